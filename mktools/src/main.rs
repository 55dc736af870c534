//! mktools: the helper scripts of a Makefile-driven Python project.
//!
//! Every subcommand is a single pass: read `pyproject.toml`, a Makefile or
//! stdin, then print or write one artifact.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use mktools::assemble::{Assembly, DEFAULT_DOCS_SCRIPT_OUT, DEFAULT_SOURCE_URL};
use mktools::badge::Badge;
use mktools::commit_log::{self, NULL_VERSION};
use mktools::docs_clean::DocsConfig;
use mktools::mypy_report::{self, ReportMode};
use mktools::todos::{self, TodoConfig};
use mktools::{pyproject, requirements};
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(
    name = "mktools",
    version,
    about = "Helper utilities for a Makefile-driven Python project"
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Disable logging
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

impl Cli {
    fn init_logging(&self) {
        if self.quiet {
            return;
        }

        let level = match self.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        };

        env_logger::Builder::from_default_env()
            .filter_level(level)
            .init();
    }
}

#[derive(Subcommand)]
enum Command {
    /// Print `v{project.version}`, or NULL on failure
    Version {
        #[arg(default_value = "pyproject.toml")]
        pyproject: PathBuf,

        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Commits since the last version as a Markdown list, oldest first
    CommitLog {
        /// Tag or revision of the last release
        last_version: String,

        #[arg(short, long)]
        output: PathBuf,
    },

    /// Summarize mypy output read from stdin as per-file error counts
    MypyReport {
        #[arg(long, value_enum, default_value_t = Mode::Jsonl)]
        mode: Mode,
    },

    /// Print the `uv export` commands configured in pyproject.toml
    ExportRequirements {
        pyproject: PathBuf,
        output_dir: PathBuf,
    },

    /// Collect inline TODO comments into Markdown, JSONL and HTML
    Todos {
        #[arg(long, default_value = "pyproject.toml")]
        config_file: PathBuf,
    },

    /// Generate a flat SVG badge
    Badge(BadgeArgs),

    /// Inline scripts and the version into the Makefile template
    Assemble {
        #[arg(long, default_value = "pyproject.toml")]
        pyproject: PathBuf,

        #[arg(long, default_value = "makefile.template")]
        template: PathBuf,

        #[arg(long, default_value = "scripts")]
        scripts_dir: PathBuf,

        #[arg(short, long, default_value = "Makefile")]
        output: PathBuf,

        /// Base URL of the `# source:` link above each script
        #[arg(long, default_value = DEFAULT_SOURCE_URL)]
        source_url: String,

        /// Docs script template to stamp with the version
        #[arg(long, value_name = "PATH")]
        docs_script: Option<PathBuf>,

        /// Where the stamped docs script is written
        #[arg(long, value_name = "PATH", default_value = DEFAULT_DOCS_SCRIPT_OUT)]
        docs_script_out: PathBuf,
    },

    /// Delete generated docs, keeping configured and listed entries
    DocsClean {
        pyproject: PathBuf,
        docs_dir: PathBuf,
        /// Extra paths to keep
        preserve: Vec<PathBuf>,
    },

    /// Render Makefile documentation as Markdown
    Docgen {
        #[arg(default_value = "makefile")]
        makefile: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Mode {
    Jsonl,
    Toml,
}

impl From<Mode> for ReportMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Jsonl => ReportMode::Jsonl,
            Mode::Toml => ReportMode::Toml,
        }
    }
}

#[derive(Args)]
struct BadgeArgs {
    /// Output SVG file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Left-hand text
    #[arg(long, requires = "value")]
    label: Option<String>,

    /// Right-hand text
    #[arg(long, requires = "label")]
    value: Option<String>,

    /// Color name or hex code for the value side
    #[arg(long, default_value = "gray")]
    color: String,

    /// coverage.txt report produced by `coverage report`
    #[arg(long, value_name = "PATH", conflicts_with_all = ["label", "pytest_results"])]
    coverage: Option<PathBuf>,

    /// File holding captured pytest output
    #[arg(long, value_name = "PATH", conflicts_with = "label")]
    pytest_results: Option<PathBuf>,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    cli.init_logging();

    match cli.command {
        Command::Version { pyproject, output } => Ok(version(&pyproject, output.as_deref())),
        Command::CommitLog {
            last_version,
            output,
        } => {
            let log = commit_log::commit_log(&last_version)?;
            fs::write(&output, log)
                .with_context(|| format!("failed to write {}", output.display()))?;
            Ok(ExitCode::SUCCESS)
        }
        Command::MypyReport { mode } => {
            let mut input = String::new();
            io::stdin()
                .read_to_string(&mut input)
                .context("failed to read mypy output from stdin")?;
            let counts = mypy_report::parse_mypy_output(input.lines());
            print!("{}", mypy_report::render_report(&counts, mode.into())?);
            Ok(ExitCode::SUCCESS)
        }
        Command::ExportRequirements {
            pyproject,
            output_dir,
        } => {
            let table = pyproject::load(&pyproject)?;
            for command in requirements::export_commands(&table, &output_dir) {
                println!("{}", command);
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Todos { config_file } => {
            let cfg = TodoConfig::read(&config_file)?;
            let outputs = todos::run(&cfg)?;
            log::info!("found {} inline todos", outputs.items);
            println!("wrote to:");
            println!("{}", outputs.markdown.display());
            Ok(ExitCode::SUCCESS)
        }
        Command::Badge(args) => badge(args),
        Command::Assemble {
            pyproject,
            template,
            scripts_dir,
            output,
            source_url,
            docs_script,
            docs_script_out,
        } => {
            let table = pyproject::load(&pyproject)?;
            let version = pyproject::project_version(&table)?;
            let assembly = Assembly {
                template,
                scripts_dir,
                output,
                source_url,
                docs_script,
                docs_script_out,
                ..Assembly::default()
            };
            assembly.run(&version)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::DocsClean {
            pyproject,
            docs_dir,
            preserve,
        } => {
            let mut cfg = DocsConfig::read(&pyproject)?;
            cfg.validate(&docs_dir)?;
            for path in preserve {
                cfg.preserve(path);
            }
            cfg.clean()?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Docgen { makefile } => {
            let text = fs::read_to_string(&makefile)
                .with_context(|| format!("failed to read {}", makefile.display()))?;
            let items = makefile_syntax::docgen::parse(&text);
            print!("{}", makefile_syntax::docgen::to_markdown(&items));
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Any failure prints `NULL` so the Makefile can still capture a value.
fn version(pyproject: &Path, output: Option<&Path>) -> ExitCode {
    let (text, code) = match pyproject::read_version(pyproject) {
        Ok(version) => (version, ExitCode::SUCCESS),
        Err(e) => {
            log::error!("{}", e);
            (NULL_VERSION.to_string(), ExitCode::FAILURE)
        }
    };

    let written = match output {
        Some(path) => fs::write(path, &text),
        None => {
            let mut stdout = io::stdout();
            stdout.write_all(text.as_bytes()).and_then(|_| stdout.flush())
        }
    };
    match written {
        Ok(()) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn badge(args: BadgeArgs) -> Result<ExitCode> {
    let badge = if let Some(path) = &args.coverage {
        anyhow::ensure!(path.exists(), "Coverage file not found: {}", path.display());
        Badge::coverage(path)?
    } else if let Some(path) = &args.pytest_results {
        anyhow::ensure!(
            path.exists(),
            "Pytest results file not found: {}",
            path.display()
        );
        Badge::tests(path)?
    } else if let (Some(label), Some(value)) = (&args.label, &args.value) {
        Badge::new(label.as_str(), value.as_str(), &args.color)
    } else {
        anyhow::bail!("specify --coverage, --pytest-results, or both --label and --value");
    };

    let svg = badge.to_svg();
    match &args.output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
            fs::write(path, svg).with_context(|| format!("failed to write {}", path.display()))?;
            println!("Badge written to {}", path.display());
        }
        None => print!("{}", svg),
    }
    Ok(ExitCode::SUCCESS)
}
