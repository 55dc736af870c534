//! recipe-info: get information about Makefile recipes/targets and variables.
//!
//! - `recipe-info --all` describes every `.PHONY` target
//! - `recipe-info build 'test*' python` describes targets and variables by
//!   name or glob pattern
//!
//! Every query is resolved before anything is printed. Resolved items go to
//! stdout, unresolved queries are reported on stderr and make the exit code
//! non-zero.

mod render;

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use makefile_syntax::query::{self, QueryError};
use makefile_syntax::{Makefile, Resolved};
use render::Palette;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(
    name = "recipe-info",
    about = "Get detailed information about Makefile recipes/targets and variables"
)]
struct Cli {
    /// Target or variable names, or glob patterns. Variables match
    /// case-insensitively.
    targets: Vec<String>,

    /// Path to the Makefile
    #[arg(short = 'f', long = "file", default_value = "makefile")]
    file: PathBuf,

    /// Describe every .PHONY target in the Makefile
    #[arg(short = 'a', long, conflicts_with = "targets")]
    all: bool,

    /// Disable colored output (color is enabled by default)
    #[arg(long)]
    no_color: bool,
}

fn main() -> Result<ExitCode> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    if !cli.all && cli.targets.is_empty() {
        Cli::command()
            .error(
                ErrorKind::MissingRequiredArgument,
                "provide target/variable names or use --all",
            )
            .exit();
    }

    colored::control::set_override(!cli.no_color);
    let palette = Palette;

    let text = fs::read_to_string(&cli.file)
        .with_context(|| format!("failed to read {}", cli.file.display()))?;
    let mf = Makefile::parse(&text);

    let (resolved, failures) = if cli.all {
        let resolved = query::resolve_all(&mf)?;
        if resolved.is_empty() {
            anyhow::bail!("no .PHONY targets defined in {}", cli.file.display());
        }
        (resolved, Vec::new())
    } else {
        resolve_queries(&mf, &cli.targets)
    };

    if !resolved.is_empty() {
        println!("{}", render::render(&resolved, palette));
    }
    for failure in &failures {
        report_failure(failure, palette);
    }

    Ok(if failures.is_empty() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Resolve every query, keeping successes and failures apart.
fn resolve_queries(mf: &Makefile, queries: &[String]) -> (Resolved, Vec<QueryError>) {
    let mut resolved = Resolved::default();
    let mut failures = Vec::new();
    for q in queries {
        match query::resolve(mf, q) {
            Ok(found) => resolved.extend(found),
            Err(e) => {
                log::debug!("query '{}' failed: {}", q, e);
                failures.push(e);
            }
        }
    }
    (resolved, failures)
}

fn report_failure(err: &QueryError, p: Palette) {
    match err {
        QueryError::NotFound { query, suggestions } => {
            eprintln!(
                "Error: '{}' not found as target or variable",
                p.label(query)
            );
            if !suggestions.is_empty() {
                let names: Vec<String> = suggestions.iter().map(|s| p.suggestion(s)).collect();
                eprintln!("Did you mean: {}?", names.join(", "));
            }
        }
        QueryError::NoMatch(pattern) => {
            eprintln!(
                "Error: no targets or variables match pattern '{}'",
                p.label(pattern)
            );
        }
        other => eprintln!("Error: {}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failures_do_not_discard_successes() {
        let mf = Makefile::parse(".PHONY: build\nbuild:\n");
        let queries = vec!["build".to_string(), "nope".to_string(), "z*".to_string()];
        let (resolved, failures) = resolve_queries(&mf, &queries);
        assert_eq!(resolved.recipes.len(), 1);
        assert_eq!(failures.len(), 2);
        assert_eq!(failures[0].query(), Some("nope"));
        assert_eq!(failures[1].query(), Some("z*"));
    }

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }
}
