//! Build the distributable Makefile from its template.
//!
//! Every helper script is inlined at its `##[[SCRIPT_NAME]]##` placeholder and
//! the `##[[VERSION]]##` placeholder becomes a boxed version line. A docs
//! build script can optionally be stamped with the bare version as well.

use crate::error::{io_error, Result, ToolError};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_SOURCE_URL: &str =
    "https://github.com/mivanit/python-project-makefile-template/tree/main";

pub const DEFAULT_DOCS_SCRIPT_OUT: &str = "docs/resources/make_docs.py";

const VERSION_LINE_WIDTH: usize = 68;

/// `##[[{var}]]##`
pub fn placeholder(var: &str) -> String {
    format!("##[[{}]]##", var)
}

/// `#| version: v1.2.3` padded to a fixed width and closed with `|`.
pub fn version_line(version: &str) -> String {
    let text = format!("#| version: v{}", version);
    format!("{:<width$}|", text, width = VERSION_LINE_WIDTH)
}

#[derive(Debug, Clone)]
pub struct Assembly {
    pub template: PathBuf,
    pub scripts_dir: PathBuf,
    pub output: PathBuf,
    /// Prefix of the `# source:` link put above each inlined script
    pub source_url: String,
    /// Script stems that are never inlined
    pub ignore: Vec<String>,
    /// Docs script template to stamp with the version, if any
    pub docs_script: Option<PathBuf>,
    pub docs_script_out: PathBuf,
}

impl Default for Assembly {
    fn default() -> Self {
        Assembly {
            template: PathBuf::from("makefile.template"),
            scripts_dir: PathBuf::from("scripts"),
            output: PathBuf::from("Makefile"),
            source_url: DEFAULT_SOURCE_URL.to_string(),
            ignore: vec!["assemble_make".to_string()],
            docs_script: None,
            docs_script_out: PathBuf::from(DEFAULT_DOCS_SCRIPT_OUT),
        }
    }
}

/// A script ready to inline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Script {
    pub stem: String,
    pub contents: String,
}

impl Assembly {
    /// `*.py` files directly inside the scripts directory, sorted by name,
    /// each prefixed with its source link.
    pub fn read_scripts(&self) -> Result<Vec<Script>> {
        let dir = &self.scripts_dir;
        let mut paths: Vec<PathBuf> = fs::read_dir(dir)
            .map_err(io_error(dir))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "py"))
            .collect();
        paths.sort();

        let mut scripts = Vec::with_capacity(paths.len());
        for path in paths {
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if self.ignore.iter().any(|i| i == stem) {
                log::debug!("skipping {}", path.display());
                continue;
            }
            let text = fs::read_to_string(&path).map_err(io_error(&path))?;
            let link = path.to_string_lossy().replace('\\', "/");
            scripts.push(Script {
                stem: stem.to_string(),
                contents: format!("# source: {}/{}\n\n{}", self.source_url, link, text),
            });
        }
        Ok(scripts)
    }

    /// Read the template and scripts, write the assembled Makefile.
    pub fn run(&self, version: &str) -> Result<()> {
        let template = fs::read_to_string(&self.template).map_err(io_error(&self.template))?;
        let scripts = self.read_scripts()?;
        let contents = fill_template(&template, &scripts, version)
            .map_err(|e| match e {
                ToolError::Configuration(msg) => ToolError::Configuration(format!(
                    "{} in {}",
                    msg,
                    self.template.display()
                )),
                other => other,
            })?;
        log::info!(
            "inlined {} scripts into {}",
            scripts.len(),
            self.output.display()
        );
        fs::write(&self.output, contents).map_err(io_error(&self.output))?;

        if let Some(source) = &self.docs_script {
            stamp_docs_script(source, &self.docs_script_out, version)?;
        }
        Ok(())
    }
}

/// Copy `source` to `output` with `##[[VERSION]]##` replaced by the bare
/// version.
pub fn stamp_docs_script(source: &Path, output: &Path, version: &str) -> Result<()> {
    let text = fs::read_to_string(source).map_err(io_error(source))?;
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_error(parent))?;
    }
    log::info!("stamping {} into {}", source.display(), output.display());
    fs::write(output, text.replace(&placeholder("VERSION"), version)).map_err(io_error(output))
}

/// Substitute every script and the version. A script whose placeholder is
/// missing from the template is an error.
pub fn fill_template(template: &str, scripts: &[Script], version: &str) -> Result<String> {
    let mut contents = template.to_string();
    for script in scripts {
        let marker = placeholder(&format!("SCRIPT_{}", script.stem.to_uppercase()));
        if !contents.contains(&marker) {
            return Err(ToolError::Configuration(format!(
                "template placeholder {} not found",
                marker
            )));
        }
        contents = contents.replace(&marker, &script.contents);
    }
    Ok(contents.replace(&placeholder("VERSION"), &version_line(version)))
}
