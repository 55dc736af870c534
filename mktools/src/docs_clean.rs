//! Empty the generated docs directory, keeping configured entries.

use crate::error::{io_error, Result, ToolError};
use crate::pyproject::{deep_get, string_list};
use std::collections::HashSet;
use std::fs;
use std::path::{Component, Path, PathBuf};
use toml::{Table, Value};

pub const TOOL_PATH: &str = "tool.makefile.docs";
pub const DEFAULT_DOCS_DIR: &str = "docs";

/// The docs directory and the entries inside it that survive a clean.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocsConfig {
    pub docs_dir: PathBuf,
    pub preserved: HashSet<PathBuf>,
}

impl Default for DocsConfig {
    fn default() -> Self {
        DocsConfig {
            docs_dir: PathBuf::from(DEFAULT_DOCS_DIR),
            preserved: HashSet::new(),
        }
    }
}

impl DocsConfig {
    /// Read `output_dir` and `no_clean`; a missing file yields the defaults.
    pub fn read(pyproject: &Path) -> Result<Self> {
        if !pyproject.is_file() {
            return Ok(DocsConfig::default());
        }
        Self::from_pyproject(&crate::pyproject::load(pyproject)?)
    }

    /// Every `no_clean` entry must stay inside the docs directory.
    pub fn from_pyproject(pyproject: &Table) -> Result<Self> {
        let docs_dir = PathBuf::from(
            deep_get(pyproject, &format!("{}.output_dir", TOOL_PATH))
                .and_then(Value::as_str)
                .unwrap_or(DEFAULT_DOCS_DIR),
        );

        let mut preserved = HashSet::new();
        for entry in string_list(pyproject, &format!("{}.no_clean", TOOL_PATH)) {
            let full = docs_dir.join(&entry);
            if !normalize(&full).starts_with(normalize(&docs_dir)) {
                return Err(ToolError::Configuration(format!(
                    "Preserved path '{}' must be within docs directory",
                    entry
                )));
            }
            preserved.insert(normalize(&full));
        }
        Ok(DocsConfig {
            docs_dir,
            preserved,
        })
    }

    /// Keep `path` as well, given relative to the working directory.
    pub fn preserve(&mut self, path: impl AsRef<Path>) {
        self.preserved.insert(normalize(path.as_ref()));
    }

    /// Check the configured directory exists and matches the one the caller
    /// expects to clean.
    pub fn validate(&self, expected: &Path) -> Result<()> {
        if !self.docs_dir.is_dir() {
            return Err(ToolError::Configuration(format!(
                "Docs directory '{}' not found",
                self.docs_dir.display()
            )));
        }
        if normalize(&self.docs_dir) != normalize(expected) {
            return Err(ToolError::Configuration(format!(
                "Docs directory mismatch: '{}' (pyproject.toml:{}.output_dir) != '{}' \
                 (makefile DOCS_DIR); update both together",
                self.docs_dir.display(),
                TOOL_PATH,
                expected.display()
            )));
        }
        Ok(())
    }

    /// Delete every direct child of the docs directory that is not preserved.
    /// Returns the removed paths.
    pub fn clean(&self) -> Result<Vec<PathBuf>> {
        let dir = &self.docs_dir;
        let mut removed = Vec::new();
        for entry in fs::read_dir(dir).map_err(io_error(dir))? {
            let path = entry.map_err(io_error(dir))?.path();
            if self.preserved.contains(&normalize(&path)) {
                log::debug!("keeping {}", path.display());
                continue;
            }
            if path.is_dir() {
                fs::remove_dir_all(&path).map_err(io_error(&path))?;
            } else {
                fs::remove_file(&path).map_err(io_error(&path))?;
            }
            removed.push(path);
        }
        log::info!("removed {} entries from {}", removed.len(), dir.display());
        Ok(removed)
    }
}

/// Resolve `.` and `..` components without touching the filesystem.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let ends_in_parent = out.components().next_back() == Some(Component::ParentDir);
                if ends_in_parent || !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config(text: &str) -> Result<DocsConfig> {
        DocsConfig::from_pyproject(&text.parse::<Table>().unwrap())
    }

    #[test]
    fn normalize_lexically() {
        assert_eq!(normalize(Path::new("docs/./a/../b")), PathBuf::from("docs/b"));
        assert_eq!(normalize(Path::new("../../x")), PathBuf::from("../../x"));
    }

    #[test]
    fn defaults_without_section() {
        let cfg = config("[project]\nname = \"x\"\n").unwrap();
        assert_eq!(cfg, DocsConfig::default());
    }

    #[test]
    fn escaping_preserve_entry_rejected() {
        let err = config("[tool.makefile.docs]\nno_clean = [\"../secrets\"]\n").unwrap_err();
        assert!(err.to_string().contains("must be within docs directory"));
    }

    #[test]
    fn clean_keeps_preserved_entries() {
        let tmp = TempDir::new().unwrap();
        let docs = tmp.path().join("site");
        fs::create_dir_all(docs.join("resources/img")).unwrap();
        fs::create_dir_all(docs.join("api")).unwrap();
        fs::write(docs.join("index.html"), "x").unwrap();
        fs::write(docs.join(".nojekyll"), "").unwrap();
        fs::write(docs.join("api/mod.html"), "x").unwrap();

        let mut cfg = DocsConfig {
            docs_dir: docs.clone(),
            preserved: HashSet::new(),
        };
        cfg.preserve(docs.join("resources"));
        cfg.preserve(docs.join(".nojekyll"));
        cfg.validate(&docs).unwrap();

        let mut removed = cfg.clean().unwrap();
        removed.sort();
        assert_eq!(removed, vec![docs.join("api"), docs.join("index.html")]);
        assert!(docs.join("resources/img").is_dir());
        assert!(docs.join(".nojekyll").is_file());
    }

    #[test]
    fn mismatch_detected() {
        let tmp = TempDir::new().unwrap();
        let cfg = DocsConfig {
            docs_dir: tmp.path().to_path_buf(),
            preserved: HashSet::new(),
        };
        assert!(cfg.validate(&tmp.path().join("other")).is_err());

        let missing = DocsConfig {
            docs_dir: tmp.path().join("absent"),
            preserved: HashSet::new(),
        };
        let err = missing.validate(&tmp.path().join("absent")).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }
}
