//! Error taxonomy shared by every utility.

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ToolError {
    /// Missing or malformed configuration that has no sensible default.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// An external command could not be run or exited non-zero.
    #[error("`{command}` failed: {message}")]
    Subprocess { command: String, message: String },

    /// Input did not have the expected structure.
    #[error("could not parse {what}: {detail}")]
    Parse { what: String, detail: String },

    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("template error: {0}")]
    Template(#[from] tera::Error),
}

pub type Result<T> = std::result::Result<T, ToolError>;

/// Attach `path` to an I/O error, for use with `map_err`.
pub(crate) fn io_error(path: &Path) -> impl FnOnce(io::Error) -> ToolError + '_ {
    move |source| ToolError::Io {
        path: path.to_path_buf(),
        source,
    }
}
