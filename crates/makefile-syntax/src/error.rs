use thiserror::Error;

/// Errors raised while building a description from a scanned Makefile.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SyntaxError {
    #[error("target '{0}' not found in makefile")]
    TargetNotFound(String),

    #[error("variable '{0}' not found in makefile")]
    VariableNotFound(String),

    /// The indexed line no longer has the shape of a definition.
    #[error("line {line} is not a variable assignment: {text}")]
    Parse { line: usize, text: String },
}
