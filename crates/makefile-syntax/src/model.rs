//! Description records derived from a scanned Makefile.

use std::fmt;

/// A Makefile target with its documentation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Recipe {
    pub target: String,
    /// Comment block directly above the definition, top to bottom
    pub comments: Vec<String>,
    /// Whitespace-split prerequisites
    pub dependencies: Vec<String>,
    /// First `echo` argument of the recipe body, unquoted
    pub echo_message: String,
}

/// A Makefile variable assignment, unexpanded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variable {
    pub name: String,
    pub operator: AssignOp,
    /// Right-hand side exactly as written, e.g. `$(shell git describe)`
    pub raw_value: String,
    pub comments: Vec<String>,
}

/// Makefile assignment flavours.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    /// `=` recursively expanded
    Recursive,
    /// `:=` simply expanded
    Simple,
    /// `?=` set if absent
    Conditional,
    /// `+=` append
    Append,
}

impl AssignOp {
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "=" => Some(AssignOp::Recursive),
            ":=" => Some(AssignOp::Simple),
            "?=" => Some(AssignOp::Conditional),
            "+=" => Some(AssignOp::Append),
            _ => None,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            AssignOp::Recursive => "=",
            AssignOp::Simple => ":=",
            AssignOp::Conditional => "?=",
            AssignOp::Append => "+=",
        }
    }
}

impl fmt::Display for AssignOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}
