//! makefile-syntax: scan a Makefile for its targets, variables and `.PHONY`
//! declarations, and describe them.
//!
//! The scanner is a linear pass over the line buffer. It does not expand
//! variables or evaluate conditionals; `define ... endef` bodies are opaque.
//!
//! ```
//! use makefile_syntax::{Makefile, Recipe};
//!
//! let mf = Makefile::parse(".PHONY: build\n# compile it\nbuild: deps\n\t@echo \"Building\"\n");
//! let recipe = Recipe::describe(&mf, "build").unwrap();
//! assert_eq!(recipe.echo_message, "Building");
//! assert_eq!(recipe.dependencies, vec!["deps"]);
//! assert_eq!(recipe.comments, vec!["compile it"]);
//! ```

pub mod describe;
pub mod docgen;
pub mod error;
pub mod model;
pub mod query;
pub mod scanner;

pub use error::SyntaxError;
pub use model::{AssignOp, Recipe, Variable};
pub use query::{QueryError, Resolved};
pub use scanner::{Index, Makefile};
