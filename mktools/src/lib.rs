//! Companion utilities for a Makefile-driven Python project.
//!
//! Each module backs one `mktools` subcommand. They read `pyproject.toml`
//! (see [`pyproject`]) or a text input and produce a single artifact.

pub mod assemble;
pub mod badge;
pub mod commit_log;
pub mod docs_clean;
pub mod error;
pub mod mypy_report;
pub mod pyproject;
pub mod requirements;
pub mod todos;

pub use error::{Result, ToolError};
