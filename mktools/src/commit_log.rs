//! Commit log since the last released version, oldest commit first.

use crate::error::{Result, ToolError};
use std::process::Command;

/// Written by the version step when no version could be read.
pub const NULL_VERSION: &str = "NULL";

const PRETTY_FORMAT: &str = "--pretty=format:- %s (%h)";

/// Run `git log {last_version}..HEAD` and format it as a Markdown list.
pub fn commit_log(last_version: &str) -> Result<String> {
    let last_version = last_version.trim();
    if last_version == NULL_VERSION {
        return Err(ToolError::Configuration(
            "LAST_VERSION is NULL, can't get commit log!".into(),
        ));
    }

    let range = format!("{}..HEAD", last_version);
    let command = format!("git log {} {}", range, PRETTY_FORMAT);
    log::debug!("running {}", command);

    let output = Command::new("git")
        .args(["log", &range, PRETTY_FORMAT])
        .output()
        .map_err(|e| ToolError::Subprocess {
            command: command.clone(),
            message: e.to_string(),
        })?;
    if !output.status.success() {
        return Err(ToolError::Subprocess {
            command,
            message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(oldest_first(&String::from_utf8_lossy(&output.stdout)))
}

/// Reverse git's newest-first listing.
pub fn oldest_first(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    trimmed.split('\n').rev().collect::<Vec<_>>().join("\n")
}
