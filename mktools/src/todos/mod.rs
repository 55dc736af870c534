//! Inline TODO scraper.
//!
//! Finds tagged comments in source files and writes them as Markdown,
//! JSONL and an interactive HTML table next to each other.

mod config;
mod item;
mod render;

pub use config::{TodoConfig, TOOL_PATH, UNKNOWN_REPO};
pub use item::{collect_files, scrape_file, scrape_text, TodoItem, TodoRecord};
pub use render::{group_by_tag_and_file, to_html, to_jsonl, to_markdown, HTML_DATA_PLACEHOLDER};

use crate::error::{io_error, Result};
use std::fs;
use std::path::PathBuf;

/// Paths written by [`run`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoOutputs {
    pub markdown: PathBuf,
    pub jsonl: PathBuf,
    /// `None` when the HTML template could not be read
    pub html: Option<PathBuf>,
    pub items: usize,
}

/// Scrape every matching file and write all outputs beside `cfg.out_file`.
pub fn run(cfg: &TodoConfig) -> Result<TodoOutputs> {
    let files = collect_files(&cfg.search_dir, &cfg.extensions, &cfg.exclude)?;
    let mut items = Vec::new();
    for (i, path) in files.iter().enumerate() {
        log::info!("scraping {:>2}/{:>2}: {}", i + 1, files.len(), path.display());
        items.extend(scrape_file(path, &cfg.tags, cfg.context_lines)?);
    }

    if let Some(parent) = cfg.out_file.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_error(parent))?;
    }

    let jsonl = cfg.out_file.with_extension("jsonl");
    fs::write(&jsonl, to_jsonl(&items, cfg)?).map_err(io_error(&jsonl))?;

    let markdown = cfg.out_file.with_extension("md");
    fs::write(&markdown, to_markdown(&items, cfg)?).map_err(io_error(&markdown))?;

    let html = match fs::read_to_string(&cfg.template_html_source) {
        Ok(template) => {
            let path = cfg.out_file.with_extension("html");
            fs::write(&path, to_html(&template, &items, cfg)?).map_err(io_error(&path))?;
            Some(path)
        }
        Err(e) => {
            log::warn!(
                "Failed to write html output: {}: {}",
                cfg.template_html_source.display(),
                e
            );
            None
        }
    };

    Ok(TodoOutputs {
        markdown,
        jsonl,
        html,
        items: items.len(),
    })
}
