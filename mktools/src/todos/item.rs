use super::config::TodoConfig;
use crate::error::{io_error, Result, ToolError};
use glob::Pattern;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Only this many characters of a line are searched for tags.
const TAG_SEARCH_WIDTH: usize = 200;

const FALLBACK_TITLE: &str = "Issue from inline todo";

/// One tagged line and the lines around it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TodoItem {
    pub tag: String,
    pub file: String,
    pub line_num: usize,
    pub content: String,
    pub context: String,
}

impl TodoItem {
    /// Content after the first occurrence of the tag, minus a leading colon.
    pub fn stripped_title(&self) -> &str {
        let rest = match self.content.split_once(self.tag.as_str()) {
            Some((_, after)) => after,
            None => self.content.as_str(),
        };
        rest.trim_start_matches(':').trim()
    }

    pub fn extension(&self) -> &str {
        Path::new(&self.file)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
    }

    pub fn context_indented(&self) -> String {
        self.context
            .lines()
            .map(|line| format!("  {}", line))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Link to a prefilled "new issue" form.
    pub fn issue_url(&self, cfg: &TodoConfig) -> String {
        let title = match self.stripped_title() {
            "" => FALLBACK_TITLE,
            t => t,
        };
        let body = cfg
            .template_issue
            .replace("{file}", &self.file)
            .replace("{line_num}", &self.line_num.to_string())
            .replace("{code_url}", &cfg.code_url(&self.file, self.line_num))
            .replace("{file_lang}", cfg.language(self.extension()))
            .replace("{context_indented}", &self.context_indented())
            .replace("{context}", &self.context);

        format!(
            "{}/issues/new?title={}&body={}&labels={}",
            cfg.repo_url,
            urlencoding::encode(title),
            urlencoding::encode(body.trim()),
            urlencoding::encode(cfg.label(&self.tag)),
        )
    }

    /// The item plus every derived field, as written to JSONL and HTML.
    pub fn record<'a>(&'a self, cfg: &TodoConfig) -> TodoRecord<'a> {
        TodoRecord {
            item: self,
            issue_url: self.issue_url(cfg),
            file_lang: cfg.language(self.extension()).to_string(),
            stripped_title: self.stripped_title(),
            code_url: cfg.code_url(&self.file, self.line_num),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TodoRecord<'a> {
    #[serde(flatten)]
    pub item: &'a TodoItem,
    pub issue_url: String,
    pub file_lang: String,
    pub stripped_title: &'a str,
    pub code_url: String,
}

/// Tagged lines of `text`. At most one item per line.
pub fn scrape_text(file: &str, text: &str, tags: &[String], context_lines: usize) -> Vec<TodoItem> {
    let lines: Vec<&str> = text.lines().collect();
    let mut items = Vec::new();

    for (i, line) in lines.iter().enumerate() {
        let head: String = line.chars().take(TAG_SEARCH_WIDTH).collect();
        let Some(tag) = tags.iter().find(|tag| head.contains(tag.as_str())) else {
            continue;
        };
        let start = i.saturating_sub(context_lines);
        let end = (i + context_lines + 1).min(lines.len());
        items.push(TodoItem {
            tag: tag.clone(),
            file: file.to_string(),
            line_num: i + 1,
            content: line.to_string(),
            context: lines[start..end].join("\n").trim_matches('\n').to_string(),
        });
    }
    items
}

pub fn scrape_file(path: &Path, tags: &[String], context_lines: usize) -> Result<Vec<TodoItem>> {
    let text = fs::read_to_string(path).map_err(io_error(path))?;
    Ok(scrape_text(&posix(path), &text, tags, context_lines))
}

/// Files under `search_dir` with one of `extensions`, minus anything
/// matching an `exclude` glob. Paths under `.` are reported without the
/// leading `./`.
pub fn collect_files(
    search_dir: &Path,
    extensions: &[String],
    exclude: &[String],
) -> Result<Vec<PathBuf>> {
    let excludes: Vec<Pattern> = exclude
        .iter()
        .filter_map(|p| match Pattern::new(p) {
            Ok(pattern) => Some(pattern),
            Err(e) => {
                log::warn!("ignoring invalid exclude pattern '{}': {}", p, e);
                None
            }
        })
        .collect();

    let mut files = Vec::new();
    for ext in extensions {
        let pattern = format!("{}/**/*.{}", search_dir.display(), ext);
        let entries = glob::glob(&pattern).map_err(|e| ToolError::Parse {
            what: format!("file pattern '{}'", pattern),
            detail: e.to_string(),
        })?;
        for path in entries.flatten() {
            if !path.is_file() {
                continue;
            }
            let path = path.strip_prefix(".").map(Path::to_path_buf).unwrap_or(path);
            let display = posix(&path);
            if excludes.iter().any(|p| p.matches(&display)) {
                log::debug!("excluded {}", display);
                continue;
            }
            files.push(path);
        }
    }
    Ok(files)
}

fn posix(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn tags() -> Vec<String> {
        TodoConfig::default().tags
    }

    const SOURCE: &str = "\
import os

def f():
    # TODO: handle the empty case
    return 1

# FIXME
x = 2
";

    #[test]
    fn scrape_with_context() {
        let items = scrape_text("src/a.py", SOURCE, &tags(), 1);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].tag, "TODO");
        assert_eq!(items[0].line_num, 4);
        assert_eq!(
            items[0].context,
            "def f():\n    # TODO: handle the empty case\n    return 1"
        );
        assert_eq!(items[1].tag, "FIXME");
        assert_eq!(items[1].line_num, 7);
    }

    #[test]
    fn first_configured_tag_wins() {
        let items = scrape_text("a.py", "# BUG TODO both here", &tags(), 0);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].tag, "TODO");
    }

    #[test]
    fn tags_past_search_width_ignored() {
        let line = format!("{}TODO late", " ".repeat(TAG_SEARCH_WIDTH));
        assert!(scrape_text("a.py", &line, &tags(), 0).is_empty());
    }

    #[test]
    fn stripped_title_variants() {
        let items = scrape_text("a.py", SOURCE, &tags(), 0);
        assert_eq!(items[0].stripped_title(), "handle the empty case");
        assert_eq!(items[1].stripped_title(), "");
    }

    #[test]
    fn issue_url_encodes_everything() {
        let cfg = TodoConfig {
            repo_url: "https://github.com/o/r".into(),
            ..TodoConfig::default()
        };
        let items = scrape_text("src/a.py", SOURCE, &tags(), 0);
        let url = items[0].issue_url(&cfg);
        assert!(url.starts_with(
            "https://github.com/o/r/issues/new?title=handle%20the%20empty%20case&body="
        ));
        assert!(url.contains("src%2Fa.py%23L4"));
        assert!(url.ends_with("&labels=enhancement"));

        let fallback = items[1].issue_url(&cfg);
        assert!(fallback.contains("title=Issue%20from%20inline%20todo"));
        assert!(fallback.ends_with("&labels=bug"));
    }

    #[test]
    fn issue_template_indented_context() {
        let cfg = TodoConfig {
            template_issue: "at {file}:\n{context_indented}".into(),
            ..TodoConfig::default()
        };
        let items = scrape_text("src/a.py", SOURCE, &tags(), 0);
        let url = items[0].issue_url(&cfg);
        let body = url.split("&body=").nth(1).unwrap().split("&labels=").next().unwrap();
        assert_eq!(
            urlencoding::decode(body).unwrap(),
            "at src/a.py:\n      # TODO: handle the empty case"
        );
    }

    #[test]
    fn record_serializes_derived_fields() {
        let cfg = TodoConfig::default();
        let items = scrape_text("src/a.py", SOURCE, &tags(), 0);
        let json = serde_json::to_value(items[0].record(&cfg)).unwrap();
        assert_eq!(json["tag"], "TODO");
        assert_eq!(json["line_num"], 4);
        assert_eq!(json["file_lang"], "python");
        assert_eq!(json["code_url"], "UNKNOWN/blob/main/src/a.py#L4");
    }

    #[test]
    fn collect_respects_excludes() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("src")).unwrap();
        fs::create_dir_all(root.join("docs")).unwrap();
        fs::write(root.join("src/a.py"), "").unwrap();
        fs::write(root.join("docs/b.md"), "").unwrap();
        fs::write(root.join("notes.txt"), "").unwrap();

        let exclude = vec![format!("{}/docs/**", posix(root))];
        let files = collect_files(root, &["py".into(), "md".into()], &exclude).unwrap();
        assert_eq!(files, vec![root.join("src/a.py")]);
    }
}
