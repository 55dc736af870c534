use crate::error::{io_error, Result};
use crate::pyproject::deep_get;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use toml::{Table, Value};

pub const TOOL_PATH: &str = "tool.makefile.inline-todo";

pub const UNKNOWN_REPO: &str = "UNKNOWN";

const DEFAULT_ISSUE_TEMPLATE: &str = "\
# source

[`{file}#L{line_num}`]({code_url})

# context
```{file_lang}
{context}
```
";

/// Settings for the inline TODO scraper, all optional in `pyproject.toml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TodoConfig {
    pub search_dir: PathBuf,
    pub out_file: PathBuf,
    /// Checked in order; the first tag found on a line wins
    pub tags: Vec<String>,
    pub extensions: Vec<String>,
    pub exclude: Vec<String>,
    pub context_lines: usize,
    pub tag_label_map: HashMap<String, String>,
    pub extension_lang_map: HashMap<String, String>,
    /// Tera template for the Markdown report, rendered with `grouped`
    /// (tag, then file, then items). The built-in layout when unset.
    pub template_md: Option<String>,
    /// Body of the "new issue" link. Placeholders: `{file}`, `{line_num}`,
    /// `{code_url}`, `{file_lang}`, `{context}`, `{context_indented}`.
    pub template_issue: String,
    pub template_html_source: PathBuf,
    pub repo_url: String,
    pub branch: String,
}

impl Default for TodoConfig {
    fn default() -> Self {
        let pairs = |items: &[(&str, &str)]| -> HashMap<String, String> {
            items
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect()
        };
        let strings = |items: &[&str]| -> Vec<String> {
            items.iter().map(|s| s.to_string()).collect()
        };

        TodoConfig {
            search_dir: PathBuf::from("."),
            out_file: PathBuf::from("docs/todo-inline.md"),
            tags: strings(&["CRIT", "TODO", "FIXME", "HACK", "BUG"]),
            extensions: strings(&["py", "md"]),
            exclude: strings(&["docs/**", ".venv/**"]),
            context_lines: 2,
            tag_label_map: pairs(&[
                ("CRIT", "bug"),
                ("TODO", "enhancement"),
                ("FIXME", "bug"),
                ("BUG", "bug"),
                ("HACK", "enhancement"),
            ]),
            extension_lang_map: pairs(&[
                ("py", "python"),
                ("md", "markdown"),
                ("html", "html"),
                ("css", "css"),
                ("js", "javascript"),
            ]),
            template_md: None,
            template_issue: DEFAULT_ISSUE_TEMPLATE.to_string(),
            template_html_source: PathBuf::from("docs/resources/templates/todo-template.html"),
            repo_url: UNKNOWN_REPO.to_string(),
            branch: "main".to_string(),
        }
    }
}

impl TodoConfig {
    /// Read the config from `path`; a missing file yields the defaults.
    pub fn read(path: &Path) -> Result<Self> {
        if !path.is_file() {
            log::info!("{} not found, using default todo settings", path.display());
            return Ok(TodoConfig::default());
        }
        let raw = fs::read_to_string(path).map_err(io_error(path))?;
        Self::from_pyproject(&raw.parse::<Table>()?)
    }

    /// Build from a parsed `pyproject.toml`. `repo_url` falls back to
    /// `project.urls` when the tool table does not set it.
    pub fn from_pyproject(pyproject: &Table) -> Result<Self> {
        let mut section = deep_get(pyproject, TOOL_PATH)
            .and_then(Value::as_table)
            .cloned()
            .unwrap_or_default();

        if !section.contains_key("repo_url") {
            section.insert("repo_url".into(), Value::String(repository_url(pyproject)));
        }
        Ok(Value::Table(section).try_into::<TodoConfig>()?)
    }

    /// `{repo}/blob/{branch}/{file}#L{line}`
    pub fn code_url(&self, file: &str, line_num: usize) -> String {
        format!("{}/blob/{}/{}#L{}", self.repo_url, self.branch, file, line_num)
    }

    /// Issue label for `tag`, the tag itself when unmapped.
    pub fn label<'a>(&'a self, tag: &'a str) -> &'a str {
        self.tag_label_map.get(tag).map(String::as_str).unwrap_or(tag)
    }

    /// Code fence language for a file extension, the extension when unmapped.
    pub fn language<'a>(&'a self, ext: &'a str) -> &'a str {
        self.extension_lang_map
            .get(ext)
            .map(String::as_str)
            .unwrap_or(ext)
    }
}

/// `project.urls.github`, else `project.urls.repository` (keys compared
/// case-insensitively), else `UNKNOWN`.
fn repository_url(pyproject: &Table) -> String {
    let urls = deep_get(pyproject, "project.urls").and_then(Value::as_table);
    let find = |wanted: &str| {
        urls.into_iter()
            .flatten()
            .find(|(k, _)| k.eq_ignore_ascii_case(wanted))
            .and_then(|(_, v)| v.as_str())
            .map(str::to_string)
    };

    match find("github").or_else(|| find("repository")) {
        Some(url) => url,
        None => {
            log::warn!(
                "No repository URL found in pyproject.toml, 'make issue' links will not work."
            );
            UNKNOWN_REPO.to_string()
        }
    }
}
