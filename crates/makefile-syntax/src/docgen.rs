//! Makefile → Markdown reference generator.
//!
//! A coarser reading of the Makefile than [`crate::scanner`]: comments are
//! gathered as they appear and handed to the next variable or target line,
//! banner comments open sections.
//!
//! ```text
//! # ==================================================
//! # configuration & variables
//! # ==================================================
//! ```

use regex::Regex;
use std::iter::Peekable;
use std::sync::LazyLock;

static RE_VARIABLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([\w\-.]+)\s*(\?|:)?=\s*(.*)$").unwrap());

static RE_TARGET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([\w\-.]+):.*$").unwrap());

static RE_ECHO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^@?echo\s+"?(.*)"?$"#).unwrap());

const NO_VARIABLE_DESC: &str = "*(No description available)*";
const NO_TARGET_DESC: &str = "No description available";

/// One documented element of a Makefile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocItem {
    Section {
        title: String,
    },
    Variable {
        name: String,
        declaration: String,
        short_desc: String,
        long_desc: Vec<String>,
    },
    Target {
        name: String,
        short_desc: String,
        long_desc: Vec<String>,
    },
}

/// `# =====` style banner: a comment holding nothing but `=` characters.
fn is_banner(stripped: &str) -> bool {
    if !stripped.starts_with('#') {
        return false;
    }
    let body = stripped.trim_matches(|c| c == '#' || c == ' ');
    !body.is_empty() && body.chars().all(|c| c == '=')
}

fn split_comments(comments: &[String]) -> (Option<String>, Vec<String>) {
    match comments.split_first() {
        Some((first, rest)) => (Some(first.clone()), rest.to_vec()),
        None => (None, Vec::new()),
    }
}

/// Parse Makefile text into documentation items, in file order.
pub fn parse(text: &str) -> Vec<DocItem> {
    let mut items = Vec::new();
    let mut comments: Vec<String> = Vec::new();
    let mut lines = text.lines().peekable();

    while let Some(line) = lines.next() {
        let stripped = line.trim();
        if stripped.is_empty() {
            comments.clear();
            continue;
        }

        if is_banner(stripped) {
            if let Some(section) = parse_section(&mut lines) {
                items.push(section);
            }
            comments.clear();
        } else if stripped.starts_with('#') {
            comments.push(stripped.trim_start_matches(['#', ' ']).trim_end().to_string());
        } else if let Some(variable) = parse_variable(stripped, &comments) {
            items.push(variable);
            comments.clear();
        } else if let Some(target) = parse_target(stripped, &comments, &mut lines) {
            items.push(target);
            comments.clear();
        } else {
            comments.clear();
        }
    }

    items
}

/// Title line after an opening banner, plus the optional closing banner.
fn parse_section<'a, I>(lines: &mut Peekable<I>) -> Option<DocItem>
where
    I: Iterator<Item = &'a str>,
{
    let title = lines.next()?.trim().trim_matches(['#', ' ']).to_string();
    if lines.peek().is_some_and(|next| is_banner(next.trim())) {
        lines.next();
    }
    if title.is_empty() {
        return None;
    }
    Some(DocItem::Section { title })
}

fn parse_variable(line: &str, comments: &[String]) -> Option<DocItem> {
    let caps = RE_VARIABLE.captures(line)?;
    let (short, long_desc) = split_comments(comments);
    Some(DocItem::Variable {
        name: caps[1].to_string(),
        declaration: line.to_string(),
        short_desc: short.unwrap_or_else(|| NO_VARIABLE_DESC.to_string()),
        long_desc,
    })
}

fn parse_target<'a, I>(line: &str, comments: &[String], lines: &mut Peekable<I>) -> Option<DocItem>
where
    I: Iterator<Item = &'a str>,
{
    if line.starts_with(".PHONY") {
        return None;
    }
    let caps = RE_TARGET.captures(line)?;

    let mut recipe = Vec::new();
    while let Some(next) = lines.next_if(|l| l.starts_with('\t') || l.starts_with(' ')) {
        recipe.push(next.trim());
    }

    let echo = recipe
        .iter()
        .filter(|l| l.contains("echo"))
        .find_map(|l| RE_ECHO.captures(l))
        .map(|m| m[1].trim_end().trim_end_matches('"').to_string());

    let (first_comment, long_desc) = split_comments(comments);
    let short_desc = echo
        .or(first_comment)
        .unwrap_or_else(|| NO_TARGET_DESC.to_string());

    Some(DocItem::Target {
        name: caps[1].to_string(),
        short_desc,
        long_desc,
    })
}

/// Render items as a Markdown reference list.
pub fn to_markdown(items: &[DocItem]) -> String {
    let mut out = String::new();
    for item in items {
        match item {
            DocItem::Section { title } => {
                out.push_str(&format!("# {}\n\n", title));
            }
            DocItem::Variable {
                name,
                declaration,
                short_desc,
                long_desc,
            } => {
                out.push_str(&format!("- `{}`: {}  \n", name, short_desc));
                push_long_desc(&mut out, long_desc);
                out.push_str(&format!("  `{}`  \n\n", declaration));
            }
            DocItem::Target {
                name,
                short_desc,
                long_desc,
            } => {
                out.push_str(&format!("- `{}`: {}  \n", name, short_desc));
                push_long_desc(&mut out, long_desc);
                out.push('\n');
            }
        }
    }
    out
}

fn push_long_desc(out: &mut String, long_desc: &[String]) {
    if long_desc.iter().all(|l| l.trim().is_empty()) {
        return;
    }
    for line in long_desc {
        out.push_str(&format!("  {}  \n", line));
    }
}
