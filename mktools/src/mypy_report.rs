//! Summarize mypy output as per-file error counts.

use crate::error::Result;
use regex::Regex;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::LazyLock;

static RE_ERROR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?P<file>[^:]+):\d+:\s+error:").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportMode {
    /// One JSON object per file
    Jsonl,
    /// Quoted file names, ready to paste into a TOML exclude list
    Toml,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileErrors {
    pub filename: String,
    pub errors: usize,
}

/// Count `error:` lines per file, sorted by ascending count. Files with equal
/// counts keep the order in which they first appeared.
pub fn parse_mypy_output<'a>(lines: impl IntoIterator<Item = &'a str>) -> Vec<FileErrors> {
    let mut counts: Vec<FileErrors> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for line in lines {
        let Some(caps) = RE_ERROR.captures(line) else {
            continue;
        };
        let file = caps["file"].replace('\\', "/");
        match positions.get(&file) {
            Some(&pos) => counts[pos].errors += 1,
            None => {
                positions.insert(file.clone(), counts.len());
                counts.push(FileErrors {
                    filename: file,
                    errors: 1,
                });
            }
        }
    }

    counts.sort_by_key(|entry| entry.errors);
    counts
}

/// Render the report, ending with a total line.
pub fn render_report(counts: &[FileErrors], mode: ReportMode) -> Result<String> {
    if counts.is_empty() {
        return Ok("# no errors found!\n".to_string());
    }

    let mut out = String::new();
    for entry in counts {
        match mode {
            ReportMode::Jsonl => out.push_str(&serde_json::to_string(entry)?),
            ReportMode::Toml => {
                out.push_str(&format!("\"{}\", # {}", entry.filename, entry.errors))
            }
        }
        out.push('\n');
    }
    let total: usize = counts.iter().map(|e| e.errors).sum();
    out.push_str(&format!("# total errors: {}\n", total));
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const OUTPUT: &str = "\
src/a.py:3: error: Incompatible types  [assignment]
src/b.py:10: error: Name \"x\" is not defined  [name-defined]
src/a.py:7: error: Missing return statement  [return]
src/a.py:9: note: See https://mypy.rtfd.io
src\\c.py:1: error: Bad  [misc]
Found 4 errors in 3 files (checked 12 source files)
";

    #[test]
    fn counts_sorted_ascending() {
        let counts = parse_mypy_output(OUTPUT.lines());
        let pairs: Vec<(&str, usize)> = counts
            .iter()
            .map(|e| (e.filename.as_str(), e.errors))
            .collect();
        assert_eq!(pairs, vec![("src/b.py", 1), ("src/c.py", 1), ("src/a.py", 2)]);
    }

    #[test]
    fn jsonl_report() {
        let counts = parse_mypy_output(OUTPUT.lines());
        let report = render_report(&counts, ReportMode::Jsonl).unwrap();
        let lines: Vec<&str> = report.lines().collect();
        assert_eq!(lines[0], r#"{"filename":"src/b.py","errors":1}"#);
        assert_eq!(lines.last(), Some(&"# total errors: 4"));
    }

    #[test]
    fn toml_report() {
        let counts = parse_mypy_output(OUTPUT.lines());
        let report = render_report(&counts, ReportMode::Toml).unwrap();
        assert!(report.contains("\"src/a.py\", # 2\n"));
    }

    #[test]
    fn clean_run() {
        let counts = parse_mypy_output("Success: no issues found in 3 source files".lines());
        assert_eq!(
            render_report(&counts, ReportMode::Jsonl).unwrap(),
            "# no errors found!\n"
        );
    }
}
