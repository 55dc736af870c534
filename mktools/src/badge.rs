//! Flat SVG badges for coverage, test results or any label/value pair.

use crate::error::{io_error, Result, ToolError};
use regex::Regex;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

static RE_COVERAGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^TOTAL\s+\d+\s+\d+\s+(\d+)%").unwrap());
// with a branch or excluded column
static RE_COVERAGE_WIDE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^TOTAL\s+\d+\s+\d+\s+\d+\s+(\d+)%").unwrap());
static RE_PYTEST_SUMMARY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)=+\s*([\d\w\s,]+(?:passed|failed|error|skipped)[^=]*)\s*=+").unwrap()
});
static RE_PASSED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)(\d+)\s*passed").unwrap());
static RE_FAILED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)(\d+)\s*failed").unwrap());
static RE_SKIPPED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+)\s*skipped").unwrap());
static RE_ERRORS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)(\d+)\s*error").unwrap());

/// Named colors, GitHub badge style.
pub const COLORS: &[(&str, &str)] = &[
    ("brightgreen", "#4c1"),
    ("green", "#97ca00"),
    ("yellowgreen", "#a4a61d"),
    ("yellow", "#dfb317"),
    ("orange", "#fe7d37"),
    ("red", "#e05d44"),
    ("blue", "#007ec6"),
    ("gray", "#555"),
    ("lightgray", "#9f9f9f"),
];

const NARROW_CHARS: &str = "iIl1|!.,;:'";
const WIDE_CHARS: &str = "mwMWOQGD%@";
const TEXT_PADDING: usize = 10;

fn preset(name: &str) -> &'static str {
    COLORS
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, hex)| *hex)
        .unwrap_or("#555")
}

/// A named preset, or a hex code with or without the leading `#`.
pub fn resolve_color(input: &str) -> String {
    if let Some((_, hex)) = COLORS.iter().find(|(name, _)| *name == input) {
        return hex.to_string();
    }
    if input.starts_with('#') {
        input.to_string()
    } else {
        format!("#{}", input)
    }
}

pub fn coverage_color(percent: f64) -> &'static str {
    if percent >= 80.0 {
        preset("brightgreen")
    } else if percent >= 60.0 {
        preset("yellowgreen")
    } else if percent >= 40.0 {
        preset("orange")
    } else {
        preset("red")
    }
}

pub fn tests_color(passed: usize, failed: usize) -> &'static str {
    if failed > 0 {
        preset("red")
    } else if passed > 0 {
        preset("brightgreen")
    } else {
        preset("gray")
    }
}

/// Approximate rendered width in pixels of `text` at 11px, with padding.
pub fn estimate_text_width(text: &str) -> usize {
    let glyphs: usize = text
        .chars()
        .map(|c| {
            if NARROW_CHARS.contains(c) {
                4
            } else if WIDE_CHARS.contains(c) {
                10
            } else if c.is_uppercase() {
                8
            } else {
                7
            }
        })
        .sum();
    glyphs + TEXT_PADDING
}

fn xml_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// A label/value pair and the color of the value side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Badge {
    pub label: String,
    pub value: String,
    pub color: String,
}

impl Badge {
    pub fn new(label: impl Into<String>, value: impl Into<String>, color: &str) -> Self {
        Badge {
            label: label.into(),
            value: value.into(),
            color: resolve_color(color),
        }
    }

    /// Badge from a coverage text report's `TOTAL` line.
    pub fn coverage(path: &Path) -> Result<Self> {
        let percent = read_coverage(path)?;
        Ok(Badge::new(
            "coverage",
            format!("{:.0}%", percent),
            coverage_color(percent),
        ))
    }

    /// Badge from captured pytest output.
    pub fn tests(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(io_error(path))?;
        let counts = TestCounts::parse(&text);
        let value = if counts.failed > 0 {
            format!("{}/{} passed", counts.passed, counts.total)
        } else {
            format!("{} passed", counts.passed)
        };
        Ok(Badge::new(
            "tests",
            value,
            tests_color(counts.passed, counts.failed),
        ))
    }

    pub fn to_svg(&self) -> String {
        let label_width = estimate_text_width(&self.label);
        let value_width = estimate_text_width(&self.value);
        let total_width = label_width + value_width;
        let label_x = label_width as f64 / 2.0;
        let value_x = label_width as f64 + value_width as f64 / 2.0;
        let label = xml_escape(&self.label);
        let value = xml_escape(&self.value);
        let color = xml_escape(&self.color);

        format!(
            r##"<?xml version="1.0" encoding="UTF-8"?>
<svg xmlns="http://www.w3.org/2000/svg" width="{total_width}" height="20">
    <linearGradient id="b" x2="0" y2="100%">
        <stop offset="0" stop-color="#bbb" stop-opacity=".1"/>
        <stop offset="1" stop-opacity=".1"/>
    </linearGradient>
    <mask id="a">
        <rect width="{total_width}" height="20" rx="3" fill="#fff"/>
    </mask>
    <g mask="url(#a)">
        <path fill="#555" d="M0 0h{label_width}v20H0z"/>
        <path fill="{color}" d="M{label_width} 0h{value_width}v20H{label_width}z"/>
        <path fill="url(#b)" d="M0 0h{total_width}v20H0z"/>
    </g>
    <g fill="#fff" text-anchor="middle" font-family="DejaVu Sans,Verdana,Geneva,sans-serif" font-size="11">
        <text x="{label_x:.1}" y="15" fill="#010101" fill-opacity=".3">{label}</text>
        <text x="{label_x:.1}" y="14">{label}</text>
        <text x="{value_x:.1}" y="15" fill="#010101" fill-opacity=".3">{value}</text>
        <text x="{value_x:.1}" y="14">{value}</text>
    </g>
</svg>
"##
        )
    }
}

/// Coverage percentage from a `coverage report` text file.
pub fn read_coverage(path: &Path) -> Result<f64> {
    let is_text = path.extension().is_some_and(|ext| ext == "txt");
    if !is_text {
        return Err(ToolError::Configuration(format!(
            "{} is not a text coverage report; run `coverage report > coverage.txt` first",
            path.display()
        )));
    }
    let text = fs::read_to_string(path).map_err(io_error(path))?;
    parse_coverage(&text).ok_or_else(|| ToolError::Parse {
        what: path.display().to_string(),
        detail: "no TOTAL coverage line".into(),
    })
}

pub fn parse_coverage(text: &str) -> Option<f64> {
    RE_COVERAGE
        .captures(text)
        .or_else(|| RE_COVERAGE_WIDE.captures(text))
        .and_then(|caps| caps[1].parse().ok())
}

/// Counts from the pytest summary line. Errors count as failures.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TestCounts {
    pub passed: usize,
    pub failed: usize,
    pub total: usize,
}

impl TestCounts {
    pub fn parse(text: &str) -> Self {
        let Some(summary) = RE_PYTEST_SUMMARY.captures(text) else {
            return TestCounts::default();
        };
        let summary = &summary[1];
        let count = |re: &Regex| {
            re.captures(summary)
                .and_then(|caps| caps[1].parse::<usize>().ok())
                .unwrap_or(0)
        };
        let passed = count(&RE_PASSED);
        let failed = count(&RE_FAILED);
        let skipped = count(&RE_SKIPPED);
        let errors = count(&RE_ERRORS);
        TestCounts {
            passed,
            failed: failed + errors,
            total: passed + failed + skipped + errors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_resolution() {
        assert_eq!(resolve_color("blue"), "#007ec6");
        assert_eq!(resolve_color("#abc"), "#abc");
        assert_eq!(resolve_color("abc"), "#abc");
    }

    #[test]
    fn coverage_thresholds() {
        assert_eq!(coverage_color(80.0), "#4c1");
        assert_eq!(coverage_color(79.9), "#a4a61d");
        assert_eq!(coverage_color(40.0), "#fe7d37");
        assert_eq!(coverage_color(12.0), "#e05d44");
    }

    #[test]
    fn text_width() {
        // 4 + 10 + 8 + 7, plus padding
        assert_eq!(estimate_text_width("imAa"), 39);
        assert_eq!(estimate_text_width(""), TEXT_PADDING);
    }

    #[test]
    fn coverage_layouts() {
        let plain = "Name    Stmts   Miss  Cover\n---\nTOTAL     120     30    75%\n";
        assert_eq!(parse_coverage(plain), Some(75.0));
        let branches = "TOTAL     120     30     12    71%\n";
        assert_eq!(parse_coverage(branches), Some(71.0));
        assert_eq!(parse_coverage("nothing here"), None);
    }

    #[test]
    fn pytest_summaries() {
        let ok = "....\n===== 42 passed in 1.23s =====\n";
        assert_eq!(
            TestCounts::parse(ok),
            TestCounts { passed: 42, failed: 0, total: 42 }
        );
        let mixed = "==== 40 passed, 2 failed, 1 skipped, 1 error in 3.0s ====";
        assert_eq!(
            TestCounts::parse(mixed),
            TestCounts { passed: 40, failed: 3, total: 44 }
        );
        assert_eq!(TestCounts::parse("no summary"), TestCounts::default());
        assert_eq!(tests_color(0, 0), "#555");
    }

    #[test]
    fn svg_escapes_text() {
        let svg = Badge::new("a<b", "R&D", "green").to_svg();
        assert!(svg.contains(">a&lt;b</text>"));
        assert!(svg.contains(">R&amp;D</text>"));
        assert!(svg.contains("fill=\"#97ca00\""));
        assert!(svg.starts_with("<?xml"));
    }

    #[test]
    fn database_coverage_rejected() {
        let err = read_coverage(Path::new(".coverage")).unwrap_err();
        assert!(matches!(err, ToolError::Configuration(_)));
    }
}
