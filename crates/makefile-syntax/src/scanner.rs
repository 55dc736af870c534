//! Makefile scanner: builds the target index, the variable index and the
//! set of names declared `.PHONY`.
//!
//! Every scan skips `define ... endef` blocks: embedded scripts routinely
//! contain lines shaped like `name:` or `NAME = value` that are not part of
//! the Makefile's own namespace.

use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

// -- Regex patterns -----------------------------------------------------------

static RE_TARGET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([a-zA-Z0-9_-]+)[ \t]*:").unwrap());

// Leading whitespace is allowed so assignments nested in ifeq/endif blocks
// are still found.
pub(crate) static RE_VARIABLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([A-Z_][A-Z0-9_]*)\s*(\?=|:=|\+=|=)\s*(.*)$").unwrap()
});

static RE_PHONY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\.PHONY:\s+(.+)$").unwrap());

// -- Index --------------------------------------------------------------------

/// Insertion-ordered mapping from a name to the line index it is defined on.
///
/// Iteration follows the order in which names first appeared in the file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Index {
    entries: Vec<(String, usize)>,
    positions: HashMap<String, usize>,
}

impl Index {
    /// Record `name` at `line`; a later definition replaces the line index
    /// but keeps the original position.
    fn insert_last_wins(&mut self, name: &str, line: usize) {
        match self.positions.get(name) {
            Some(&pos) => self.entries[pos].1 = line,
            None => self.push(name, line),
        }
    }

    /// Record `name` at `line` unless it is already present.
    fn insert_first_wins(&mut self, name: &str, line: usize) {
        if !self.positions.contains_key(name) {
            self.push(name, line);
        }
    }

    fn push(&mut self, name: &str, line: usize) {
        self.positions.insert(name.to_string(), self.entries.len());
        self.entries.push((name.to_string(), line));
    }

    pub fn get(&self, name: &str) -> Option<usize> {
        self.positions.get(name).map(|&pos| self.entries[pos].1)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.positions.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.entries.iter().map(|(name, line)| (name.as_str(), *line))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// -- Makefile -----------------------------------------------------------------

/// A scanned Makefile: the raw line buffer plus the indices built from it.
///
/// The line buffer is never modified after [`Makefile::parse`]; all
/// descriptions are derived from it on demand.
#[derive(Debug, Clone)]
pub struct Makefile {
    lines: Vec<String>,
    targets: Index,
    variables: Index,
    phony: HashSet<String>,
}

impl Makefile {
    /// Split `text` into lines and build every index in one pass each.
    pub fn parse(text: &str) -> Self {
        let lines: Vec<String> = text.lines().map(str::to_string).collect();
        let targets = index_targets(&lines);
        let variables = index_variables(&lines);
        let phony = declared_phony(&lines);
        log::debug!(
            "scanned {} lines: {} targets, {} variables, {} phony names",
            lines.len(),
            targets.len(),
            variables.len(),
            phony.len()
        );
        Makefile {
            lines,
            targets,
            variables,
            phony,
        }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn line(&self, idx: usize) -> Option<&str> {
        self.lines.get(idx).map(String::as_str)
    }

    /// Every target definition, phony or not.
    pub fn targets(&self) -> &Index {
        &self.targets
    }

    pub fn variables(&self) -> &Index {
        &self.variables
    }

    /// Line index of the definition of `name` (exact, case-sensitive).
    pub fn find_target(&self, name: &str) -> Option<usize> {
        self.targets.get(name)
    }

    /// Line index of the first assignment to `name` (exact).
    pub fn find_variable(&self, name: &str) -> Option<usize> {
        self.variables.get(name)
    }

    /// First variable, in file order, whose name equals `name` ignoring case.
    pub fn find_variable_ignore_case(&self, name: &str) -> Option<(&str, usize)> {
        let wanted = name.to_uppercase();
        self.variables
            .iter()
            .find(|(var, _)| var.to_uppercase() == wanted)
    }

    pub fn is_phony(&self, name: &str) -> bool {
        self.phony.contains(name)
    }

    /// Targets that are both defined and declared `.PHONY`, in file order.
    ///
    /// A name listed in `.PHONY` without a definition is not included, and
    /// a defined target missing from `.PHONY` is only reachable by exact
    /// name.
    pub fn phony_targets(&self) -> Vec<&str> {
        self.targets
            .names()
            .filter(|name| self.phony.contains(*name))
            .collect()
    }
}

// -- Scans --------------------------------------------------------------------

/// Lines eligible for indexing, paired with their index.
fn scannable_lines(lines: &[String]) -> impl Iterator<Item = (usize, &str)> {
    let mut in_define = false;
    lines.iter().enumerate().filter_map(move |(i, line)| {
        if line.starts_with("define ") {
            in_define = true;
            return None;
        }
        if line.starts_with("endef") {
            in_define = false;
            return None;
        }
        if in_define {
            None
        } else {
            Some((i, line.as_str()))
        }
    })
}

/// Index every rule definition line `name: deps...`.
pub fn index_targets(lines: &[String]) -> Index {
    let mut index = Index::default();
    for (i, line) in scannable_lines(lines) {
        let Some(caps) = RE_TARGET.captures(line) else {
            continue;
        };
        // `NAME := value` is an assignment, not a rule
        let colon_end = caps.get(0).map_or(0, |m| m.end());
        if line[colon_end..].starts_with('=') {
            continue;
        }
        index.insert_last_wins(&caps[1], i);
    }
    index
}

/// Index the first assignment of every upper-case variable.
pub fn index_variables(lines: &[String]) -> Index {
    let mut index = Index::default();
    for (i, line) in scannable_lines(lines) {
        if let Some(caps) = RE_VARIABLE.captures(line) {
            index.insert_first_wins(&caps[1], i);
        }
    }
    index
}

/// Union of the names listed on every `.PHONY:` line.
pub fn declared_phony(lines: &[String]) -> HashSet<String> {
    lines
        .iter()
        .filter_map(|line| RE_PHONY.captures(line))
        .flat_map(|caps| {
            caps[1]
                .split_whitespace()
                .map(str::to_string)
                .collect::<Vec<_>>()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(text: &str) -> Vec<String> {
        text.lines().map(str::to_string).collect()
    }

    #[test]
    fn targets_indexed_by_line() {
        let idx = index_targets(&lines("all: build\n\nbuild:\n\tcc main.c\nclean :\n"));
        assert_eq!(idx.get("all"), Some(0));
        assert_eq!(idx.get("build"), Some(2));
        assert_eq!(idx.get("clean"), Some(4));
        assert_eq!(idx.len(), 3);
    }

    #[test]
    fn define_block_is_opaque() {
        let text = "define SCRIPT\nfake-target: x\nFAKE_VAR := 1\nendef\nreal: \nREAL = 2\n";
        let mf = Makefile::parse(text);
        assert!(mf.find_target("fake-target").is_none());
        assert!(mf.find_variable("FAKE_VAR").is_none());
        assert_eq!(mf.find_target("real"), Some(4));
        assert_eq!(mf.find_variable("REAL"), Some(5));
    }

    #[test]
    fn recipe_lines_never_match_as_targets() {
        let idx = index_targets(&lines("build:\n\tinner: thing\n    other: thing\n"));
        assert_eq!(idx.names().collect::<Vec<_>>(), vec!["build"]);
    }

    #[test]
    fn later_target_definition_wins_but_keeps_order() {
        let idx = index_targets(&lines("a:\nb:\na: extra\n"));
        assert_eq!(idx.get("a"), Some(2));
        assert_eq!(idx.names().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn simple_expanded_assignment_is_not_a_target() {
        let idx = index_targets(&lines("PYTHON := python3\nFOO:=bar\nbuild:\n"));
        assert_eq!(idx.names().collect::<Vec<_>>(), vec!["build"]);
    }

    #[test]
    fn variables_first_assignment_wins() {
        let idx = index_variables(&lines("X = 1\nX := 2\n_Y ?= 3\nlower = 4\n"));
        assert_eq!(idx.get("X"), Some(0));
        assert_eq!(idx.get("_Y"), Some(2));
        assert!(!idx.contains("lower"));
    }

    #[test]
    fn indented_variables_inside_conditionals() {
        let idx = index_variables(&lines("ifeq ($(OS),Windows_NT)\n    EXT := .exe\nendif\n"));
        assert_eq!(idx.get("EXT"), Some(1));
    }

    #[test]
    fn phony_targets_intersect_definitions() {
        let mf = Makefile::parse(".PHONY: a b c\na:\nb:\nd:\n");
        assert_eq!(mf.phony_targets(), vec!["a", "b"]);
        assert!(mf.is_phony("c"));
        assert_eq!(mf.find_target("d"), Some(3));
    }

    #[test]
    fn multiple_phony_lines_are_unioned() {
        let set = declared_phony(&lines(".PHONY: a\nx:\n.PHONY: b  c\n.PHONY:\n"));
        assert_eq!(set.len(), 3);
        assert!(set.contains("a") && set.contains("b") && set.contains("c"));
    }

    #[test]
    fn rescanning_is_deterministic() {
        let text = ".PHONY: a b\nA = 1\na: b\nb:\nB ?= 2\n";
        let first = Makefile::parse(text);
        let second = Makefile::parse(text);
        assert_eq!(first.targets(), second.targets());
        assert_eq!(first.variables(), second.variables());
        assert_eq!(first.phony_targets(), second.phony_targets());
    }

    #[test]
    fn variable_lookup_ignores_case() {
        let mf = Makefile::parse("PACKAGE_NAME := demo\n");
        assert_eq!(
            mf.find_variable_ignore_case("package_name"),
            Some(("PACKAGE_NAME", 0))
        );
        assert_eq!(mf.find_variable("package_name"), None);
    }
}
