//! Build [`Recipe`] and [`Variable`] records from a scanned [`Makefile`].

use crate::error::SyntaxError;
use crate::model::{AssignOp, Recipe, Variable};
use crate::scanner::{Makefile, RE_VARIABLE};
use regex::Regex;
use std::sync::LazyLock;

static RE_ECHO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^@?echo[ \t]+(.*)").unwrap());

/// Collect the comment block attached to the definition on line `idx`.
///
/// Walks upward from the line above: comment lines are collected, a single
/// blank line is tolerated, `.PHONY:` lines are stepped over, and anything
/// else (or a second consecutive blank) ends the block.
pub fn comment_block(lines: &[String], idx: usize) -> Vec<String> {
    let mut comments = Vec::new();
    let mut blank_count = 0;

    for line in lines[..idx.min(lines.len())].iter().rev() {
        let stripped = line.trim_start();
        if let Some(body) = stripped.strip_prefix('#') {
            comments.push(body.strip_prefix(' ').unwrap_or(body).to_string());
            blank_count = 0;
        } else if stripped.is_empty() {
            blank_count += 1;
            if blank_count >= 2 {
                break;
            }
        } else if stripped.starts_with(".PHONY:") {
            blank_count = 0;
        } else {
            break;
        }
    }

    comments.reverse();
    comments
}

fn is_recipe_line(line: &str) -> bool {
    line.starts_with('\t') || line.starts_with("    ")
}

/// Remove one layer of matching single or double quotes.
fn unquote(content: &str) -> &str {
    let wrapped = content.len() >= 2
        && ((content.starts_with('"') && content.ends_with('"'))
            || (content.starts_with('\'') && content.ends_with('\'')));
    if wrapped {
        &content[1..content.len() - 1]
    } else {
        content
    }
}

/// First `echo` message in the recipe body following line `idx`.
fn echo_message(lines: &[String], idx: usize) -> String {
    lines
        .iter()
        .skip(idx + 1)
        .take_while(|line| is_recipe_line(line))
        .find_map(|line| {
            RE_ECHO
                .captures(line.trim_start())
                .map(|caps| unquote(caps[1].trim()).to_string())
        })
        .unwrap_or_default()
}

impl Recipe {
    /// Describe the target `target` (exact name).
    pub fn describe(mf: &Makefile, target: &str) -> Result<Recipe, SyntaxError> {
        let idx = mf
            .find_target(target)
            .ok_or_else(|| SyntaxError::TargetNotFound(target.to_string()))?;
        let lines = mf.lines();
        let line = &lines[idx];

        let dependencies = line
            .split_once(':')
            .map(|(_, deps)| deps.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default();

        Ok(Recipe {
            target: target.to_string(),
            comments: comment_block(lines, idx),
            dependencies,
            echo_message: echo_message(lines, idx),
        })
    }
}

impl Variable {
    /// Describe the variable `name` (exact indexed name).
    pub fn describe(mf: &Makefile, name: &str) -> Result<Variable, SyntaxError> {
        let idx = mf
            .find_variable(name)
            .ok_or_else(|| SyntaxError::VariableNotFound(name.to_string()))?;
        let lines = mf.lines();
        let line = &lines[idx];

        let parse_error = || SyntaxError::Parse {
            line: idx + 1,
            text: line.clone(),
        };
        let caps = RE_VARIABLE.captures(line).ok_or_else(parse_error)?;
        let operator = AssignOp::from_symbol(&caps[2]).ok_or_else(parse_error)?;

        Ok(Variable {
            name: caps[1].to_string(),
            operator,
            raw_value: caps[3].to_string(),
            comments: comment_block(lines, idx),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(text: &str) -> Vec<String> {
        text.lines().map(str::to_string).collect()
    }

    #[test]
    fn single_blank_line_does_not_break_attribution() {
        let ls = lines("unrelated: x\n\n# first\n# second\n\ntarget:\n");
        assert_eq!(comment_block(&ls, 5), vec!["first", "second"]);
    }

    #[test]
    fn two_blank_lines_end_the_block() {
        let ls = lines("# far away\n\n\ntarget:\n");
        assert!(comment_block(&ls, 3).is_empty());
    }

    #[test]
    fn phony_lines_are_stepped_over() {
        let ls = lines("# builds it\n.PHONY: build\nbuild:\n");
        assert_eq!(comment_block(&ls, 2), vec!["builds it"]);
    }

    #[test]
    fn non_comment_line_stops_the_walk() {
        let ls = lines("# belongs to a\na:\n\techo a\nb:\n");
        assert!(comment_block(&ls, 3).is_empty());
    }

    #[test]
    fn only_one_space_after_hash_is_removed() {
        let ls = lines("#   indented\n#tight\n  # leading\nx:\n");
        assert_eq!(comment_block(&ls, 3), vec!["  indented", "tight", "leading"]);
    }

    #[test]
    fn comment_block_at_top_of_file() {
        assert!(comment_block(&lines("x:\n"), 0).is_empty());
    }

    #[test]
    fn echo_message_quotes_stripped() {
        let mf = Makefile::parse("build:\n\t@echo \"Building now\"\n\tcc main.c\n");
        let recipe = Recipe::describe(&mf, "build").unwrap();
        assert_eq!(recipe.echo_message, "Building now");
    }

    #[test]
    fn echo_message_single_quotes_and_spaces() {
        let mf = Makefile::parse("test:\n    echo 'run the tests'\n");
        let recipe = Recipe::describe(&mf, "test").unwrap();
        assert_eq!(recipe.echo_message, "run the tests");
    }

    #[test]
    fn echo_message_unbalanced_quotes_kept() {
        let mf = Makefile::parse("a:\n\t@echo \"half\n");
        assert_eq!(Recipe::describe(&mf, "a").unwrap().echo_message, "\"half");
    }

    #[test]
    fn echo_search_stops_at_end_of_recipe_body() {
        let mf = Makefile::parse("a:\n\tcc x.c\nb:\n\t@echo from b\n");
        assert_eq!(Recipe::describe(&mf, "a").unwrap().echo_message, "");
        assert_eq!(Recipe::describe(&mf, "b").unwrap().echo_message, "from b");
    }

    #[test]
    fn dependencies_split_on_whitespace() {
        let mf = Makefile::parse("all: build  test\tdocs\nnone:\n");
        let all = Recipe::describe(&mf, "all").unwrap();
        assert_eq!(all.dependencies, vec!["build", "test", "docs"]);
        assert!(Recipe::describe(&mf, "none").unwrap().dependencies.is_empty());
    }

    #[test]
    fn bare_target_has_empty_record() {
        let mf = Makefile::parse("lonely:\n");
        let recipe = Recipe::describe(&mf, "lonely").unwrap();
        assert_eq!(
            recipe,
            Recipe {
                target: "lonely".into(),
                ..Recipe::default()
            }
        );
    }

    #[test]
    fn missing_target_is_an_error() {
        let mf = Makefile::parse("a:\n");
        assert_eq!(
            Recipe::describe(&mf, "b"),
            Err(SyntaxError::TargetNotFound("b".into()))
        );
    }

    #[test]
    fn variable_operators_and_raw_values() {
        let text = "A = $(B) x\nB := $(shell git describe)\nC ?= default\nD += more stuff\n";
        let mf = Makefile::parse(text);
        let cases = [
            ("A", AssignOp::Recursive, "$(B) x"),
            ("B", AssignOp::Simple, "$(shell git describe)"),
            ("C", AssignOp::Conditional, "default"),
            ("D", AssignOp::Append, "more stuff"),
        ];
        for (name, op, raw) in cases {
            let var = Variable::describe(&mf, name).unwrap();
            assert_eq!(var.operator, op, "{name}");
            assert_eq!(var.raw_value, raw, "{name}");
        }
    }

    #[test]
    fn variable_comments_use_the_shared_walk() {
        let mf = Makefile::parse("# python to use\n\n# really\nPYTHON ?= python3\n");
        let var = Variable::describe(&mf, "PYTHON").unwrap();
        assert_eq!(var.comments, vec!["python to use", "really"]);
    }

    #[test]
    fn missing_variable_is_an_error() {
        let mf = Makefile::parse("A = 1\n");
        assert_eq!(
            Variable::describe(&mf, "B"),
            Err(SyntaxError::VariableNotFound("B".into()))
        );
    }
}
