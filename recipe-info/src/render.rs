//! Text rendering of recipe and variable descriptions, with optional ANSI
//! colors.

use colored::{ColoredString, Colorize};
use makefile_syntax::{Recipe, Resolved, Variable};

/// Width of the dash rule between the target group and the variable group.
pub const RULE_WIDTH: usize = 40;

/// Appended to every variable: raw values may hold unexpanded references.
pub const VARIABLE_HINT: &str = "(run 'make info-long' for computed values)";

/// Color roles used by the renderer. Whether escape codes are emitted is
/// decided once, globally, through `colored::control::set_override`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Palette;

impl Palette {
    fn paint(&self, text: &str, style: impl FnOnce(&str) -> ColoredString) -> String {
        style(text).to_string()
    }

    pub fn target(&self, text: &str) -> String {
        self.paint(text, |t| t.bold().blue())
    }

    pub fn variable(&self, text: &str) -> String {
        self.paint(text, |t| t.bold().cyan())
    }

    pub fn value(&self, text: &str) -> String {
        self.paint(text, |t| t.yellow())
    }

    pub fn dependency(&self, text: &str) -> String {
        self.paint(text, |t| t.magenta())
    }

    pub fn comment(&self, text: &str) -> String {
        self.paint(text, |t| t.green())
    }

    pub fn label(&self, text: &str) -> String {
        self.paint(text, |t| t.red())
    }

    pub fn punct(&self, text: &str) -> String {
        self.paint(text, |t| t.white())
    }

    pub fn suggestion(&self, text: &str) -> String {
        self.paint(text, |t| t.blue())
    }
}

fn push_comments(out: &mut Vec<String>, comments: &[String], p: Palette) {
    if comments.is_empty() {
        return;
    }
    out.push(format!("  {}", p.label("comments:")));
    out.extend(comments.iter().map(|line| format!("    {}", p.comment(line))));
}

/// Lines describing one recipe. Only the header is mandatory.
pub fn describe_recipe(recipe: &Recipe, p: Palette) -> Vec<String> {
    let mut out = vec![format!("{}{}", p.target(&recipe.target), p.punct(":"))];

    if !recipe.echo_message.is_empty() {
        out.push(format!("  {}", p.value(&recipe.echo_message)));
    }

    if !recipe.dependencies.is_empty() {
        let deps: Vec<String> = recipe.dependencies.iter().map(|d| p.dependency(d)).collect();
        out.push(format!("  {} {}", p.label("depends-on:"), deps.join(" ")));
    }

    push_comments(&mut out, &recipe.comments, p);
    out
}

/// Lines describing one variable, ending with the computed-value hint.
pub fn describe_variable(var: &Variable, p: Palette) -> Vec<String> {
    let mut out = vec![
        format!("{} {}", p.variable(&var.name), p.punct(var.operator.symbol())),
        format!("  {}", p.value(&var.raw_value)),
    ];
    push_comments(&mut out, &var.comments, p);
    out.push(format!("  {}", p.punct(VARIABLE_HINT)));
    out
}

/// Render all targets, then a dash rule if both kinds are present, then all
/// variables.
pub fn render(resolved: &Resolved, p: Palette) -> String {
    let mut lines: Vec<String> = Vec::new();
    for recipe in &resolved.recipes {
        lines.extend(describe_recipe(recipe, p));
    }
    if !resolved.recipes.is_empty() && !resolved.variables.is_empty() {
        lines.push("-".repeat(RULE_WIDTH));
    }
    for var in &resolved.variables {
        lines.extend(describe_variable(var, p));
    }
    lines.join("\n")
}
