//! Generate `uv export` commands from `[tool.makefile.uv-exports]`.
//!
//! The commands are printed, not run; the Makefile executes them.

use crate::pyproject::{deep_get, string_list, table_keys};
use std::path::Path;
use toml::{Table, Value};

pub const TOOL_PATH: &str = "tool.makefile.uv-exports";

/// Which dependency groups or extras an export selects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    All,
    Named(Vec<String>),
}

impl Selection {
    fn from_value(value: &Value) -> Option<Selection> {
        match value {
            Value::Boolean(true) => Some(Selection::All),
            Value::Boolean(false) => Some(Selection::Named(Vec::new())),
            Value::Array(items) => Some(Selection::Named(
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect(),
            )),
            _ => None,
        }
    }

    fn resolve<'a>(&'a self, available: &'a [String]) -> &'a [String] {
        match self {
            Selection::All => available,
            Selection::Named(names) => names,
        }
    }
}

/// One entry of `exports = [...]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSpec {
    pub name: String,
    pub filename: String,
    /// `None` leaves groups to uv's defaults
    pub groups: Option<Selection>,
    pub extras: Selection,
    pub options: Vec<String>,
}

impl ExportSpec {
    /// Parse an export table; `None` (with a warning) when it is unusable.
    fn from_table(export: &Table) -> Option<ExportSpec> {
        let name = export.get("name").and_then(Value::as_str).unwrap_or("");
        if name.is_empty() || !name.chars().all(char::is_alphanumeric) {
            log::warn!("Export configuration missing valid 'name' field {}", export);
            return None;
        }

        let filename = export
            .get("filename")
            .and_then(Value::as_str)
            .filter(|f| !f.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("requirements-{}.txt", name));

        let groups = match export.get("groups") {
            None => None,
            Some(value) => match Selection::from_value(value) {
                Some(sel) => Some(sel),
                None => {
                    log::warn!("export '{}': 'groups' must be a bool or a list", name);
                    return None;
                }
            },
        };
        let extras = match export.get("extras") {
            None => Selection::Named(Vec::new()),
            Some(value) => match Selection::from_value(value) {
                Some(sel) => sel,
                None => {
                    log::warn!("export '{}': 'extras' must be a bool or a list", name);
                    return None;
                }
            },
        };
        let options = export
            .get("options")
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(Value::as_str).map(str::to_string).collect())
            .unwrap_or_default();

        Some(ExportSpec {
            name: name.to_string(),
            filename,
            groups,
            extras,
            options,
        })
    }

    fn default_all() -> ExportSpec {
        ExportSpec {
            name: "all".into(),
            filename: "requirements-all.txt".into(),
            groups: Some(Selection::Named(Vec::new())),
            extras: Selection::Named(Vec::new()),
            options: Vec::new(),
        }
    }
}

/// Everything needed to turn export specs into commands.
#[derive(Debug, Clone, Default)]
pub struct ExportContext {
    pub all_groups: Vec<String>,
    pub all_extras: Vec<String>,
    /// Arguments placed right after `uv export` for every export
    pub args: Vec<String>,
}

impl ExportContext {
    pub fn from_pyproject(pyproject: &Table) -> Self {
        ExportContext {
            all_groups: table_keys(pyproject, "dependency-groups"),
            all_extras: table_keys(pyproject, "project.optional-dependencies"),
            args: string_list(pyproject, &format!("{}.args", TOOL_PATH)),
        }
    }

    /// Shell command exporting `spec` into `output_dir`.
    pub fn command(&self, spec: &ExportSpec, output_dir: &Path) -> String {
        let mut cmd: Vec<String> = vec!["uv".into(), "export".into()];
        cmd.extend(self.args.iter().cloned());

        if let Some(groups) = &spec.groups {
            let selected = groups.resolve(&self.all_groups);
            for group in &self.all_groups {
                let flag = if selected.contains(group) { "--group" } else { "--no-group" };
                cmd.push(flag.into());
                cmd.push(group.clone());
            }
        }

        for extra in spec.extras.resolve(&self.all_extras) {
            cmd.push("--extra".into());
            cmd.push(extra.clone());
        }

        cmd.extend(spec.options.iter().cloned());

        let output_path = output_dir.join(&spec.filename);
        format!("{} > {}", cmd.join(" "), output_path.display())
    }
}

/// Configured export specs, or the single default `all` export.
pub fn export_specs(pyproject: &Table) -> Vec<ExportSpec> {
    let configured: Vec<&Table> = deep_get(pyproject, &format!("{}.exports", TOOL_PATH))
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(Value::as_table).collect())
        .unwrap_or_default();

    if configured.is_empty() {
        return vec![ExportSpec::default_all()];
    }
    configured.into_iter().filter_map(ExportSpec::from_table).collect()
}

/// One command line per valid export.
pub fn export_commands(pyproject: &Table, output_dir: &Path) -> Vec<String> {
    let ctx = ExportContext::from_pyproject(pyproject);
    export_specs(pyproject)
        .iter()
        .map(|spec| ctx.command(spec, output_dir))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PYPROJECT: &str = r#"
[project]
name = "demo"
version = "0.1.0"

[project.optional-dependencies]
cli = ["click"]
gpu = ["torch"]

[dependency-groups]
dev = ["pytest"]
lint = ["ruff"]

[tool.makefile.uv-exports]
args = ["--no-hashes"]
exports = [
    { name = "base", groups = false },
    { name = "dev", groups = ["dev"], extras = true, filename = "req-dev.txt" },
    { name = "bad-name" },
    { name = "opts", options = ["--frozen"] },
]
"#;

    fn commands() -> Vec<String> {
        let table = PYPROJECT.parse::<Table>().unwrap();
        export_commands(&table, Path::new("out"))
    }

    #[test]
    fn groups_false_disables_every_group() {
        assert_eq!(
            commands()[0],
            "uv export --no-hashes --no-group dev --no-group lint > out/requirements-base.txt"
        );
    }

    #[test]
    fn named_groups_and_all_extras() {
        assert_eq!(
            commands()[1],
            "uv export --no-hashes --group dev --no-group lint --extra cli --extra gpu > out/req-dev.txt"
        );
    }

    #[test]
    fn invalid_names_are_skipped() {
        let cmds = commands();
        assert_eq!(cmds.len(), 3);
        assert!(cmds.iter().all(|c| !c.contains("bad-name")));
    }

    #[test]
    fn absent_groups_emit_no_group_flags() {
        assert_eq!(
            commands()[2],
            "uv export --no-hashes --frozen > out/requirements-opts.txt"
        );
    }

    #[test]
    fn default_export_when_unconfigured() {
        let table = "[dependency-groups]\ndev = []\n".parse::<Table>().unwrap();
        assert_eq!(
            export_commands(&table, Path::new("reqs")),
            vec!["uv export --no-group dev > reqs/requirements-all.txt"]
        );
    }
}
