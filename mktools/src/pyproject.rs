//! `pyproject.toml` access: loading, dotted-path lookup, project version.

use crate::error::{io_error, Result, ToolError};
use std::fs;
use std::path::Path;
use toml::{Table, Value};

/// Read and parse a TOML file.
pub fn load(path: &Path) -> Result<Table> {
    let raw = fs::read_to_string(path).map_err(io_error(path))?;
    Ok(raw.parse::<Table>()?)
}

/// Look up a dotted path such as `tool.makefile.docs`.
///
/// Returns `None` as soon as a segment is missing or a non-table value is
/// reached before the last segment.
pub fn deep_get<'a>(table: &'a Table, path: &str) -> Option<&'a Value> {
    let mut keys = path.split('.');
    let first = table.get(keys.next()?)?;
    keys.try_fold(first, |value, key| value.get(key))
}

/// Names of the keys of the table at `path`, in file order. Empty when the
/// path is absent or not a table.
pub fn table_keys(table: &Table, path: &str) -> Vec<String> {
    deep_get(table, path)
        .and_then(Value::as_table)
        .map(|t| t.keys().cloned().collect())
        .unwrap_or_default()
}

/// Strings of the array at `path`; non-string entries are skipped.
pub fn string_list(table: &Table, path: &str) -> Vec<String> {
    deep_get(table, path)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// `project.version`, required.
pub fn project_version(table: &Table) -> Result<String> {
    deep_get(table, "project.version")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| ToolError::Configuration("missing string key project.version".into()))
}

/// `v{project.version}` read from the file at `path`.
pub fn read_version(path: &Path) -> Result<String> {
    let table = load(path)?;
    Ok(format!("v{}", project_version(&table)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(text: &str) -> Table {
        text.parse::<Table>().unwrap()
    }

    #[test]
    fn deep_get_walks_tables() {
        let t = table("[tool.makefile.docs]\noutput_dir = \"site\"\n");
        let value = deep_get(&t, "tool.makefile.docs.output_dir");
        assert_eq!(value.and_then(Value::as_str), Some("site"));
    }

    #[test]
    fn deep_get_missing_segment() {
        let t = table("[tool]\nx = 1\n");
        assert!(deep_get(&t, "tool.makefile.docs").is_none());
        assert!(deep_get(&t, "tool.x.y").is_none());
    }

    #[test]
    fn version_found() {
        let t = table("[project]\nname = \"demo\"\nversion = \"1.2.3\"\n");
        assert_eq!(project_version(&t).unwrap(), "1.2.3");
    }

    #[test]
    fn version_missing_is_configuration_error() {
        let t = table("[project]\nname = \"demo\"\n");
        assert!(matches!(
            project_version(&t),
            Err(ToolError::Configuration(_))
        ));
    }

    #[test]
    fn table_keys_in_order() {
        let t = table("[dependency-groups]\ndev = []\nlint = []\ndocs = []\n");
        assert_eq!(table_keys(&t, "dependency-groups"), vec!["dev", "lint", "docs"]);
        assert!(table_keys(&t, "project.optional-dependencies").is_empty());
    }
}
