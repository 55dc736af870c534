use super::config::TodoConfig;
use super::item::{TodoItem, TodoRecord};
use crate::error::Result;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use tera::{Context, Tera, Value};

/// Tag, then file, both sorted; items within a file sorted by line.
pub type Grouped<'a> = BTreeMap<&'a str, BTreeMap<&'a str, Vec<&'a TodoItem>>>;

pub const HTML_DATA_PLACEHOLDER: &str = "//{{DATA}}//";

const MARKDOWN_TEMPLATE_NAME: &str = "todo-inline.md";

pub fn group_by_tag_and_file(items: &[TodoItem]) -> Grouped<'_> {
    let mut grouped: Grouped = BTreeMap::new();
    for item in items {
        grouped
            .entry(item.tag.as_str())
            .or_default()
            .entry(item.file.as_str())
            .or_default()
            .push(item);
    }
    for files in grouped.values_mut() {
        for list in files.values_mut() {
            list.sort_by_key(|item| item.line_num);
        }
    }
    grouped
}

pub fn to_jsonl(items: &[TodoItem], cfg: &TodoConfig) -> Result<String> {
    let mut out = String::new();
    for item in items {
        out.push_str(&serde_json::to_string(&item.record(cfg))?);
        out.push('\n');
    }
    Ok(out)
}

/// Fill the HTML template's data placeholder with every item as a JSON array.
pub fn to_html(template: &str, items: &[TodoItem], cfg: &TodoConfig) -> Result<String> {
    let records: Vec<_> = items.iter().map(|item| item.record(cfg)).collect();
    Ok(template.replace(HTML_DATA_PLACEHOLDER, &serde_json::to_string(&records)?))
}

/// The Markdown report: `cfg.template_md` when set, else the built-in layout.
pub fn to_markdown(items: &[TodoItem], cfg: &TodoConfig) -> Result<String> {
    match &cfg.template_md {
        Some(template) => render_markdown_template(template, items, cfg),
        None => Ok(default_markdown(items, cfg)),
    }
}

/// One item as seen by a Markdown template.
#[derive(Serialize)]
struct TemplateItem<'a> {
    #[serde(flatten)]
    record: TodoRecord<'a>,
    context_indented: String,
}

fn render_markdown_template(
    template: &str,
    items: &[TodoItem],
    cfg: &TodoConfig,
) -> Result<String> {
    type TemplateGrouped<'a> = BTreeMap<&'a str, BTreeMap<&'a str, Vec<TemplateItem<'a>>>>;
    let grouped: TemplateGrouped = group_by_tag_and_file(items)
        .into_iter()
        .map(|(tag, files)| {
            let files = files
                .into_iter()
                .map(|(file, list)| {
                    let list = list
                        .into_iter()
                        .map(|item| TemplateItem {
                            record: item.record(cfg),
                            context_indented: item.context_indented(),
                        })
                        .collect();
                    (file, list)
                })
                .collect();
            (tag, files)
        })
        .collect();

    let mut tera = Tera::default();
    tera.register_filter("dictsort", dictsort);
    tera.add_raw_template(MARKDOWN_TEMPLATE_NAME, template)?;

    let mut context = Context::new();
    context.insert("grouped", &grouped);
    Ok(tera.render(MARKDOWN_TEMPLATE_NAME, &context)?)
}

/// Key-sorted copy of a map, so Jinja-style report templates keep working.
fn dictsort(value: &Value, _: &HashMap<String, Value>) -> tera::Result<Value> {
    match value {
        Value::Object(map) => {
            let sorted: BTreeMap<&String, &Value> = map.iter().collect();
            Ok(Value::Object(
                sorted
                    .into_iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect(),
            ))
        }
        other => Err(tera::Error::msg(format!(
            "dictsort expects a map, got {}",
            other
        ))),
    }
}

fn default_markdown(items: &[TodoItem], cfg: &TodoConfig) -> String {
    let mut out = String::from("# Inline TODOs\n");

    for (tag, files) in group_by_tag_and_file(items) {
        out.push_str(&format!("\n# {}\n", tag));
        for (file, list) in files {
            out.push_str(&format!("\n## [`{0}`](/{0})\n", file));
            for item in list {
                out.push_str(&format!("\n- {}  \n", item.stripped_title()));
                out.push_str(&format!(
                    "  local link: [`/{0}#{1}`](/{0}#{1}) \n",
                    file, item.line_num
                ));
                out.push_str(&format!(
                    "  | view on GitHub: [{}#L{}]({})\n",
                    item.file,
                    item.line_num,
                    cfg.code_url(&item.file, item.line_num)
                ));
                out.push_str(&format!("  | [Make Issue]({})\n", item.issue_url(cfg)));
                if !item.context.is_empty() {
                    out.push_str(&format!(
                        "\n  ```{}\n{}\n  ```\n",
                        cfg.language(item.extension()),
                        item.context_indented()
                    ));
                }
            }
        }
    }
    out
}
