//! TOML output.
//!
//! Dictionaries become tables, and dictionaries nested inside lists become
//! inline tables. Tables holding only other tables are left implicit so
//! that each entry gets a single `[objects.<section>.<GUID>]` header.

use libpbx::{Dict, Value};
use toml_edit::DocumentMut;

/// Encode a project tree as TOML text.
pub fn encode(tree: &Dict) -> String {
    let table = dict_to_table(tree);
    let mut doc = DocumentMut::new();
    for (key, item) in table.iter() {
        doc[key] = item.clone();
    }
    doc.to_string()
}

fn dict_to_table(dict: &Dict) -> toml_edit::Table {
    let mut table = toml_edit::Table::new();
    table.set_implicit(true);
    for (k, v) in dict {
        let item = match v {
            Value::Dict(inner) => toml_edit::Item::Table(dict_to_table(inner)),
            other => toml_edit::Item::Value(value_to_toml(other)),
        };
        table.insert(k, item);
    }
    table
}

fn value_to_toml(value: &Value) -> toml_edit::Value {
    match value {
        Value::String(s) => toml_edit::Value::String(toml_edit::Formatted::new(s.clone())),
        Value::Array(items) => {
            let mut arr = toml_edit::Array::new();
            for v in items {
                arr.push(value_to_toml(v));
            }
            toml_edit::Value::Array(arr)
        }
        Value::Dict(dict) => {
            let mut inline = toml_edit::InlineTable::new();
            for (k, v) in dict {
                inline.insert(k, value_to_toml(v));
            }
            toml_edit::Value::InlineTable(inline)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(text: &str) -> Value {
        Value::String(text.to_string())
    }

    #[test]
    fn test_entry_tables() {
        let mut entry = Dict::new();
        entry.insert("isa".to_string(), s("PBXGroup"));
        entry.insert("children".to_string(), Value::Array(vec![s("F1"), s("F2")]));
        let mut section = Dict::new();
        section.insert("G1".to_string(), Value::Dict(entry));
        let mut objects = Dict::new();
        objects.insert("PBXGroup".to_string(), Value::Dict(section));
        let mut tree = Dict::new();
        tree.insert("rootObject".to_string(), s("ROOT"));
        tree.insert("objects".to_string(), Value::Dict(objects));

        let text = encode(&tree);
        assert!(text.starts_with("rootObject = \"ROOT\"\n"));
        assert!(text.contains("[objects.PBXGroup.G1]\n"));
        assert!(text.contains("isa = \"PBXGroup\"\n"));
        assert!(text.contains("children = [\"F1\", \"F2\"]\n"));
        assert!(!text.contains("[objects]\n"));
    }

    #[test]
    fn test_dicts_in_lists_are_inline() {
        let mut reference = Dict::new();
        reference.insert("ProductGroup".to_string(), s("G2"));
        let mut tree = Dict::new();
        tree.insert(
            "projectReferences".to_string(),
            Value::Array(vec![Value::Dict(reference)]),
        );

        let text = encode(&tree);
        assert!(text.contains("projectReferences = [{ ProductGroup = \"G2\" }]"));
    }
}
