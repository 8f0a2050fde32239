//! YAML output.
//!
//! Strings stay strings, lists become sequences and dictionaries become
//! mappings in their original key order. Every scalar of a project is a
//! string, so numbers such as `objectVersion` values are written quoted.

use libpbx::{Dict, Value};

/// Encode a project tree as YAML text.
pub fn encode(tree: &Dict) -> Result<String, String> {
    serde_yaml::to_string(&dict_to_yaml(tree)).map_err(|e| format!("YAML encode error: {}", e))
}

fn dict_to_yaml(dict: &Dict) -> serde_yaml::Value {
    let mut map = serde_yaml::Mapping::new();
    for (k, v) in dict {
        map.insert(serde_yaml::Value::String(k.clone()), value_to_yaml(v));
    }
    serde_yaml::Value::Mapping(map)
}

fn value_to_yaml(value: &Value) -> serde_yaml::Value {
    match value {
        Value::String(s) => serde_yaml::Value::String(s.clone()),
        Value::Array(items) => {
            serde_yaml::Value::Sequence(items.iter().map(value_to_yaml).collect())
        }
        Value::Dict(dict) => dict_to_yaml(dict),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_keeps_key_order() {
        let mut entry = Dict::new();
        entry.insert("isa".to_string(), Value::String("PBXGroup".to_string()));
        entry.insert(
            "children".to_string(),
            Value::Array(vec![Value::String("F1".to_string())]),
        );
        entry.insert("sourceTree".to_string(), Value::String("<group>".to_string()));
        entry.insert("objectVersion".to_string(), Value::String("46".to_string()));

        let text = encode(&entry).unwrap();
        let isa = text.find("isa: PBXGroup\n").unwrap();
        let children = text.find("children:\n").unwrap();
        let tree = text.find("sourceTree: <group>\n").unwrap();
        assert!(isa < children && children < tree);
        assert!(text.contains("- F1\n"));
        assert!(text.contains("objectVersion: '46'\n"));
    }
}
