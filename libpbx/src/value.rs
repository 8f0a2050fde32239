//! Property tree of an entry body.

use indexmap::IndexMap;
use std::fmt;

/// Insertion-ordered property dictionary.
pub type Dict = IndexMap<String, Value>;

/// A property value: the grammar has strings, lists and dictionaries only.
#[derive(Clone, PartialEq, Eq)]
pub enum Value {
    /// Bare or quoted string, escapes kept as written.
    String(String),
    /// Parenthesized list.
    Array(Vec<Value>),
    /// Braced dictionary.
    Dict(Dict),
}

impl Value {
    /// Returns a reference to the string if this is a `String`.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns a reference to the array if this is an `Array`.
    pub fn as_array(&self) -> Option<&Vec<Value>> {
        match self {
            Value::Array(arr) => Some(arr),
            _ => None,
        }
    }

    /// Returns a mutable reference to the array if this is an `Array`.
    pub fn as_array_mut(&mut self) -> Option<&mut Vec<Value>> {
        match self {
            Value::Array(arr) => Some(arr),
            _ => None,
        }
    }

    /// Returns a reference to the dictionary if this is a `Dict`.
    pub fn as_dict(&self) -> Option<&Dict> {
        match self {
            Value::Dict(dict) => Some(dict),
            _ => None,
        }
    }

    /// Returns a mutable reference to the dictionary if this is a `Dict`.
    pub fn as_dict_mut(&mut self) -> Option<&mut Dict> {
        match self {
            Value::Dict(dict) => Some(dict),
            _ => None,
        }
    }

    /// The strings of an array, or the single string itself.
    pub fn string_items(&self) -> Vec<&str> {
        match self {
            Value::String(s) => vec![s.as_str()],
            Value::Array(arr) => arr.iter().filter_map(Value::as_str).collect(),
            Value::Dict(_) => Vec::new(),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "{:?}", s),
            Value::Array(arr) => f.debug_list().entries(arr).finish(),
            Value::Dict(dict) => f.debug_map().entries(dict).finish(),
        }
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<Vec<Value>> for Value {
    fn from(arr: Vec<Value>) -> Self {
        Value::Array(arr)
    }
}

impl From<Dict> for Value {
    fn from(dict: Dict) -> Self {
        Value::Dict(dict)
    }
}

/// Run `f` on the dictionary at `path` below `dict`, creating empty
/// dictionaries as needed. A non-dictionary in the way is replaced in place.
pub(crate) fn with_dict_path<R>(
    dict: &mut Dict,
    path: &[&str],
    f: impl FnOnce(&mut Dict) -> R,
) -> R {
    let Some((key, rest)) = path.split_first() else {
        return f(dict);
    };
    match dict
        .entry((*key).to_string())
        .or_insert_with(|| Value::Dict(Dict::new()))
    {
        Value::Dict(inner) => with_dict_path(inner, rest, f),
        slot => {
            let mut inner = Dict::new();
            let result = with_dict_path(&mut inner, rest, f);
            *slot = Value::Dict(inner);
            result
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_items() {
        assert_eq!(Value::from("a").string_items(), vec!["a"]);
        let arr = Value::Array(vec!["x".into(), "y".into()]);
        assert_eq!(arr.string_items(), vec!["x", "y"]);
        assert!(Value::Dict(Dict::new()).string_items().is_empty());
    }

    #[test]
    fn test_dict_path_creates_levels() {
        let mut root = Dict::new();
        root.insert("before".into(), "1".into());
        root.insert("attributes".into(), "clobbered".into());
        root.insert("after".into(), "2".into());
        with_dict_path(&mut root, &["attributes", "TargetAttributes"], |targets| {
            targets.insert("k".into(), "v".into())
        });
        let keys: Vec<&str> = root.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["before", "attributes", "after"]);
        let attrs = root["attributes"].as_dict().unwrap();
        let targets = attrs["TargetAttributes"].as_dict().unwrap();
        assert_eq!(targets["k"], Value::from("v"));
    }

    #[test]
    fn test_dict_path_reuses_existing_levels() {
        let mut root = Dict::new();
        with_dict_path(&mut root, &["a", "b"], |b| b.insert("x".into(), "1".into()));
        with_dict_path(&mut root, &["a", "b"], |b| b.insert("y".into(), "2".into()));
        let b = root["a"].as_dict().unwrap()["b"].as_dict().unwrap();
        assert_eq!(b.len(), 2);
        assert_eq!(with_dict_path(&mut root, &[], |top| top.len()), 1);
    }
}
