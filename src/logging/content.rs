//! Log content normalization
//!
//! Anything handed to the logger ends up as an ordered list of text lines.

use crate::config::Value;

/// Normalized log content: one entry per output line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Content(Vec<String>);

impl Content {
    pub fn lines(&self) -> &[String] {
        &self.0
    }

    pub fn into_lines(self) -> Vec<String> {
        self.0
    }
}

/// Flatten a value into printable lines
///
/// Never returns an empty vector; empty lists and maps yield a single empty
/// line.
pub fn normalize_content(value: &Value) -> Vec<String> {
    let lines = match value {
        Value::Str(s) => vec![s.clone()],
        Value::Int(n) => vec![n.to_string()],
        Value::Map(entries) => entries
            .iter()
            .map(|(key, value)| format!("{}: {}", key, map_entry_line(value)))
            .collect(),
        Value::List(items) => items.iter().map(|item| item.to_string()).collect(),
        other => vec![other.to_string()],
    };
    if lines.is_empty() {
        vec![String::new()]
    } else {
        lines
    }
}

fn map_entry_line(value: &Value) -> String {
    match value {
        Value::List(items) => items
            .iter()
            .map(|item| item.to_string())
            .collect::<Vec<_>>()
            .join(", "),
        Value::Map(entries) => entries
            .iter()
            .map(|(k, v)| format!("{}: {}", k, v))
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    }
}

impl From<&Value> for Content {
    fn from(value: &Value) -> Self {
        Content(normalize_content(value))
    }
}

impl From<Value> for Content {
    fn from(value: Value) -> Self {
        Content::from(&value)
    }
}

impl From<&str> for Content {
    fn from(s: &str) -> Self {
        Content(vec![s.to_string()])
    }
}

impl From<String> for Content {
    fn from(s: String) -> Self {
        Content(vec![s])
    }
}

impl From<&String> for Content {
    fn from(s: &String) -> Self {
        Content(vec![s.clone()])
    }
}

impl From<i64> for Content {
    fn from(n: i64) -> Self {
        Content(vec![n.to_string()])
    }
}

impl<T: Into<String>> From<Vec<T>> for Content {
    fn from(lines: Vec<T>) -> Self {
        let lines: Vec<String> = lines.into_iter().map(Into::into).collect();
        if lines.is_empty() {
            Content(vec![String::new()])
        } else {
            Content(lines)
        }
    }
}

impl<T: Into<String>, const N: usize> From<[T; N]> for Content {
    fn from(lines: [T; N]) -> Self {
        Content::from(Vec::from(lines))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(entries: Vec<(&str, Value)>) -> Value {
        Value::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        )
    }

    #[test]
    fn test_string_and_int() {
        assert_eq!(normalize_content(&Value::from("hello")), vec!["hello"]);
        assert_eq!(normalize_content(&Value::Int(42)), vec!["42"]);
    }

    #[test]
    fn test_list_is_stringified() {
        let value = Value::List(vec![Value::from("a"), Value::Int(2), Value::Bool(true)]);
        assert_eq!(normalize_content(&value), vec!["a", "2", "true"]);
    }

    #[test]
    fn test_mapping_one_line_per_key() {
        let value = map(vec![
            ("name", Value::from("bob")),
            ("tags", Value::from(vec!["x", "y"])),
            ("nested", map(vec![("a", Value::Int(1)), ("b", Value::Int(2))])),
        ]);
        assert_eq!(
            normalize_content(&value),
            vec!["name: bob", "tags: x, y", "nested: a: 1, b: 2"]
        );
    }

    #[test]
    fn test_other_types_fall_back_to_string() {
        assert_eq!(normalize_content(&Value::Null), vec!["null"]);
        assert_eq!(normalize_content(&Value::Bool(false)), vec!["false"]);
        assert_eq!(normalize_content(&Value::Float(1.5)), vec!["1.5"]);
    }

    #[test]
    fn test_never_empty() {
        let inputs = [
            Value::List(vec![]),
            Value::Map(vec![]),
            Value::from(""),
            Value::Null,
        ];
        for input in &inputs {
            assert!(!normalize_content(input).is_empty(), "{:?}", input);
        }
        assert_eq!(Content::from(Vec::<String>::new()).lines().len(), 1);
    }

    #[test]
    fn test_idempotent_on_normalized_lines() {
        let first = normalize_content(&map(vec![("k", Value::from(vec!["a", "b"]))]));
        let again = normalize_content(&Value::from(first.clone()));
        assert_eq!(first, again);
    }
}
