//! Nested documents fetched from the management API and dotted-path lookup.

use std::collections::HashMap;

use serde_json::Value;

/// Separator between the segments of a dotted path.
pub const PATH_SEPARATOR: char = '.';

/// One fetched snapshot of a management API resource.
///
/// Built from the JSON body of a single response and dropped once the
/// collection cycle that fetched it is over.
#[derive(Debug, Clone, PartialEq)]
pub enum Document {
    /// Object with string keys.
    Mapping(HashMap<String, Document>),
    /// Any JSON number, integer or float.
    Number(f64),
    String(String),
    Bool(bool),
    /// JSON array. Never traversed by path resolution.
    List(Vec<Document>),
    Null,
}

impl Document {
    /// Parse a JSON body into a document.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        let value: Value = serde_json::from_slice(bytes)?;
        Ok(Self::from(value))
    }

    /// Look up a child by key if this node is a mapping.
    pub fn get(&self, key: &str) -> Option<&Document> {
        match self {
            Document::Mapping(entries) => entries.get(key),
            _ => None,
        }
    }

    /// Numeric value of a leaf, if this node is a number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Document::Number(n) => Some(*n),
            Document::Mapping(_)
            | Document::String(_)
            | Document::Bool(_)
            | Document::List(_)
            | Document::Null => None,
        }
    }

    /// Resolve a dotted path to a numeric leaf.
    ///
    /// See [`resolve`].
    pub fn resolve(&self, path: &str) -> Option<f64> {
        resolve(self, path)
    }
}

impl From<Value> for Document {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => {
                Document::Mapping(map.into_iter().map(|(k, v)| (k, v.into())).collect())
            }
            // Every serde_json number has an f64 representation
            Value::Number(n) => n.as_f64().map_or(Document::Null, Document::Number),
            Value::String(s) => Document::String(s),
            Value::Bool(b) => Document::Bool(b),
            Value::Array(items) => Document::List(items.into_iter().map(Into::into).collect()),
            Value::Null => Document::Null,
        }
    }
}

/// Resolve a dotted path such as `message_stats.publish_details.rate` to a
/// numeric leaf of `document`.
///
/// Returns `None` when the path is empty or has an empty segment, when any
/// segment is missing, when an intermediate node is not a mapping, or when the
/// leaf is not a number. Absence is an expected outcome: the broker omits
/// fields depending on its version and configuration.
pub fn resolve(document: &Document, path: &str) -> Option<f64> {
    if path.is_empty() {
        return None;
    }

    let mut node = document;
    for segment in path.split(PATH_SEPARATOR) {
        if segment.is_empty() {
            return None;
        }
        node = node.get(segment)?;
    }

    node.as_f64()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        Document::from(value)
    }

    #[test]
    fn test_resolve_integer_leaf() {
        let d = doc(json!({"object_totals": {"queues": 5}}));
        assert_eq!(resolve(&d, "object_totals.queues"), Some(5.0));
    }

    #[test]
    fn test_resolve_float_leaf() {
        let d = doc(json!({"message_stats": {"publish_details": {"rate": 12.4}}}));
        assert_eq!(resolve(&d, "message_stats.publish_details.rate"), Some(12.4));
    }

    #[test]
    fn test_resolve_top_level_leaf() {
        let d = doc(json!({"rabbitmq_version": "3.12.0", "queues": 3}));
        assert_eq!(resolve(&d, "queues"), Some(3.0));
    }

    #[test]
    fn test_resolve_non_numeric_leaf() {
        let d = doc(json!({"message_stats": {"publish_details": {"rate": "n/a"}}}));
        assert_eq!(resolve(&d, "message_stats.publish_details.rate"), None);

        let d = doc(json!({"flags": {"enabled": true, "missing": null}}));
        assert_eq!(resolve(&d, "flags.enabled"), None);
        assert_eq!(resolve(&d, "flags.missing"), None);
    }

    #[test]
    fn test_resolve_container_leaf() {
        let d = doc(json!({"object_totals": {"queues": 5}, "listeners": [1, 2]}));
        assert_eq!(resolve(&d, "object_totals"), None);
        assert_eq!(resolve(&d, "listeners"), None);
    }

    #[test]
    fn test_resolve_missing_segments() {
        let d = doc(json!({"object_totals": {"queues": 5}}));
        assert_eq!(resolve(&d, "queue_totals.messages"), None);
        assert_eq!(resolve(&d, "object_totals.channels"), None);
        assert_eq!(resolve(&d, "object_totals.queues.extra"), None);
    }

    #[test]
    fn test_resolve_through_non_mapping() {
        let d = doc(json!({"a": 1, "b": "text", "c": [{"d": 2}], "e": null}));
        assert_eq!(resolve(&d, "a.x"), None);
        assert_eq!(resolve(&d, "b.x"), None);
        assert_eq!(resolve(&d, "c.d"), None);
        assert_eq!(resolve(&d, "c.0.d"), None);
        assert_eq!(resolve(&d, "e.x"), None);
    }

    #[test]
    fn test_resolve_malformed_paths() {
        let d = doc(json!({"a": {"b": 1}, "": {"b": 2}}));
        assert_eq!(resolve(&d, ""), None);
        assert_eq!(resolve(&d, "."), None);
        assert_eq!(resolve(&d, ".b"), None);
        assert_eq!(resolve(&d, "a."), None);
        assert_eq!(resolve(&d, "a..b"), None);
    }

    #[test]
    fn test_resolve_on_scalar_root() {
        for root in [json!(5), json!("x"), json!(null), json!([1, 2]), json!(true)] {
            let d = doc(root);
            assert_eq!(resolve(&d, "a"), None);
            assert_eq!(resolve(&d, "a.b"), None);
        }
    }

    #[test]
    fn test_from_slice() {
        let d = Document::from_slice(br#"{"queue_totals": {"messages": 42}}"#).unwrap();
        assert_eq!(d.resolve("queue_totals.messages"), Some(42.0));

        assert!(Document::from_slice(b"<html>").is_err());
    }

    #[test]
    fn test_from_value_variants() {
        let d = doc(json!({"n": 1, "s": "x", "b": false, "l": [null], "z": null}));
        assert_eq!(d.get("n"), Some(&Document::Number(1.0)));
        assert_eq!(d.get("s"), Some(&Document::String("x".to_string())));
        assert_eq!(d.get("b"), Some(&Document::Bool(false)));
        assert_eq!(d.get("l"), Some(&Document::List(vec![Document::Null])));
        assert_eq!(d.get("z"), Some(&Document::Null));
    }
}
