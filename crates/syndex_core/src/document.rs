//! Document and identity types.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Canonical string identity of a document in the store.
///
/// Identities are normalized before any remote call: a JSON string id is
/// taken as-is, a JSON integer id is rendered in decimal. This makes the
/// numeric id `42` and the string id `"42"` the same key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DocId(String);

impl DocId {
    /// Creates an identity from an already-normalized string.
    ///
    /// Returns `None` for an empty string, which is not a usable key.
    pub fn new(id: impl Into<String>) -> Option<Self> {
        let id = id.into();
        if id.is_empty() {
            None
        } else {
            Some(Self(id))
        }
    }

    /// Derives an identity from a raw `id` field value.
    ///
    /// Accepts non-empty strings and integers; everything else (null,
    /// floats, booleans, containers) has no canonical form and yields
    /// `None`.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Self::new(s.clone()),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Some(Self(i.to_string()))
                } else {
                    n.as_u64().map(|u| Self(u.to_string()))
                }
            }
            _ => None,
        }
    }

    /// Returns the identity as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parses the identity as an unsigned integer, if it is numeric.
    #[must_use]
    pub fn as_u64(&self) -> Option<u64> {
        self.0.parse().ok()
    }
}

impl fmt::Display for DocId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A document: a JSON object mapping field names to values.
///
/// Documents are immutable inputs to the engine; the engine never mutates
/// a caller-supplied document. A document intended for the store must carry
/// an `id` field from which its [`DocId`] is derived.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document(Map<String, Value>);

impl Document {
    /// Wraps a JSON object as a document.
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// The document's fields.
    #[must_use]
    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Consumes the document, returning its fields.
    #[must_use]
    pub fn into_fields(self) -> Map<String, Value> {
        self.0
    }

    /// Derives the document's store identity from its `id` field.
    ///
    /// Returns `None` when the field is missing, null, an empty string,
    /// or of a type that has no canonical form.
    #[must_use]
    pub fn doc_id(&self) -> Option<DocId> {
        self.0.get("id").and_then(DocId::from_value)
    }

    /// Resolves a dotted field path (`"meta.published"`) through nested
    /// objects. Returns `None` when any segment is missing or not an
    /// object where descent is required.
    #[must_use]
    pub fn field_path(&self, path: &str) -> Option<&Value> {
        let mut parts = path.split('.');
        let mut value = self.0.get(parts.next()?)?;
        for part in parts {
            value = value.as_object()?.get(part)?;
        }
        Some(value)
    }
}

impl From<Map<String, Value>> for Document {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

impl TryFrom<Value> for Document {
    type Error = Value;

    /// Accepts only JSON objects; any other value is handed back.
    fn try_from(value: Value) -> Result<Self, Value> {
        match value {
            Value::Object(fields) => Ok(Self(fields)),
            other => Err(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        Document::try_from(value).unwrap()
    }

    #[test]
    fn string_and_integer_ids_normalize_to_same_key() {
        let a = doc(json!({"id": "42", "title": "a"}));
        let b = doc(json!({"id": 42, "title": "b"}));
        assert_eq!(a.doc_id(), b.doc_id());
        assert_eq!(a.doc_id().unwrap().as_str(), "42");
    }

    #[test]
    fn negative_integer_id() {
        let d = doc(json!({"id": -7}));
        assert_eq!(d.doc_id().unwrap().as_str(), "-7");
        assert_eq!(d.doc_id().unwrap().as_u64(), None);
    }

    #[test]
    fn missing_null_and_empty_ids_are_rejected() {
        assert!(doc(json!({"title": "no id"})).doc_id().is_none());
        assert!(doc(json!({"id": null})).doc_id().is_none());
        assert!(doc(json!({"id": ""})).doc_id().is_none());
        assert!(doc(json!({"id": 1.5})).doc_id().is_none());
        assert!(doc(json!({"id": true})).doc_id().is_none());
    }

    #[test]
    fn zero_is_a_valid_identity() {
        let d = doc(json!({"id": 0}));
        assert_eq!(d.doc_id().unwrap().as_str(), "0");
        assert_eq!(d.doc_id().unwrap().as_u64(), Some(0));
    }

    #[test]
    fn field_path_walks_nested_objects() {
        let d = doc(json!({"id": 1, "meta": {"published": "2024-05-01", "n": 3}}));
        assert_eq!(d.field_path("meta.published"), Some(&json!("2024-05-01")));
        assert_eq!(d.field_path("id"), Some(&json!(1)));
        assert!(d.field_path("meta.missing").is_none());
        assert!(d.field_path("meta.n.deeper").is_none());
        assert!(d.field_path("").is_none());
    }

    #[test]
    fn non_object_values_are_rejected() {
        assert!(Document::try_from(json!([1, 2])).is_err());
        assert!(Document::try_from(json!("text")).is_err());
    }

    #[test]
    fn serde_transparency() {
        let d = doc(json!({"id": 1, "tags": ["a"]}));
        let text = serde_json::to_string(&d).unwrap();
        let back: Document = serde_json::from_str(&text).unwrap();
        assert_eq!(d, back);
    }
}
