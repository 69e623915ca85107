//! Structural document comparison.
//!
//! Decides whether a write is necessary during sync, so it must neither
//! report "different" for semantically equal documents (spurious writes)
//! nor "equal" for different ones (silent staleness).

use serde_json::{Map, Value};

/// Deep, order-insensitive equality between two documents.
///
/// Two documents are equal when they have the same key set and every
/// shared key holds equal values:
/// - nested objects are compared recursively;
/// - same-length sequences whose elements are all objects on both sides
///   are reordered by a canonical key derived from each element's sorted
///   key/value pairs, then compared pairwise;
/// - all other sequences are compared positionally;
/// - scalars require exact equality.
///
/// The relation is symmetric and reflexive.
#[must_use]
pub fn documents_equal(a: &Map<String, Value>, b: &Map<String, Value>) -> bool {
    if a.len() != b.len() || !a.keys().all(|k| b.contains_key(k)) {
        return false;
    }
    a.iter().all(|(key, va)| values_equal(va, &b[key]))
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Object(a), Value::Object(b)) => documents_equal(a, b),
        (Value::Array(a), Value::Array(b)) => sequences_equal(a, b),
        _ => a == b,
    }
}

fn sequences_equal(a: &[Value], b: &[Value]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let all_objects = |side: &[Value]| side.iter().all(Value::is_object);
    if all_objects(a) && all_objects(b) {
        sorted_objects(a)
            .into_iter()
            .zip(sorted_objects(b))
            .all(|(x, y)| documents_equal(x, y))
    } else {
        // Mixed or scalar sequences are order-sensitive.
        a == b
    }
}

fn sorted_objects(side: &[Value]) -> Vec<&Map<String, Value>> {
    let mut items: Vec<&Map<String, Value>> =
        side.iter().filter_map(Value::as_object).collect();
    items.sort_by_key(|obj| canonical_key(obj));
    items
}

/// Canonical sort key for an object: its key/value pairs sorted by key,
/// rendered as compact JSON. Stable regardless of insertion order.
fn canonical_key(obj: &Map<String, Value>) -> String {
    let mut pairs: Vec<(&String, &Value)> = obj.iter().collect();
    pairs.sort_by(|x, y| x.0.cmp(y.0));

    let mut key = String::new();
    for (name, value) in pairs {
        key.push_str(name);
        key.push('=');
        key.push_str(&value.to_string());
        key.push(';');
    }
    key
}
