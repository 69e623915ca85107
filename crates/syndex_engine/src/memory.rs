//! In-memory document store.
//!
//! A full [`DocumentStore`] implementation used by unit and integration
//! tests: seedable contents, a remote-call counter for zero-call
//! assertions, and single-shot fault injection to exercise the
//! classification policy.

use crate::store::{
    DeleteAck, DocumentStore, Hit, MultiGetEntry, SortOrder, SourceFilter, WriteAck,
};
use parking_lot::{Mutex, RwLock};
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use syndex_core::{DocId, Document, StoreError, StoreResult};

#[derive(Default)]
struct IndexState {
    settings: Option<Value>,
    docs: BTreeMap<String, Document>,
}

/// An in-memory store.
///
/// Multi-get responses contain entries only for identities the store
/// holds; unknown identities are omitted, the loosest response shape the
/// interface permits, so callers' unknown-handling is exercised.
#[derive(Default)]
pub struct MemoryStore {
    indices: RwLock<BTreeMap<String, IndexState>>,
    calls: AtomicU64,
    fault: Mutex<Option<(u64, StoreError)>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a document directly, keyed by its own identity.
    /// Documents without an identity are ignored.
    pub fn seed(&self, index: &str, document: Document) {
        if let Some(id) = document.doc_id() {
            self.indices
                .write()
                .entry(index.to_string())
                .or_default()
                .docs
                .insert(id.as_str().to_string(), document);
        }
    }

    /// Returns a stored document, bypassing the remote interface.
    pub fn stored(&self, index: &str, id: &DocId) -> Option<Document> {
        self.indices
            .read()
            .get(index)
            .and_then(|state| state.docs.get(id.as_str()).cloned())
    }

    /// Settings body an index was created with, if any.
    pub fn index_settings(&self, index: &str) -> Option<Value> {
        self.indices
            .read()
            .get(index)
            .and_then(|state| state.settings.clone())
    }

    /// Number of remote calls issued so far.
    pub fn call_count(&self) -> u64 {
        self.calls.load(AtomicOrdering::SeqCst)
    }

    /// Makes the next remote call fail with `error`.
    pub fn fail_next(&self, error: StoreError) {
        self.fail_after(0, error);
    }

    /// Makes the remote call after `calls` further successful calls fail
    /// with `error`.
    pub fn fail_after(&self, calls: u64, error: StoreError) {
        *self.fault.lock() = Some((calls, error));
    }

    fn enter(&self) -> StoreResult<()> {
        self.calls.fetch_add(1, AtomicOrdering::SeqCst);
        let mut fault = self.fault.lock();
        match fault.take() {
            Some((0, error)) => Err(error),
            Some((remaining, error)) => {
                *fault = Some((remaining - 1, error));
                Ok(())
            }
            None => Ok(()),
        }
    }
}

impl DocumentStore for MemoryStore {
    fn get(&self, index: &str, id: &DocId) -> StoreResult<Option<Document>> {
        self.enter()?;
        Ok(self.stored(index, id))
    }

    fn create(&self, index: &str, id: &DocId, document: &Document) -> StoreResult<WriteAck> {
        self.enter()?;
        let mut indices = self.indices.write();
        let docs = &mut indices.entry(index.to_string()).or_default().docs;
        if docs.contains_key(id.as_str()) {
            return Err(StoreError::rejected(format!(
                "version_conflict_engine_exception: [{id}] already exists"
            )));
        }
        docs.insert(id.as_str().to_string(), document.clone());
        Ok(WriteAck::Created)
    }

    fn replace(&self, index: &str, id: &DocId, document: &Document) -> StoreResult<WriteAck> {
        self.enter()?;
        let mut indices = self.indices.write();
        let docs = &mut indices.entry(index.to_string()).or_default().docs;
        let previous = docs.insert(id.as_str().to_string(), document.clone());
        Ok(if previous.is_some() {
            WriteAck::Updated
        } else {
            WriteAck::Created
        })
    }

    fn multi_get(&self, index: &str, ids: &[DocId]) -> StoreResult<Vec<MultiGetEntry>> {
        self.enter()?;
        let indices = self.indices.read();
        let Some(state) = indices.get(index) else {
            return Ok(Vec::new());
        };
        Ok(ids
            .iter()
            .filter(|id| state.docs.contains_key(id.as_str()))
            .map(|id| MultiGetEntry {
                id: id.clone(),
                found: true,
            })
            .collect())
    }

    fn search(
        &self,
        index: &str,
        sort_field: &str,
        order: SortOrder,
        size: usize,
        source: &SourceFilter,
    ) -> StoreResult<Vec<Hit>> {
        self.enter()?;
        let indices = self.indices.read();
        let Some(state) = indices.get(index) else {
            return Ok(Vec::new());
        };

        let mut matching: Vec<(&String, &Document)> = state
            .docs
            .iter()
            .filter(|(_, doc)| doc.field_path(sort_field).is_some())
            .collect();
        matching.sort_by(|(_, a), (_, b)| {
            let ordering = compare_sort_values(
                a.field_path(sort_field).unwrap_or(&Value::Null),
                b.field_path(sort_field).unwrap_or(&Value::Null),
            );
            match order {
                SortOrder::Ascending => ordering,
                SortOrder::Descending => ordering.reverse(),
            }
        });

        Ok(matching
            .into_iter()
            .take(size)
            .filter_map(|(key, doc)| {
                let id = DocId::new(key.clone())?;
                let source = match source {
                    SourceFilter::All => Some(doc.clone()),
                    SourceFilter::Omit => None,
                    SourceFilter::Fields(fields) => Some(project(doc, fields)),
                };
                Some(Hit { id, source })
            })
            .collect())
    }

    fn count_by_term(&self, index: &str, field: &str, value: &Value) -> StoreResult<u64> {
        self.enter()?;
        let indices = self.indices.read();
        let Some(state) = indices.get(index) else {
            return Ok(0);
        };
        Ok(state
            .docs
            .values()
            .filter(|doc| match doc.field_path(field) {
                Some(Value::Array(items)) => items.contains(value),
                Some(found) => found == value,
                None => false,
            })
            .count() as u64)
    }

    fn delete(&self, index: &str, id: &DocId) -> StoreResult<DeleteAck> {
        self.enter()?;
        let mut indices = self.indices.write();
        let removed = indices
            .get_mut(index)
            .and_then(|state| state.docs.remove(id.as_str()));
        Ok(if removed.is_some() {
            DeleteAck::Deleted
        } else {
            DeleteAck::Absent
        })
    }

    fn ping(&self) -> StoreResult<bool> {
        self.enter()?;
        Ok(true)
    }

    fn index_exists(&self, index: &str) -> StoreResult<bool> {
        self.enter()?;
        Ok(self.indices.read().contains_key(index))
    }

    fn create_index(&self, index: &str, settings: &Value) -> StoreResult<()> {
        self.enter()?;
        let mut indices = self.indices.write();
        if indices.contains_key(index) {
            return Err(StoreError::rejected(format!(
                "resource_already_exists_exception: index [{index}]"
            )));
        }
        indices.insert(
            index.to_string(),
            IndexState {
                settings: Some(settings.clone()),
                docs: BTreeMap::new(),
            },
        );
        Ok(())
    }
}

/// Numeric comparison when both sides are (or parse as) numbers, textual
/// comparison otherwise. Mirrors how the cursor queries sort identities.
fn compare_sort_values(a: &Value, b: &Value) -> Ordering {
    let numeric = |v: &Value| -> Option<f64> {
        match v {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.parse().ok(),
            _ => None,
        }
    };
    match (numeric(a), numeric(b)) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        _ => a.to_string().cmp(&b.to_string()),
    }
}

fn project(document: &Document, fields: &[String]) -> Document {
    let mut out = Map::new();
    for path in fields {
        if let Some(value) = document.field_path(path) {
            insert_path(&mut out, path, value.clone());
        }
    }
    Document::new(out)
}

fn insert_path(out: &mut Map<String, Value>, path: &str, value: Value) {
    match path.split_once('.') {
        None => {
            out.insert(path.to_string(), value);
        }
        Some((head, rest)) => {
            let entry = out
                .entry(head.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if let Value::Object(inner) = entry {
                insert_path(inner, rest, value);
            }
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

    fn id(s: &str) -> DocId {
        DocId::new(s).unwrap()
    }

    #[test]
    fn get_and_replace_roundtrip() {
        let store = MemoryStore::new();
        let d = doc(json!({"id": 1, "title": "t"}));
        assert_eq!(store.replace("idx", &id("1"), &d).unwrap(), WriteAck::Created);
        assert_eq!(store.get("idx", &id("1")).unwrap(), Some(d.clone()));
        assert_eq!(store.replace("idx", &id("1"), &d).unwrap(), WriteAck::Updated);
        assert_eq!(store.get("idx", &id("2")).unwrap(), None);
    }

    #[test]
    fn create_conflicts_on_existing_identity() {
        let store = MemoryStore::new();
        let d = doc(json!({"id": 1}));
        store.create("idx", &id("1"), &d).unwrap();
        let err = store.create("idx", &id("1"), &d).unwrap_err();
        assert!(!err.is_retryable());
    }

    #[test]
    fn multi_get_omits_unknown_ids() {
        let store = MemoryStore::new();
        store.seed("idx", doc(json!({"id": "a"})));
        let entries = store.multi_get("idx", &[id("a"), id("b")]).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, id("a"));
        assert!(entries[0].found);
    }

    #[test]
    fn search_sorts_descending_and_projects_source() {
        let store = MemoryStore::new();
        store.seed("idx", doc(json!({"id": 1, "meta": {"at": "2024-01-01"}})));
        store.seed("idx", doc(json!({"id": 3, "meta": {"at": "2024-03-01"}})));
        store.seed("idx", doc(json!({"id": 2, "meta": {"at": "2024-02-01"}})));

        let hits = store
            .search(
                "idx",
                "meta.at",
                SortOrder::Descending,
                1,
                &SourceFilter::Fields(vec!["meta.at".into()]),
            )
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, id("3"));
        let source = hits[0].source.as_ref().unwrap();
        assert_eq!(source.field_path("meta.at"), Some(&json!("2024-03-01")));
        assert!(source.field_path("id").is_none());
    }

    #[test]
    fn search_sorts_numeric_ids_numerically() {
        let store = MemoryStore::new();
        store.seed("idx", doc(json!({"id": 9})));
        store.seed("idx", doc(json!({"id": 10})));
        let hits = store
            .search("idx", "id", SortOrder::Descending, 1, &SourceFilter::Omit)
            .unwrap();
        assert_eq!(hits[0].id, id("10"));
        assert!(hits[0].source.is_none());
    }

    #[test]
    fn search_on_missing_index_is_empty() {
        let store = MemoryStore::new();
        assert!(store
            .search("nope", "id", SortOrder::Descending, 1, &SourceFilter::All)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn count_matches_scalars_and_array_membership() {
        let store = MemoryStore::new();
        store.seed("idx", doc(json!({"id": 1, "lang": "pl", "tags": ["a", "b"]})));
        store.seed("idx", doc(json!({"id": 2, "lang": "en", "tags": ["b"]})));
        assert_eq!(store.count_by_term("idx", "lang", &json!("pl")).unwrap(), 1);
        assert_eq!(store.count_by_term("idx", "tags", &json!("b")).unwrap(), 2);
        assert_eq!(store.count_by_term("idx", "lang", &json!("de")).unwrap(), 0);
    }

    #[test]
    fn fault_injection_fires_once() {
        let store = MemoryStore::new();
        store.fail_next(StoreError::Timeout);
        assert!(store.ping().is_err());
        assert!(store.ping().unwrap());
        assert_eq!(store.call_count(), 2);
    }

    #[test]
    fn create_index_rejects_duplicates() {
        let store = MemoryStore::new();
        store.create_index("idx", &json!({"settings": {}})).unwrap();
        assert!(store.index_exists("idx").unwrap());
        let err = store.create_index("idx", &json!({})).unwrap_err();
        assert!(err.to_string().contains("resource_already_exists"));
    }
}
