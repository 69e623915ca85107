//! The document synchronization engine.
//!
//! One engine per process, holding the injected store collaborator.
//! Synchronization of one document is strictly sequential: read the
//! current remote state, decide, then write at most once. The engine
//! performs no internal retries — transient faults are re-raised so an
//! outer retry/backoff layer can re-invoke the whole operation, which is
//! always safe because the operation is idempotent.

use crate::store::{DeleteAck, DocumentStore, WriteAck};
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use syndex_core::{documents_equal, DocId, Document, FaultClass, StoreError, StoreResult};
use tracing::{error, info, warn};

/// Outcome of a sync operation.
///
/// Callers must be able to tell "no-op because already correct" from
/// "write succeeded" from "write failed"; ingestion counters depend on
/// the distinction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The document did not exist and was created.
    Created,
    /// The document existed with different content and was replaced.
    Updated,
    /// The document already matched; no write was issued.
    Unchanged,
    /// The operation failed terminally (or the document had no identity).
    Failed,
}

/// Cumulative sync counters.
#[derive(Debug, Clone, Default)]
pub struct SyncStats {
    /// Documents created.
    pub created: u64,
    /// Documents replaced.
    pub updated: u64,
    /// Documents already up to date.
    pub unchanged: u64,
    /// Failed sync operations.
    pub failed: u64,
}

impl SyncStats {
    /// Total sync operations accounted for.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.created + self.updated + self.unchanged + self.failed
    }
}

/// Applies the uniform fault policy for operations that degrade on
/// terminal faults: Terminal is logged and folded into `fallback`,
/// Retryable and Unexpected are re-raised for the caller.
pub(crate) fn terminal_to<T>(err: StoreError, fallback: T, context: &str) -> StoreResult<T> {
    match err.classification() {
        FaultClass::Terminal => {
            error!("{context} failed: {err}");
            Ok(fallback)
        }
        FaultClass::Retryable => {
            warn!("transient fault while {context}, caller may retry: {err}");
            Err(err)
        }
        FaultClass::Unexpected => {
            error!("unexpected fault while {context}: {err}");
            Err(err)
        }
    }
}

/// The synchronization engine over an injected document store.
pub struct SyncEngine<S: DocumentStore> {
    store: Arc<S>,
    stats: RwLock<SyncStats>,
}

impl<S: DocumentStore> SyncEngine<S> {
    /// Creates an engine owning the given store.
    pub fn new(store: S) -> Self {
        Self::from_shared(Arc::new(store))
    }

    /// Creates an engine over a shared store handle.
    pub fn from_shared(store: Arc<S>) -> Self {
        Self {
            store,
            stats: RwLock::new(SyncStats::default()),
        }
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// A snapshot of the cumulative sync counters.
    pub fn stats(&self) -> SyncStats {
        self.stats.read().clone()
    }

    /// Ensures the index holds `document` exactly, writing only when
    /// needed.
    ///
    /// The remote state is freshly read every time; when the existing
    /// snapshot is structurally equal to the candidate no write is
    /// issued. Terminal faults yield [`SyncOutcome::Failed`]; transient
    /// and unexpected faults propagate unmodified.
    pub fn sync_document(&self, index: &str, document: &Document) -> StoreResult<SyncOutcome> {
        let Some(id) = document.doc_id() else {
            warn!("document carries no usable id field, refusing to sync");
            return Ok(self.record(SyncOutcome::Failed));
        };

        let snapshot = match self.store.get(index, &id) {
            Ok(snapshot) => snapshot,
            Err(err) => {
                return self.fail_or_propagate(err, &format!("reading document {id} from index {index}"))
            }
        };

        match snapshot {
            None => match self.store.create(index, &id, document) {
                Ok(WriteAck::Created) => {
                    info!("document {id} created in index {index}");
                    Ok(self.record(SyncOutcome::Created))
                }
                Ok(ack) => {
                    error!("create of document {id} in index {index} acknowledged as {ack:?}");
                    Ok(self.record(SyncOutcome::Failed))
                }
                Err(err) => {
                    self.fail_or_propagate(err, &format!("creating document {id} in index {index}"))
                }
            },
            Some(existing) => {
                if documents_equal(document.fields(), existing.fields()) {
                    info!("document {id} in index {index} is already up to date");
                    return Ok(self.record(SyncOutcome::Unchanged));
                }
                match self.store.replace(index, &id, document) {
                    Ok(ack) if ack.acknowledged() => {
                        info!("document {id} updated in index {index}");
                        Ok(self.record(SyncOutcome::Updated))
                    }
                    Ok(ack) => {
                        error!(
                            "update of document {id} in index {index} acknowledged as {ack:?}"
                        );
                        Ok(self.record(SyncOutcome::Failed))
                    }
                    Err(err) => self.fail_or_propagate(
                        err,
                        &format!("updating document {id} in index {index}"),
                    ),
                }
            }
        }
    }

    /// Resolves existence for many identities in one round trip.
    ///
    /// The result covers only identities the store accounted for; a key
    /// absent from the map means "unknown", not "absent". Transient
    /// faults propagate so the whole batch can be retried; every other
    /// failure degrades to an empty map, which callers treat as "could
    /// not determine, check individually".
    pub fn batch_exists(
        &self,
        index: &str,
        ids: &[DocId],
    ) -> StoreResult<HashMap<DocId, bool>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        match self.store.multi_get(index, ids) {
            Ok(entries) => {
                let requested: HashSet<&DocId> = ids.iter().collect();
                Ok(entries
                    .into_iter()
                    .filter(|entry| requested.contains(&entry.id))
                    .map(|entry| (entry.id, entry.found))
                    .collect())
            }
            Err(err) if err.is_retryable() => {
                warn!(
                    "transient fault while resolving batch existence in index {index}, \
                     caller may retry: {err}"
                );
                Err(err)
            }
            Err(err) => {
                error!("batch existence in index {index} failed, statuses unknown: {err}");
                Ok(HashMap::new())
            }
        }
    }

    /// Writes a document unconditionally (no diff), keyed by its own
    /// identity. Returns false for documents without an identity, for
    /// terminal faults, and for unacknowledged writes.
    pub fn put_document(&self, index: &str, document: &Document) -> StoreResult<bool> {
        let Some(id) = document.doc_id() else {
            warn!("document carries no usable id field, refusing to index it");
            return Ok(false);
        };
        match self.store.replace(index, &id, document) {
            Ok(ack) if ack.acknowledged() => Ok(true),
            Ok(ack) => {
                error!("write of document {id} to index {index} acknowledged as {ack:?}");
                Ok(false)
            }
            Err(err) => terminal_to(
                err,
                false,
                &format!("indexing document {id} in index {index}"),
            ),
        }
    }

    /// Checks whether a single document exists.
    pub fn document_exists(&self, index: &str, id: &DocId) -> StoreResult<bool> {
        match self.store.get(index, id) {
            Ok(found) => Ok(found.is_some()),
            Err(err) => terminal_to(
                err,
                false,
                &format!("checking document {id} in index {index}"),
            ),
        }
    }

    /// Fetches a document by identity; `None` when absent or on a
    /// terminal fault.
    pub fn fetch(&self, index: &str, id: &DocId) -> StoreResult<Option<Document>> {
        match self.store.get(index, id) {
            Ok(found) => Ok(found),
            Err(err) => terminal_to(
                err,
                None,
                &format!("retrieving document {id} from index {index}"),
            ),
        }
    }

    /// Deletes a document by identity. Deleting an absent document is a
    /// success.
    pub fn remove(&self, index: &str, id: &DocId) -> StoreResult<bool> {
        match self.store.delete(index, id) {
            Ok(DeleteAck::Deleted) => {
                info!("document {id} deleted from index {index}");
                Ok(true)
            }
            Ok(DeleteAck::Absent) => {
                info!("document {id} already absent from index {index}");
                Ok(true)
            }
            Ok(DeleteAck::Other(ack)) => {
                warn!("deletion of document {id} from index {index} acknowledged as {ack}");
                Ok(false)
            }
            Err(err) => terminal_to(
                err,
                false,
                &format!("deleting document {id} from index {index}"),
            ),
        }
    }

    /// Counts documents whose `field` exactly matches `value`; `None`
    /// when the count could not be determined.
    pub fn count_by_term(
        &self,
        index: &str,
        field: &str,
        value: &Value,
    ) -> StoreResult<Option<u64>> {
        match self.store.count_by_term(index, field, value) {
            Ok(count) => Ok(Some(count)),
            Err(err) => terminal_to(
                err,
                None,
                &format!("counting documents in index {index} by {field}"),
            ),
        }
    }

    /// Routes a fault per the uniform policy and records failed outcomes.
    fn fail_or_propagate(&self, err: StoreError, context: &str) -> StoreResult<SyncOutcome> {
        match terminal_to(err, SyncOutcome::Failed, context) {
            Ok(outcome) => Ok(self.record(outcome)),
            Err(err) => Err(err),
        }
    }

    fn record(&self, outcome: SyncOutcome) -> SyncOutcome {
        let mut stats = self.stats.write();
        match outcome {
            SyncOutcome::Created => stats.created += 1,
            SyncOutcome::Updated => stats.updated += 1,
            SyncOutcome::Unchanged => stats.unchanged += 1,
            SyncOutcome::Failed => stats.failed += 1,
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        Document::try_from(value).unwrap()
    }

    fn id(s: &str) -> DocId {
        DocId::new(s).unwrap()
    }

    fn engine() -> (Arc<MemoryStore>, SyncEngine<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        (Arc::clone(&store), SyncEngine::from_shared(store))
    }

    #[test]
    fn sync_without_identity_fails_with_zero_remote_calls() {
        let (store, engine) = engine();
        let outcome = engine
            .sync_document("docs", &doc(json!({"title": "orphan"})))
            .unwrap();
        assert_eq!(outcome, SyncOutcome::Failed);
        assert_eq!(store.call_count(), 0);
        assert_eq!(engine.stats().failed, 1);
    }

    #[test]
    fn sync_create_then_unchanged() {
        let (store, engine) = engine();
        let d = doc(json!({"id": 1, "title": "t", "tags": [{"a": 1}, {"b": 2}]}));

        assert_eq!(engine.sync_document("docs", &d).unwrap(), SyncOutcome::Created);
        // get + create
        assert_eq!(store.call_count(), 2);

        // A second sync with reordered content issues no write.
        let same = doc(json!({"tags": [{"b": 2}, {"a": 1}], "title": "t", "id": 1}));
        assert_eq!(
            engine.sync_document("docs", &same).unwrap(),
            SyncOutcome::Unchanged
        );
        assert_eq!(store.call_count(), 3);

        let stats = engine.stats();
        assert_eq!((stats.created, stats.unchanged), (1, 1));
    }

    #[test]
    fn sync_update_on_changed_content_then_unchanged() {
        let (store, engine) = engine();
        let original = doc(json!({"id": 1, "title": "t"}));
        engine.sync_document("docs", &original).unwrap();

        let changed = doc(json!({"id": 1, "title": "t2"}));
        assert_eq!(
            engine.sync_document("docs", &changed).unwrap(),
            SyncOutcome::Updated
        );
        assert_eq!(store.stored("docs", &id("1")).unwrap(), changed);

        assert_eq!(
            engine.sync_document("docs", &changed).unwrap(),
            SyncOutcome::Unchanged
        );
    }

    #[test]
    fn scalar_list_reorder_is_a_real_update() {
        let (_, engine) = engine();
        engine
            .sync_document("docs", &doc(json!({"id": 1, "vals": [1, 2]})))
            .unwrap();
        assert_eq!(
            engine
                .sync_document("docs", &doc(json!({"id": 1, "vals": [2, 1]})))
                .unwrap(),
            SyncOutcome::Updated
        );
    }

    #[test]
    fn transport_fault_during_get_propagates_unmodified() {
        let (store, engine) = engine();
        store.fail_next(StoreError::transport("connection refused"));
        let err = engine
            .sync_document("docs", &doc(json!({"id": 1})))
            .unwrap_err();
        assert!(err.is_retryable());
        // The failure is the caller's to retry; it is not a failed outcome.
        assert_eq!(engine.stats().failed, 0);
    }

    #[test]
    fn timeout_during_write_propagates() {
        let (store, engine) = engine();
        store.seed("docs", doc(json!({"id": 1, "title": "old"})));
        // Let the get succeed, then time out the write.
        store.fail_after(1, StoreError::Timeout);
        let err = engine
            .sync_document("docs", &doc(json!({"id": 1, "title": "new"})))
            .unwrap_err();
        assert!(matches!(err, StoreError::Timeout));
        // The replace never landed.
        assert_eq!(
            store.stored("docs", &id("1")).unwrap(),
            doc(json!({"id": 1, "title": "old"}))
        );
    }

    #[test]
    fn terminal_fault_during_write_is_a_failed_outcome() {
        let (store, engine) = engine();
        store.seed("docs", doc(json!({"id": 1, "title": "old"})));
        store.fail_after(1, StoreError::rejected("mapper_parsing_exception"));
        let outcome = engine
            .sync_document("docs", &doc(json!({"id": 1, "title": "new"})))
            .unwrap();
        assert_eq!(outcome, SyncOutcome::Failed);
        assert_eq!(engine.stats().failed, 1);
    }

    #[test]
    fn terminal_fault_during_get_is_a_failed_outcome() {
        let (store, engine) = engine();
        store.fail_next(StoreError::rejected("bad request"));
        let outcome = engine
            .sync_document("docs", &doc(json!({"id": 1})))
            .unwrap();
        assert_eq!(outcome, SyncOutcome::Failed);
    }

    #[test]
    fn unexpected_fault_propagates() {
        let (store, engine) = engine();
        store.fail_next(StoreError::unexpected("shard exploded"));
        let err = engine
            .sync_document("docs", &doc(json!({"id": 1})))
            .unwrap_err();
        assert_eq!(err.classification(), FaultClass::Unexpected);
    }

    #[test]
    fn batch_exists_empty_input_issues_no_calls() {
        let (store, engine) = engine();
        let result = engine.batch_exists("docs", &[]).unwrap();
        assert!(result.is_empty());
        assert_eq!(store.call_count(), 0);
    }

    #[test]
    fn batch_exists_omits_unknown_ids() {
        let (store, engine) = engine();
        store.seed("docs", doc(json!({"id": "a"})));
        let result = engine.batch_exists("docs", &[id("a"), id("b")]).unwrap();
        assert_eq!(result.get(&id("a")), Some(&true));
        // "b" is unknown: absent from the map, not false.
        assert_eq!(result.get(&id("b")), None);
        assert_eq!(result.len(), 1);
        assert_eq!(store.call_count(), 1);
    }

    #[test]
    fn batch_exists_transient_fault_propagates() {
        let (store, engine) = engine();
        store.fail_next(StoreError::transport("reset"));
        assert!(engine.batch_exists("docs", &[id("a")]).is_err());
    }

    #[test]
    fn batch_exists_other_faults_degrade_to_empty() {
        let (store, engine) = engine();
        store.fail_next(StoreError::unexpected("?"));
        let result = engine.batch_exists("docs", &[id("a")]).unwrap();
        assert!(result.is_empty());

        store.fail_next(StoreError::rejected("bad request"));
        let result = engine.batch_exists("docs", &[id("a")]).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn put_document_blind_upsert() {
        let (store, engine) = engine();
        let d = doc(json!({"id": 5, "title": "t"}));
        assert!(engine.put_document("docs", &d).unwrap());
        assert!(engine.put_document("docs", &d).unwrap());
        assert_eq!(store.stored("docs", &id("5")).unwrap(), d);
        assert!(!engine.put_document("docs", &doc(json!({"x": 1}))).unwrap());
    }

    #[test]
    fn put_document_terminal_fault_is_false() {
        let (store, engine) = engine();
        store.fail_next(StoreError::rejected("strict_dynamic_mapping_exception"));
        assert!(!engine.put_document("docs", &doc(json!({"id": 5}))).unwrap());
    }

    #[test]
    fn document_exists_and_fetch() {
        let (store, engine) = engine();
        store.seed("docs", doc(json!({"id": 9, "title": "t"})));
        assert!(engine.document_exists("docs", &id("9")).unwrap());
        assert!(!engine.document_exists("docs", &id("8")).unwrap());
        assert!(engine.fetch("docs", &id("9")).unwrap().is_some());
        assert!(engine.fetch("docs", &id("8")).unwrap().is_none());
    }

    #[test]
    fn remove_absent_document_is_success() {
        let (store, engine) = engine();
        store.seed("docs", doc(json!({"id": 9})));
        assert!(engine.remove("docs", &id("9")).unwrap());
        assert!(engine.remove("docs", &id("9")).unwrap());
        assert!(store.stored("docs", &id("9")).is_none());
    }

    #[test]
    fn count_by_term_degrades_on_terminal_fault() {
        let (store, engine) = engine();
        store.seed("docs", doc(json!({"id": 1, "lang": "pl"})));
        assert_eq!(
            engine.count_by_term("docs", "lang", &json!("pl")).unwrap(),
            Some(1)
        );
        store.fail_next(StoreError::rejected("unknown field"));
        assert_eq!(
            engine.count_by_term("docs", "lang", &json!("pl")).unwrap(),
            None
        );
    }
}
