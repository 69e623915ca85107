//! The remote document-store collaborator interface.
//!
//! Abstracts the network layer so the engine can run against different
//! backends (a REST store, an in-memory store for tests). Every method is
//! a single blocking request/response; every failure is a classified
//! [`StoreError`]. Absence is reported in-band (`Option`, ack variants),
//! never as an error.

use serde_json::Value;
use syndex_core::{DocId, Document, StoreResult};

/// Acknowledgment of a write operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteAck {
    /// The store created a new document.
    Created,
    /// The store replaced an existing document.
    Updated,
    /// Any other acknowledgment (e.g. "noop"). Not a success for sync.
    Other(String),
}

impl WriteAck {
    /// True when the write took effect as a create or an update.
    #[must_use]
    pub fn acknowledged(&self) -> bool {
        matches!(self, WriteAck::Created | WriteAck::Updated)
    }

    /// Parses a store result string ("created", "updated", ...).
    pub fn from_result(result: &str) -> Self {
        match result {
            "created" => WriteAck::Created,
            "updated" => WriteAck::Updated,
            other => WriteAck::Other(other.to_string()),
        }
    }
}

/// Acknowledgment of a delete operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteAck {
    /// The document existed and was removed.
    Deleted,
    /// The document was not there to begin with.
    Absent,
    /// Any other acknowledgment.
    Other(String),
}

/// One entry of a multi-get response.
///
/// The store may omit entries for IDs it cannot account for; an omitted
/// entry means "unknown", not "absent".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultiGetEntry {
    /// Canonical identity of the document.
    pub id: DocId,
    /// Whether the store holds a document under that identity.
    pub found: bool,
}

/// Sort direction for search queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Smallest value first.
    Ascending,
    /// Largest value first.
    Descending,
}

impl SortOrder {
    /// Wire name of the order ("asc"/"desc").
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Ascending => "asc",
            SortOrder::Descending => "desc",
        }
    }
}

/// Which source fields a search should return.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceFilter {
    /// Return the full document source.
    All,
    /// Return no source at all (identity-only queries).
    Omit,
    /// Return only the named fields (dotted paths allowed).
    Fields(Vec<String>),
}

/// A single search hit.
#[derive(Debug, Clone, PartialEq)]
pub struct Hit {
    /// Identity of the matching document.
    pub id: DocId,
    /// The (possibly filtered) source, when requested.
    pub source: Option<Document>,
}

/// Blocking interface to the remote document store.
///
/// Implementations own connection handling; the engine receives a store by
/// injection and never reaches for ambient global state.
pub trait DocumentStore: Send + Sync {
    /// Fetches a document by identity. `None` means the document (or the
    /// whole index) does not exist.
    fn get(&self, index: &str, id: &DocId) -> StoreResult<Option<Document>>;

    /// Writes a document that is not expected to exist yet.
    fn create(&self, index: &str, id: &DocId, document: &Document) -> StoreResult<WriteAck>;

    /// Replaces a document with a full new body (not a partial patch).
    fn replace(&self, index: &str, id: &DocId, document: &Document) -> StoreResult<WriteAck>;

    /// Resolves existence for many identities in one round trip.
    ///
    /// Entries may be omitted for identities the store cannot account for.
    fn multi_get(&self, index: &str, ids: &[DocId]) -> StoreResult<Vec<MultiGetEntry>>;

    /// Runs a sorted query and returns the top `size` hits.
    ///
    /// A missing index yields an empty hit list, not an error.
    fn search(
        &self,
        index: &str,
        sort_field: &str,
        order: SortOrder,
        size: usize,
        source: &SourceFilter,
    ) -> StoreResult<Vec<Hit>>;

    /// Counts documents whose `field` exactly matches `value`.
    fn count_by_term(&self, index: &str, field: &str, value: &Value) -> StoreResult<u64>;

    /// Deletes a document by identity.
    fn delete(&self, index: &str, id: &DocId) -> StoreResult<DeleteAck>;

    /// Checks that the store is reachable and answering.
    fn ping(&self) -> StoreResult<bool>;

    /// Checks whether an index exists.
    fn index_exists(&self, index: &str) -> StoreResult<bool>;

    /// Creates an index with the given settings body.
    fn create_index(&self, index: &str, settings: &Value) -> StoreResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_ack_parsing() {
        assert_eq!(WriteAck::from_result("created"), WriteAck::Created);
        assert_eq!(WriteAck::from_result("updated"), WriteAck::Updated);
        assert_eq!(
            WriteAck::from_result("noop"),
            WriteAck::Other("noop".into())
        );
    }

    #[test]
    fn write_ack_acknowledged() {
        assert!(WriteAck::Created.acknowledged());
        assert!(WriteAck::Updated.acknowledged());
        assert!(!WriteAck::Other("noop".into()).acknowledged());
    }

    #[test]
    fn sort_order_wire_names() {
        assert_eq!(SortOrder::Ascending.as_str(), "asc");
        assert_eq!(SortOrder::Descending.as_str(), "desc");
    }
}
