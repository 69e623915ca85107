//! Ingestion-cursor queries.
//!
//! Ingestion pipelines decide what to sync next from two signals: the
//! largest identity in the index and the most recent value of a chosen
//! field. Both are top-1 descending queries; an empty index yields a
//! defined default, never a fault.

use crate::engine::{terminal_to, SyncEngine};
use crate::store::{DocumentStore, SortOrder, SourceFilter};
use serde_json::Value;
use syndex_core::StoreResult;
use tracing::warn;

impl<S: DocumentStore> SyncEngine<S> {
    /// The largest numeric identity in the index, or 0 when the index is
    /// empty (or its top identity is not numeric).
    pub fn largest_id(&self, index: &str) -> StoreResult<u64> {
        let hits = match self.store().search(
            index,
            "id",
            SortOrder::Descending,
            1,
            &SourceFilter::Omit,
        ) {
            Ok(hits) => hits,
            Err(err) => {
                return terminal_to(err, 0, &format!("querying largest id in index {index}"))
            }
        };
        Ok(match hits.first() {
            None => 0,
            Some(hit) => hit.id.as_u64().unwrap_or_else(|| {
                warn!("top identity {} in index {index} is not numeric", hit.id);
                0
            }),
        })
    }

    /// The most recent value of `field` (dotted paths allowed), or `None`
    /// when no document carries it.
    pub fn latest_value(&self, index: &str, field: &str) -> StoreResult<Option<Value>> {
        let filter = SourceFilter::Fields(vec![field.to_string()]);
        let hits = match self
            .store()
            .search(index, field, SortOrder::Descending, 1, &filter)
        {
            Ok(hits) => hits,
            Err(err) => {
                return terminal_to(
                    err,
                    None,
                    &format!("querying latest {field} in index {index}"),
                )
            }
        };
        Ok(hits
            .into_iter()
            .next()
            .and_then(|hit| hit.source)
            .and_then(|source| source.field_path(field).cloned()))
    }

    /// Both cursors in one operation.
    ///
    /// The halves are resolved independently and may come from two
    /// different documents: the document with the highest identity need
    /// not be the one with the latest field value.
    pub fn latest_state(&self, index: &str, field: &str) -> StoreResult<(u64, Option<Value>)> {
        let largest = self.largest_id(index)?;
        let latest = self.latest_value(index, field)?;
        Ok((largest, latest))
    }
}
