//! Batch existence check.

use syndex_core::DocId;
use syndex_engine::{DocumentStore, SyncEngine};
use tracing::warn;

/// Resolves existence for the given identities in one round trip.
///
/// Identities the store did not account for print as `unknown`.
pub fn run<S: DocumentStore>(
    engine: &SyncEngine<S>,
    index: &str,
    ids: &[String],
) -> Result<(), Box<dyn std::error::Error>> {
    let ids: Vec<DocId> = ids
        .iter()
        .filter_map(|raw| {
            let id = DocId::new(raw.clone());
            if id.is_none() {
                warn!("skipping empty document id");
            }
            id
        })
        .collect();

    let result = engine.batch_exists(index, &ids)?;
    for id in &ids {
        let status = match result.get(id) {
            Some(true) => "exists",
            Some(false) => "absent",
            None => "unknown",
        };
        println!("{id}\t{status}");
    }
    Ok(())
}
