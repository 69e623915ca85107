//! Single-document deletion.

use syndex_core::DocId;
use syndex_engine::{DocumentStore, SyncEngine};

/// Deletes a document by identity; deleting an absent document succeeds.
pub fn run<S: DocumentStore>(
    engine: &SyncEngine<S>,
    index: &str,
    id: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let id = DocId::new(id).ok_or("document id must not be empty")?;
    if engine.remove(index, &id)? {
        println!("document {id} deleted from index {index}");
        Ok(())
    } else {
        Err(format!("document {id} could not be deleted from index {index}").into())
    }
}
