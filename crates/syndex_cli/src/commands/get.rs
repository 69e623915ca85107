//! Single-document fetch.

use syndex_core::DocId;
use syndex_engine::{DocumentStore, SyncEngine};

/// Prints a document by identity.
pub fn run<S: DocumentStore>(
    engine: &SyncEngine<S>,
    index: &str,
    id: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let id = DocId::new(id).ok_or("document id must not be empty")?;
    match engine.fetch(index, &id)? {
        Some(document) => {
            println!("{}", serde_json::to_string_pretty(document.fields())?);
            Ok(())
        }
        None => Err(format!("document {id} not found in index {index}").into()),
    }
}
