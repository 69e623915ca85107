//! Index creation.

use std::path::Path;
use syndex_engine::{DocumentStore, IndexStatus};

/// Creates the index from a settings file unless it already exists.
pub fn run<S: DocumentStore>(
    store: &S,
    index: &str,
    settings: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    match syndex_engine::ensure_index(store, index, settings) {
        IndexStatus::Created => {
            println!("created index {index}");
            Ok(())
        }
        IndexStatus::AlreadyExists => {
            println!("index {index} already exists");
            Ok(())
        }
        IndexStatus::Failed => Err(format!("could not create index {index}").into()),
    }
}
