//! Ingestion-cursor queries.

use syndex_engine::{DocumentStore, SyncEngine};

/// Prints the largest identity and, when a field is given, its most
/// recent value. The two may come from different documents.
pub fn run<S: DocumentStore>(
    engine: &SyncEngine<S>,
    index: &str,
    field: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    match field {
        Some(field) => {
            let (largest, latest) = engine.latest_state(index, field)?;
            println!("largest id: {largest}");
            match latest {
                Some(value) => println!("latest {field}: {value}"),
                None => println!("latest {field}: (none)"),
            }
        }
        None => {
            println!("largest id: {}", engine.largest_id(index)?);
        }
    }
    Ok(())
}
