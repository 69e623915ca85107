//! Term-match document count.

use serde_json::Value;
use syndex_engine::{DocumentStore, SyncEngine};

/// Counts documents whose `field` matches `value`. The value is taken as
/// JSON when it parses, as a bare string otherwise.
pub fn run<S: DocumentStore>(
    engine: &SyncEngine<S>,
    index: &str,
    field: &str,
    value: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let value: Value =
        serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    match engine.count_by_term(index, field, &value)? {
        Some(count) => {
            println!("{count}");
            Ok(())
        }
        None => Err(format!("count in index {index} could not be determined").into()),
    }
}
