//! Bulk sync from a JSON-lines file.

use std::fs;
use std::path::Path;
use syndex_core::Document;
use syndex_engine::{DocumentStore, SyncEngine, SyncOutcome};
use tracing::warn;

/// Syncs every document in `file` (one JSON object per line) into
/// `index`.
///
/// Transient faults abort the run so an outer scheduler can re-invoke it;
/// re-syncing already-converged documents is a no-op.
pub fn run<S: DocumentStore>(
    engine: &SyncEngine<S>,
    index: &str,
    file: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let raw = fs::read_to_string(file)?;

    let (mut created, mut updated, mut unchanged, mut failed) = (0u64, 0u64, 0u64, 0u64);
    for (line_no, line) in raw.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let document = match serde_json::from_str::<serde_json::Value>(line).map(Document::try_from)
        {
            Ok(Ok(document)) => document,
            _ => {
                warn!("line {} is not a JSON object, counting as failed", line_no + 1);
                failed += 1;
                continue;
            }
        };
        match engine.sync_document(index, &document)? {
            SyncOutcome::Created => created += 1,
            SyncOutcome::Updated => updated += 1,
            SyncOutcome::Unchanged => unchanged += 1,
            SyncOutcome::Failed => failed += 1,
        }
    }

    println!(
        "synced into {index}: {created} created, {updated} updated, \
         {unchanged} unchanged, {failed} failed"
    );
    if failed > 0 {
        Err(format!("{failed} documents failed to sync").into())
    } else {
        Ok(())
    }
}
