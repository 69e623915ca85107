//! Index administration.
//!
//! Startup-time concerns: checking that the store answers at all and
//! making sure the target index exists with the intended settings.
//! These absorb every fault into their return value — callers branch,
//! they don't catch.

use crate::store::DocumentStore;
use serde_json::Value;
use std::fs;
use std::path::Path;
use syndex_core::StoreError;
use tracing::{error, info, warn};

/// Result of an [`ensure_index`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexStatus {
    /// The index was created.
    Created,
    /// The index was already there; nothing was done.
    AlreadyExists,
    /// The index could not be created.
    Failed,
}

/// Creates `index` from a JSON settings file unless it already exists.
///
/// A concurrent creator winning the race is reported as
/// [`IndexStatus::AlreadyExists`], not a failure.
pub fn ensure_index<S: DocumentStore>(store: &S, index: &str, settings_path: &Path) -> IndexStatus {
    match store.index_exists(index) {
        Ok(true) => {
            info!("index {index} already exists");
            return IndexStatus::AlreadyExists;
        }
        Ok(false) => {}
        Err(err) => {
            warn!("could not check whether index {index} exists: {err}");
            return IndexStatus::Failed;
        }
    }

    let raw = match fs::read_to_string(settings_path) {
        Ok(raw) => raw,
        Err(err) => {
            error!("settings file {} unreadable: {err}", settings_path.display());
            return IndexStatus::Failed;
        }
    };
    let settings: Value = match serde_json::from_str(&raw) {
        Ok(settings) => settings,
        Err(err) => {
            error!(
                "settings file {} is not valid JSON: {err}",
                settings_path.display()
            );
            return IndexStatus::Failed;
        }
    };

    match store.create_index(index, &settings) {
        Ok(()) => {
            info!("created index {index}");
            IndexStatus::Created
        }
        Err(StoreError::Rejected { message }) if message.contains("resource_already_exists") => {
            info!("index {index} already exists");
            IndexStatus::AlreadyExists
        }
        Err(err) if err.is_retryable() => {
            warn!("transient fault while creating index {index}: {err}");
            IndexStatus::Failed
        }
        Err(err) => {
            error!("failed to create index {index}: {err}");
            IndexStatus::Failed
        }
    }
}

/// Checks that the store is reachable, absorbing every fault into a
/// boolean.
pub fn check_connection<S: DocumentStore>(store: &S) -> bool {
    match store.ping() {
        Ok(true) => {
            info!("successfully connected to the document store");
            true
        }
        Ok(false) => {
            warn!("document store did not answer the ping");
            false
        }
        Err(err) => {
            error!("could not reach the document store: {err}");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use serde_json::json;
    use std::io::Write;
    use syndex_core::StoreError;

    fn settings_file(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn creates_missing_index_from_settings() {
        let store = MemoryStore::new();
        let file = settings_file(r#"{"settings": {"number_of_shards": 1}}"#);
        assert_eq!(
            ensure_index(&store, "docs", file.path()),
            IndexStatus::Created
        );
        assert_eq!(
            store.index_settings("docs").unwrap(),
            json!({"settings": {"number_of_shards": 1}})
        );
    }

    #[test]
    fn existing_index_is_left_alone() {
        let store = MemoryStore::new();
        store.create_index("docs", &json!({})).unwrap();
        let calls_before = store.call_count();
        let file = settings_file("{}");
        assert_eq!(
            ensure_index(&store, "docs", file.path()),
            IndexStatus::AlreadyExists
        );
        // Only the existence check; no create call.
        assert_eq!(store.call_count(), calls_before + 1);
    }

    #[test]
    fn lost_creation_race_counts_as_already_exists() {
        let store = MemoryStore::new();
        let file = settings_file("{}");
        // The existence check says no, then another creator wins.
        store.fail_after(
            1,
            StoreError::rejected("resource_already_exists_exception: index [docs]"),
        );
        assert_eq!(
            ensure_index(&store, "docs", file.path()),
            IndexStatus::AlreadyExists
        );
    }

    #[test]
    fn unreadable_or_invalid_settings_fail_before_any_create() {
        let store = MemoryStore::new();
        assert_eq!(
            ensure_index(&store, "docs", Path::new("/nonexistent/settings.json")),
            IndexStatus::Failed
        );
        // Existence check only.
        assert_eq!(store.call_count(), 1);

        let file = settings_file("not json at all");
        assert_eq!(
            ensure_index(&store, "docs", file.path()),
            IndexStatus::Failed
        );
    }

    #[test]
    fn connection_check_absorbs_faults() {
        let store = MemoryStore::new();
        assert!(check_connection(&store));
        store.fail_next(StoreError::transport("refused"));
        assert!(!check_connection(&store));
    }
}
