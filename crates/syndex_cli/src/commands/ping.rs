//! Connection check.

use syndex_engine::DocumentStore;

/// Pings the store and reports reachability.
pub fn run<S: DocumentStore>(store: &S) -> Result<(), Box<dyn std::error::Error>> {
    if syndex_engine::check_connection(store) {
        println!("document store is reachable");
        Ok(())
    } else {
        Err("document store is unreachable".into())
    }
}
