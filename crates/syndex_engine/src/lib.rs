//! # Syndex Engine
//!
//! Idempotent synchronization between a canonical document source and a
//! remote search index.
//!
//! This crate provides:
//! - The [`DocumentStore`] collaborator interface and acknowledgment types
//! - [`SyncEngine`]: diff-based upsert (`sync_document`), batch existence,
//!   ingestion cursors, and single-document passthroughs
//! - A REST transport over an abstract [`HttpClient`]
//! - [`MemoryStore`], a full in-memory store for tests
//! - Index administration helpers
//!
//! ## Key invariants
//!
//! - A document without a usable identity is rejected before any remote call
//! - At most one write is issued per sync operation, and only after the
//!   current remote state has been established
//! - Transient and unexpected faults always propagate; terminal faults are
//!   logged and folded into failed outcomes
//! - The engine never retries internally; operations are idempotent so an
//!   outer retry layer can always re-invoke them whole

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod admin;
mod config;
mod cursor;
mod engine;
mod memory;
mod rest;
mod store;

pub use admin::{check_connection, ensure_index, IndexStatus};
pub use config::StoreConfig;
pub use engine::{SyncEngine, SyncOutcome, SyncStats};
pub use memory::MemoryStore;
pub use rest::{HttpClient, HttpError, HttpResponse, LoopbackClient, LoopbackServer, Method, RestStore};
pub use store::{
    DeleteAck, DocumentStore, Hit, MultiGetEntry, SortOrder, SourceFilter, WriteAck,
};
