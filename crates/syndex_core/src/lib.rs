//! # Syndex Core
//!
//! Document model and pure decision logic for syndex.
//!
//! This crate provides:
//! - The [`Document`] type and canonical identity handling ([`DocId`])
//! - Structural, order-insensitive document comparison
//! - The classified fault taxonomy shared by every remote operation
//!
//! Nothing in this crate performs I/O. The remote store collaborator and
//! the sync engine built on top of these types live in `syndex_engine`.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod compare;
mod document;
mod error;

pub use compare::documents_equal;
pub use document::{DocId, Document};
pub use error::{FaultClass, StoreError, StoreResult};
