//! Fault taxonomy for remote store operations.
//!
//! Every failure raised by the store collaborator is classified so that
//! callers can pattern-match the classification instead of inspecting
//! error text: transient faults are re-raised for an outer retry layer,
//! terminal faults are logged and converted to failed outcomes, and
//! unrecognized faults are always propagated.
//!
//! Absence of a document is not a fault. Lookups report it as an explicit
//! `None`/ack variant, never through this type.

use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Classification of a store fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultClass {
    /// The same operation may succeed if reattempted unchanged.
    Retryable,
    /// Reattempting the identical operation will fail identically.
    Terminal,
    /// Not recognized; must surface to operational monitoring.
    Unexpected,
}

/// A classified failure from the remote document store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Connectivity or transport-level failure. Retryable.
    #[error("transport failure: {message}")]
    Transport {
        /// Description of the transport fault.
        message: String,
    },

    /// The operation timed out. Retryable.
    #[error("store operation timed out")]
    Timeout,

    /// The store rejected the request as malformed (schema violation,
    /// conflicting document structure). Terminal.
    #[error("request rejected by the store: {message}")]
    Rejected {
        /// The store's rejection reason.
        message: String,
    },

    /// A failure outside the known taxonomy.
    #[error("unexpected store failure: {message}")]
    Unexpected {
        /// Description of the failure.
        message: String,
    },
}

impl StoreError {
    /// Creates a retryable transport error.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Creates a terminal rejection error.
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected {
            message: message.into(),
        }
    }

    /// Creates an unexpected error.
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected {
            message: message.into(),
        }
    }

    /// Returns the fault classification.
    #[must_use]
    pub fn classification(&self) -> FaultClass {
        match self {
            StoreError::Transport { .. } | StoreError::Timeout => FaultClass::Retryable,
            StoreError::Rejected { .. } => FaultClass::Terminal,
            StoreError::Unexpected { .. } => FaultClass::Unexpected,
        }
    }

    /// Returns true if this fault can be retried unchanged.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.classification() == FaultClass::Retryable
    }
}
