//! Error types for the persistent map collaborator

use thiserror::Error;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Failures raised by a store environment or an open store handle
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing file could not be opened or created
    #[error("failed to open store {id:?}: {source}")]
    Open {
        /// Store identifier
        id: String,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },

    /// A mutation could not be made durable
    #[error("write failed for store {id:?}: {source}")]
    Write {
        /// Store identifier
        id: String,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },

    /// The backing file failed its integrity check
    #[error("store {id:?} is corrupted: {detail}")]
    Corrupted {
        /// Store identifier
        id: String,
        /// What the integrity check found
        detail: String,
    },
}

impl StoreError {
    /// Create an open failure
    pub fn open_failed(id: impl Into<String>, source: std::io::Error) -> Self {
        Self::Open {
            id: id.into(),
            source,
        }
    }

    /// Create a write failure
    pub fn write_failed(id: impl Into<String>, source: std::io::Error) -> Self {
        Self::Write {
            id: id.into(),
            source,
        }
    }

    /// Create a corruption error
    pub fn corrupted(id: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Corrupted {
            id: id.into(),
            detail: detail.into(),
        }
    }
}
