//! Persistence error types.
//!
//! These never cross a store's public mutation surface: write failures are
//! swallowed (logged, in-memory state stays authoritative). They exist so
//! blob-store implementations report failures in a typed way.

use thiserror::Error;

/// Local durable-storage failures.
#[derive(Debug, Error)]
pub enum PersistError {
    /// Reading a blob failed below the "absent" level (I/O error, not a miss).
    #[error("blob read failed: {0}")]
    Read(String),

    /// Writing a blob failed.
    #[error("blob write failed: {0}")]
    Write(String),

    /// A stored blob did not decode.
    #[error("blob decode failed: {0}")]
    Decode(String),
}

/// Convenience type alias for Results with PersistError.
pub type PersistResult<T> = Result<T, PersistError>;
