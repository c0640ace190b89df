//! Catalog fetch error types.

use thiserror::Error;

/// Failures surfaced by a [`crate::client::CatalogClient`].
///
/// `Cancelled` is internal machinery: loaders use it to mark abandoned
/// work and never surface it to a subscriber - a cancelled load leaves the
/// previously published state untouched.
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    /// Network or I/O failure between us and the catalog.
    #[error("transport failure: {0}")]
    Transport(String),

    /// The catalog answered with something we could not decode.
    #[error("malformed catalog response: {0}")]
    Decode(String),

    /// The catalog has no record under this id.
    #[error("product {0} not found")]
    NotFound(i64),

    /// The fetch was abandoned by its dispatcher.
    #[error("fetch cancelled")]
    Cancelled,
}

/// Convenience type alias for Results with FetchError.
pub type FetchResult<T> = Result<T, FetchError>;
