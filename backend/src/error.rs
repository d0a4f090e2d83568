//! Error taxonomy for catalog operations

use thiserror::Error;

/// Errors raised by the catalog query layer.
///
/// Store errors (including constraint violations) are passed through
/// untouched so clients see the driver's own message.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Update/delete target does not exist, e.g. "Book not found"
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Update called without an id; raised before touching the store
    #[error("{0} ID is required")]
    MissingId(&'static str),

    /// Rating payload outside the accepted shape
    #[error("Invalid rating: {0}")]
    InvalidRating(&'static str),

    #[error(transparent)]
    Store(#[from] sqlx::Error),
}

pub type CatalogResult<T> = Result<T, CatalogError>;
