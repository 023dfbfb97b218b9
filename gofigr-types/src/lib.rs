//! Core value types for the GoFigr client.
//!
//! This crate defines the leaf types shared by the resource model and the
//! HTTP client:
//! - [`ApiId`]: the server-assigned identifier of a remote resource
//! - [`timestamp`]: parsing and formatting of wire timestamps
//!
//! Nothing here performs I/O.

mod ids;
pub mod timestamp;

pub use ids::ApiId;
pub use timestamp::Timestamp;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid API id: {0}")]
    InvalidId(#[from] uuid::Error),

    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),
}
