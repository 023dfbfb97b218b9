//! Error types for the resource model.

use thiserror::Error;

/// Result type for transport calls.
pub type TransportResult<T> = Result<T, TransportError>;

/// Result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors a [`Transport`](crate::Transport) may raise.
///
/// The model layer never retries; these surface to the caller unchanged.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("not authorized: {0}")]
    NotAuthorized(String),

    #[error("method not allowed: {0}")]
    MethodNotAllowed(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("request to {path} returned {status}: {body}")]
    Status {
        path: String,
        status: u16,
        body: String,
    },

    #[error("network error: {0}")]
    Network(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl TransportError {
    /// Returns true if the service refused the caller (HTTP 403).
    pub fn is_not_authorized(&self) -> bool {
        matches!(self, TransportError::NotAuthorized(_))
    }

    /// Returns the HTTP status this error stands for, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::NotAuthorized(_) => Some(403),
            TransportError::MethodNotAllowed(_) => Some(405),
            TransportError::NotFound(_) => Some(404),
            TransportError::Status { status, .. } => Some(*status),
            TransportError::Network(_) | TransportError::Serialization(_) => None,
        }
    }
}

/// Errors that can occur in model operations.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A precondition of the call was not met.
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("{entity_type} has no field named `{field}`")]
    UnknownField { entity_type: String, field: String },

    #[error("unknown entity type: {0}")]
    UnknownEntityType(String),

    #[error("{0} has no API id; create() it first")]
    MissingId(String),

    #[error("{entity_type} {api_id} already exists; use update to save it instead")]
    AlreadyExists { entity_type: String, api_id: String },

    #[error("collection is read-only; cannot create a new {0}")]
    ReadOnlyCollection(String),

    #[error("no entity matches {criteria}")]
    NotFound { criteria: String },

    #[error("expected exactly one entity matching {criteria}, found {count}")]
    Ambiguous { criteria: String, count: usize },

    #[error("field `{field}` expects {expected}, got {actual}")]
    TypeMismatch {
        field: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("{0} does not support sharing")]
    NotShareable(String),

    #[error("cannot decode payload as {encoding}: {reason}")]
    Encoding { encoding: String, reason: String },

    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("invalid value: {0}")]
    InvalidValue(#[from] gofigr_types::Error),

    #[error("table error: {0}")]
    Table(#[from] csv::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ModelError {
    /// Returns true for errors raised locally, before any network call, because
    /// the caller asked for something the model forbids.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            ModelError::Validation(_)
                | ModelError::UnknownField { .. }
                | ModelError::MissingId(_)
                | ModelError::AlreadyExists { .. }
                | ModelError::ReadOnlyCollection(_)
                | ModelError::NotFound { .. }
                | ModelError::TypeMismatch { .. }
        )
    }

    /// Returns true if the service refused the caller.
    pub fn is_not_authorized(&self) -> bool {
        matches!(self, ModelError::Transport(e) if e.is_not_authorized())
    }

    /// Returns the underlying transport error, if this is one.
    pub fn as_transport(&self) -> Option<&TransportError> {
        match self {
            ModelError::Transport(e) => Some(e),
            _ => None,
        }
    }
}
