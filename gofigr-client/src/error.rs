//! Client error types.

use gofigr_model::{ModelError, TransportError};
use thiserror::Error;

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors that can occur while configuring or using the client.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// The account owns no primary workspace, or none it can see.
    #[error("no primary workspace owned by `{0}`")]
    NoPrimaryWorkspace(String),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid base64: {0}")]
    Decode(#[from] base64::DecodeError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ClientError {
    /// Returns true if the service refused the caller, at either layer.
    pub fn is_not_authorized(&self) -> bool {
        match self {
            ClientError::Model(e) => e.is_not_authorized(),
            ClientError::Transport(e) => e.is_not_authorized(),
            _ => false,
        }
    }
}
