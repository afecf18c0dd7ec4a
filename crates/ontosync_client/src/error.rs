//! Error types for client operations.

use ontosync_model::ModelError;
use ontosync_protocol::ProtocolError;
use thiserror::Error;

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors that can occur during client operations.
#[derive(Error, Debug)]
pub enum ClientError {
    /// A local input failed shape validation; nothing touched the network.
    #[error("invalid entity shape: {0}")]
    InvalidEntityShape(#[from] ModelError),

    /// An entity referenced by another record could not be resolved.
    #[error("referenced entity not found: {reference}")]
    ReferenceNotFound {
        /// The identifier that failed to resolve.
        reference: String,
    },

    /// The directly requested entity does not exist.
    #[error("entity does not exist: {id}")]
    EntityDoesNotExist {
        /// The identifier that was requested.
        id: String,
    },

    /// The label already exists in the store and does not belong to the
    /// submitting account.
    #[error("label {label:?} already exists under another account")]
    AlreadyExists {
        /// The colliding label.
        label: String,
    },

    /// No API key configured.
    #[error("no api key configured")]
    MissingApiKey,

    /// The server rejected the API key.
    #[error("api key was rejected by the server")]
    IncorrectApiKey,

    /// The host requires basic-auth credentials that were not supplied.
    #[error("host {host} requires basic-auth credentials")]
    IncorrectAuth {
        /// The host that demands credentials.
        host: String,
    },

    /// The server answered with something the protocol layer could not
    /// make sense of.
    #[error("bad response: {0}")]
    BadResponse(#[from] ProtocolError),

    /// The server understood the call and refused it.
    #[error("server rejected call (status {status}): {detail}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Server-reported detail.
        detail: String,
    },

    /// Network or transport error.
    #[error("transport error: {message}")]
    Transport {
        /// Error message.
        message: String,
        /// Whether the operation can be retried.
        retryable: bool,
    },
}

impl ClientError {
    /// Creates a retryable transport error.
    pub fn transport_retryable(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            retryable: true,
        }
    }

    /// Creates a non-retryable transport error.
    pub fn transport_fatal(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            retryable: false,
        }
    }

    /// Creates a rejection error from a server status and detail.
    pub fn rejected(status: u16, detail: impl Into<String>) -> Self {
        Self::Rejected {
            status,
            detail: detail.into(),
        }
    }

    /// Returns true if this error can be retried.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::Transport { retryable, .. } => *retryable,
            ClientError::Rejected { status, .. } => *status >= 500,
            _ => false,
        }
    }
}
