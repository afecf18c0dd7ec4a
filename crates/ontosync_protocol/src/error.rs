//! Error types for protocol decoding.

use thiserror::Error;

/// Result type for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Errors raised while decoding or normalizing wire payloads.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The payload was not valid JSON or did not match any known shape.
    #[error("malformed payload: {message}")]
    Malformed {
        /// Description of what failed to decode.
        message: String,
    },

    /// A record was decoded but is missing a field the caller requires.
    #[error("incomplete record: missing {field}")]
    IncompleteRecord {
        /// Name of the missing field.
        field: &'static str,
    },

    /// An identifier inside a payload failed to normalize.
    #[error(transparent)]
    Model(#[from] ontosync_model::ModelError),
}

impl ProtocolError {
    /// Creates a malformed-payload error.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed {
            message: message.into(),
        }
    }
}
