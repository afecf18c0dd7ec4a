//! Error types for the Ontosync domain model.

use thiserror::Error;

/// Result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors raised by local model validation and identifier parsing.
///
/// None of these involve the network; they are produced before any
/// remote call is issued.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    /// The string could not be recognized as an entity identifier.
    #[error("not a recognized entity identifier: {given}")]
    InvalidId {
        /// The offending input.
        given: String,
    },

    /// A new entity was submitted without a label.
    #[error("entity needs a label")]
    MissingLabel,

    /// The entity kind string is not in the controlled vocabulary.
    #[error("unknown entity kind: {given}")]
    UnknownKind {
        /// The offending input.
        given: String,
    },

    /// A synonym record has an empty literal.
    #[error("synonym for {label:?} has an empty literal")]
    EmptySynonym {
        /// Label of the entity being validated.
        label: String,
    },

    /// An external-identifier record is missing a required field.
    #[error("existing id for {label:?} is missing {field}")]
    IncompleteExistingId {
        /// Label of the entity being validated.
        label: String,
        /// Name of the missing field.
        field: &'static str,
    },
}

impl ModelError {
    /// Creates an invalid-identifier error.
    pub fn invalid_id(given: impl Into<String>) -> Self {
        Self::InvalidId {
            given: given.into(),
        }
    }

    /// Creates an unknown-kind error.
    pub fn unknown_kind(given: impl Into<String>) -> Self {
        Self::UnknownKind {
            given: given.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = ModelError::invalid_id("XYZ:123");
        assert_eq!(
            err.to_string(),
            "not a recognized entity identifier: XYZ:123"
        );

        let err = ModelError::IncompleteExistingId {
            label: "brain".into(),
            field: "curie",
        };
        assert!(err.to_string().contains("curie"));
    }
}
