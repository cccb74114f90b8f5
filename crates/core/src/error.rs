//! Entity-level error model.

use thiserror::Error;

/// Result type used across the core layer.
pub type EntityResult<T> = Result<T, EntityError>;

/// Entity-level error.
///
/// Covers failures that happen while inspecting a managed object (snapshotting,
/// decoding a raw record, parsing an identity). Lifecycle and persistence failures
/// belong to the infrastructure layer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EntityError {
    /// The object could not be captured as a field snapshot.
    #[error("snapshot failed for {entity_type}: {reason}")]
    Snapshot {
        entity_type: &'static str,
        reason: String,
    },

    /// A raw record could not be decoded into the entity type.
    #[error("decode failed for {entity_type}: {reason}")]
    Decode {
        entity_type: &'static str,
        reason: String,
    },

    /// The object is mutably borrowed elsewhere and cannot be inspected.
    #[error("object {entity_type} is already mutably borrowed")]
    Borrowed { entity_type: &'static str },

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identity: {0}")]
    InvalidIdentity(String),
}

impl EntityError {
    pub fn snapshot(entity_type: &'static str, reason: impl ToString) -> Self {
        Self::Snapshot {
            entity_type,
            reason: reason.to_string(),
        }
    }

    pub fn decode(entity_type: &'static str, reason: impl ToString) -> Self {
        Self::Decode {
            entity_type,
            reason: reason.to_string(),
        }
    }

    pub fn invalid_identity(msg: impl Into<String>) -> Self {
        Self::InvalidIdentity(msg.into())
    }
}
