//! Error taxonomy shared across the workspace.
//!
//! Every fallible domain or state-manager operation returns [`DomainError`].
//! None of these conditions are fatal to the process; each carries a stable
//! wire kind (see [`DomainError::kind`]) so collaborators can serialize the
//! failure without matching on the full enum.

use thiserror::Error;

/// Top-level error for domain and state-manager operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// A referenced house, room, device, or alarm does not exist.
    #[error(transparent)]
    NotFound(#[from] NotFoundError),

    /// An attribute value is outside its allowed domain.
    #[error(transparent)]
    InvalidValue(#[from] InvalidValueError),

    /// An identifier collision, or a second ceiling light in a room.
    #[error(transparent)]
    Duplicate(#[from] DuplicateError),

    /// The house alarm is triggered and the action is not security-related.
    #[error("action refused: house alarm is triggered")]
    AlarmActive,

    /// The caller's role does not permit this operation.
    ///
    /// Permissions are validated by the session layer before a command
    /// reaches the core; this variant exists so the core can still refuse
    /// if that check is somehow bypassed.
    #[error("permission denied: {operation} requires {required}")]
    PermissionDenied {
        operation: &'static str,
        required: &'static str,
    },
}

impl DomainError {
    /// Stable machine-readable kind for wire serialization.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not-found",
            Self::InvalidValue(_) => "invalid-value",
            Self::Duplicate(_) => "duplicate",
            Self::AlarmActive => "alarm-active",
            Self::PermissionDenied { .. } => "permission-denied",
        }
    }
}

/// A referenced entity does not exist.
#[derive(Debug, Error)]
#[error("{entity} {id} not found")]
pub struct NotFoundError {
    /// Entity type name ("House", "Room", "Device", …).
    pub entity: &'static str,
    /// Display form of the missing identifier.
    pub id: String,
}

/// An attribute value is outside its allowed domain.
#[derive(Debug, Error)]
#[error("invalid {field}: {reason}")]
pub struct InvalidValueError {
    /// Field or action the value was destined for.
    pub field: &'static str,
    /// Human-readable rejection reason.
    pub reason: String,
}

/// An identifier or singleton-device collision.
#[derive(Debug, Error)]
#[error("duplicate {entity}: {detail}")]
pub struct DuplicateError {
    /// Entity type name.
    pub entity: &'static str,
    /// What collided.
    pub detail: String,
}
