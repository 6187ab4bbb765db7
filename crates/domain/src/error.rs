//! Common error types used across the workspace.
//!
//! Every failure of the synchronization protocol is recoverable: callers log
//! it and move on. Each layer defines its own typed errors and converts into
//! [`PanelError`] via `#[from]`.

use crate::entity::EntityKind;

/// Top-level error of the iopanel core.
#[derive(Debug, thiserror::Error)]
pub enum PanelError {
    /// The inbound payload is not a well-formed command object.
    #[error("malformed message")]
    MalformedMessage(#[from] MalformedMessageError),

    /// The payload is an object but carries none of the known command fields.
    #[error("unrecognized command")]
    UnrecognizedCommand,

    /// The command targets an entity that was never declared.
    #[error("unknown entity")]
    UnknownEntity(#[from] UnknownEntityError),

    /// A declaration violates a domain invariant.
    #[error("validation error")]
    Validation(#[from] ValidationError),

    /// The physical output driver rejected a write.
    #[error("output driver error")]
    Driver(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Details about why an inbound payload could not be decoded.
#[derive(Debug, thiserror::Error)]
pub enum MalformedMessageError {
    /// The payload is not valid JSON.
    #[error("payload is not valid JSON")]
    Json(#[from] serde_json::Error),

    /// The payload is valid JSON but not an object.
    #[error("payload is not a JSON object")]
    NotAnObject,

    /// A command field is present but its value cannot be used.
    #[error("field `{field}` has an invalid value")]
    InvalidField {
        /// Wire name of the offending field.
        field: &'static str,
    },

    /// A command requires a companion field that is absent.
    #[error("field `{field}` is missing")]
    MissingField {
        /// Wire name of the missing field.
        field: &'static str,
    },
}

/// Lookup miss in the output registry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} `{id}` is not declared")]
pub struct UnknownEntityError {
    pub kind: EntityKind,
    pub id: String,
}

/// Declaration-time invariant violations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("analog range must satisfy min < max, got [{min}, {max}]")]
    InvalidRange { min: i64, max: i64 },

    #[error("name must not be empty")]
    EmptyName,

    #[error("token must not be empty")]
    EmptyToken,

    #[error("{kind} `{id}` is declared more than once")]
    Duplicate { kind: EntityKind, id: String },

    #[error("button `{0}` is bound more than once")]
    DuplicateButton(String),

    #[error("pin {0} is bound to more than one entity")]
    PinConflict(u8),

    #[error("PWM resolution must be non-zero")]
    ZeroResolution,
}
