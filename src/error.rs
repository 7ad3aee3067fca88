//! Error taxonomy shared by the boundary layers.
//!
//! Stores report a missing id through `Option` or `bool`; these errors are
//! produced where external input is converted or validated.

use std::fmt;

use thiserror::Error;

/// The kind of entity an id refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    User,
    Task,
    Project,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Entity::User => "User",
            Entity::Task => "Task",
            Entity::Project => "Project",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaskError {
    /// An id did not resolve in its store.
    #[error("{entity} not found")]
    NotFound { entity: Entity, id: u64 },

    /// A value that must be unique is already registered.
    #[error("{field} already exists")]
    Duplicate { field: &'static str, value: String },

    /// An unrecognised status string or priority ordinal.
    #[error("Invalid {kind}: {value}")]
    InvalidEnumValue { kind: &'static str, value: String },

    /// A required field was empty or out of bounds.
    #[error("{message}")]
    InvalidInput { field: &'static str, message: String },
}

impl TaskError {
    pub fn not_found(entity: Entity, id: u64) -> Self {
        TaskError::NotFound { entity, id }
    }

    pub fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        TaskError::InvalidInput {
            field,
            message: message.into(),
        }
    }

    /// HTTP-style status code for the response envelope.
    pub fn code(&self) -> u16 {
        match self {
            TaskError::NotFound { .. } => 404,
            TaskError::Duplicate { .. }
            | TaskError::InvalidEnumValue { .. }
            | TaskError::InvalidInput { .. } => 400,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        assert_eq!(TaskError::not_found(Entity::Task, 7).code(), 404);
        assert_eq!(TaskError::invalid("title", "Title is required").code(), 400);
        assert_eq!(
            TaskError::Duplicate { field: "Email", value: "a@b.io".into() }.code(),
            400
        );
    }

    #[test]
    fn test_messages() {
        assert_eq!(TaskError::not_found(Entity::User, 3).to_string(), "User not found");
        assert_eq!(
            TaskError::InvalidEnumValue { kind: "status", value: "nope".into() }.to_string(),
            "Invalid status: nope"
        );
        assert_eq!(
            TaskError::Duplicate { field: "Email", value: "a@b.io".into() }.to_string(),
            "Email already exists"
        );
    }
}
