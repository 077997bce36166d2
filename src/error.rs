//! Structured error types for engine operations.

use crate::types::Permission;
use serde::Serialize;
use thiserror::Error;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Validation errors
    MissingRequiredField,
    InvalidState,

    // Not found errors
    WorkbasketNotFound,
    AccessItemNotFound,

    // Authorization errors
    NotAuthorized,

    // Internal errors
    DatabaseError,
    MigrationError,
    ConfigError,
}

/// Errors surfaced by the engine and its managers.
///
/// Persistence failures are passed through unchanged; the engine performs no
/// retries or local recovery.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Workbasket not found: {0}")]
    WorkbasketNotFound(String),

    #[error("Access item not found: {0}")]
    AccessItemNotFound(String),

    #[error("Principal {principal} lacks {permission} permission on workbasket {workbasket_id}")]
    NotAuthorized {
        principal: String,
        workbasket_id: String,
        permission: Permission,
    },

    #[error("Invalid connection state: {0}")]
    InvalidState(String),

    #[error("{0} is required")]
    MissingField(&'static str),

    #[error(transparent)]
    Persistence(#[from] rusqlite::Error),

    #[error("Migration failed: {0}")]
    Migration(#[from] refinery::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl EngineError {
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState(message.into())
    }

    pub fn not_authorized(principal: &str, workbasket_id: &str, permission: Permission) -> Self {
        Self::NotAuthorized {
            principal: principal.to_string(),
            workbasket_id: workbasket_id.to_string(),
            permission,
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            Self::WorkbasketNotFound(_) => ErrorCode::WorkbasketNotFound,
            Self::AccessItemNotFound(_) => ErrorCode::AccessItemNotFound,
            Self::NotAuthorized { .. } => ErrorCode::NotAuthorized,
            Self::InvalidState(_) => ErrorCode::InvalidState,
            Self::MissingField(_) => ErrorCode::MissingRequiredField,
            Self::Persistence(_) => ErrorCode::DatabaseError,
            Self::Migration(_) => ErrorCode::MigrationError,
            Self::Config(_) => ErrorCode::ConfigError,
        }
    }

    /// True for both workbasket and access item lookups that matched nothing.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::WorkbasketNotFound(_) | Self::AccessItemNotFound(_)
        )
    }
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            EngineError::WorkbasketNotFound("wb".into()).code(),
            ErrorCode::WorkbasketNotFound
        );
        assert_eq!(
            EngineError::invalid_state("bound").code(),
            ErrorCode::InvalidState
        );
        assert_eq!(
            EngineError::not_authorized("arthur", "wb", Permission::Write).code(),
            ErrorCode::NotAuthorized
        );
        assert_eq!(
            EngineError::MissingField("principal").code(),
            ErrorCode::MissingRequiredField
        );
    }

    #[test]
    fn test_not_found_covers_both_entities() {
        assert!(EngineError::WorkbasketNotFound("a".into()).is_not_found());
        assert!(EngineError::AccessItemNotFound("b".into()).is_not_found());
        assert!(!EngineError::invalid_state("x").is_not_found());
    }

    #[test]
    fn test_error_code_serialization() {
        let json = serde_json::to_string(&ErrorCode::WorkbasketNotFound).unwrap();
        assert_eq!(json, "\"WORKBASKET_NOT_FOUND\"");
    }

    #[test]
    fn test_not_authorized_message() {
        let err = EngineError::not_authorized("Ford Prefect", "wb-1", Permission::Write);
        assert_eq!(
            err.to_string(),
            "Principal Ford Prefect lacks write permission on workbasket wb-1"
        );
    }
}
