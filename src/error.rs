//! Error types for taskwatch
//!
//! Exit codes:
//! - 0: Success
//! - 2: User error (bad input, missing entity)
//! - 3: Blocked by policy (role not allowed to perform the mutation)
//! - 4: Operation failed (storage or lock failure)

use std::path::PathBuf;
use thiserror::Error;

/// Exit codes for the taskwatch CLI
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const USER_ERROR: i32 = 2;
    pub const POLICY_BLOCKED: i32 = 3;
    pub const OPERATION_FAILED: i32 = 4;
}

/// Main error type for taskwatch operations
#[derive(Error, Debug)]
pub enum Error {
    // User errors (exit code 2)
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("Notification not found: {0}")]
    NotificationNotFound(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // Policy blocks (exit code 3)
    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Invalid password")]
    InvalidCredentials,

    // Operation failures (exit code 4)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Lock acquisition failed: {0}")]
    LockFailed(PathBuf),
}

impl Error {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            // User errors
            Error::Validation(_)
            | Error::UserNotFound(_)
            | Error::TaskNotFound(_)
            | Error::NotificationNotFound(_)
            | Error::InvalidConfig(_) => exit_codes::USER_ERROR,

            // Policy blocks
            Error::Forbidden(_) | Error::InvalidCredentials => exit_codes::POLICY_BLOCKED,

            // Operation failures
            Error::Io(_)
            | Error::Json(_)
            | Error::TomlParse(_)
            | Error::TomlSerialize(_)
            | Error::LockFailed(_) => exit_codes::OPERATION_FAILED,
        }
    }
}

/// Result type alias for taskwatch operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_follow_taxonomy() {
        assert_eq!(
            Error::Validation("title is required".into()).exit_code(),
            exit_codes::USER_ERROR
        );
        assert_eq!(
            Error::TaskNotFound("abc".into()).exit_code(),
            exit_codes::USER_ERROR
        );
        assert_eq!(
            Error::Forbidden("role USER may only update status".into()).exit_code(),
            exit_codes::POLICY_BLOCKED
        );
        assert_eq!(
            Error::LockFailed(PathBuf::from("/tmp/x.lock")).exit_code(),
            exit_codes::OPERATION_FAILED
        );
    }
}
