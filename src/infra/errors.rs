// src/infra/errors.rs — Error types for studylab

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StudyError {
    // Authentication
    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Credential '{username}' is locked to the {assigned} condition")]
    ConditionLocked { username: String, assigned: String },

    #[error("Unknown study condition '{0}' (expected personalised or generic)")]
    UnknownCondition(String),

    // Sessions
    #[error("Invalid session id '{0}' (expected YYYYMMDD_HHMMSS_First_Last)")]
    InvalidSessionId(String),

    #[error("All {0} pseudonyms are already in use in this run")]
    PseudonymsExhausted(usize),

    #[error("Session directory already exists: {}", .0.display())]
    SessionExists(PathBuf),

    #[error("Session '{0}' not found")]
    SessionNotFound(String),

    #[error("Missing artifact: {}", .0.display())]
    MissingArtifact(PathBuf),

    // Surveys
    #[error("Invalid survey answer for '{item}': {reason}")]
    InvalidAnswer { item: String, reason: String },

    // Upload
    #[error("Upload is not enabled for this session's credential")]
    UploadDisabled,

    #[error("Storage error for '{path}': {message}")]
    Storage { path: String, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, StudyError>;

impl StudyError {
    /// Errors caused by participant input rather than the environment.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            StudyError::InvalidCredentials
                | StudyError::ConditionLocked { .. }
                | StudyError::UnknownCondition(_)
                | StudyError::InvalidSessionId(_)
                | StudyError::InvalidAnswer { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_errors_classified() {
        assert!(StudyError::InvalidCredentials.is_user_error());
        assert!(StudyError::UnknownCondition("x".into()).is_user_error());
        assert!(!StudyError::UploadDisabled.is_user_error());
        assert!(!StudyError::PseudonymsExhausted(676).is_user_error());
    }

    #[test]
    fn test_messages_do_not_leak_username_on_login_failure() {
        let msg = StudyError::InvalidCredentials.to_string();
        assert_eq!(msg, "Invalid username or password");
    }
}
