use super::validation::ValidationFailureKind;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AppError {
    #[error("Network error: {0}")]
    Network(String),
    #[error("Validation error ({kind}): {message}")]
    Validation {
        kind: ValidationFailureKind,
        message: String,
    },
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Malformed payload: {0}")]
    Payload(String),
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

/// 呼び出し元へ通知する失敗の分類
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    NetworkFailure,
    ValidationFailure,
    ConflictFailure,
    Internal,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FailureKind::NetworkFailure => "network_failure",
            FailureKind::ValidationFailure => "validation_failure",
            FailureKind::ConflictFailure => "conflict_failure",
            FailureKind::Internal => "internal",
        };
        f.write_str(label)
    }
}

impl AppError {
    pub fn validation(kind: ValidationFailureKind, message: impl Into<String>) -> Self {
        AppError::Validation {
            kind,
            message: message.into(),
        }
    }

    pub fn failure_kind(&self) -> FailureKind {
        match self {
            AppError::Network(_) | AppError::Payload(_) => FailureKind::NetworkFailure,
            AppError::Validation { .. } => FailureKind::ValidationFailure,
            AppError::Conflict(_) => FailureKind::ConflictFailure,
            AppError::Configuration(_) | AppError::Internal(_) => FailureKind::Internal,
        }
    }

    pub fn validation_kind(&self) -> Option<ValidationFailureKind> {
        match self {
            AppError::Validation { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// リモート操作の失敗としてロールバック対象になるか
    pub fn triggers_rollback(&self) -> bool {
        matches!(
            self.failure_kind(),
            FailureKind::NetworkFailure | FailureKind::ConflictFailure
        )
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Payload(err.to_string())
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::Internal(format!("Background task failed: {err}"))
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
