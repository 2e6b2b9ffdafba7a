// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Error types for stagehand-server.

use stagehand_core::{DeliveryError, ErrorKind, StagingError};
use thiserror::Error;

use crate::executor::ExecutorError;

/// Server errors.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Configuration loading failed.
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    /// Recipe building or completion translation failed.
    #[error(transparent)]
    Staging(#[from] StagingError),

    /// The task executor rejected or failed a request.
    #[error("Executor error: {0}")]
    Executor(#[from] ExecutorError),

    /// The outcome could not be delivered to the requester.
    #[error("Delivery error: {0}")]
    Delivery(#[from] DeliveryError),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Request validation failed.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl Error {
    /// Get the error code string for this error type.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Config(_) => "CONFIG_ERROR",
            Self::Staging(e) => e.error_code(),
            Self::Executor(ExecutorError::NotFound(_)) => "TASK_NOT_FOUND",
            Self::Executor(_) => "EXECUTOR_ERROR",
            Self::Delivery(_) => "DELIVERY_ERROR",
            Self::Json(_) => "INVALID_JSON",
            Self::InvalidRequest(_) => "INVALID_REQUEST",
        }
    }

    /// HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Staging(StagingError::WrongTaskDomain { .. }) => 403,
            Self::Staging(e) => match e.kind() {
                ErrorKind::Validation | ErrorKind::Resolution => 400,
                ErrorKind::Annotation | ErrorKind::ResultParse => 500,
            },
            Self::Executor(ExecutorError::NotFound(_)) => 404,
            Self::Executor(_) => 503,
            Self::Delivery(_) => 502,
            Self::Json(_) | Self::InvalidRequest(_) => 400,
            Self::Config(_) => 500,
        }
    }
}

/// Result type using the server Error.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use stagehand_core::models::Lifecycle;

    #[test]
    fn test_staging_error_statuses() {
        assert_eq!(Error::from(StagingError::MissingAppId).status_code(), 400);
        assert_eq!(
            Error::from(StagingError::NoRegistryAvailable {
                registry: "r".to_string()
            })
            .status_code(),
            400
        );
        assert_eq!(
            Error::from(StagingError::WrongTaskDomain {
                expected: "a".to_string(),
                actual: "b".to_string()
            })
            .status_code(),
            403
        );
        assert_eq!(
            Error::from(StagingError::AnnotationDecode {
                message: "eof".to_string()
            })
            .status_code(),
            500
        );
        assert_eq!(
            Error::from(StagingError::MissingLifecycleData {
                lifecycle: Lifecycle::Docker
            })
            .error_code(),
            "MISSING_LIFECYCLE_DATA"
        );
    }

    #[test]
    fn test_executor_error_statuses() {
        assert_eq!(
            Error::from(ExecutorError::NotFound("t".to_string())).status_code(),
            404
        );
        assert_eq!(
            Error::from(ExecutorError::Transport("refused".to_string())).status_code(),
            503
        );
    }
}
