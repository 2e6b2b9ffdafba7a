// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Error types for stagehand-core.
//!
//! Every failure the recipe builders and the completion translator can
//! produce is a variant of [`StagingError`]. Callers branch on
//! [`StagingError::kind`] instead of matching message text.

use thiserror::Error;

use crate::models::Lifecycle;

/// Result type using StagingError
pub type Result<T> = std::result::Result<T, StagingError>;

/// Broad classification of a [`StagingError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The request itself is unusable (missing field, unknown mapping).
    Validation,
    /// A configured or supplied location could not be resolved.
    Resolution,
    /// A completed task carried an annotation we cannot route.
    Annotation,
    /// A successful task produced a result we cannot interpret.
    ResultParse,
}

/// Errors raised while building a recipe or translating a completion.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StagingError {
    /// The request did not carry an application id.
    #[error("missing app id")]
    MissingAppId,

    /// The request named a lifecycle we have no backend for.
    #[error("unknown lifecycle: {0}")]
    UnknownLifecycle(String),

    /// The request carried no lifecycle data.
    #[error("missing {lifecycle} lifecycle data")]
    MissingLifecycleData {
        /// Lifecycle whose data was missing.
        lifecycle: Lifecycle,
    },

    /// The lifecycle data did not parse for the requested lifecycle.
    #[error("invalid {lifecycle} lifecycle data: {message}")]
    InvalidLifecycleData {
        /// Lifecycle whose data failed to parse.
        lifecycle: Lifecycle,
        /// Parser error.
        message: String,
    },

    /// Buildpack lifecycle data without an app bits download URI.
    #[error("missing app bits download uri")]
    MissingAppBitsDownloadUri,

    /// Docker lifecycle data without an image reference.
    #[error("missing docker image")]
    MissingDockerImage,

    /// No builder bundle is configured for the requested stack.
    #[error("no compiler defined for requested stack: {stack}")]
    NoCompilerDefined {
        /// The stack that was requested.
        stack: String,
    },

    /// No builder bundle is configured under `key`.
    #[error("no lifecycle bundle configured for {key}")]
    NoLifecycleBundle {
        /// Lifecycle map key that was looked up.
        key: String,
    },

    /// Buildpack lifecycle data without a droplet upload URI.
    #[error("missing droplet upload uri")]
    MissingDropletUploadUri,

    /// A lifecycle bundle location could not be parsed.
    #[error("invalid lifecycle bundle url '{url}': {message}")]
    InvalidLifecycleUrl {
        /// The configured location.
        url: String,
        /// Parser error.
        message: String,
    },

    /// A lifecycle bundle location uses a scheme other than http(s).
    #[error("unsupported scheme '{scheme}' in lifecycle bundle url '{url}'")]
    UnsupportedLifecycleScheme {
        /// The offending scheme.
        scheme: String,
        /// The configured location.
        url: String,
    },

    /// An upload or download URL could not be built.
    #[error("invalid {field} url '{url}': {message}")]
    InvalidUrl {
        /// Which URL was being built.
        field: &'static str,
        /// The offending value.
        url: String,
        /// Parser error.
        message: String,
    },

    /// Image caching was requested but no registry address resolved.
    #[error("no available docker registry: {registry}")]
    NoRegistryAvailable {
        /// Logical registry name that resolved to nothing.
        registry: String,
    },

    /// The task annotation could not be decoded.
    #[error("failed to decode task annotation: {message}")]
    AnnotationDecode {
        /// Decoder error.
        message: String,
    },

    /// The completion arrived for a domain other than ours.
    #[error("task domain mismatch: expected '{expected}', got '{actual}'")]
    WrongTaskDomain {
        /// Configured staging domain.
        expected: String,
        /// Domain on the completion.
        actual: String,
    },

    /// The task succeeded but its result did not parse.
    #[error("failed to parse result of task '{task_guid}': {message}")]
    ResultParse {
        /// Task whose result failed to parse.
        task_guid: String,
        /// Parser error.
        message: String,
    },
}

impl StagingError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingAppId
            | Self::UnknownLifecycle(_)
            | Self::MissingLifecycleData { .. }
            | Self::InvalidLifecycleData { .. }
            | Self::MissingAppBitsDownloadUri
            | Self::MissingDockerImage
            | Self::NoCompilerDefined { .. }
            | Self::MissingDropletUploadUri => ErrorKind::Validation,
            Self::NoLifecycleBundle { .. }
            | Self::InvalidLifecycleUrl { .. }
            | Self::UnsupportedLifecycleScheme { .. }
            | Self::InvalidUrl { .. }
            | Self::NoRegistryAvailable { .. } => ErrorKind::Resolution,
            Self::AnnotationDecode { .. } | Self::WrongTaskDomain { .. } => ErrorKind::Annotation,
            Self::ResultParse { .. } => ErrorKind::ResultParse,
        }
    }

    /// Get the error code string for this error type.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::MissingAppId => "MISSING_APP_ID",
            Self::UnknownLifecycle(_) => "UNKNOWN_LIFECYCLE",
            Self::MissingLifecycleData { .. } => "MISSING_LIFECYCLE_DATA",
            Self::InvalidLifecycleData { .. } => "INVALID_LIFECYCLE_DATA",
            Self::MissingAppBitsDownloadUri => "MISSING_APP_BITS_DOWNLOAD_URI",
            Self::MissingDockerImage => "MISSING_DOCKER_IMAGE",
            Self::NoCompilerDefined { .. } => "NO_COMPILER_DEFINED",
            Self::NoLifecycleBundle { .. } => "NO_LIFECYCLE_BUNDLE",
            Self::MissingDropletUploadUri => "MISSING_DROPLET_UPLOAD_URI",
            Self::InvalidLifecycleUrl { .. } => "INVALID_LIFECYCLE_URL",
            Self::UnsupportedLifecycleScheme { .. } => "UNSUPPORTED_LIFECYCLE_SCHEME",
            Self::InvalidUrl { .. } => "INVALID_URL",
            Self::NoRegistryAvailable { .. } => "NO_REGISTRY_AVAILABLE",
            Self::AnnotationDecode { .. } => "ANNOTATION_DECODE",
            Self::WrongTaskDomain { .. } => "WRONG_TASK_DOMAIN",
            Self::ResultParse { .. } => "RESULT_PARSE",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_errors_are_classified() {
        assert_eq!(StagingError::MissingAppId.kind(), ErrorKind::Validation);
        assert_eq!(
            StagingError::NoCompilerDefined {
                stack: "rabbit_hole".to_string()
            }
            .kind(),
            ErrorKind::Validation
        );
    }

    #[test]
    fn test_resolution_errors_are_distinct_from_validation() {
        let err = StagingError::NoRegistryAvailable {
            registry: "docker-registry".to_string(),
        };
        assert_eq!(err.kind(), ErrorKind::Resolution);
        assert_eq!(err.error_code(), "NO_REGISTRY_AVAILABLE");
    }

    #[test]
    fn test_annotation_routing_and_decode_are_distinct() {
        let decode = StagingError::AnnotationDecode {
            message: "eof".to_string(),
        };
        let routing = StagingError::UnknownLifecycle("cnb".to_string());
        assert_ne!(decode.error_code(), routing.error_code());
    }

    #[test]
    fn test_display_names_the_stack() {
        let err = StagingError::NoCompilerDefined {
            stack: "rabbit_hole".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "no compiler defined for requested stack: rabbit_hole"
        );
    }
}
