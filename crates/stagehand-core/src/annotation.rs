// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Task annotation codec.
//!
//! The annotation is the only place a submitted task records which lifecycle
//! built it; completions come back without the original request.

use serde::Deserialize;

use crate::error::{Result, StagingError};
use crate::models::Lifecycle;

#[derive(Debug, Deserialize)]
struct StagingTaskAnnotation {
    lifecycle: String,
}

/// Encode the annotation for a task built by `lifecycle`.
pub fn encode(lifecycle: Lifecycle) -> String {
    serde_json::json!({ "lifecycle": lifecycle.as_str() }).to_string()
}

/// Decode an annotation back into the lifecycle that built the task.
///
/// Malformed input is [`StagingError::AnnotationDecode`]; a well-formed
/// annotation naming a lifecycle we do not know is
/// [`StagingError::UnknownLifecycle`].
pub fn decode(annotation: &str) -> Result<Lifecycle> {
    let parsed: StagingTaskAnnotation =
        serde_json::from_str(annotation).map_err(|e| StagingError::AnnotationDecode {
            message: e.to_string(),
        })?;
    parsed.lifecycle.parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_is_stable() {
        assert_eq!(encode(Lifecycle::Buildpack), r#"{"lifecycle":"buildpack"}"#);
        assert_eq!(encode(Lifecycle::Docker), r#"{"lifecycle":"docker"}"#);
    }

    #[test]
    fn test_decode_recovers_lifecycle() {
        assert_eq!(decode(&encode(Lifecycle::Buildpack)).unwrap(), Lifecycle::Buildpack);
        assert_eq!(decode(&encode(Lifecycle::Docker)).unwrap(), Lifecycle::Docker);
    }

    #[test]
    fn test_decode_tolerates_extra_fields() {
        let lifecycle = decode(r#"{"lifecycle":"docker","app_id":"x"}"#).unwrap();
        assert_eq!(lifecycle, Lifecycle::Docker);
    }

    #[test]
    fn test_malformed_annotation_is_decode_error() {
        assert!(matches!(
            decode("{not json"),
            Err(StagingError::AnnotationDecode { .. })
        ));
        assert!(matches!(decode(""), Err(StagingError::AnnotationDecode { .. })));
        assert!(matches!(
            decode(r#"{"other":"x"}"#),
            Err(StagingError::AnnotationDecode { .. })
        ));
    }

    #[test]
    fn test_unknown_lifecycle_is_routing_error() {
        assert!(matches!(
            decode(r#"{"lifecycle":"kpack"}"#),
            Err(StagingError::UnknownLifecycle(name)) if name == "kpack"
        ));
    }
}
