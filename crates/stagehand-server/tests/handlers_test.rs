// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Tests for staging handlers module.

mod common;

use std::sync::Arc;

use common::*;
use serde_json::json;
use stagehand_core::{
    Lifecycle, StagingError, StagingRequest, StagingResponse, TaskCompletion, annotation,
};
use stagehand_server::error::Error;
use stagehand_server::executor::{ExecutorError, MockExecutor};
use stagehand_server::handlers::{
    handle_health_check, handle_stage, handle_staging_complete, handle_stop_staging,
};

const GUID: &str = "staging-guid-1";

fn completion(failed: bool) -> TaskCompletion {
    TaskCompletion {
        task_guid: GUID.to_string(),
        domain: "cf-app-staging".to_string(),
        failed,
        failure_reason: if failed { "boom".to_string() } else { String::new() },
        result: if failed {
            String::new()
        } else {
            json!({
                "lifecycle_metadata": { "buildpack_key": "zfirst", "detected_buildpack": "Rabbit" },
                "process_types": { "web": "./run" },
                "execution_metadata": ""
            })
            .to_string()
        },
        annotation: annotation::encode(Lifecycle::Buildpack),
    }
}

// ============================================================================
// Health Check
// ============================================================================

#[tokio::test]
async fn test_health_check() {
    let state = create_test_state(
        Arc::new(MockExecutor::new()),
        Arc::new(RecordingNotifier::default()),
    );
    let health = handle_health_check(&state).await.unwrap();
    assert!(health.healthy);
    assert_eq!(health.executor, "mock");
    assert!(!health.version.is_empty());
}

// ============================================================================
// Stage
// ============================================================================

#[tokio::test]
async fn test_stage_submits_task() {
    let executor = Arc::new(MockExecutor::new());
    let notifier = Arc::new(RecordingNotifier::default());
    let state = create_test_state(executor.clone(), notifier.clone());

    let response = handle_stage(&state, GUID, buildpack_request()).await.unwrap();
    assert_eq!(response.task_guid, GUID);
    assert_eq!(response.lifecycle, Lifecycle::Buildpack);

    let task = executor.task(GUID).await.unwrap();
    assert!(task.privileged);
    assert_eq!(task.domain, "cf-app-staging");
    assert_eq!(notifier.attempts().await, 0);
}

#[tokio::test]
async fn test_stage_twice_is_idempotent() {
    let executor = Arc::new(MockExecutor::new());
    let state = create_test_state(executor.clone(), Arc::new(RecordingNotifier::default()));

    handle_stage(&state, GUID, buildpack_request()).await.unwrap();
    handle_stage(&state, GUID, buildpack_request()).await.unwrap();
    assert_eq!(executor.task_count().await, 1);
}

#[tokio::test]
async fn test_invalid_request_delivers_synthetic_failure() {
    let executor = Arc::new(MockExecutor::new());
    let notifier = Arc::new(RecordingNotifier::default());
    let state = create_test_state(executor.clone(), notifier.clone());

    let mut request = buildpack_request();
    request.lifecycle_data.as_mut().unwrap()["stack"] = json!("unknown_stack");

    let err = handle_stage(&state, GUID, request).await.unwrap_err();
    assert!(matches!(
        err,
        Error::Staging(StagingError::NoCompilerDefined { .. })
    ));
    assert_eq!(err.status_code(), 400);
    assert_eq!(executor.task_count().await, 0);

    let outcomes = notifier.outcomes().await;
    assert_eq!(outcomes.len(), 1);
    let (guid, outcome) = &outcomes[0];
    assert_eq!(guid, GUID);
    let failure = outcome.error().unwrap();
    assert_eq!(failure.id, "StagingError");
    assert_eq!(
        failure.message,
        "no compiler defined for requested stack: unknown_stack"
    );
}

#[tokio::test]
async fn test_resolution_failure_is_sanitized_before_delivery() {
    let executor = Arc::new(MockExecutor::new());
    let notifier = Arc::new(RecordingNotifier::default());
    let state = create_test_state(executor.clone(), notifier.clone());

    let request: StagingRequest = serde_json::from_value(json!({
        "app_id": "bunny",
        "lifecycle": "docker",
        "lifecycle_data": { "docker_image": "busybox", "cache_docker_image": true }
    }))
    .unwrap();

    let err = handle_stage(&state, GUID, request).await.unwrap_err();
    assert!(matches!(
        err,
        Error::Staging(StagingError::NoRegistryAvailable { .. })
    ));
    assert_eq!(executor.task_count().await, 0);

    let outcomes = notifier.outcomes().await;
    assert_eq!(outcomes.len(), 1);
    assert_eq!(
        outcomes[0].1.error().unwrap().message,
        "no available docker registry: docker-registry.service.cf.internal!"
    );
}

#[tokio::test]
async fn test_stage_reports_docker_lifecycle() {
    let executor = Arc::new(MockExecutor::new());
    let state = create_test_state(executor.clone(), Arc::new(RecordingNotifier::default()));

    let request: StagingRequest = serde_json::from_value(json!({
        "app_id": "bunny",
        "lifecycle": "docker",
        "lifecycle_data": { "docker_image": "busybox" }
    }))
    .unwrap();

    let response = handle_stage(&state, GUID, request).await.unwrap();
    assert_eq!(response.lifecycle, Lifecycle::Docker);
    assert!(!executor.task(GUID).await.unwrap().privileged);
}

#[tokio::test]
async fn test_submit_failure_delivers_failure() {
    let notifier = Arc::new(RecordingNotifier::default());
    let state = create_test_state(Arc::new(MockExecutor::failing()), notifier.clone());

    let err = handle_stage(&state, GUID, buildpack_request()).await.unwrap_err();
    assert!(matches!(err, Error::Executor(ExecutorError::Transport(_))));
    assert_eq!(err.status_code(), 503);

    let outcomes = notifier.outcomes().await;
    assert_eq!(outcomes.len(), 1);
    assert!(outcomes[0].1.error().is_some());
}

// ============================================================================
// Stop Staging
// ============================================================================

#[tokio::test]
async fn test_stop_staging_cancels_task() {
    let executor = Arc::new(MockExecutor::new());
    let state = create_test_state(executor.clone(), Arc::new(RecordingNotifier::default()));

    handle_stage(&state, GUID, buildpack_request()).await.unwrap();
    handle_stop_staging(&state, GUID).await.unwrap();
    assert_eq!(executor.cancelled().await, vec![GUID.to_string()]);
}

#[tokio::test]
async fn test_stop_unknown_task() {
    let state = create_test_state(
        Arc::new(MockExecutor::new()),
        Arc::new(RecordingNotifier::default()),
    );
    let err = handle_stop_staging(&state, "nope").await.unwrap_err();
    assert_eq!(err.status_code(), 404);
}

// ============================================================================
// Staging Complete
// ============================================================================

#[tokio::test]
async fn test_failed_completion_is_sanitized_and_delivered() {
    let notifier = Arc::new(RecordingNotifier::default());
    let state = create_test_state(Arc::new(MockExecutor::new()), notifier.clone());

    let response = handle_staging_complete(&state, GUID, completion(true))
        .await
        .unwrap();
    assert_eq!(response.error().unwrap().message, "boom!");

    let outcomes = notifier.outcomes().await;
    assert_eq!(outcomes, vec![(GUID.to_string(), response)]);
}

#[tokio::test]
async fn test_successful_completion_is_delivered() {
    let notifier = Arc::new(RecordingNotifier::default());
    let state = create_test_state(Arc::new(MockExecutor::new()), notifier.clone());

    let response = handle_staging_complete(&state, GUID, completion(false))
        .await
        .unwrap();
    match &response {
        StagingResponse::Result(result) => {
            assert_eq!(result.lifecycle_type, Lifecycle::Buildpack);
        }
        StagingResponse::Error(failure) => panic!("unexpected failure {:?}", failure),
    }
    assert_eq!(notifier.attempts().await, 1);
}

#[tokio::test]
async fn test_transient_delivery_failures_are_retried() {
    let notifier = Arc::new(RecordingNotifier::failing_with(vec![503, 504]));
    let state = create_test_state(Arc::new(MockExecutor::new()), notifier.clone());

    handle_staging_complete(&state, GUID, completion(true))
        .await
        .unwrap();
    assert_eq!(notifier.attempts().await, 3);
}

#[tokio::test]
async fn test_permanent_delivery_failure_is_not_retried() {
    let notifier = Arc::new(RecordingNotifier::failing_with(vec![400]));
    let state = create_test_state(Arc::new(MockExecutor::new()), notifier.clone());

    let err = handle_staging_complete(&state, GUID, completion(true))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Delivery(_)));
    assert_eq!(notifier.attempts().await, 1);
}

#[tokio::test]
async fn test_retries_are_bounded() {
    let notifier = Arc::new(RecordingNotifier::failing_with(vec![503, 503, 503, 503]));
    let state = create_test_state(Arc::new(MockExecutor::new()), notifier.clone());

    let err = handle_staging_complete(&state, GUID, completion(true))
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), 502);
    assert_eq!(notifier.attempts().await, 3);
}

#[tokio::test]
async fn test_completion_for_other_guid_is_rejected() {
    let state = create_test_state(
        Arc::new(MockExecutor::new()),
        Arc::new(RecordingNotifier::default()),
    );
    let err = handle_staging_complete(&state, "other-guid", completion(true))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidRequest(_)));
}

#[tokio::test]
async fn test_completion_from_foreign_domain() {
    let notifier = Arc::new(RecordingNotifier::default());
    let state = create_test_state(Arc::new(MockExecutor::new()), notifier.clone());

    let mut foreign = completion(true);
    foreign.domain = "cf-apps".to_string();
    let err = handle_staging_complete(&state, GUID, foreign).await.unwrap_err();
    assert_eq!(err.status_code(), 403);
    assert_eq!(notifier.attempts().await, 0);
}
