// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! HTTP server for the staging API.
//!
//! | Method   | Path                             | Success |
//! |----------|----------------------------------|---------|
//! | `PUT`    | `/v1/staging/{guid}`             | 202     |
//! | `DELETE` | `/v1/staging/{guid}`             | 202     |
//! | `POST`   | `/v1/staging/{guid}/completed`   | 200     |
//! | `GET`    | `/health`                        | 200     |

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::Serialize;
use stagehand_core::{StagingRequest, StagingResponse, TaskCompletion};
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::error::Error;
use crate::handlers::{self, HealthCheckResponse, StageResponse, StagerHandlerState};

/// Error response body.
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Serialize)]
struct ErrorDetail {
    code: &'static str,
    message: String,
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            error!(status = status.as_u16(), error = %self, "Request failed");
        }
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.error_code(),
                message: self.to_string(),
            },
        };
        (status, Json(body)).into_response()
    }
}

/// Create the staging API router.
pub fn router(state: Arc<StagerHandlerState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/v1/staging/{guid}", put(stage).delete(stop_staging))
        .route("/v1/staging/{guid}/completed", post(staging_complete))
        .with_state(state)
}

async fn health(
    State(state): State<Arc<StagerHandlerState>>,
) -> Result<Json<HealthCheckResponse>, Error> {
    Ok(Json(handlers::handle_health_check(&state).await?))
}

async fn stage(
    State(state): State<Arc<StagerHandlerState>>,
    Path(guid): Path<String>,
    Json(request): Json<StagingRequest>,
) -> Result<(StatusCode, Json<StageResponse>), Error> {
    let response = handlers::handle_stage(&state, &guid, request).await?;
    Ok((StatusCode::ACCEPTED, Json(response)))
}

async fn stop_staging(
    State(state): State<Arc<StagerHandlerState>>,
    Path(guid): Path<String>,
) -> Result<StatusCode, Error> {
    handlers::handle_stop_staging(&state, &guid).await?;
    Ok(StatusCode::ACCEPTED)
}

async fn staging_complete(
    State(state): State<Arc<StagerHandlerState>>,
    Path(guid): Path<String>,
    Json(completion): Json<TaskCompletion>,
) -> Result<Json<StagingResponse>, Error> {
    Ok(Json(
        handlers::handle_staging_complete(&state, &guid, completion).await?,
    ))
}

/// Serve the staging API on `addr` until `shutdown` resolves.
pub async fn serve<F>(
    addr: SocketAddr,
    state: Arc<StagerHandlerState>,
    shutdown: F,
) -> std::io::Result<()>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "Staging API listening");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
}
