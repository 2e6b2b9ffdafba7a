// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Stagehand Server - Staging Service
//!
//! This crate exposes the staging recipe translator over HTTP. It submits
//! built tasks to an external executor, receives their completion callbacks,
//! and delivers the resulting outcome to the requester.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐  PUT /v1/staging/{guid}   ┌──────────────────┐  POST /v1/tasks  ┌──────────┐
//! │  Requester   │──────────────────────────►│ stagehand-server │─────────────────►│ Executor │
//! │              │◄──────────────────────────│                  │◄─────────────────│          │
//! └──────────────┘  build_completed (retry)  └──────────────────┘  .../completed   └──────────┘
//! ```
//!
//! # Configuration
//!
//! Configuration is loaded from environment variables:
//!
//! | Variable | Required | Default | Description |
//! |----------|----------|---------|-------------|
//! | `STAGER_LISTEN_ADDR` | No | `0.0.0.0:8888` | HTTP listen address |
//! | `STAGER_URL` | Yes | - | Base URL for completion callbacks |
//! | `STAGER_EXECUTOR_URL` | Yes | - | Task executor API |
//! | `STAGER_CC_BASE_URL` | Yes | - | Requester internal API |
//! | `STAGER_CC_USERNAME` / `STAGER_CC_PASSWORD` | No | empty | Basic auth for delivery |
//! | `STAGER_FILE_SERVER_URL` | Yes | - | Lifecycle bundle host |
//! | `STAGER_CC_UPLOADER_URL` | Yes | - | Droplet/cache uploader |
//! | `STAGER_LIFECYCLES` | No | empty | `key=location,...` bundle map |
//! | `STAGER_TASK_DOMAIN` | No | `cf-app-staging` | Staging task domain |
//! | `STAGER_SKIP_CERT_VERIFY` | No | `false` | Skip TLS verification |
//! | `STAGER_INSECURE_DOCKER_REGISTRY` | No | `false` | Platform registry is insecure |
//! | `STAGER_INSECURE_DOCKER_REGISTRIES` | No | empty | Extra insecure registries |
//! | `STAGER_DOCKER_REGISTRY_ADDRESSES` | No | empty | Platform registry addresses |
//! | `STAGER_DOCKER_REGISTRY_PORT` | No | `8080` | Platform registry port |
//! | `STAGER_DOCKER_STACK` | No | `cflinuxfs3` | Docker staging rootfs |
//! | `STAGER_DEFAULT_TIMEOUT_SECS` | No | `900` | Default staging timeout |
//! | `STAGER_MIN_MEMORY_MB` | No | `1024` | Memory floor |
//! | `STAGER_MIN_DISK_MB` | No | `6144` | Disk floor |
//! | `STAGER_MIN_FILE_DESCRIPTORS` | No | `256` | File descriptor floor |
//! | `STAGER_DELIVERY_MAX_ATTEMPTS` | No | `3` | Outcome delivery attempts |
//!
//! # Modules
//!
//! - [`config`]: Server configuration from environment variables
//! - [`error`]: Error types and status mapping
//! - [`executor`]: Task executor clients
//! - [`handlers`]: Staging request handlers
//! - [`notifier`]: Outcome delivery with retries
//! - [`server`]: HTTP server

#![deny(missing_docs)]

/// Server configuration loaded from environment variables.
pub mod config;

/// Error types for server operations.
pub mod error;

/// Task executor clients (HTTP, mock).
pub mod executor;

/// Staging request handlers.
pub mod handlers;

/// Outcome delivery to the requester.
pub mod notifier;

/// HTTP server for the staging API.
pub mod server;
