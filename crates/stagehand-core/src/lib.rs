// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Stagehand Core - Staging Recipe Translator
//!
//! This crate turns staging requests into declarative task recipes for an
//! external executor, and turns task completions back into staging outcomes.
//! It performs no I/O: submission and delivery live in `stagehand-server`.
//!
//! # Flow
//!
//! ```text
//!   StagingRequest ──► StagingEngine::build_recipe ──► TaskDefinition ──► executor
//!                              │                         (annotation)         │
//!                              ▼                                              │
//!                      BackendRegistry                                        │
//!                    buildpack │ docker                                       │
//!                              ▲                                              │
//!                              │                                              ▼
//!   StagingResponse ◄── StagingEngine::translate_completion ◄──── TaskCompletion
//! ```
//!
//! # Recipes
//!
//! | Lifecycle | Builder bundle key   | Privileged task | Result file                       |
//! |-----------|----------------------|-----------------|-----------------------------------|
//! | buildpack | `buildpack/<stack>`  | yes             | `/tmp/result.json`                |
//! | docker    | `docker`             | no              | `/tmp/docker-result/result.json`  |
//!
//! # Modules
//!
//! - [`action`]: Action tree nodes
//! - [`annotation`]: Task annotation codec
//! - [`backend`]: Recipe builders and the backend registry
//! - [`config`]: Builder configuration
//! - [`delivery`]: Delivery failure classification
//! - [`engine`]: Recipe building and completion translation entry point
//! - [`error`]: Error types
//! - [`models`]: Request, envelope and response types
//! - [`registry`]: Image registry resolution
//! - [`resources`]: Resource and timeout policy
//! - [`sanitize`]: Failure message sanitizing
//! - [`urls`]: Download and upload URL resolution

#![deny(missing_docs)]

pub mod action;
pub mod annotation;
pub mod backend;
pub mod config;
pub mod delivery;
pub mod engine;
pub mod error;
pub mod models;
pub mod registry;
pub mod resources;
pub mod sanitize;
pub mod urls;

pub use action::Action;
pub use backend::{Backend, BackendRegistry, BuildpackBackend, DockerBackend};
pub use config::BackendConfig;
pub use delivery::{DeliveryError, is_retryable};
pub use engine::StagingEngine;
pub use error::{ErrorKind, Result, StagingError};
pub use models::{
    Lifecycle, StagingFailure, StagingRequest, StagingResponse, StagingResult, TaskCompletion,
    TaskDefinition,
};
pub use registry::{RegistryEndpoints, RegistryResolver, StaticRegistryResolver};
pub use sanitize::{DefaultSanitizer, Sanitizer};
