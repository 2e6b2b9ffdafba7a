// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Action tree submitted to the executor.
//!
//! A recipe is a tree of [`Action`] nodes. The tree is plain data: nothing in
//! here runs anything, the executor interprets each node by its tag.
//!
//! The serialized form is externally tagged, one key per node:
//!
//! ```json
//! { "timeout": { "timeout_ms": 900000, "action": { "serial": { "actions": [ ... ] } } } }
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::models::EnvironmentVariable;

/// Union of all action kinds, discriminated by the outer key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Fetch an artifact into the container
    Download(DownloadAction),

    /// Push a file out of the container
    Upload(UploadAction),

    /// Execute a process
    Run(RunAction),

    /// Run children one after another, stop at the first failure
    Serial(SerialAction),

    /// Run children concurrently, fail if any child fails
    Parallel(ParallelAction),

    /// Fail the child if it runs past a deadline
    Timeout(TimeoutAction),

    /// Run the child and ignore its failure
    Try(TryAction),

    /// Emit progress messages around the child
    EmitProgress(EmitProgressAction),
}

/// Fetch an artifact from a URL to a path inside the container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadAction {
    /// Human-readable artifact name, shown in logs
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub artifact: String,
    /// Source URL
    pub from: String,
    /// Destination directory
    pub to: String,
    /// Executor-side cache key; identical keys share one cached copy
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_key: Option<String>,
    /// User the download runs as
    pub user: String,
}

/// Upload a file from the container to a URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadAction {
    /// Human-readable artifact name, shown in logs
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub artifact: String,
    /// Source path inside the container
    pub from: String,
    /// Destination URL
    pub to: String,
    /// User the upload runs as
    pub user: String,
}

/// Per-process limits applied to a run action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceLimits {
    /// Maximum number of open file descriptors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nofile: Option<u64>,
}

/// Execute a binary inside the container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunAction {
    /// Path of the executable
    pub path: String,
    /// Arguments, in order
    #[serde(default)]
    pub args: Vec<String>,
    /// Environment, in order; duplicates are preserved
    #[serde(default)]
    pub env: Vec<EnvironmentVariable>,
    /// Process limits; absent means unlimited
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_limits: Option<ResourceLimits>,
    /// User the process runs as
    pub user: String,
    /// Whether the process needs elevated privileges
    #[serde(default)]
    pub privileged: bool,
}

/// Children executed in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerialAction {
    /// Child actions
    pub actions: Vec<Action>,
}

/// Children executed concurrently; completion order is irrelevant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParallelAction {
    /// Child actions
    pub actions: Vec<Action>,
}

/// Deadline around a child action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeoutAction {
    /// Wrapped action
    pub action: Box<Action>,
    /// Deadline in milliseconds
    pub timeout_ms: u64,
}

/// Best-effort child action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TryAction {
    /// Wrapped action
    pub action: Box<Action>,
}

/// Progress messages around a child action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmitProgressAction {
    /// Wrapped action
    pub action: Box<Action>,
    /// Emitted before the child starts
    pub start_message: String,
    /// Emitted when the child succeeds
    pub success_message: String,
    /// Prefixed to the child's error when it fails
    pub failure_message_prefix: String,
}

/// Run `actions` one after another.
pub fn serial(actions: Vec<Action>) -> Action {
    Action::Serial(SerialAction { actions })
}

/// Run `actions` concurrently.
pub fn parallel(actions: Vec<Action>) -> Action {
    Action::Parallel(ParallelAction { actions })
}

/// `duration` in whole milliseconds, saturating at `u64::MAX`.
pub fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Bound `action` by `timeout`.
pub fn timeout(action: Action, timeout: Duration) -> Action {
    Action::Timeout(TimeoutAction {
        action: Box::new(action),
        timeout_ms: duration_ms(timeout),
    })
}

/// Swallow the failure of `action`.
pub fn try_action(action: Action) -> Action {
    Action::Try(TryAction {
        action: Box::new(action),
    })
}

/// Wrap `action` with progress messages.
pub fn emit_progress(
    action: Action,
    start_message: impl Into<String>,
    success_message: impl Into<String>,
    failure_message_prefix: impl Into<String>,
) -> Action {
    Action::EmitProgress(EmitProgressAction {
        action: Box::new(action),
        start_message: start_message.into(),
        success_message: success_message.into(),
        failure_message_prefix: failure_message_prefix.into(),
    })
}

impl Action {
    /// Node kind as it appears on the wire.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Download(_) => "download",
            Self::Upload(_) => "upload",
            Self::Run(_) => "run",
            Self::Serial(_) => "serial",
            Self::Parallel(_) => "parallel",
            Self::Timeout(_) => "timeout",
            Self::Try(_) => "try",
            Self::EmitProgress(_) => "emit_progress",
        }
    }

    /// Direct children of this node.
    pub fn children(&self) -> Vec<&Action> {
        match self {
            Self::Download(_) | Self::Upload(_) | Self::Run(_) => Vec::new(),
            Self::Serial(SerialAction { actions }) | Self::Parallel(ParallelAction { actions }) => {
                actions.iter().collect()
            }
            Self::Timeout(TimeoutAction { action, .. })
            | Self::Try(TryAction { action })
            | Self::EmitProgress(EmitProgressAction { action, .. }) => vec![action.as_ref()],
        }
    }

    /// Depth-first, pre-order walk of the tree rooted at this node.
    pub fn walk(&self) -> Vec<&Action> {
        let mut out = Vec::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            out.push(node);
            let children = node.children();
            stack.extend(children.into_iter().rev());
        }
        out
    }

    /// All run actions in the tree, in pre-order.
    pub fn run_actions(&self) -> Vec<&RunAction> {
        self.walk()
            .into_iter()
            .filter_map(|a| match a {
                Self::Run(run) => Some(run),
                _ => None,
            })
            .collect()
    }

    /// All download actions in the tree, in pre-order.
    pub fn download_actions(&self) -> Vec<&DownloadAction> {
        self.walk()
            .into_iter()
            .filter_map(|a| match a {
                Self::Download(download) => Some(download),
                _ => None,
            })
            .collect()
    }

    /// All upload actions in the tree, in pre-order.
    pub fn upload_actions(&self) -> Vec<&UploadAction> {
        self.walk()
            .into_iter()
            .filter_map(|a| match a {
                Self::Upload(upload) => Some(upload),
                _ => None,
            })
            .collect()
    }
}
