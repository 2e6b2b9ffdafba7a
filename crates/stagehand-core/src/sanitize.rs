// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Failure message sanitizing.
//!
//! Executor failure reasons can carry cell names, paths and other operator
//! detail. Everything that reaches the requester goes through a [`Sanitizer`].

/// Exit status of the buildpack builder when no buildpack detected the app.
pub const DETECT_FAIL_EXIT_CODE: i32 = 222;
/// Exit status of the buildpack builder when compile failed.
pub const COMPILE_FAIL_EXIT_CODE: i32 = 223;
/// Exit status of the buildpack builder when release failed.
pub const RELEASE_FAIL_EXIT_CODE: i32 = 224;

const INSUFFICIENT_RESOURCES: &str = "insufficient resources";
const NO_COMPATIBLE_CELL: &str = "found no compatible cell";

/// Turns a raw failure reason into a message safe for the requester.
pub trait Sanitizer: Send + Sync {
    /// Sanitize `raw`.
    fn sanitize(&self, raw: &str) -> String;
}

impl<F> Sanitizer for F
where
    F: Fn(&str) -> String + Send + Sync,
{
    fn sanitize(&self, raw: &str) -> String {
        self(raw)
    }
}

/// Default sanitizer.
///
/// Keeps scheduler placement reasons and builder exit statuses, which the
/// requester can act on, and replaces everything else with a generic message.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultSanitizer;

impl Sanitizer for DefaultSanitizer {
    fn sanitize(&self, raw: &str) -> String {
        let lower = raw.to_ascii_lowercase();
        if lower.starts_with(INSUFFICIENT_RESOURCES) {
            return "insufficient resources".to_string();
        }
        if lower.starts_with(NO_COMPATIBLE_CELL) {
            return "found no compatible cell".to_string();
        }
        match exit_status(raw) {
            Some(DETECT_FAIL_EXIT_CODE) => "staging failed: no app detected".to_string(),
            Some(COMPILE_FAIL_EXIT_CODE) => "staging failed: buildpack compile failed".to_string(),
            Some(RELEASE_FAIL_EXIT_CODE) => "staging failed: buildpack release failed".to_string(),
            Some(code) => format!("staging failed: exited with status {}", code),
            None => "staging failed".to_string(),
        }
    }
}

/// Stable failure identifier for a raw failure reason.
pub fn failure_id(raw: &str) -> &'static str {
    let lower = raw.to_ascii_lowercase();
    if lower.starts_with(INSUFFICIENT_RESOURCES) {
        return "InsufficientResources";
    }
    if lower.starts_with(NO_COMPATIBLE_CELL) {
        return "NoCompatibleCell";
    }
    match exit_status(raw) {
        Some(DETECT_FAIL_EXIT_CODE) => "NoAppDetectedError",
        Some(COMPILE_FAIL_EXIT_CODE) => "BuildpackCompileFailed",
        Some(RELEASE_FAIL_EXIT_CODE) => "BuildpackReleaseFailed",
        _ => "StagingError",
    }
}

/// Extract `N` from a reason containing "Exited with status N".
fn exit_status(raw: &str) -> Option<i32> {
    const MARKER: &str = "exited with status ";
    let lower = raw.to_ascii_lowercase();
    let start = lower.find(MARKER)? + MARKER.len();
    let digits: String = lower[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}
