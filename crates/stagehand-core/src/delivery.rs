// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Delivery failure classification.
//!
//! | error shape                        | retryable |
//! |------------------------------------|-----------|
//! | transport, temporary or timed out  | yes       |
//! | transport, anything else           | no        |
//! | status 503 or 504                  | yes       |
//! | any other status                   | no        |
//! | anything else                      | no        |

use thiserror::Error;

/// Failure while delivering a staging outcome to the requester.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DeliveryError {
    /// The request never got a response.
    #[error("transport error: {message}")]
    Transport {
        /// The condition is expected to clear on its own.
        temporary: bool,
        /// The request timed out.
        timeout: bool,
        /// Transport error text.
        message: String,
    },

    /// The target answered with a non-2xx status.
    #[error("unexpected status {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, possibly truncated.
        body: String,
    },

    /// Other error.
    #[error("{0}")]
    Other(String),
}

/// Whether delivery should be attempted again after `err`.
pub fn is_retryable(err: &DeliveryError) -> bool {
    match err {
        DeliveryError::Transport {
            temporary, timeout, ..
        } => *temporary || *timeout,
        DeliveryError::Status { status, .. } => matches!(status, 503 | 504),
        DeliveryError::Other(_) => false,
    }
}
