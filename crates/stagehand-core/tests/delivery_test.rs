// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Tests for delivery failure classification.

use stagehand_core::{DeliveryError, is_retryable};

#[test]
fn test_classification_table() {
    let cases = [
        (
            DeliveryError::Transport {
                temporary: true,
                timeout: false,
                message: "connection refused".to_string(),
            },
            true,
        ),
        (
            DeliveryError::Transport {
                temporary: false,
                timeout: true,
                message: "deadline exceeded".to_string(),
            },
            true,
        ),
        (
            DeliveryError::Transport {
                temporary: false,
                timeout: false,
                message: "invalid certificate".to_string(),
            },
            false,
        ),
        (
            DeliveryError::Status {
                status: 503,
                body: "unavailable".to_string(),
            },
            true,
        ),
        (
            DeliveryError::Status {
                status: 504,
                body: String::new(),
            },
            true,
        ),
        (
            DeliveryError::Status {
                status: 500,
                body: String::new(),
            },
            false,
        ),
        (
            DeliveryError::Status {
                status: 404,
                body: String::new(),
            },
            false,
        ),
        (DeliveryError::Other("unexpected".to_string()), false),
    ];

    for (err, expected) in cases {
        assert_eq!(is_retryable(&err), expected, "{}", err);
    }
}

#[test]
fn test_status_error_keeps_code_in_message() {
    let err = DeliveryError::Status {
        status: 401,
        body: "unauthorized".to_string(),
    };
    assert_eq!(err.to_string(), "unexpected status 401: unauthorized");
}
