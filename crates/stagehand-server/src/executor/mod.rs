// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Executor module - clients for the system that runs staging tasks.

pub mod http;
pub mod mock;
mod traits;

pub use http::HttpTaskExecutor;
pub use mock::MockExecutor;
pub use traits::*;
