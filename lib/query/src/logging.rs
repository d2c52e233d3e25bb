// SPDX-FileCopyrightText: Copyright (c) 2025 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

//! Logging initialization.
//!
//! Filters come from the `CACHEGRID_LOG` environment variable (same syntax
//! as `RUST_LOG`); the default level is `info`.

use std::sync::Once;
use tracing_subscriber::EnvFilter;

/// ENV used to set the log level
const FILTER_ENV: &str = "CACHEGRID_LOG";

/// Default log level
const DEFAULT_FILTER_LEVEL: &str = "info";

/// Once instance to ensure the logger is only initialized once
static INIT: Once = Once::new();

/// Initialize the global tracing subscriber. Subsequent calls are no-ops.
pub fn init() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env(FILTER_ENV)
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER_LEVEL));

        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    });
}
