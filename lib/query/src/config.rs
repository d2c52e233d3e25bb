// SPDX-FileCopyrightText: Copyright (c) 2025 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

//! Query service configuration.
//!
//! Settings are plain data with environment overrides:
//! - `CACHEGRID_CURSOR_TTL_SECS`: lease window for idle cursor expiration.
//! - `CACHEGRID_MAX_PAGE_SIZE`: upper bound on a single page fetch.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// ENV used to override the cursor lease window, in seconds
const CURSOR_TTL_ENV: &str = "CACHEGRID_CURSOR_TTL_SECS";

/// ENV used to override the page size cap
const MAX_PAGE_SIZE_ENV: &str = "CACHEGRID_MAX_PAGE_SIZE";

/// Window after which an idle cursor is removed (5 minutes)
const DEFAULT_CURSOR_TTL: Duration = Duration::from_secs(300);

const DEFAULT_MAX_PAGE_SIZE: usize = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryConfig {
    /// Delay between successive expiration checks for a registered cursor.
    /// A cursor not accessed within one window is closed at the next check.
    pub lease_window: Duration,

    /// Largest number of rows a single `execute` or `next_page` call will
    /// materialize, regardless of the requested page size.
    pub max_page_size: usize,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            lease_window: DEFAULT_CURSOR_TTL,
            max_page_size: DEFAULT_MAX_PAGE_SIZE,
        }
    }
}

impl QueryConfig {
    /// Build the configuration from environment variables, falling back to
    /// defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        Self::from_env_or(Self::default())
    }

    /// Build the configuration from environment variables on top of the
    /// provided defaults.
    pub fn from_env_or(defaults: Self) -> Self {
        let lease_window = std::env::var(CURSOR_TTL_ENV)
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.lease_window);

        let max_page_size = std::env::var(MAX_PAGE_SIZE_ENV)
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .filter(|n| *n > 0)
            .unwrap_or(defaults.max_page_size);

        Self {
            lease_window,
            max_page_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = QueryConfig::default();
        assert_eq!(config.lease_window, Duration::from_secs(300));
        assert_eq!(config.max_page_size, 10_000);
    }

    #[test]
    fn test_from_env_or_keeps_provided_defaults() {
        // Neither env var is set in the test environment, so the provided
        // defaults must survive untouched.
        let defaults = QueryConfig {
            lease_window: Duration::from_secs(7),
            max_page_size: 42,
        };
        assert_eq!(QueryConfig::from_env_or(defaults), defaults);
    }
}
