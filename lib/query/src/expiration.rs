// SPDX-FileCopyrightText: Copyright (c) 2025 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

//! Deferred expiration of idle query cursors.
//!
//! A second-chance lease: each registered cursor gets a periodic check, and
//! each check either renews the lease (the cursor was accessed since the
//! previous check, flag is cleared) or removes and closes the cursor. There
//! is no per-access timer work: an access only flips the cursor's flag, and
//! the decision is deferred to the next window. A cursor accessed at least once
//! per window survives indefinitely; one never accessed again is closed
//! after exactly one window.

use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::cursor::CursorRegistry;

/// Result of one expiration check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckOutcome {
    /// The id is no longer registered (exhausted or already expired).
    Missing,
    /// The cursor was accessed within the window; lease renewed.
    Renewed,
    /// The cursor was idle; removed from the registry and closed.
    Expired,
}

impl CheckOutcome {
    /// Terminal outcomes end the armed lease loop.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, CheckOutcome::Renewed)
    }
}

/// Schedules lease checks for registered cursors.
///
/// Holds a clone of the registry it evicts from; construct one per node
/// process next to the registry and hand both to the router.
#[derive(Clone)]
pub struct CursorExpiry {
    registry: CursorRegistry,
    lease_window: Duration,
    cancel_token: CancellationToken,
}

impl CursorExpiry {
    pub fn new(
        registry: CursorRegistry,
        lease_window: Duration,
        cancel_token: CancellationToken,
    ) -> Self {
        Self {
            registry,
            lease_window,
            cancel_token,
        }
    }

    pub fn lease_window(&self) -> Duration {
        self.lease_window
    }

    /// Arm the lease loop for a just-registered cursor id. Call only after
    /// the cursor is in the registry, so a firing check can observe it.
    ///
    /// One task per cursor: sleep a window, run a check, and keep going
    /// while checks renew. The task ends on a terminal outcome or when the
    /// cancellation token fires (node shutdown leaves cursors to die with
    /// the process).
    pub fn arm(&self, id: String) {
        let this = self.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = this.cancel_token.cancelled() => break,
                    _ = tokio::time::sleep(this.lease_window) => {}
                }
                if this.run_check(&id).await.is_terminal() {
                    break;
                }
            }
        });
    }

    /// One expiration check for `id`. Deterministic and callable directly
    /// from tests. Never fails: close faults stay on the scheduler side
    /// since no caller waits on a check.
    pub async fn run_check(&self, id: &str) -> CheckOutcome {
        let Some(cursor) = self.registry.get(id) else {
            return CheckOutcome::Missing;
        };

        if cursor.take_accessed() {
            tracing::trace!(cursor_id = id, "cursor accessed within lease window, renewing");
            return CheckOutcome::Renewed;
        }

        self.registry.remove(id);
        cursor.close().await;
        tracing::debug!(cursor_id = id, "expired idle query cursor");
        CheckOutcome::Expired
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::QueryCursor;
    use crate::testing::VecStream;
    use serde_json::json;
    use std::sync::Arc;

    fn expiry_with_cursor(id: &str) -> (CursorExpiry, Arc<QueryCursor>) {
        let registry = CursorRegistry::new();
        let cursor = Arc::new(QueryCursor::new(
            id,
            Box::new(VecStream::new(vec![vec![json!(1)], vec![json!(2)]])),
        ));
        registry.put(cursor.clone());
        let expiry = CursorExpiry::new(
            registry,
            Duration::from_secs(300),
            CancellationToken::new(),
        );
        (expiry, cursor)
    }

    #[tokio::test]
    async fn test_check_on_missing_id() {
        let expiry = CursorExpiry::new(
            CursorRegistry::new(),
            Duration::from_secs(300),
            CancellationToken::new(),
        );
        assert_eq!(expiry.run_check("scan-gone").await, CheckOutcome::Missing);
    }

    #[tokio::test]
    async fn test_accessed_cursor_is_renewed_then_expired() {
        let (expiry, cursor) = expiry_with_cursor("sql-1");

        cursor.mark_accessed();
        assert_eq!(expiry.run_check("sql-1").await, CheckOutcome::Renewed);
        assert!(!cursor.is_closed());

        // The renewing check cleared the flag; with no access in the next
        // window the cursor goes.
        assert_eq!(expiry.run_check("sql-1").await, CheckOutcome::Expired);
        assert!(cursor.is_closed());
        assert_eq!(expiry.run_check("sql-1").await, CheckOutcome::Missing);
    }

    #[tokio::test]
    async fn test_idle_cursor_expires_on_first_check() {
        let (expiry, cursor) = expiry_with_cursor("scan-1");

        assert_eq!(expiry.run_check("scan-1").await, CheckOutcome::Expired);
        assert!(cursor.is_closed());
        assert!(expiry.registry.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_armed_loop_expires_idle_cursor() {
        let (expiry, cursor) = expiry_with_cursor("scan-2");
        expiry.arm("scan-2".to_string());

        // Just short of one window: still leased.
        tokio::time::sleep(Duration::from_secs(299)).await;
        assert!(expiry.registry.contains("scan-2"));

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(expiry.registry.is_empty());
        assert!(cursor.is_closed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_armed_loop_renews_while_accessed() {
        let (expiry, cursor) = expiry_with_cursor("sql-2");
        expiry.arm("sql-2".to_string());

        for _ in 0..5 {
            cursor.mark_accessed();
            tokio::time::sleep(Duration::from_secs(301)).await;
            assert!(expiry.registry.contains("sql-2"));
        }

        // Access stops; gone within the next window.
        tokio::time::sleep(Duration::from_secs(301)).await;
        assert!(expiry.registry.is_empty());
        assert!(cursor.is_closed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_stops_the_loop() {
        let (expiry, _cursor) = expiry_with_cursor("scan-3");
        expiry.arm("scan-3".to_string());

        expiry.cancel_token.cancel();
        tokio::time::sleep(Duration::from_secs(301)).await;

        // Loop ended without evicting; shutdown leaves cursors to the
        // process teardown.
        assert!(expiry.registry.contains("scan-3"));
    }
}
