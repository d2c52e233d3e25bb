// SPDX-FileCopyrightText: Copyright (c) 2025 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

//! Open query cursors and the node-local registry that owns them.

use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::engine::RowStream;
use crate::protocols::Row;
use crate::Result;

/// A server-side handle over a partially consumed result stream.
///
/// Shared as `Arc<QueryCursor>` between the registry (which controls
/// removal) and in-flight page fetches. The underlying stream is owned
/// exclusively by this wrapper and closed exactly once.
pub struct QueryCursor {
    id: String,
    stream: Mutex<Box<dyn RowStream>>,
    /// Set on every page fetch; cleared by a renewing expiration check.
    accessed: AtomicBool,
    closed: AtomicBool,
}

impl QueryCursor {
    pub fn new(id: impl Into<String>, stream: Box<dyn RowStream>) -> Self {
        Self {
            id: id.into(),
            stream: Mutex::new(stream),
            accessed: AtomicBool::new(false),
            closed: AtomicBool::new(false),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Record an external access, deferring expiration by one lease window.
    pub fn mark_accessed(&self) {
        self.accessed.store(true, Ordering::SeqCst);
    }

    /// Atomically read and clear the accessed flag. Only the expiration
    /// check calls this; an access landing after the swap renews the next
    /// window instead of this one, never less.
    pub fn take_accessed(&self) -> bool {
        self.accessed.swap(false, Ordering::SeqCst)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Fetch up to `limit` rows and report whether more remain, under one
    /// stream lock so the pair is consistent.
    pub async fn fetch_page(&self, limit: usize) -> Result<(Vec<Row>, bool)> {
        if self.is_closed() {
            anyhow::bail!("cursor {} is closed", self.id);
        }
        let mut stream = self.stream.lock().await;
        let rows = stream.fetch_page(limit).await?;
        let has_next = stream.has_next();
        Ok((rows, has_next))
    }

    /// Close the underlying stream. Idempotent: only the first caller
    /// reaches the stream.
    pub async fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.stream.lock().await.close();
    }
}

impl std::fmt::Debug for QueryCursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryCursor")
            .field("id", &self.id)
            .field("accessed", &self.accessed.load(Ordering::SeqCst))
            .field("closed", &self.closed.load(Ordering::SeqCst))
            .finish()
    }
}

/// Node-local mapping from cursor id to open cursor.
///
/// Ids are unique by construction (kind prefix plus a random UUID), so the
/// registry does no collision detection. Eviction is driven externally by
/// [`crate::expiration::CursorExpiry`].
#[derive(Clone, Default)]
pub struct CursorRegistry {
    cursors: Arc<DashMap<String, Arc<QueryCursor>>>,
}

impl CursorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, cursor: Arc<QueryCursor>) {
        tracing::debug!(cursor_id = %cursor.id(), "registering query cursor");
        self.cursors.insert(cursor.id().to_string(), cursor);
    }

    pub fn get(&self, id: &str) -> Option<Arc<QueryCursor>> {
        self.cursors.get(id).map(|c| c.clone())
    }

    /// Remove a cursor from the registry. Removing an absent id is a no-op.
    pub fn remove(&self, id: &str) -> Option<Arc<QueryCursor>> {
        self.cursors.remove(id).map(|(_, c)| c)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.cursors.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.cursors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cursors.is_empty()
    }
}
