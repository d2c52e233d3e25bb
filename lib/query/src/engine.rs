// SPDX-FileCopyrightText: Copyright (c) 2025 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

//! Query engine seam.
//!
//! The underlying cache/query engine is an external collaborator; this
//! module defines the trait surface the executor drives. One stream
//! resource is opened per query and owned by exactly one
//! [`crate::cursor::QueryCursor`] (or closed before the first page is
//! returned when no rows remain).

use async_trait::async_trait;

use crate::protocols::{QueryField, Row};
use crate::Result;

/// A server-side stream of result rows.
#[async_trait]
pub trait RowStream: Send + Sync {
    /// Fetch up to `limit` rows, advancing the stream.
    async fn fetch_page(&mut self, limit: usize) -> Result<Vec<Row>>;

    /// Whether rows remain beyond what has been fetched. Must not consume
    /// them.
    fn has_next(&self) -> bool;

    /// Release the underlying resources. Idempotent and infallible: closing
    /// an already-closed stream is a no-op, and close must not panic (the
    /// expiration scheduler calls it with no caller waiting).
    fn close(&mut self);
}

/// An opened SQL fields query: the row stream plus the column metadata the
/// engine reported, if any.
pub struct SqlStream {
    pub stream: Box<dyn RowStream>,
    pub fields: Option<Vec<QueryField>>,
}

/// Executes scans and SQL queries against named caches.
#[async_trait]
pub trait QueryEngine: Send + Sync {
    /// Open a predicate-free scan over every entry of the cache.
    async fn open_scan(&self, cache_name: &str, page_size: usize) -> Result<Box<dyn RowStream>>;

    /// Open a SQL fields query. `fields` is `None` when the engine cannot
    /// describe the result columns.
    async fn open_sql(
        &self,
        cache_name: &str,
        query_text: &str,
        page_size: usize,
    ) -> Result<SqlStream>;
}
