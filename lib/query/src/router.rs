// SPDX-FileCopyrightText: Copyright (c) 2025 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

//! The query entry point: locality decision, execution, and cursor
//! registration.

use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::cluster::{AffinityOracle, DelegationClient};
use crate::config::QueryConfig;
use crate::cursor::{CursorRegistry, QueryCursor};
use crate::engine::QueryEngine;
use crate::error::QueryError;
use crate::executor::{self, ExecutedPage, QueryKind};
use crate::expiration::CursorExpiry;
use crate::protocols::{NextPage, NodeId, QueryRequest, QueryResult};

/// Routes a query to local execution or delegation and serves follow-up
/// pages from registered cursors.
pub struct QueryRouter {
    node_id: NodeId,
    max_page_size: usize,
    oracle: Arc<dyn AffinityOracle>,
    engine: Arc<dyn QueryEngine>,
    delegation: Arc<dyn DelegationClient>,
    registry: CursorRegistry,
    expiry: CursorExpiry,
}

impl QueryRouter {
    /// Build a router with a fresh registry and expiration scheduler, the
    /// usual per-node-process setup.
    pub fn new(
        node_id: NodeId,
        config: QueryConfig,
        oracle: Arc<dyn AffinityOracle>,
        engine: Arc<dyn QueryEngine>,
        delegation: Arc<dyn DelegationClient>,
        cancel_token: CancellationToken,
    ) -> Self {
        let registry = CursorRegistry::new();
        let expiry = CursorExpiry::new(registry.clone(), config.lease_window, cancel_token);
        Self::with_parts(node_id, config, oracle, engine, delegation, registry, expiry)
    }

    /// Build a router around an existing registry and scheduler. Tests use
    /// this to observe and drive cursor state directly.
    pub fn with_parts(
        node_id: NodeId,
        config: QueryConfig,
        oracle: Arc<dyn AffinityOracle>,
        engine: Arc<dyn QueryEngine>,
        delegation: Arc<dyn DelegationClient>,
        registry: CursorRegistry,
        expiry: CursorExpiry,
    ) -> Self {
        Self {
            node_id,
            max_page_size: config.max_page_size,
            oracle,
            engine,
            delegation,
            registry,
            expiry,
        }
    }

    pub fn node_id(&self) -> NodeId {
        self.node_id
    }

    pub fn registry(&self) -> &CursorRegistry {
        &self.registry
    }

    /// Execute a query and return its first page.
    ///
    /// When no target node is pinned, the affinity oracle decides whether
    /// this node can serve the query; a node that owns no partitions of the
    /// cache delegates to the fan-out layer with failover disabled. All
    /// failures come back as a typed [`QueryError`]; nothing panics
    /// through here.
    pub async fn execute(&self, request: QueryRequest) -> Result<QueryResult, QueryError> {
        if request.page_size == 0 {
            return Err(QueryError::Execution(anyhow::anyhow!(
                "page size must be positive"
            )));
        }

        if request.target_node.is_none() {
            let nodes = self
                .oracle
                .data_nodes(&request.cache_name)
                .await
                .map_err(QueryError::Execution)?;

            if nodes.is_empty() {
                return Err(QueryError::NoDataNodes {
                    cache_name: request.cache_name.clone(),
                });
            }

            if !nodes.contains(self.node_id) {
                tracing::debug!(
                    cache = %request.cache_name,
                    data_nodes = nodes.len(),
                    "local node owns no partitions, delegating"
                );
                return self
                    .delegation
                    .run_on(&nodes.ids(), request, true)
                    .await
                    .map_err(QueryError::Delegation);
            }
        }

        self.execute_local(request).await
    }

    async fn execute_local(&self, request: QueryRequest) -> Result<QueryResult, QueryError> {
        let kind = QueryKind::classify(&request.query_text);
        let cursor_id = format!("{}-{}", kind.prefix(), Uuid::new_v4());
        let page_size = request.page_size.min(self.max_page_size);

        let ExecutedPage {
            columns,
            rows,
            has_next,
            stream,
            duration,
        } = executor::execute(
            self.engine.as_ref(),
            kind,
            &request.cache_name,
            &request.query_text,
            page_size,
        )
        .await?;

        let cursor = Arc::new(QueryCursor::new(cursor_id.clone(), stream));
        let cursor_id = if has_next {
            // Arm strictly after put: a check must be able to observe the
            // registration it is leasing.
            self.registry.put(cursor);
            self.expiry.arm(cursor_id.clone());
            Some(cursor_id)
        } else {
            cursor.close().await;
            None
        };

        if request.debug {
            tracing::info!(
                kind = %kind,
                cache = %request.cache_name,
                rows = rows.len(),
                has_next,
                duration_ms = duration.as_millis() as u64,
                "query executed"
            );
        }

        Ok(QueryResult {
            node_id: self.node_id,
            cursor_id,
            columns,
            rows,
            has_next,
            duration_ms: duration.as_millis() as u64,
        })
    }

    /// Fetch the next page from a registered cursor, renewing its lease.
    ///
    /// Returns `Ok(None)` when the id is unknown (expired, exhausted, or
    /// never registered). An exhausted cursor is removed and closed here;
    /// its armed check then observes the removal and terminates.
    pub async fn next_page(
        &self,
        cursor_id: &str,
        page_size: usize,
    ) -> Result<Option<NextPage>, QueryError> {
        let Some(cursor) = self.registry.get(cursor_id) else {
            return Ok(None);
        };

        cursor.mark_accessed();
        let limit = page_size.max(1).min(self.max_page_size);
        let (rows, has_next) = cursor
            .fetch_page(limit)
            .await
            .map_err(QueryError::Execution)?;

        if !has_next {
            self.registry.remove(cursor_id);
            cursor.close().await;
        }

        Ok(Some(NextPage { rows, has_next }))
    }
}
