// SPDX-FileCopyrightText: Copyright (c) 2025 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

//! In-memory collaborators for tests.
//!
//! The production affinity oracle, query engine, and delegation layer live
//! outside this crate; these mocks implement the same seams over plain
//! in-memory state so unit and integration tests can drive the full
//! execute → register → expire lifecycle deterministically.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::cluster::{AffinityOracle, DataNodeSet, DelegationClient};
use crate::engine::{QueryEngine, RowStream, SqlStream};
use crate::protocols::{NodeId, QueryField, QueryRequest, QueryResult, ResultColumns, Row};
use crate::Result;

/// A row stream over a pre-built vector of rows.
pub struct VecStream {
    rows: std::collections::VecDeque<Row>,
    closed: bool,
    /// Shared count of streams the owning engine still has open.
    open_count: Option<Arc<AtomicUsize>>,
}

impl VecStream {
    pub fn new(rows: Vec<Row>) -> Self {
        Self {
            rows: rows.into(),
            closed: false,
            open_count: None,
        }
    }

    fn tracked(rows: Vec<Row>, open_count: Arc<AtomicUsize>) -> Self {
        open_count.fetch_add(1, Ordering::SeqCst);
        Self {
            rows: rows.into(),
            closed: false,
            open_count: Some(open_count),
        }
    }
}

#[async_trait]
impl RowStream for VecStream {
    async fn fetch_page(&mut self, limit: usize) -> Result<Vec<Row>> {
        if self.closed {
            anyhow::bail!("fetch on closed stream");
        }
        let take = limit.min(self.rows.len());
        Ok(self.rows.drain(..take).collect())
    }

    fn has_next(&self) -> bool {
        !self.rows.is_empty()
    }

    fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        if let Some(count) = &self.open_count {
            count.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

/// Query engine over per-cache row vectors.
///
/// Scans and SQL queries both page over the cache's rows; SQL metadata can
/// be withheld with [`MockEngine::without_metadata`] to exercise that
/// terminal path. `open_streams` reports streams opened but not yet closed.
#[derive(Clone)]
pub struct MockEngine {
    rows: Arc<Mutex<HashMap<String, Vec<Row>>>>,
    metadata_available: Arc<AtomicBool>,
    open_count: Arc<AtomicUsize>,
    opens: Arc<AtomicUsize>,
}

impl MockEngine {
    pub fn new() -> Self {
        Self {
            rows: Arc::new(Mutex::new(HashMap::new())),
            metadata_available: Arc::new(AtomicBool::new(true)),
            open_count: Arc::new(AtomicUsize::new(0)),
            opens: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_rows(self, cache_name: impl Into<String>, rows: Vec<Row>) -> Self {
        self.rows.lock().unwrap().insert(cache_name.into(), rows);
        self
    }

    pub fn without_metadata(self) -> Self {
        self.metadata_available.store(false, Ordering::SeqCst);
        self
    }

    /// Streams opened and not yet closed.
    pub fn open_streams(&self) -> usize {
        self.open_count.load(Ordering::SeqCst)
    }

    /// Total number of streams ever opened.
    pub fn total_opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    fn cache_rows(&self, cache_name: &str) -> Vec<Row> {
        self.rows
            .lock()
            .unwrap()
            .get(cache_name)
            .cloned()
            .unwrap_or_default()
    }

    /// Field descriptors matching the single-column rows the mock serves.
    pub fn fields() -> Vec<QueryField> {
        vec![QueryField {
            schema: "PUBLIC".to_string(),
            type_name: "PERSON".to_string(),
            field_name: "VALUE".to_string(),
            field_type_name: "java.lang.Integer".to_string(),
        }]
    }
}

impl Default for MockEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl QueryEngine for MockEngine {
    async fn open_scan(&self, cache_name: &str, _page_size: usize) -> Result<Box<dyn RowStream>> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(VecStream::tracked(
            self.cache_rows(cache_name),
            self.open_count.clone(),
        )))
    }

    async fn open_sql(
        &self,
        cache_name: &str,
        _query_text: &str,
        _page_size: usize,
    ) -> Result<SqlStream> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        let stream = Box::new(VecStream::tracked(
            self.cache_rows(cache_name),
            self.open_count.clone(),
        ));
        let fields = self
            .metadata_available
            .load(Ordering::SeqCst)
            .then(Self::fields);
        Ok(SqlStream { stream, fields })
    }
}

/// Affinity oracle over a fixed cache → data-node-set table.
#[derive(Clone, Default)]
pub struct StaticAffinityOracle {
    caches: Arc<Mutex<HashMap<String, DataNodeSet>>>,
}

impl StaticAffinityOracle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cache(self, cache_name: impl Into<String>, nodes: impl IntoIterator<Item = NodeId>) -> Self {
        self.caches
            .lock()
            .unwrap()
            .insert(cache_name.into(), DataNodeSet::new(nodes));
        self
    }
}

#[async_trait]
impl AffinityOracle for StaticAffinityOracle {
    async fn data_nodes(&self, cache_name: &str) -> Result<DataNodeSet> {
        Ok(self
            .caches
            .lock()
            .unwrap()
            .get(cache_name)
            .cloned()
            .unwrap_or_default())
    }
}

/// Delegation client that records its calls and answers with a canned
/// result attributed to the first target node.
#[derive(Clone, Default)]
pub struct RecordingDelegation {
    calls: Arc<Mutex<Vec<DelegatedCall>>>,
}

#[derive(Debug, Clone)]
pub struct DelegatedCall {
    pub nodes: Vec<NodeId>,
    pub request: QueryRequest,
    pub failover_disabled: bool,
}

impl RecordingDelegation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<DelegatedCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl DelegationClient for RecordingDelegation {
    async fn run_on(
        &self,
        nodes: &[NodeId],
        request: QueryRequest,
        failover_disabled: bool,
    ) -> Result<QueryResult> {
        let produced_by = *nodes
            .first()
            .ok_or_else(|| anyhow::anyhow!("delegated to an empty node set"))?;

        self.calls.lock().unwrap().push(DelegatedCall {
            nodes: nodes.to_vec(),
            request,
            failover_disabled,
        });

        Ok(QueryResult {
            node_id: produced_by,
            cursor_id: None,
            columns: ResultColumns::Sql(MockEngine::fields()),
            rows: Vec::new(),
            has_next: false,
            duration_ms: 0,
        })
    }
}
