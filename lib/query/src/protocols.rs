// SPDX-FileCopyrightText: Copyright (c) 2025 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

//! In-process protocol types handed to and from the transport layer.

use serde::{Deserialize, Serialize};

pub type NodeId = uuid::Uuid;

/// One result row, projected to a fixed-width column layout.
pub type Row = Vec<serde_json::Value>;

/// A query against a named distributed cache. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryRequest {
    pub cache_name: String,
    pub query_text: String,
    /// Rows per page; must be positive.
    pub page_size: usize,
    /// When set, the fan-out layer already routed this request here and the
    /// affinity check is skipped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_node: Option<NodeId>,
    #[serde(default)]
    pub debug: bool,
}

impl QueryRequest {
    pub fn new(
        cache_name: impl Into<String>,
        query_text: impl Into<String>,
        page_size: usize,
    ) -> Self {
        Self {
            cache_name: cache_name.into(),
            query_text: query_text.into(),
            page_size,
            target_node: None,
            debug: false,
        }
    }

    pub fn with_target_node(mut self, node: NodeId) -> Self {
        self.target_node = Some(node);
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }
}

/// Descriptor of one SQL result column, in engine-reported order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryField {
    pub schema: String,
    pub type_name: String,
    pub field_name: String,
    pub field_type_name: String,
}

/// Column metadata of a result page: fixed names for scans, field
/// descriptors for SQL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultColumns {
    Scan(Vec<String>),
    Sql(Vec<QueryField>),
}

/// The first page of a query, produced by the node named in `node_id`.
///
/// `cursor_id` is present exactly when `has_next` is true; follow-up pages
/// are fetched from the producing node under that id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub node_id: NodeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor_id: Option<String>,
    pub columns: ResultColumns,
    pub rows: Vec<Row>,
    pub has_next: bool,
    /// Execution plus first-page fetch time.
    pub duration_ms: u64,
}

/// A subsequent page fetched from a registered cursor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NextPage {
    pub rows: Vec<Row>,
    pub has_next: bool,
}
