// SPDX-FileCopyrightText: Copyright (c) 2025 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

//! Error taxonomy for query execution.
//!
//! Every failure of [`crate::router::QueryRouter::execute`] is one of these
//! variants; nothing escapes as a panic. Expiration checks swallow their own
//! faults and never surface here, since no caller waits on them.

#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    /// No cluster node currently owns partitions of the requested cache.
    #[error("no data nodes for cache: {cache_name}")]
    NoDataNodes { cache_name: String },

    /// The query engine could not describe the SQL result columns. The
    /// opened stream has already been closed when this is returned.
    #[error("failed to execute query: no metadata available")]
    NoMetadata,

    /// Any fault during scan/SQL execution or page fetch.
    #[error("query execution failed")]
    Execution(#[source] anyhow::Error),

    /// The delegated fan-out execution failed on the data nodes.
    #[error("delegated execution failed")]
    Delegation(#[source] anyhow::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_data_nodes_names_the_cache() {
        let err = QueryError::NoDataNodes {
            cache_name: "people".to_string(),
        };
        assert_eq!(err.to_string(), "no data nodes for cache: people");
    }

    #[test]
    fn test_execution_preserves_source() {
        use std::error::Error as _;

        let err = QueryError::Execution(anyhow::anyhow!("connection reset"));
        assert!(err.source().unwrap().to_string().contains("connection reset"));
    }
}
