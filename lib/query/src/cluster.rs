// SPDX-FileCopyrightText: Copyright (c) 2025 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

//! Cluster-facing seams: partition affinity and fan-out delegation.
//!
//! Both traits are consumed, never implemented, by this crate. Production
//! implementations live with the cluster membership and task layers;
//! [`crate::testing`] provides in-memory versions for tests.

use async_trait::async_trait;
use std::collections::HashSet;

use crate::protocols::{NodeId, QueryRequest, QueryResult};
use crate::Result;

/// The set of nodes currently hosting partitions of a cache.
///
/// A snapshot taken at request time; membership can change between calls,
/// so this is never cached.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataNodeSet {
    nodes: HashSet<NodeId>,
}

impl DataNodeSet {
    pub fn new(nodes: impl IntoIterator<Item = NodeId>) -> Self {
        Self {
            nodes: nodes.into_iter().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.nodes.contains(&node)
    }

    pub fn ids(&self) -> Vec<NodeId> {
        self.nodes.iter().copied().collect()
    }
}

/// Partition-affinity lookup against the current cluster topology.
#[async_trait]
pub trait AffinityOracle: Send + Sync {
    async fn data_nodes(&self, cache_name: &str) -> Result<DataNodeSet>;
}

/// Fan-out task layer used when the local node holds no partitions of the
/// queried cache. How the layer picks or merges a single result from the
/// target nodes is its own concern; the router returns it verbatim.
#[async_trait]
pub trait DelegationClient: Send + Sync {
    async fn run_on(
        &self,
        nodes: &[NodeId],
        request: QueryRequest,
        failover_disabled: bool,
    ) -> Result<QueryResult>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_node_set_membership() {
        let a = NodeId::new_v4();
        let b = NodeId::new_v4();
        let c = NodeId::new_v4();

        let set = DataNodeSet::new([a, b]);
        assert_eq!(set.len(), 2);
        assert!(set.contains(a));
        assert!(set.contains(b));
        assert!(!set.contains(c));

        assert!(DataNodeSet::default().is_empty());
    }
}
