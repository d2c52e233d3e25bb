// SPDX-FileCopyrightText: Copyright (c) 2025 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

//! Cachegrid Query
//!
//! Node-local query execution and result pagination for a distributed cache
//! cluster. A query is routed to a node that owns the cache's partitions
//! (or delegated to one), executed as a predicate-free scan or a SQL fields
//! query, and the first page of rows is returned. When more rows remain, a
//! server-side cursor is kept in a node-local registry under a lazily
//! renewed lease so follow-up calls can fetch subsequent pages.

pub use anyhow::{Context as ErrorContext, Error, Result};

pub mod cluster;
pub mod config;
pub mod cursor;
pub mod engine;
pub mod error;
pub mod executor;
pub mod expiration;
pub mod logging;
pub mod protocols;
pub mod router;
pub mod testing;

pub use cluster::{AffinityOracle, DataNodeSet, DelegationClient};
pub use config::QueryConfig;
pub use cursor::{CursorRegistry, QueryCursor};
pub use engine::{QueryEngine, RowStream, SqlStream};
pub use error::QueryError;
pub use expiration::{CheckOutcome, CursorExpiry};
pub use protocols::{NextPage, NodeId, QueryRequest, QueryResult, Row};
pub use router::QueryRouter;
pub use tokio_util::sync::CancellationToken;
