// SPDX-FileCopyrightText: Copyright (c) 2025 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

//! Scan and SQL execution paths behind one pagination contract.

use std::time::{Duration, Instant};

use crate::engine::{QueryEngine, RowStream, SqlStream};
use crate::error::QueryError;
use crate::protocols::{ResultColumns, Row};

/// Column names of a scan result page. Scan rows are projected to this
/// fixed layout by the engine.
pub const SCAN_COL_NAMES: [&str; 4] = ["Key Class", "Key", "Value Class", "Value"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    Scan,
    Sql,
}

impl QueryKind {
    /// Classify a query by its leading token: anything starting with `SCAN`
    /// (case-insensitive, leading whitespace ignored) is a scan, everything
    /// else is SQL.
    pub fn classify(query_text: &str) -> Self {
        if query_text.trim_start().to_uppercase().starts_with("SCAN") {
            QueryKind::Scan
        } else {
            QueryKind::Sql
        }
    }

    /// Cursor id prefix, kept distinct per kind for diagnostics.
    pub fn prefix(&self) -> &'static str {
        match self {
            QueryKind::Scan => "scan",
            QueryKind::Sql => "sql",
        }
    }
}

impl std::fmt::Display for QueryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.prefix())
    }
}

/// The first page of an executed query plus the still-open stream.
pub struct ExecutedPage {
    pub columns: ResultColumns,
    pub rows: Vec<Row>,
    pub has_next: bool,
    pub stream: Box<dyn RowStream>,
    /// Open + metadata retrieval + first-page fetch.
    pub duration: Duration,
}

/// Execute one query of the given kind and materialize its first page.
///
/// On the SQL path a missing-metadata response closes the stream before
/// returning [`QueryError::NoMetadata`], so that terminal condition never
/// leaks an open stream. Fetch faults likewise close the stream they
/// opened.
pub async fn execute(
    engine: &dyn QueryEngine,
    kind: QueryKind,
    cache_name: &str,
    query_text: &str,
    page_size: usize,
) -> Result<ExecutedPage, QueryError> {
    match kind {
        QueryKind::Scan => {
            let start = Instant::now();
            let mut stream = engine
                .open_scan(cache_name, page_size)
                .await
                .map_err(QueryError::Execution)?;

            let rows = fetch_first_page(stream.as_mut(), page_size).await?;
            let duration = start.elapsed();
            let has_next = stream.has_next();

            tracing::debug!(
                cache = cache_name,
                rows = rows.len(),
                has_next,
                "scan query executed"
            );

            Ok(ExecutedPage {
                columns: ResultColumns::Scan(
                    SCAN_COL_NAMES.iter().map(|s| s.to_string()).collect(),
                ),
                rows,
                has_next,
                stream,
                duration,
            })
        }
        QueryKind::Sql => {
            let start = Instant::now();
            let SqlStream { mut stream, fields } = engine
                .open_sql(cache_name, query_text, page_size)
                .await
                .map_err(QueryError::Execution)?;

            let Some(fields) = fields else {
                stream.close();
                return Err(QueryError::NoMetadata);
            };

            let rows = fetch_first_page(stream.as_mut(), page_size).await?;
            let duration = start.elapsed();
            let has_next = stream.has_next();

            tracing::debug!(
                cache = cache_name,
                fields = fields.len(),
                rows = rows.len(),
                has_next,
                "sql query executed"
            );

            Ok(ExecutedPage {
                columns: ResultColumns::Sql(fields),
                rows,
                has_next,
                stream,
                duration,
            })
        }
    }
}

async fn fetch_first_page(
    stream: &mut dyn RowStream,
    page_size: usize,
) -> Result<Vec<Row>, QueryError> {
    match stream.fetch_page(page_size).await {
        Ok(rows) => Ok(rows),
        Err(e) => {
            stream.close();
            Err(QueryError::Execution(e))
        }
    }
}
