//! Query builder for stored samples.
//!
//! [`SampleQuery`] follows the builder pattern: every filter is optional and
//! the methods chain in any order.
//!
//! # Example
//!
//! ```
//! use loctrack_store::{SampleQuery, Store};
//!
//! let store = Store::open_in_memory()?;
//!
//! // Second page of ten, newest first
//! let query = SampleQuery::new().limit(10).offset(10);
//! let samples = store.query_samples(&query)?;
//!
//! // Everything in a window, chronological
//! let window = SampleQuery::new()
//!     .since(1_700_000_000_000)
//!     .until(1_700_086_400_000)
//!     .oldest_first();
//! let samples = store.query_samples(&window)?;
//! # Ok::<(), loctrack_store::Error>(())
//! ```

/// Fluent query builder for location samples.
///
/// Use this to construct queries for [`Store::query_samples`](crate::Store::query_samples).
/// Timestamps are milliseconds since the Unix epoch and both bounds are
/// inclusive.
///
/// By default, queries return results ordered by `timestamp` descending
/// (newest first), with insertion order breaking ties.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SampleQuery {
    /// Include only samples at or after this timestamp.
    pub since: Option<i64>,
    /// Include only samples at or before this timestamp.
    pub until: Option<i64>,
    /// Maximum number of results.
    pub limit: Option<u32>,
    /// Offset for pagination.
    pub offset: Option<u32>,
    /// Order by timestamp descending (newest first).
    pub newest_first: bool,
}

impl SampleQuery {
    /// Create a new query with default settings.
    ///
    /// Default behavior:
    /// - No time range filter
    /// - No limit (all matching records)
    /// - Ordered by newest first
    pub fn new() -> Self {
        Self {
            newest_first: true,
            ..Default::default()
        }
    }

    /// Filter to samples captured at or after this timestamp.
    pub fn since(mut self, timestamp_ms: i64) -> Self {
        self.since = Some(timestamp_ms);
        self
    }

    /// Filter to samples captured at or before this timestamp.
    pub fn until(mut self, timestamp_ms: i64) -> Self {
        self.until = Some(timestamp_ms);
        self
    }

    /// Limit the maximum number of results returned.
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Skip the first N results.
    pub fn offset(mut self, offset: u32) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Order results by oldest first.
    pub fn oldest_first(mut self) -> Self {
        self.newest_first = false;
        self
    }

    /// Build the SQL WHERE clause and parameters.
    pub(crate) fn build_where(&self) -> (String, Vec<i64>) {
        let mut conditions = Vec::new();
        let mut params = Vec::new();

        if let Some(since) = self.since {
            conditions.push("timestamp >= ?");
            params.push(since);
        }

        if let Some(until) = self.until {
            conditions.push("timestamp <= ?");
            params.push(until);
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        (where_clause, params)
    }

    /// Build the full SQL query.
    pub(crate) fn build_sql(&self) -> String {
        let (where_clause, _) = self.build_where();
        let order = if self.newest_first { "DESC" } else { "ASC" };

        let mut sql = format!(
            "SELECT id, latitude, longitude, address, timestamp, formatted_time \
             FROM location_samples {} ORDER BY timestamp {order}, id {order}",
            where_clause
        );

        match (self.limit, self.offset) {
            (Some(limit), Some(offset)) => {
                sql.push_str(&format!(" LIMIT {} OFFSET {}", limit, offset))
            }
            (Some(limit), None) => sql.push_str(&format!(" LIMIT {}", limit)),
            // SQLite only accepts OFFSET after a LIMIT clause.
            (None, Some(offset)) => sql.push_str(&format!(" LIMIT -1 OFFSET {}", offset)),
            (None, None) => {}
        }

        sql
    }
}
