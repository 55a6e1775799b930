//! Backend-agnostic description of a listing query
//!
//! A `RequestQuery` is what the view builds and a `RequestStore` executes.
//! It mirrors what an ORM query builder would accumulate: annotations
//! (per-request aggregates over related SQL queries), an AND chain of
//! conditions, one ordering and a row limit.
//!
//! # Example
//! ```rust,ignore
//! let query = RequestQuery::new()
//!     .with_db_time()
//!     .db_time_at_least(0.0)
//!     .order_by(OrderBy::DbTime, OrderDir::Desc)
//!     .limit(25);
//! let rows = store.fetch(&query).await?;
//! ```

use crate::core::preferences::{OrderBy, OrderDir};
use crate::core::record::RequestRow;
use chrono::{DateTime, Utc};
use std::cmp::Ordering;

/// Per-request aggregate computed over related SQL query records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Annotation {
    /// Sum of `time_taken` of the request's queries (absent when none)
    DbTime,
    /// Number of query records attached to the request
    NumQueries,
}

/// A single narrowing condition; conditions are combined with AND
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    PathEquals(String),
    ViewNameEquals(String),
    MethodEquals(String),
    StatusCodeEquals(i32),
    StartedAfter(DateTime<Utc>),
    StartedBefore(DateTime<Utc>),
    TimeTakenAtLeast(f64),
    /// Requires [`Annotation::DbTime`]
    DbTimeAtLeast(f64),
    /// Requires [`Annotation::NumQueries`]
    NumQueriesAtLeast(i64),
}

impl Condition {
    /// The annotation a backend must compute before it can test this condition
    pub fn required_annotation(&self) -> Option<Annotation> {
        match self {
            Condition::DbTimeAtLeast(_) => Some(Annotation::DbTime),
            Condition::NumQueriesAtLeast(_) => Some(Annotation::NumQueries),
            _ => None,
        }
    }

    /// Evaluate against a fully materialized row
    ///
    /// Absent measurements never satisfy a lower bound.
    pub fn matches(&self, row: &RequestRow) -> bool {
        let req = &row.request;
        match self {
            Condition::PathEquals(path) => &req.path == path,
            Condition::ViewNameEquals(name) => &req.view_name == name,
            Condition::MethodEquals(method) => &req.method == method,
            Condition::StatusCodeEquals(code) => row.status_code == Some(*code),
            Condition::StartedAfter(at) => req.start_time > *at,
            Condition::StartedBefore(at) => req.start_time < *at,
            Condition::TimeTakenAtLeast(min) => req.time_taken.is_some_and(|t| t >= *min),
            Condition::DbTimeAtLeast(min) => row.db_time.is_some_and(|t| t >= *min),
            Condition::NumQueriesAtLeast(min) => row.num_queries.is_some_and(|n| n >= *min),
        }
    }
}

/// Ordering key plus direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortOrder {
    pub key: OrderBy,
    pub dir: OrderDir,
}

impl SortOrder {
    /// Compare two rows the way a relational backend orders them
    ///
    /// Absent values compare greater than any present value, so they come
    /// last ascending and first descending.
    pub fn compare(&self, a: &RequestRow, b: &RequestRow) -> Ordering {
        let ordering = match self.key {
            OrderBy::StartTime => a.request.start_time.cmp(&b.request.start_time),
            OrderBy::Path => a.request.path.cmp(&b.request.path),
            OrderBy::NumSqlQueries => a.request.num_sql_queries.cmp(&b.request.num_sql_queries),
            OrderBy::TimeTaken => compare_optional(a.request.time_taken, b.request.time_taken),
            OrderBy::DbTime => compare_optional(a.db_time, b.db_time),
        };
        match self.dir {
            OrderDir::Asc => ordering,
            OrderDir::Desc => ordering.reverse(),
        }
    }
}

fn compare_optional(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.total_cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Accumulated listing query
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestQuery {
    annotations: Vec<Annotation>,
    conditions: Vec<Condition>,
    order: Option<SortOrder>,
    limit: Option<usize>,
}

impl RequestQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an annotation; adding the same one twice is a no-op
    pub fn annotate(mut self, annotation: Annotation) -> Self {
        if !self.annotations.contains(&annotation) {
            self.annotations.push(annotation);
        }
        self
    }

    pub fn with_db_time(self) -> Self {
        self.annotate(Annotation::DbTime)
    }

    pub fn with_num_queries(self) -> Self {
        self.annotate(Annotation::NumQueries)
    }

    /// AND a condition onto the chain
    ///
    /// Conditions over aggregates pull in their annotation so a backend
    /// never sees a condition it cannot evaluate.
    pub fn filter(mut self, condition: Condition) -> Self {
        if let Some(annotation) = condition.required_annotation() {
            self = self.annotate(annotation);
        }
        self.conditions.push(condition);
        self
    }

    pub fn path_equals(self, path: impl Into<String>) -> Self {
        self.filter(Condition::PathEquals(path.into()))
    }

    pub fn time_taken_at_least(self, min: f64) -> Self {
        self.filter(Condition::TimeTakenAtLeast(min))
    }

    pub fn db_time_at_least(self, min: f64) -> Self {
        self.filter(Condition::DbTimeAtLeast(min))
    }

    pub fn order_by(mut self, key: OrderBy, dir: OrderDir) -> Self {
        self.order = Some(SortOrder { key, dir });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    pub fn has_annotation(&self, annotation: Annotation) -> bool {
        self.annotations.contains(&annotation)
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn sort_order(&self) -> Option<SortOrder> {
        self.order
    }

    pub fn row_limit(&self) -> Option<usize> {
        self.limit
    }

    /// True when every condition holds for the row
    pub fn matches(&self, row: &RequestRow) -> bool {
        self.conditions.iter().all(|c| c.matches(row))
    }
}
