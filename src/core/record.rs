//! Captured request, response and SQL query records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A profiled HTTP request
///
/// `time_taken` is in milliseconds. Upstream collectors write a negative
/// value (or nothing at all) when the request never finished, so readers
/// must treat anything below zero as unset.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RequestRecord {
    pub id: Uuid,
    pub path: String,
    pub query_params: String,
    pub method: String,
    /// Resolved view name, empty when routing did not resolve one
    pub view_name: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub time_taken: Option<f64>,
    pub num_sql_queries: i64,
    pub encoded_headers: String,
    pub body: String,
}

impl RequestRecord {
    /// Create a request starting now with no timing information
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            path: path.into(),
            query_params: String::new(),
            method: method.into(),
            view_name: String::new(),
            start_time: Utc::now(),
            end_time: None,
            time_taken: None,
            num_sql_queries: 0,
            encoded_headers: String::new(),
            body: String::new(),
        }
    }

    pub fn with_view_name(mut self, view_name: impl Into<String>) -> Self {
        self.view_name = view_name.into();
        self
    }

    pub fn with_start_time(mut self, start_time: DateTime<Utc>) -> Self {
        self.start_time = start_time;
        self
    }

    /// Set the measured duration and derive `end_time` from it
    pub fn with_time_taken(mut self, time_taken: f64) -> Self {
        self.time_taken = Some(time_taken);
        if time_taken >= 0.0 {
            // Left unset when the end would fall outside the representable range
            self.end_time = self.start_time.checked_add_signed(chrono::Duration::microseconds(
                (time_taken * 1000.0) as i64,
            ));
        }
        self
    }
}

/// The response sent back for a profiled request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResponseRecord {
    pub id: Uuid,
    pub request_id: Uuid,
    pub status_code: i32,
    pub encoded_headers: String,
    pub body: String,
}

impl ResponseRecord {
    pub fn new(request_id: Uuid, status_code: i32) -> Self {
        Self {
            id: Uuid::new_v4(),
            request_id,
            status_code,
            encoded_headers: String::new(),
            body: String::new(),
        }
    }
}

/// A SQL statement executed while serving a profiled request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SqlQueryRecord {
    pub id: Uuid,
    pub request_id: Uuid,
    pub query: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub time_taken: Option<f64>,
}

impl SqlQueryRecord {
    pub fn new(request_id: Uuid, query: impl Into<String>, time_taken: Option<f64>) -> Self {
        Self {
            id: Uuid::new_v4(),
            request_id,
            query: query.into(),
            start_time: Utc::now(),
            end_time: None,
            time_taken,
        }
    }
}

/// One row of the listing page
///
/// `db_time` is only populated when the query that produced the row
/// computed the per-request sum of query timings.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RequestRow {
    #[serde(flatten)]
    pub request: RequestRecord,
    pub status_code: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub db_time: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_queries: Option<i64>,
}
