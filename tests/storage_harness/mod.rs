//! Shared test harness for record store backends
//!
//! Provides fixture helpers that seed requests with responses and SQL
//! query timings, plus the `request_store_tests!` conformance macro.
//!
//! # Usage
//!
//! From any integration test file in `tests/`:
//! ```rust,ignore
//! #[macro_use]
//! mod storage_harness;
//! use storage_harness::*;
//!
//! request_store_tests!(InMemoryRequestStore::new());
//! ```

#![allow(dead_code)]

#[macro_use]
pub mod request_store_tests;

use chrono::{DateTime, Duration, TimeZone, Utc};
use reqlist::core::record::{RequestRecord, ResponseRecord, SqlQueryRecord};
use reqlist::core::store::RequestStore;
use uuid::Uuid;

/// Fixed reference instant so ordering by start time is deterministic
pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
}

/// Description of one request to seed
#[derive(Debug, Clone)]
pub struct Fixture {
    pub method: &'static str,
    pub path: &'static str,
    pub view_name: &'static str,
    pub status: Option<i32>,
    pub time_taken: Option<f64>,
    /// One entry per SQL query; `None` means the query has no timing
    pub query_times: Vec<Option<f64>>,
    /// Minutes after [`base_time`]
    pub started_minutes: i64,
}

impl Fixture {
    pub fn get(path: &'static str) -> Self {
        Self {
            method: "GET",
            path,
            view_name: "",
            status: Some(200),
            time_taken: None,
            query_times: Vec::new(),
            started_minutes: 0,
        }
    }

    pub fn method(mut self, method: &'static str) -> Self {
        self.method = method;
        self
    }

    pub fn view(mut self, view_name: &'static str) -> Self {
        self.view_name = view_name;
        self
    }

    pub fn status(mut self, status: Option<i32>) -> Self {
        self.status = status;
        self
    }

    pub fn took(mut self, ms: f64) -> Self {
        self.time_taken = Some(ms);
        self
    }

    pub fn queries(mut self, times: &[Option<f64>]) -> Self {
        self.query_times = times.to_vec();
        self
    }

    pub fn started(mut self, minutes: i64) -> Self {
        self.started_minutes = minutes;
        self
    }
}

/// Record a fixture with its response and SQL queries
pub async fn seed<S: RequestStore + ?Sized>(store: &S, fixture: Fixture) -> Uuid {
    let mut request = RequestRecord::new(fixture.method, fixture.path)
        .with_view_name(fixture.view_name)
        .with_start_time(base_time() + Duration::minutes(fixture.started_minutes));
    if let Some(ms) = fixture.time_taken {
        request = request.with_time_taken(ms);
    }
    let request = store.record_request(request).await.unwrap();

    if let Some(code) = fixture.status {
        store
            .record_response(ResponseRecord::new(request.id, code))
            .await
            .unwrap();
    }
    for (i, time) in fixture.query_times.iter().enumerate() {
        store
            .record_sql_query(SqlQueryRecord::new(
                request.id,
                format!("SELECT {}", i),
                *time,
            ))
            .await
            .unwrap();
    }
    request.id
}

/// Seed a mixed set of requests covering every sortable attribute
pub async fn seed_mixed<S: RequestStore + ?Sized>(store: &S) -> Vec<Uuid> {
    let fixtures = vec![
        Fixture::get("/orders")
            .view("orders-list")
            .took(120.0)
            .queries(&[Some(10.0), Some(15.0)])
            .started(1),
        Fixture::get("/users")
            .method("POST")
            .view("users-create")
            .status(Some(201))
            .took(40.0)
            .queries(&[Some(5.0)])
            .started(2),
        Fixture::get("/health").took(1.0).started(3),
        Fixture::get("/orders")
            .view("orders-list")
            .status(Some(500))
            .queries(&[Some(2.0), Some(2.0), Some(2.0)])
            .started(4),
        Fixture::get("/broken")
            .method("DELETE")
            .status(None)
            .took(-1.0)
            .queries(&[Some(-3.0)])
            .started(5),
    ];

    let mut ids = Vec::new();
    for fixture in fixtures {
        ids.push(seed(store, fixture).await);
    }
    ids
}
