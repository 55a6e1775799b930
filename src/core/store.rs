//! Record store trait

use crate::core::query::RequestQuery;
use crate::core::record::{RequestRecord, RequestRow, ResponseRecord, SqlQueryRecord};
use anyhow::Result;
use async_trait::async_trait;

/// Storage of captured request records
///
/// Backends execute a [`RequestQuery`] and answer the distinct-value
/// lookups used to populate the listing's dropdowns. Ingestion methods are
/// used by collectors, fixtures and demos.
#[async_trait]
pub trait RequestStore: Send + Sync {
    /// Short backend name used in error messages
    fn backend_name(&self) -> &'static str;

    /// Execute a listing query
    ///
    /// Rows must come back ordered as the query asks, hold at most
    /// `row_limit()` entries, and carry `db_time` / `num_queries` when
    /// the corresponding annotation was requested.
    async fn fetch(&self, query: &RequestQuery) -> Result<Vec<RequestRow>>;

    /// Distinct request paths, sorted
    async fn distinct_paths(&self) -> Result<Vec<String>>;

    /// Distinct non-empty view names, sorted
    async fn distinct_view_names(&self) -> Result<Vec<String>>;

    /// Distinct response status codes, sorted
    async fn distinct_status_codes(&self) -> Result<Vec<i32>>;

    /// Distinct request methods, sorted
    async fn distinct_methods(&self) -> Result<Vec<String>>;

    async fn record_request(&self, request: RequestRecord) -> Result<RequestRecord>;

    async fn record_response(&self, response: ResponseRecord) -> Result<ResponseRecord>;

    async fn record_sql_query(&self, query: SqlQueryRecord) -> Result<SqlQueryRecord>;
}
