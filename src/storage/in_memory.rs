//! In-memory record and session stores for testing and development

use crate::core::query::{Annotation, RequestQuery};
use crate::core::record::{RequestRecord, RequestRow, ResponseRecord, SqlQueryRecord};
use crate::core::session::{Session, SessionStore};
use crate::core::store::RequestStore;
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, RwLock};
use uuid::Uuid;

#[derive(Default)]
struct Tables {
    /// Requests in insertion order
    requests: Vec<RequestRecord>,
    responses: HashMap<Uuid, ResponseRecord>,
    queries: Vec<SqlQueryRecord>,
}

impl Tables {
    /// Materialize a row with every aggregate computed
    fn row(&self, request: &RequestRecord) -> RequestRow {
        let timings: Vec<f64> = self
            .queries
            .iter()
            .filter(|q| q.request_id == request.id)
            .filter_map(|q| q.time_taken)
            .collect();
        let num_queries = self
            .queries
            .iter()
            .filter(|q| q.request_id == request.id)
            .count() as i64;

        RequestRow {
            request: request.clone(),
            status_code: self.responses.get(&request.id).map(|r| r.status_code),
            // SUM over no values is NULL, not zero
            db_time: (!timings.is_empty()).then(|| timings.iter().sum()),
            num_queries: Some(num_queries),
        }
    }
}

/// In-memory request store
///
/// Evaluates a [`RequestQuery`] the way a relational backend would:
/// annotate, filter, order, limit. Uses RwLock for thread-safe access.
#[derive(Clone, Default)]
pub struct InMemoryRequestStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryRequestStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Tables>> {
        self.tables
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, Tables>> {
        self.tables
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))
    }
}

#[async_trait]
impl RequestStore for InMemoryRequestStore {
    fn backend_name(&self) -> &'static str {
        "in-memory"
    }

    async fn fetch(&self, query: &RequestQuery) -> Result<Vec<RequestRow>> {
        let tables = self.read()?;

        let mut rows: Vec<RequestRow> = tables
            .requests
            .iter()
            .map(|request| tables.row(request))
            .filter(|row| query.matches(row))
            .collect();

        if let Some(order) = query.sort_order() {
            rows.sort_by(|a, b| order.compare(a, b));
        }
        if let Some(limit) = query.row_limit() {
            rows.truncate(limit);
        }

        // Only expose the aggregates the query asked for
        for row in &mut rows {
            if !query.has_annotation(Annotation::DbTime) {
                row.db_time = None;
            }
            if !query.has_annotation(Annotation::NumQueries) {
                row.num_queries = None;
            }
        }

        Ok(rows)
    }

    async fn distinct_paths(&self) -> Result<Vec<String>> {
        let tables = self.read()?;
        let paths: BTreeSet<&str> = tables.requests.iter().map(|r| r.path.as_str()).collect();
        Ok(paths.into_iter().map(str::to_string).collect())
    }

    async fn distinct_view_names(&self) -> Result<Vec<String>> {
        let tables = self.read()?;
        let names: BTreeSet<&str> = tables
            .requests
            .iter()
            .map(|r| r.view_name.as_str())
            .filter(|name| !name.is_empty())
            .collect();
        Ok(names.into_iter().map(str::to_string).collect())
    }

    async fn distinct_status_codes(&self) -> Result<Vec<i32>> {
        let tables = self.read()?;
        let codes: BTreeSet<i32> = tables.responses.values().map(|r| r.status_code).collect();
        Ok(codes.into_iter().collect())
    }

    async fn distinct_methods(&self) -> Result<Vec<String>> {
        let tables = self.read()?;
        let methods: BTreeSet<&str> = tables.requests.iter().map(|r| r.method.as_str()).collect();
        Ok(methods.into_iter().map(str::to_string).collect())
    }

    async fn record_request(&self, request: RequestRecord) -> Result<RequestRecord> {
        let mut tables = self.write()?;
        if tables.requests.iter().any(|r| r.id == request.id) {
            return Err(anyhow!("Request {} already recorded", request.id));
        }
        tables.requests.push(request.clone());
        Ok(request)
    }

    async fn record_response(&self, response: ResponseRecord) -> Result<ResponseRecord> {
        let mut tables = self.write()?;
        if !tables.requests.iter().any(|r| r.id == response.request_id) {
            return Err(anyhow!("Unknown request {}", response.request_id));
        }
        tables.responses.insert(response.request_id, response.clone());
        Ok(response)
    }

    async fn record_sql_query(&self, query: SqlQueryRecord) -> Result<SqlQueryRecord> {
        let mut tables = self.write()?;
        let Some(request) = tables.requests.iter_mut().find(|r| r.id == query.request_id) else {
            return Err(anyhow!("Unknown request {}", query.request_id));
        };
        request.num_sql_queries += 1;
        tables.queries.push(query.clone());
        Ok(query)
    }
}

/// In-memory session store
#[derive(Clone, Default)]
pub struct InMemorySessionStore {
    sessions: Arc<RwLock<HashMap<Uuid, Session>>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of sessions held
    pub fn len(&self) -> usize {
        self.sessions.read().map(|s| s.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn load(&self, id: &Uuid) -> Result<Option<Session>> {
        let sessions = self
            .sessions
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;
        Ok(sessions.get(id).cloned())
    }

    async fn save(&self, session: &Session) -> Result<()> {
        let mut sessions = self
            .sessions
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;
        sessions.insert(session.id, session.clone());
        Ok(())
    }
}
