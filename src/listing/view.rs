//! The request listing view
//!
//! `RequestsView` owns everything needed to answer one listing request:
//! the record store, the session slot accessor and the page-size settings.
//! Handlers hand it a mutable [`Session`]; the view reads and rewrites the
//! stored mapping and returns the page context. Persisting the session is
//! left to the caller.

use crate::config::ListingConfig;
use crate::core::error::{ListingError, ListingResult, QueryError};
use crate::core::filters::{FilterEntry, RequestFilter, filters_from_form};
use crate::core::preferences::{OrderBy, OrderDir, SelectOption, ViewStyle};
use crate::core::query::RequestQuery;
use crate::core::record::RequestRow;
use crate::core::session::{FiltersManager, Session};
use crate::core::store::RequestStore;
use indexmap::IndexMap;
use serde::Serialize;
use std::sync::Arc;

/// Everything the listing template renders
#[derive(Debug, Clone, Serialize)]
pub struct ListingContext {
    pub show: usize,
    pub order_by: String,
    pub order_dir: String,
    pub view_style: String,
    pub options_show: Vec<usize>,
    pub options_order_by: Vec<SelectOption>,
    pub options_order_dir: Vec<SelectOption>,
    pub options_view_style: Vec<SelectOption>,
    pub options_paths: Vec<String>,
    pub options_status_codes: Vec<i32>,
    pub options_methods: Vec<String>,
    pub view_names: Vec<String>,
    /// Stored filters keyed by identifier
    pub filters: IndexMap<String, FilterEntry>,
    pub filter_kinds: Vec<&'static str>,
    /// Identifier for a filter added from the page, unused by `filters`
    pub new_filter_ident: String,
    pub csrf_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    pub results: Vec<RequestRow>,
}

/// Listing of profiled requests
pub struct RequestsView {
    store: Arc<dyn RequestStore>,
    filters_manager: FiltersManager,
    default_show: usize,
    show_options: Vec<usize>,
}

impl RequestsView {
    pub fn new(store: Arc<dyn RequestStore>, config: &ListingConfig) -> Self {
        Self {
            store,
            filters_manager: FiltersManager::new(config.session_key.clone()),
            default_show: config.default_show,
            show_options: config.show_options.clone(),
        }
    }

    pub fn filters_manager(&self) -> &FiltersManager {
        &self.filters_manager
    }

    /// Build the listing query
    ///
    /// Missing or zero `show` falls back to the default page size, missing
    /// `order_by` to recency and missing `order_dir` to descending.
    pub fn build_query(
        &self,
        show: Option<usize>,
        order_by: Option<&str>,
        order_dir: Option<OrderDir>,
        path: Option<&str>,
        filters: &[RequestFilter],
    ) -> Result<RequestQuery, QueryError> {
        let show = show.filter(|n| *n > 0).unwrap_or(self.default_show);
        let order_by: OrderBy = match order_by {
            Some(key) if !key.is_empty() => key.parse()?,
            _ => OrderBy::default(),
        };
        let order_dir = order_dir.unwrap_or_default();

        let mut query = RequestQuery::new();
        if let Some(narrow) = order_by.narrowing() {
            query = narrow(query);
        }
        query = query.order_by(order_by, order_dir);

        if let Some(path) = path.filter(|p| !p.is_empty()) {
            query = query.path_equals(path);
        }

        for filter in filters {
            query = filter.apply(query);
        }

        tracing::debug!(
            order_by = %order_by,
            order_dir = order_dir.as_str(),
            show,
            conditions = query.conditions().len(),
            "Built request listing query"
        );

        Ok(query.limit(show))
    }

    /// Fetch one page of request rows
    pub async fn get_objects(
        &self,
        show: Option<usize>,
        order_by: Option<&str>,
        order_dir: Option<OrderDir>,
        path: Option<&str>,
        filters: &[RequestFilter],
    ) -> ListingResult<Vec<RequestRow>> {
        let query = self.build_query(show, order_by, order_dir, path, filters)?;
        self.store
            .fetch(&query)
            .await
            .map_err(|e| ListingError::storage(self.store.backend_name(), e))
    }

    /// Assemble the page context from the stored mapping
    ///
    /// Read-only: neither the session nor the store is modified.
    pub async fn create_context(
        &self,
        session: &Session,
        path: Option<&str>,
    ) -> ListingResult<ListingContext> {
        let stored = self.filters_manager.get(session)?;
        let prefs = stored.preferences(self.default_show);

        let mut filters = Vec::new();
        for (ident, rebuilt) in stored.filters() {
            match rebuilt {
                Ok(filter) => filters.push(filter),
                Err(e) => {
                    tracing::warn!(ident = %ident, error = %e, "Skipping stored filter");
                }
            }
        }

        let backend = self.store.backend_name();
        let (paths, view_names, status_codes, methods) = tokio::try_join!(
            self.store.distinct_paths(),
            self.store.distinct_view_names(),
            self.store.distinct_status_codes(),
            self.store.distinct_methods(),
        )
        .map_err(|e| ListingError::storage(backend, e))?;

        let results = self
            .get_objects(
                Some(prefs.show),
                Some(&prefs.order_by),
                Some(prefs.order_dir),
                path,
                &filters,
            )
            .await?;

        let filters: IndexMap<String, FilterEntry> = stored
            .filter_entries()
            .map(|(ident, entry)| (ident.clone(), entry.clone()))
            .collect();
        let new_filter_ident = (1..)
            .map(|n| format!("new{n}"))
            .find(|ident| !filters.contains_key(ident))
            .unwrap_or_default();

        Ok(ListingContext {
            show: prefs.show,
            order_by: prefs.order_by,
            order_dir: prefs.order_dir.as_str().to_string(),
            view_style: prefs.view_style.as_str().to_string(),
            options_show: self.show_options.clone(),
            options_order_by: OrderBy::options(),
            options_order_dir: OrderDir::options(),
            options_view_style: ViewStyle::options(),
            options_paths: paths,
            options_status_codes: status_codes,
            options_methods: methods,
            view_names,
            filters,
            filter_kinds: RequestFilter::KINDS.to_vec(),
            new_filter_ident,
            csrf_token: session.csrf_token.clone(),
            path: path.filter(|p| !p.is_empty()).map(str::to_string),
            results,
        })
    }

    /// Read path
    ///
    /// A non-empty query string overlays its preference keys on the stored
    /// mapping, which is saved before the page is built.
    pub async fn get(
        &self,
        session: &mut Session,
        params: &[(String, String)],
    ) -> ListingResult<ListingContext> {
        if !params.is_empty() {
            let stored = self.filters_manager.get(session)?.merge_query(params);
            tracing::debug!(entries = stored.len(), "Saving preferences from query string");
            self.filters_manager.save(session, &stored)?;
        }
        let path = query_value(params, "path");
        self.create_context(session, path).await
    }

    /// Write path
    ///
    /// Submitted filters replace the stored ones; stored preferences stay.
    pub async fn post(
        &self,
        session: &mut Session,
        params: &[(String, String)],
        form: &[(String, String)],
    ) -> ListingResult<ListingContext> {
        let submitted = filters_from_form(form);
        let stored = self
            .filters_manager
            .get(session)?
            .merge_submission(&submitted);
        tracing::debug!(filters = submitted.len(), "Saving submitted filters");
        self.filters_manager.save(session, &stored)?;

        let path = query_value(params, "path");
        self.create_context(session, path).await
    }
}

/// Last value of a repeated query parameter
fn query_value<'a>(params: &'a [(String, String)], key: &str) -> Option<&'a str> {
    params
        .iter()
        .rev()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}
