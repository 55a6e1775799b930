//! # reqlist-rs
//!
//! A filterable, sortable listing page for HTTP requests captured by a
//! request profiler.
//!
//! ## Features
//!
//! - **Session-Persisted Preferences**: Page size, sort key, sort direction
//!   and view style survive across page loads
//! - **Typed Filters**: A closed set of filter kinds, each narrowing the
//!   listing query and rendering a human-readable label
//! - **Backend-Agnostic Queries**: One query description executed by the
//!   in-memory store or PostgreSQL
//! - **Configuration-Based**: Page sizes, session naming and the database
//!   URL come from YAML
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use reqlist::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let store = InMemoryRequestStore::new();
//!     let request = store
//!         .record_request(RequestRecord::new("GET", "/orders").with_time_taken(12.0))
//!         .await?;
//!     store.record_response(ResponseRecord::new(request.id, 200)).await?;
//!
//!     ServerBuilder::new()
//!         .with_request_store(store)
//!         .with_config(ListingConfig::default())
//!         .serve()
//!         .await
//! }
//! ```

pub mod config;
pub mod core;
pub mod listing;
pub mod server;
pub mod storage;

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Core ===
    pub use crate::core::{
        error::{ListingError, ListingResult},
        filters::{FilterEntry, FilterError, RequestFilter},
        preferences::{OrderBy, OrderDir, Preferences, ViewStyle},
        query::{Annotation, Condition, RequestQuery},
        record::{RequestRecord, RequestRow, ResponseRecord, SqlQueryRecord},
        session::{FiltersManager, Session, SessionStore, StoredFilters},
        store::RequestStore,
    };

    // === Listing ===
    pub use crate::listing::{
        AppState, ListingContext, ListingTemplates, RequestsView, filter_requests, list_requests,
    };

    // === Storage ===
    pub use crate::storage::{InMemoryRequestStore, InMemorySessionStore};
    #[cfg(feature = "postgres")]
    pub use crate::storage::PostgresRequestStore;

    // === Config ===
    pub use crate::config::ListingConfig;

    // === Server ===
    pub use crate::server::ServerBuilder;

    // === External dependencies ===
    pub use anyhow::Result;
    pub use async_trait::async_trait;
    pub use chrono::{DateTime, Utc};
    pub use serde::{Deserialize, Serialize};
    pub use uuid::Uuid;

    // === Axum ===
    pub use axum::{
        Router,
        extract::State,
        routing::{get, post},
    };
}
