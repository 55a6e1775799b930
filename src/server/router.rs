//! Router builder utilities for the listing routes

use crate::listing::handlers::{AppState, filter_requests, list_requests};
use axum::{Json, Router, routing::get};
use serde_json::{Value, json};

/// Build the listing routes
///
/// - GET / - Render the listing with the stored preferences
/// - POST / - Replace the stored filters and render the listing
pub fn build_listing_routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(list_requests).post(filter_requests))
        .with_state(state)
}

/// Build health check routes
pub fn health_routes() -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/healthz", get(health_check))
}

/// Health check endpoint handler
async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "reqlist-rs"
    }))
}
