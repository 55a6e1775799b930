//! Server module for building the listing HTTP server
//!
//! This module provides a `ServerBuilder` that wires the record store, the
//! session store and the configuration into an axum `Router` exposing:
//! - The listing page (`GET /`, `POST /`)
//! - Health check routes

pub mod builder;
pub mod router;

pub use builder::ServerBuilder;
pub use router::{build_listing_routes, health_routes};
