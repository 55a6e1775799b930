//! The profiled request listing page
//!
//! - [`view`]: query construction and page context assembly
//! - [`handlers`]: axum handlers for the read and write paths
//! - [`template`]: the embedded HTML template

pub mod handlers;
pub mod template;
pub mod view;

pub use handlers::{AppState, filter_requests, list_requests};
pub use template::ListingTemplates;
pub use view::{ListingContext, RequestsView};
