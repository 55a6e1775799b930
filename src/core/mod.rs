//! Core module containing the record model, query description, filters
//! and session state shared by every storage backend

pub mod error;
pub mod filters;
pub mod preferences;
pub mod query;
pub mod record;
pub mod session;
pub mod store;

pub use error::{ListingError, ListingResult};
pub use filters::{FilterEntry, FilterError, RequestFilter};
pub use preferences::{OrderBy, OrderDir, Preferences, SelectOption, ViewStyle};
pub use query::{Annotation, Condition, RequestQuery, SortOrder};
pub use record::{RequestRecord, RequestRow, ResponseRecord, SqlQueryRecord};
pub use session::{FiltersManager, Session, SessionStore, StoredFilters, StoredValue};
pub use store::RequestStore;
