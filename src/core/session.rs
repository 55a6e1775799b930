//! Session-scoped preference and filter state
//!
//! The listing keeps one flat mapping per session under a fixed slot name.
//! It holds the four display preferences as plain strings next to the
//! filter entries, keyed by filter identifier:
//!
//! ```text
//! {
//!   "show": "10",
//!   "order_by": "path",
//!   "f1": {"typ": "MethodFilter", "value": "GET", "str": "Method == GET"}
//! }
//! ```
//!
//! Reading, merging and writing are separate steps: [`FiltersManager::get`]
//! returns a [`StoredFilters`] value, the `merge_*` methods return a new
//! value, and [`FiltersManager::save`] writes it back into the session.

use crate::core::error::SessionError;
use crate::core::filters::{FilterEntry, FilterError, RequestFilter};
use crate::core::preferences::{OrderDir, PREFERENCE_KEYS, Preferences, ViewStyle};
use anyhow::Result;
use async_trait::async_trait;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Slot name used when none is configured
pub const DEFAULT_SESSION_KEY: &str = "request_filters";

/// A browser session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    /// Anti-forgery token issued with the session
    pub csrf_token: String,
    data: IndexMap<String, Value>,
}

impl Session {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            csrf_token: Uuid::new_v4().simple().to_string(),
            data: IndexMap::new(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.data.insert(key.into(), value);
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// Storage for sessions
///
/// The hosting application decides where sessions live; the listing only
/// needs to load one by id and write it back.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load(&self, id: &Uuid) -> Result<Option<Session>>;

    async fn save(&self, session: &Session) -> Result<()>;
}

/// One value of the stored mapping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StoredValue {
    Filter(FilterEntry),
    Scalar(String),
}

/// The stored preference/filter mapping
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StoredFilters(IndexMap<String, StoredValue>);

impl StoredFilters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, key: &str) -> Option<&StoredValue> {
        self.0.get(key)
    }

    /// A stored preference value, if present as a string
    pub fn preference(&self, key: &str) -> Option<&str> {
        match self.0.get(key) {
            Some(StoredValue::Scalar(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn set_preference(&mut self, key: &str, value: impl Into<String>) {
        self.0
            .insert(key.to_string(), StoredValue::Scalar(value.into()));
    }

    /// Overlay preference values from a query string
    ///
    /// Only the four preference keys are taken from `params`; everything
    /// already stored, filters included, is kept.
    pub fn merge_query(&self, params: &[(String, String)]) -> Self {
        let mut merged = self.clone();
        for (key, value) in params {
            if PREFERENCE_KEYS.contains(&key.as_str()) {
                merged.set_preference(key, value.clone());
            }
        }
        merged
    }

    /// Replace the stored filters with a new submission
    ///
    /// Stored preference keys survive; previously stored filters do not.
    pub fn merge_submission(&self, filters: &IndexMap<String, RequestFilter>) -> Self {
        let mut merged: IndexMap<String, StoredValue> = self
            .0
            .iter()
            .filter(|(key, _)| PREFERENCE_KEYS.contains(&key.as_str()))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        for (ident, filter) in filters {
            if PREFERENCE_KEYS.contains(&ident.as_str()) {
                tracing::warn!(ident = %ident, "Ignoring filter whose identifier shadows a preference");
                continue;
            }
            merged.insert(ident.clone(), StoredValue::Filter(filter.to_entry()));
        }
        Self(merged)
    }

    /// Resolve display preferences, falling back to defaults
    pub fn preferences(&self, default_show: usize) -> Preferences {
        let defaults = Preferences::with_default_show(default_show);
        Preferences {
            show: Preferences::parse_show(self.preference("show"), default_show),
            order_by: self
                .preference("order_by")
                .map(str::to_string)
                .unwrap_or(defaults.order_by),
            order_dir: self
                .preference("order_dir")
                .map(OrderDir::parse)
                .unwrap_or(defaults.order_dir),
            view_style: self
                .preference("view_style")
                .map(ViewStyle::parse_or_default)
                .unwrap_or(defaults.view_style),
        }
    }

    /// Stored filter entries, in insertion order
    pub fn filter_entries(&self) -> impl Iterator<Item = (&String, &FilterEntry)> {
        self.0.iter().filter_map(|(ident, value)| match value {
            StoredValue::Filter(entry) if !PREFERENCE_KEYS.contains(&ident.as_str()) => {
                Some((ident, entry))
            }
            _ => None,
        })
    }

    /// Rebuild every stored filter
    pub fn filters(&self) -> Vec<(String, Result<RequestFilter, FilterError>)> {
        self.filter_entries()
            .map(|(ident, entry)| (ident.clone(), RequestFilter::from_entry(entry)))
            .collect()
    }
}

impl FromIterator<(String, StoredValue)> for StoredFilters {
    fn from_iter<I: IntoIterator<Item = (String, StoredValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Reads and writes the stored mapping in a session slot
#[derive(Debug, Clone)]
pub struct FiltersManager {
    key: String,
}

impl FiltersManager {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    /// The stored mapping, empty when the slot was never written
    pub fn get(&self, session: &Session) -> Result<StoredFilters, SessionError> {
        match session.get(&self.key) {
            None | Some(Value::Null) => Ok(StoredFilters::new()),
            Some(value) => serde_json::from_value(value.clone()).map_err(|e| {
                SessionError::CorruptSlot {
                    key: self.key.clone(),
                    message: e.to_string(),
                }
            }),
        }
    }

    pub fn save(&self, session: &mut Session, filters: &StoredFilters) -> Result<(), SessionError> {
        let value = serde_json::to_value(filters).map_err(|e| SessionError::CorruptSlot {
            key: self.key.clone(),
            message: e.to_string(),
        })?;
        session.insert(self.key.clone(), value);
        Ok(())
    }
}

impl Default for FiltersManager {
    fn default() -> Self {
        Self::new(DEFAULT_SESSION_KEY)
    }
}
