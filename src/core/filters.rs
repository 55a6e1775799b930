//! Filter predicates over profiled requests
//!
//! Each filter kind is a variant of [`RequestFilter`] and follows a
//! two-step contract when applied to a [`RequestQuery`]:
//!
//! 1. [`RequestFilter::contribute`] adds whatever the condition needs
//!    (annotations over related query records)
//! 2. [`RequestFilter::condition`] produces the condition that is ANDed
//!    onto the query
//!
//! Filters are persisted as [`FilterEntry`] values (`typ`, `value`, `str`)
//! and rebuilt with [`RequestFilter::from_entry`], which rejects unknown
//! kinds and values that do not parse.

use crate::core::query::{Annotation, Condition, RequestQuery};
use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;
use thiserror::Error;

/// Date format accepted by the date filters
pub const DATE_FORMAT: &str = "%Y/%m/%d %H:%M";

static FORM_FIELD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^filter-([^-]+)-(typ|value)$").expect("form field pattern is valid")
});

/// Reasons a filter cannot be rebuilt from its stored or submitted form
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FilterError {
    #[error("Unknown filter kind: {kind}")]
    UnknownKind { kind: String },

    #[error("Invalid value '{value}' for {kind}: {message}")]
    InvalidValue {
        kind: String,
        value: String,
        message: String,
    },
}

/// Serialized form of a filter as kept in session storage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterEntry {
    pub typ: String,
    pub value: String,
    /// Human-readable rendering, shown as the filter's chip on the page
    #[serde(rename = "str", default)]
    pub label: String,
}

/// A filter predicate
#[derive(Debug, Clone, PartialEq)]
pub enum RequestFilter {
    /// Started within the last `n` seconds
    Seconds(i64),
    AfterDate(DateTime<Utc>),
    BeforeDate(DateTime<Utc>),
    ViewName(String),
    Path(String),
    /// At least `n` SQL query records
    NumQueries(i64),
    /// At least `n` ms spent in SQL queries
    TimeSpentOnQueries(i64),
    /// Took at least `n` ms overall
    OverallTime(f64),
    StatusCode(i32),
    Method(String),
}

impl RequestFilter {
    pub const KINDS: [&'static str; 10] = [
        "SecondsFilter",
        "AfterDateFilter",
        "BeforeDateFilter",
        "ViewNameFilter",
        "PathFilter",
        "NumQueriesFilter",
        "TimeSpentOnQueriesFilter",
        "OverallTimeFilter",
        "StatusCodeFilter",
        "MethodFilter",
    ];

    /// Build a filter from its kind name and raw value
    pub fn parse(kind: &str, value: &str) -> Result<Self, FilterError> {
        let value = value.trim();
        match kind {
            "SecondsFilter" => Ok(RequestFilter::Seconds(parse_seconds(kind, value)?)),
            "AfterDateFilter" => Ok(RequestFilter::AfterDate(parse_date(kind, value)?)),
            "BeforeDateFilter" => Ok(RequestFilter::BeforeDate(parse_date(kind, value)?)),
            "ViewNameFilter" => Ok(RequestFilter::ViewName(value.to_string())),
            "PathFilter" => Ok(RequestFilter::Path(value.to_string())),
            "NumQueriesFilter" => Ok(RequestFilter::NumQueries(parse_int(kind, value)?)),
            "TimeSpentOnQueriesFilter" => {
                Ok(RequestFilter::TimeSpentOnQueries(parse_int(kind, value)?))
            }
            "OverallTimeFilter" => value
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite())
                .map(RequestFilter::OverallTime)
                .ok_or_else(|| invalid(kind, value, "expected a number")),
            "StatusCodeFilter" => value
                .parse::<i32>()
                .map(RequestFilter::StatusCode)
                .map_err(|e| invalid(kind, value, &e.to_string())),
            "MethodFilter" => Ok(RequestFilter::Method(value.to_string())),
            other => Err(FilterError::UnknownKind {
                kind: other.to_string(),
            }),
        }
    }

    pub fn from_entry(entry: &FilterEntry) -> Result<Self, FilterError> {
        Self::parse(&entry.typ, &entry.value)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            RequestFilter::Seconds(_) => "SecondsFilter",
            RequestFilter::AfterDate(_) => "AfterDateFilter",
            RequestFilter::BeforeDate(_) => "BeforeDateFilter",
            RequestFilter::ViewName(_) => "ViewNameFilter",
            RequestFilter::Path(_) => "PathFilter",
            RequestFilter::NumQueries(_) => "NumQueriesFilter",
            RequestFilter::TimeSpentOnQueries(_) => "TimeSpentOnQueriesFilter",
            RequestFilter::OverallTime(_) => "OverallTimeFilter",
            RequestFilter::StatusCode(_) => "StatusCodeFilter",
            RequestFilter::Method(_) => "MethodFilter",
        }
    }

    /// The raw value as it would be submitted in a form
    pub fn value(&self) -> String {
        match self {
            RequestFilter::Seconds(n)
            | RequestFilter::NumQueries(n)
            | RequestFilter::TimeSpentOnQueries(n) => n.to_string(),
            RequestFilter::AfterDate(at) | RequestFilter::BeforeDate(at) => {
                at.format(DATE_FORMAT).to_string()
            }
            RequestFilter::ViewName(s) | RequestFilter::Path(s) | RequestFilter::Method(s) => {
                s.clone()
            }
            RequestFilter::OverallTime(n) => n.to_string(),
            RequestFilter::StatusCode(code) => code.to_string(),
        }
    }

    pub fn to_entry(&self) -> FilterEntry {
        FilterEntry {
            typ: self.kind().to_string(),
            value: self.value(),
            label: self.to_string(),
        }
    }

    /// Add the annotations this filter's condition relies on
    pub fn contribute(&self, query: RequestQuery) -> RequestQuery {
        match self {
            RequestFilter::NumQueries(_) => query.annotate(Annotation::NumQueries),
            RequestFilter::TimeSpentOnQueries(_) => query.annotate(Annotation::DbTime),
            _ => query,
        }
    }

    pub fn condition(&self) -> Condition {
        self.condition_at(Utc::now())
    }

    /// Condition relative to a fixed "now"
    pub fn condition_at(&self, now: DateTime<Utc>) -> Condition {
        match self {
            RequestFilter::Seconds(n) => Condition::StartedAfter(
                Duration::try_seconds(*n)
                    .and_then(|window| now.checked_sub_signed(window))
                    .unwrap_or(DateTime::<Utc>::MIN_UTC),
            ),
            RequestFilter::AfterDate(at) => Condition::StartedAfter(*at),
            RequestFilter::BeforeDate(at) => Condition::StartedBefore(*at),
            RequestFilter::ViewName(name) => Condition::ViewNameEquals(name.clone()),
            RequestFilter::Path(path) => Condition::PathEquals(path.clone()),
            RequestFilter::NumQueries(n) => Condition::NumQueriesAtLeast(*n),
            RequestFilter::TimeSpentOnQueries(n) => Condition::DbTimeAtLeast(*n as f64),
            RequestFilter::OverallTime(n) => Condition::TimeTakenAtLeast(*n),
            RequestFilter::StatusCode(code) => Condition::StatusCodeEquals(*code),
            RequestFilter::Method(method) => Condition::MethodEquals(method.clone()),
        }
    }

    /// Contribute, then AND the condition
    pub fn apply(&self, query: RequestQuery) -> RequestQuery {
        self.contribute(query).filter(self.condition())
    }
}

impl fmt::Display for RequestFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestFilter::Seconds(n) => write!(f, ">{} seconds ago", n),
            RequestFilter::AfterDate(at) => write!(f, ">{}", at.format(DATE_FORMAT)),
            RequestFilter::BeforeDate(at) => write!(f, "<{}", at.format(DATE_FORMAT)),
            RequestFilter::ViewName(name) => write!(f, "View == {}", name),
            RequestFilter::Path(path) => write!(f, "Path == {}", path),
            RequestFilter::NumQueries(n) => write!(f, "#queries >= {}", n),
            RequestFilter::TimeSpentOnQueries(n) => write!(f, "DB Time >= {}", n),
            RequestFilter::OverallTime(n) => write!(f, "Time >= {}", n),
            RequestFilter::StatusCode(code) => write!(f, "Status == {}", code),
            RequestFilter::Method(method) => write!(f, "Method == {}", method),
        }
    }
}

fn invalid(kind: &str, value: &str, message: &str) -> FilterError {
    FilterError::InvalidValue {
        kind: kind.to_string(),
        value: value.to_string(),
        message: message.to_string(),
    }
}

fn parse_int(kind: &str, value: &str) -> Result<i64, FilterError> {
    value
        .parse::<i64>()
        .map_err(|e| invalid(kind, value, &e.to_string()))
}

/// A window in seconds must be representable as an offset from now
fn parse_seconds(kind: &str, value: &str) -> Result<i64, FilterError> {
    let n = parse_int(kind, value)?;
    Duration::try_seconds(n)
        .and_then(|window| Utc::now().checked_sub_signed(window))
        .map(|_| n)
        .ok_or_else(|| invalid(kind, value, "window out of range"))
}

fn parse_date(kind: &str, value: &str) -> Result<DateTime<Utc>, FilterError> {
    NaiveDateTime::parse_from_str(value, DATE_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|e| invalid(kind, value, &e.to_string()))
}

/// Parse filters out of a submitted form
///
/// Fields are named `filter-<ident>-typ` and `filter-<ident>-value`.
/// Entries with a blank value are skipped. Entries whose kind is unknown
/// or whose value does not parse are dropped with a warning; the rest of
/// the submission still applies.
pub fn filters_from_form(fields: &[(String, String)]) -> IndexMap<String, RequestFilter> {
    let mut raw: IndexMap<String, (Option<&str>, Option<&str>)> = IndexMap::new();
    for (name, value) in fields {
        let Some(caps) = FORM_FIELD.captures(name) else {
            continue;
        };
        let slot = raw.entry(caps[1].to_string()).or_default();
        match &caps[2] {
            "typ" => slot.0 = Some(value.as_str()),
            _ => slot.1 = Some(value.as_str()),
        }
    }

    let mut filters = IndexMap::new();
    for (ident, (typ, value)) in raw {
        let value = value.unwrap_or_default();
        if value.trim().is_empty() {
            continue;
        }
        let Some(typ) = typ else {
            tracing::warn!(ident = %ident, "Dropping filter submitted without a type");
            continue;
        };
        match RequestFilter::parse(typ, value) {
            Ok(filter) => {
                filters.insert(ident, filter);
            }
            Err(e) => {
                tracing::warn!(ident = %ident, error = %e, "Dropping invalid filter submission");
            }
        }
    }
    filters
}
