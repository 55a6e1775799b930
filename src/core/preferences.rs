//! Display preferences for the listing page
//!
//! Four independent choices, each with a default:
//!
//! - page size (`show`), one of a fixed set of sizes
//! - sort key (`order_by`)
//! - sort direction (`order_dir`)
//! - view style (`view_style`)
//!
//! Values arrive as plain strings (query string, session storage) and are
//! parsed here. Sort keys are the only values that are rejected when
//! unknown; everything else falls back to its default.

use crate::core::error::QueryError;
use crate::core::query::RequestQuery;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Page sizes offered in the "show" dropdown
pub const SHOW_OPTIONS: [usize; 5] = [5, 10, 25, 100, 250];

/// Page size used when none is stored or the stored one is zero
pub const DEFAULT_SHOW: usize = 25;

/// Keys under which preferences live in the stored filter mapping
pub const PREFERENCE_KEYS: [&str; 4] = ["show", "order_by", "order_dir", "view_style"];

/// A value/label pair rendered as one `<option>`
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

impl SelectOption {
    fn new(value: &str, label: &str) -> Self {
        Self {
            value: value.to_string(),
            label: label.to_string(),
        }
    }
}

/// Orderable fields of a request record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OrderBy {
    /// Most recent first when descending
    #[default]
    StartTime,
    Path,
    NumSqlQueries,
    TimeTaken,
    /// Sum of the time spent in the request's SQL queries
    DbTime,
}

impl OrderBy {
    pub const ALL: [OrderBy; 5] = [
        OrderBy::StartTime,
        OrderBy::Path,
        OrderBy::NumSqlQueries,
        OrderBy::TimeTaken,
        OrderBy::DbTime,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderBy::StartTime => "start_time",
            OrderBy::Path => "path",
            OrderBy::NumSqlQueries => "num_sql_queries",
            OrderBy::TimeTaken => "time_taken",
            OrderBy::DbTime => "db_time",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            OrderBy::StartTime => "Recent",
            OrderBy::Path => "Path",
            OrderBy::NumSqlQueries => "Num. Queries",
            OrderBy::TimeTaken => "Time",
            OrderBy::DbTime => "Time on queries",
        }
    }

    /// Extra narrowing applied before ordering by this key
    ///
    /// Keys over optional measurements drop rows where the measurement is
    /// absent or negative, so that unset timings never sort to the top.
    pub fn narrowing(&self) -> Option<fn(RequestQuery) -> RequestQuery> {
        match self {
            OrderBy::TimeTaken => Some(narrow_time_taken),
            OrderBy::DbTime => Some(narrow_db_time),
            OrderBy::StartTime | OrderBy::Path | OrderBy::NumSqlQueries => None,
        }
    }

    pub fn options() -> Vec<SelectOption> {
        Self::ALL
            .iter()
            .map(|o| SelectOption::new(o.as_str(), o.label()))
            .collect()
    }
}

fn narrow_time_taken(query: RequestQuery) -> RequestQuery {
    query.time_taken_at_least(0.0)
}

fn narrow_db_time(query: RequestQuery) -> RequestQuery {
    query.with_db_time().db_time_at_least(0.0)
}

impl FromStr for OrderBy {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|o| o.as_str() == s)
            .ok_or_else(|| QueryError::UnknownOrderBy {
                order_by: s.to_string(),
            })
    }
}

impl fmt::Display for OrderBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderDir {
    Asc,
    #[default]
    Desc,
}

impl OrderDir {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderDir::Asc => "ASC",
            OrderDir::Desc => "DESC",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            OrderDir::Asc => "Ascending",
            OrderDir::Desc => "Descending",
        }
    }

    /// Only `DESC` sorts descending; any other stored value sorts ascending
    pub fn parse(s: &str) -> Self {
        if s == "DESC" { OrderDir::Desc } else { OrderDir::Asc }
    }

    pub fn options() -> Vec<SelectOption> {
        [OrderDir::Asc, OrderDir::Desc]
            .iter()
            .map(|d| SelectOption::new(d.as_str(), d.label()))
            .collect()
    }
}

/// How result rows are laid out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewStyle {
    #[default]
    Card,
    Row,
}

impl ViewStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViewStyle::Card => "card",
            ViewStyle::Row => "row",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ViewStyle::Card => "Cards",
            ViewStyle::Row => "Rows",
        }
    }

    pub fn parse_or_default(s: &str) -> Self {
        if s == "row" { ViewStyle::Row } else { ViewStyle::Card }
    }

    pub fn options() -> Vec<SelectOption> {
        [ViewStyle::Card, ViewStyle::Row]
            .iter()
            .map(|v| SelectOption::new(v.as_str(), v.label()))
            .collect()
    }
}

/// Resolved display preferences
///
/// `order_by` is kept as the raw string until the query is built so that
/// an unknown key surfaces as an error at that point instead of being
/// silently replaced by the default.
#[derive(Debug, Clone, PartialEq)]
pub struct Preferences {
    pub show: usize,
    pub order_by: String,
    pub order_dir: OrderDir,
    pub view_style: ViewStyle,
}

impl Preferences {
    /// Parse a page size, falling back to `default_show` when it is
    /// missing, zero or not a number
    pub fn parse_show(raw: Option<&str>, default_show: usize) -> usize {
        raw.and_then(|s| s.trim().parse::<usize>().ok())
            .filter(|n| *n > 0)
            .unwrap_or(default_show)
    }

    pub fn with_default_show(default_show: usize) -> Self {
        Self {
            show: default_show,
            ..Self::default()
        }
    }
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            show: DEFAULT_SHOW,
            order_by: OrderBy::default().as_str().to_string(),
            order_dir: OrderDir::default(),
            view_style: ViewStyle::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let prefs = Preferences::default();
        assert_eq!(prefs.show, 25);
        assert_eq!(prefs.order_by, "start_time");
        assert_eq!(prefs.order_dir, OrderDir::Desc);
        assert_eq!(prefs.view_style, ViewStyle::Card);
    }

    #[test]
    fn test_order_by_round_trips_through_str() {
        for key in OrderBy::ALL {
            assert_eq!(key.as_str().parse::<OrderBy>().unwrap(), key);
        }
    }

    #[test]
    fn test_unknown_order_by_is_rejected() {
        let err = "bogus".parse::<OrderBy>().unwrap_err();
        assert!(err.to_string().contains("bogus"));
    }

    #[test]
    fn test_only_timing_keys_narrow() {
        assert!(OrderBy::StartTime.narrowing().is_none());
        assert!(OrderBy::Path.narrowing().is_none());
        assert!(OrderBy::NumSqlQueries.narrowing().is_none());
        assert!(OrderBy::TimeTaken.narrowing().is_some());
        assert!(OrderBy::DbTime.narrowing().is_some());
    }

    #[test]
    fn test_parse_show_falls_back() {
        assert_eq!(Preferences::parse_show(Some("10"), 25), 10);
        assert_eq!(Preferences::parse_show(Some("0"), 25), 25);
        assert_eq!(Preferences::parse_show(Some("lots"), 25), 25);
        assert_eq!(Preferences::parse_show(None, 25), 25);
    }

    #[test]
    fn test_direction_and_style_coercion() {
        assert_eq!(OrderDir::parse("ASC"), OrderDir::Asc);
        assert_eq!(OrderDir::parse("DESC"), OrderDir::Desc);
        assert_eq!(OrderDir::parse("desc"), OrderDir::Asc);
        assert_eq!(ViewStyle::parse_or_default("row"), ViewStyle::Row);
        assert_eq!(ViewStyle::parse_or_default(""), ViewStyle::Card);
    }

    #[test]
    fn test_option_lists() {
        let labels: Vec<_> = OrderBy::options().into_iter().map(|o| o.label).collect();
        assert_eq!(
            labels,
            vec!["Recent", "Path", "Num. Queries", "Time", "Time on queries"]
        );
        assert_eq!(OrderDir::options().len(), 2);
        assert_eq!(ViewStyle::options()[0].value, "card");
    }
}
