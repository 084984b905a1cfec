//! Aggregate functions applied to selected columns.

use crate::keyword::{Keyword, impl_into_keyword};
use serde::Serialize;
use std::collections::BTreeMap;

/// Aggregate function wrapping a selected column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Aggregate {
    Avg,
    Count,
    Max,
    Min,
    Sum,
}

/// Column name → aggregate function.
pub type AggregateMap = BTreeMap<String, Aggregate>;

impl Aggregate {
    /// SQL function name, e.g. `SUM`.
    pub fn as_sql(self) -> &'static str {
        match self {
            Aggregate::Avg => "AVG",
            Aggregate::Count => "COUNT",
            Aggregate::Max => "MAX",
            Aggregate::Min => "MIN",
            Aggregate::Sum => "SUM",
        }
    }

    /// Lowercase label used in tabular headers, e.g. `sum`.
    pub fn label(self) -> &'static str {
        match self {
            Aggregate::Avg => "avg",
            Aggregate::Count => "count",
            Aggregate::Max => "max",
            Aggregate::Min => "min",
            Aggregate::Sum => "sum",
        }
    }

    /// Tabular header for an aggregated column: `"<label>: <column>"`.
    pub fn header(self, column: &str) -> String {
        format!("{}: {}", self.label(), column)
    }
}

impl Keyword for Aggregate {
    const FIELD: &'static str = "aggregate";
    const EXPECTED: &'static str = "AVG, COUNT, MAX, MIN, SUM";

    fn from_normalized(s: &str) -> Option<Self> {
        match s {
            "AVG" => Some(Aggregate::Avg),
            "COUNT" => Some(Aggregate::Count),
            "MAX" => Some(Aggregate::Max),
            "MIN" => Some(Aggregate::Min),
            "SUM" => Some(Aggregate::Sum),
            _ => None,
        }
    }
}

impl_into_keyword!(Aggregate);

impl std::fmt::Display for Aggregate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_sql())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("sum".parse::<Aggregate>().unwrap(), Aggregate::Sum);
        assert_eq!(" Avg ".parse::<Aggregate>().unwrap(), Aggregate::Avg);
    }

    #[test]
    fn rejects_unknown_function() {
        let err = "MEDIAN".parse::<Aggregate>().unwrap_err();
        assert_eq!(err.field(), Some("aggregate"));
    }

    #[test]
    fn rejects_injected_text() {
        assert!("SUM(x)); DROP TABLE t; --".parse::<Aggregate>().is_err());
    }

    #[test]
    fn header_uses_lowercase_label() {
        assert_eq!(Aggregate::Sum.header("price"), "sum: price");
        assert_eq!(Aggregate::Count.header("Name"), "count: Name");
    }
}
