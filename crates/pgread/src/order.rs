//! ORDER BY items.
//!
//! Callers may give a bare column (ascending), a `(column, direction)` pair, or an
//! explicit column → direction mapping. All three normalize to [`OrderBy`].

use crate::error::ReadResult;
use crate::keyword::{IntoKeyword, Keyword, impl_into_keyword};

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    pub fn as_sql(self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

impl Keyword for Direction {
    const FIELD: &'static str = "order_by";
    const EXPECTED: &'static str = "ASC, DESC";

    fn from_normalized(s: &str) -> Option<Self> {
        match s {
            "ASC" => Some(Direction::Asc),
            "DESC" => Some(Direction::Desc),
            _ => None,
        }
    }
}

impl_into_keyword!(Direction);

/// Ordered column → direction mapping.
///
/// A column given twice keeps its first position and takes the later direction.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OrderBy {
    entries: Vec<(String, Direction)>,
}

impl OrderBy {
    /// Order by one column, ascending.
    pub fn column(column: impl Into<String>) -> Self {
        Self::pair(column, Direction::Asc)
    }

    /// Order by one column in the given direction.
    pub fn pair(column: impl Into<String>, direction: Direction) -> Self {
        let mut order = Self::default();
        order.insert(column.into(), direction);
        order
    }

    /// Build from an explicit mapping whose directions may be strings.
    pub fn from_map<I, C, D>(entries: I) -> ReadResult<Self>
    where
        I: IntoIterator<Item = (C, D)>,
        C: Into<String>,
        D: IntoKeyword<Direction>,
    {
        let mut order = Self::default();
        for (column, direction) in entries {
            order.insert(column.into(), direction.into_keyword()?);
        }
        Ok(order)
    }

    fn insert(&mut self, column: String, direction: Direction) {
        match self.entries.iter_mut().find(|(c, _)| *c == column) {
            Some(entry) => entry.1 = direction,
            None => self.entries.push((column, direction)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Entries in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Direction)> {
        self.entries.iter().map(|(c, d)| (c.as_str(), *d))
    }
}

/// Convert an input into an [`OrderBy`].
pub trait IntoOrderBy {
    fn into_order_by(self) -> ReadResult<OrderBy>;
}

impl IntoOrderBy for OrderBy {
    fn into_order_by(self) -> ReadResult<OrderBy> {
        Ok(self)
    }
}

impl IntoOrderBy for &str {
    fn into_order_by(self) -> ReadResult<OrderBy> {
        Ok(OrderBy::column(self))
    }
}

impl IntoOrderBy for String {
    fn into_order_by(self) -> ReadResult<OrderBy> {
        Ok(OrderBy::column(self))
    }
}

impl<C, D> IntoOrderBy for (C, D)
where
    C: Into<String>,
    D: IntoKeyword<Direction>,
{
    fn into_order_by(self) -> ReadResult<OrderBy> {
        Ok(OrderBy::pair(self.0, self.1.into_keyword()?))
    }
}

impl<C, D> IntoOrderBy for Vec<(C, D)>
where
    C: Into<String>,
    D: IntoKeyword<Direction>,
{
    fn into_order_by(self) -> ReadResult<OrderBy> {
        OrderBy::from_map(self)
    }
}

impl<C, D, const N: usize> IntoOrderBy for [(C, D); N]
where
    C: Into<String>,
    D: IntoKeyword<Direction>,
{
    fn into_order_by(self) -> ReadResult<OrderBy> {
        OrderBy::from_map(self)
    }
}

impl From<&str> for OrderBy {
    fn from(column: &str) -> Self {
        OrderBy::column(column)
    }
}

impl From<(&str, Direction)> for OrderBy {
    fn from((column, direction): (&str, Direction)) -> Self {
        OrderBy::pair(column, direction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_column_equals_explicit_ascending_map() {
        let bare = "Name".into_order_by().unwrap();
        let mapped = OrderBy::from_map([("Name", "ASC")]).unwrap();
        assert_eq!(bare, mapped);
    }

    #[test]
    fn pair_with_string_direction() {
        let order = ("price", "desc").into_order_by().unwrap();
        assert_eq!(order.iter().collect::<Vec<_>>(), vec![("price", Direction::Desc)]);
    }

    #[test]
    fn map_keeps_insertion_order() {
        let order = vec![("b", "DESC"), ("a", "ASC")].into_order_by().unwrap();
        let cols: Vec<_> = order.iter().map(|(c, _)| c).collect();
        assert_eq!(cols, vec!["b", "a"]);
    }

    #[test]
    fn repeated_column_takes_last_direction() {
        let order = OrderBy::from_map([("a", "ASC"), ("b", "ASC"), ("a", "DESC")]).unwrap();
        assert_eq!(
            order.iter().collect::<Vec<_>>(),
            vec![("a", Direction::Desc), ("b", Direction::Asc)]
        );
    }

    #[test]
    fn invalid_direction_names_order_by() {
        let err = ("price", "SIDEWAYS").into_order_by().unwrap_err();
        assert_eq!(err.field(), Some("order_by"));
    }
}
