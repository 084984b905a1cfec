//! Declarative read requests.
//!
//! [`ReadRequest`] is a consuming builder. Methods that parse caller input (keyword
//! strings, identifiers, operand shapes) never fail on the spot; the first failure
//! is recorded and surfaced by [`ReadRequest::validate`], which turns the request
//! into an immutable [`ReadSpec`].
//!
//! # Example
//!
//! ```ignore
//! use pgread::{Op, ReadRequest};
//!
//! let spec = ReadRequest::new("public", "film_list")
//!     .columns(["category", "price"])
//!     .aggregate("price", "SUM")
//!     .condition("length", Op::Gt, 60_i32)
//!     .group_by(["category", "price"])
//!     .order_by(("price", "DESC"))
//!     .limit(10)
//!     .validate()?;
//! # Ok::<(), pgread::ReadError>(())
//! ```

use crate::aggregate::{Aggregate, AggregateMap};
use crate::condition::{Condition, Conjunction, Op, Operand};
use crate::error::{ReadError, ReadResult};
use crate::format::ReturnType;
use crate::ident::Ident;
use crate::keyword::IntoKeyword;
use crate::order::{Direction, IntoOrderBy, OrderBy};
use tokio_postgres::types::ToSql;

/// Builder for one read.
#[derive(Debug, Clone)]
#[must_use]
pub struct ReadRequest {
    schema: String,
    table: String,
    columns: Option<Vec<String>>,
    aggregate: AggregateMap,
    conditions: Vec<Condition>,
    conjunction: Conjunction,
    order_by: OrderBy,
    group_by: Vec<String>,
    limit: Option<i64>,
    return_type: Option<ReturnType>,
    build_error: Option<(String, String)>,
}

impl ReadRequest {
    /// Start a read of `schema.table`.
    pub fn new(schema: impl Into<String>, table_name: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            table: table_name.into(),
            columns: None,
            aggregate: AggregateMap::new(),
            conditions: Vec::new(),
            conjunction: Conjunction::default(),
            order_by: OrderBy::default(),
            group_by: Vec::new(),
            limit: None,
            return_type: None,
            build_error: None,
        }
    }

    fn record<T>(&mut self, result: ReadResult<T>) -> Option<T> {
        match result {
            Ok(v) => Some(v),
            Err(err) => {
                if self.build_error.is_none() {
                    self.build_error = Some(match err {
                        ReadError::Validation { field, message } => (field, message),
                        other => ("request".to_string(), other.to_string()),
                    });
                }
                None
            }
        }
    }

    // ==================== columns ====================

    /// Explicit column list. An empty list means "resolve from the table".
    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        self.columns = (!columns.is_empty()).then_some(columns);
        self
    }

    /// Wrap `column` in an aggregate function. A repeated column takes the later function.
    pub fn aggregate(mut self, column: impl Into<String>, func: impl IntoKeyword<Aggregate>) -> Self {
        if let Some(func) = self.record(func.into_keyword()) {
            self.aggregate.insert(column.into(), func);
        }
        self
    }

    /// Set several aggregates at once.
    pub fn aggregates<I, C, F>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = (C, F)>,
        C: Into<String>,
        F: IntoKeyword<Aggregate>,
    {
        for (column, func) in entries {
            self = self.aggregate(column, func);
        }
        self
    }

    // ==================== WHERE ====================

    /// `column <op> value` with a single bound value.
    pub fn condition<T>(self, column: impl Into<String>, op: impl IntoKeyword<Op>, value: T) -> Self
    where
        T: ToSql + Send + Sync + 'static,
    {
        self.condition_operand(column, op, Operand::value(value))
    }

    /// `column BETWEEN low AND high`.
    pub fn condition_between<T>(self, column: impl Into<String>, low: T, high: T) -> Self
    where
        T: ToSql + Send + Sync + 'static,
    {
        self.condition_operand(column, Op::Between, Operand::between(low, high))
    }

    /// `column IN (...)` / `column NOT IN (...)`.
    pub fn condition_list<T, I>(self, column: impl Into<String>, op: impl IntoKeyword<Op>, values: I) -> Self
    where
        T: ToSql + Send + Sync + 'static,
        I: IntoIterator<Item = T>,
    {
        self.condition_operand(column, op, Operand::list(values))
    }

    /// Condition with an explicit [`Operand`].
    pub fn condition_operand(
        mut self,
        column: impl Into<String>,
        op: impl IntoKeyword<Op>,
        operand: Operand,
    ) -> Self {
        let Some(op) = self.record(op.into_keyword()) else {
            return self;
        };
        let condition = Condition::new(column, op, operand);
        if let Some(condition) = self.record(condition) {
            self = self.filter(condition);
        }
        self
    }

    /// Add a prebuilt [`Condition`].
    ///
    /// Conditions are keyed by column: a second condition on the same column
    /// replaces the first one in place.
    pub fn filter(mut self, condition: Condition) -> Self {
        match self
            .conditions
            .iter_mut()
            .find(|c| c.column() == condition.column())
        {
            Some(existing) => *existing = condition,
            None => self.conditions.push(condition),
        }
        self
    }

    /// Logical keyword joining all conditions (default `AND`).
    pub fn conjunction(mut self, conjunction: impl IntoKeyword<Conjunction>) -> Self {
        if let Some(conjunction) = self.record(conjunction.into_keyword()) {
            self.conjunction = conjunction;
        }
        self
    }

    // ==================== GROUP / ORDER / LIMIT ====================

    /// Ordering: a bare column, a `(column, direction)` pair, or a mapping.
    pub fn order_by(mut self, order: impl IntoOrderBy) -> Self {
        if let Some(order) = self.record(order.into_order_by()) {
            self.order_by = order;
        }
        self
    }

    pub fn group_by<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.group_by = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Row limit; zero or negative means no limit.
    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Override the reader's default return shape for this read.
    pub fn return_type(mut self, return_type: impl IntoKeyword<ReturnType>) -> Self {
        if let Some(return_type) = self.record(return_type.into_keyword()) {
            self.return_type = Some(return_type);
        }
        self
    }

    // ==================== validation ====================

    /// Validate the request into an immutable [`ReadSpec`]. Performs no I/O.
    pub fn validate(&self) -> ReadResult<ReadSpec> {
        if !self.aggregate.is_empty() && self.group_by.is_empty() {
            return Err(ReadError::constraint(
                "aggregate requires a non-empty group_by",
            ));
        }

        if let Some((field, message)) = &self.build_error {
            return Err(ReadError::validation(field.as_str(), message.as_str()));
        }

        let schema = Ident::for_field("schema", self.schema.as_str())?;
        let table = Ident::for_field("table_name", self.table.as_str())?;

        let columns = self
            .columns
            .as_ref()
            .map(|cols| idents("columns", cols))
            .transpose()?;

        for column in self.aggregate.keys() {
            Ident::for_field("aggregate", column.as_str())?;
        }

        let group_by = idents("group_by", &self.group_by)?;

        let order_by = self
            .order_by
            .iter()
            .map(|(column, direction)| Ok((Ident::for_field("order_by", column)?, direction)))
            .collect::<ReadResult<Vec<_>>>()?;

        if let Some(columns) = &columns {
            check_aggregate_columns(&self.aggregate, columns)?;
        }

        Ok(ReadSpec {
            schema,
            table,
            columns,
            aggregate: self.aggregate.clone(),
            conditions: self.conditions.clone(),
            conjunction: self.conjunction,
            order_by,
            group_by,
            limit: self.limit,
            return_type: self.return_type,
        })
    }
}

fn idents(field: &str, names: &[String]) -> ReadResult<Vec<Ident>> {
    names
        .iter()
        .map(|name| Ident::for_field(field, name.as_str()))
        .collect()
}

/// Every aggregated column must be among the selected columns.
pub(crate) fn check_aggregate_columns(aggregate: &AggregateMap, columns: &[Ident]) -> ReadResult<()> {
    for (column, func) in aggregate {
        if !columns.iter().any(|c| c.name() == column) {
            return Err(ReadError::constraint(format!(
                "aggregate {func}({column}) names a column that is not selected"
            )));
        }
    }
    Ok(())
}

/// A validated, immutable read description.
#[derive(Debug, Clone)]
pub struct ReadSpec {
    schema: Ident,
    table: Ident,
    columns: Option<Vec<Ident>>,
    aggregate: AggregateMap,
    conditions: Vec<Condition>,
    conjunction: Conjunction,
    order_by: Vec<(Ident, Direction)>,
    group_by: Vec<Ident>,
    limit: Option<i64>,
    return_type: Option<ReturnType>,
}

impl ReadSpec {
    pub fn schema(&self) -> &Ident {
        &self.schema
    }

    pub fn table(&self) -> &Ident {
        &self.table
    }

    /// Explicit columns, or `None` when they must be resolved from the table.
    pub fn columns(&self) -> Option<&[Ident]> {
        self.columns.as_deref()
    }

    pub fn aggregate(&self) -> &AggregateMap {
        &self.aggregate
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn conjunction(&self) -> Conjunction {
        self.conjunction
    }

    pub fn order_by(&self) -> &[(Ident, Direction)] {
        &self.order_by
    }

    pub fn group_by(&self) -> &[Ident] {
        &self.group_by
    }

    /// Limit to emit, if positive.
    pub fn effective_limit(&self) -> Option<i64> {
        self.limit.filter(|n| *n > 0)
    }

    pub fn return_type(&self) -> Option<ReturnType> {
        self.return_type
    }
}
