//! Filter conditions for the WHERE clause.
//!
//! A [`Condition`] pairs a column with a whitelisted [`Op`] and an [`Operand`] whose
//! shape must match the operator: `IN` / `NOT IN` take a list, `BETWEEN` takes a
//! pair, every other operator takes one value. Conditions are joined by a single
//! [`Conjunction`] for the whole query.

use crate::error::{ReadError, ReadResult};
use crate::ident::Ident;
use crate::keyword::{Keyword, impl_into_keyword};
use crate::sql::{Param, Sql};
use tokio_postgres::types::ToSql;

/// Comparison operator.
///
/// # Example
/// ```ignore
/// use pgread::Op;
///
/// let op: Op = "not in".parse()?;
/// assert_eq!(op, Op::NotIn);
/// assert_eq!(Op::Ne.as_sql(), "<>");
/// # Ok::<(), pgread::ReadError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    /// `=`
    Eq,
    /// `<`
    Lt,
    /// `>`
    Gt,
    /// `<=`
    Lte,
    /// `>=`
    Gte,
    /// `<>`
    Ne,
    /// `IN (list)`
    In,
    /// `NOT IN (list)`
    NotIn,
    /// `BETWEEN a AND b`
    Between,
    /// `LIKE pattern`
    Like,
    /// Case-insensitive `ILIKE pattern`
    Ilike,
}

impl Op {
    pub fn as_sql(self) -> &'static str {
        match self {
            Op::Eq => "=",
            Op::Lt => "<",
            Op::Gt => ">",
            Op::Lte => "<=",
            Op::Gte => ">=",
            Op::Ne => "<>",
            Op::In => "IN",
            Op::NotIn => "NOT IN",
            Op::Between => "BETWEEN",
            Op::Like => "LIKE",
            Op::Ilike => "ILIKE",
        }
    }

    fn expects(self) -> OperandShape {
        match self {
            Op::In | Op::NotIn => OperandShape::List,
            Op::Between => OperandShape::Pair,
            _ => OperandShape::Scalar,
        }
    }
}

impl Keyword for Op {
    const FIELD: &'static str = "conditions";
    const EXPECTED: &'static str = "=, <, >, <=, >=, <>, IN, NOT IN, BETWEEN, LIKE, ILIKE";

    fn from_normalized(s: &str) -> Option<Self> {
        match s {
            "=" => Some(Op::Eq),
            "<" => Some(Op::Lt),
            ">" => Some(Op::Gt),
            "<=" => Some(Op::Lte),
            ">=" => Some(Op::Gte),
            "<>" => Some(Op::Ne),
            "IN" => Some(Op::In),
            "NOT IN" => Some(Op::NotIn),
            "BETWEEN" => Some(Op::Between),
            "LIKE" => Some(Op::Like),
            "ILIKE" => Some(Op::Ilike),
            _ => None,
        }
    }
}

/// Logical keyword joining all conditions of a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Conjunction {
    #[default]
    And,
    Or,
}

impl Conjunction {
    pub fn as_sql(self) -> &'static str {
        match self {
            Conjunction::And => "AND",
            Conjunction::Or => "OR",
        }
    }
}

impl Keyword for Conjunction {
    const FIELD: &'static str = "conjunction";
    const EXPECTED: &'static str = "AND, OR";

    fn from_normalized(s: &str) -> Option<Self> {
        match s {
            "AND" => Some(Conjunction::And),
            "OR" => Some(Conjunction::Or),
            _ => None,
        }
    }
}

impl_into_keyword!(Op, Conjunction);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OperandShape {
    Scalar,
    Pair,
    List,
}

impl OperandShape {
    fn describe(self) -> &'static str {
        match self {
            OperandShape::Scalar => "a single value",
            OperandShape::Pair => "a (low, high) pair",
            OperandShape::List => "a list of values",
        }
    }
}

/// Right-hand side of a condition; every value is bound, never inlined.
#[derive(Debug, Clone)]
pub enum Operand {
    Scalar(Param),
    Pair(Param, Param),
    List(Vec<Param>),
}

impl Operand {
    /// A single value.
    pub fn value<T: ToSql + Send + Sync + 'static>(value: T) -> Self {
        Operand::Scalar(Param::new(value))
    }

    /// A `(low, high)` pair for `BETWEEN`.
    pub fn between<T: ToSql + Send + Sync + 'static>(low: T, high: T) -> Self {
        Operand::Pair(Param::new(low), Param::new(high))
    }

    /// A list for `IN` / `NOT IN`.
    pub fn list<T, I>(values: I) -> Self
    where
        T: ToSql + Send + Sync + 'static,
        I: IntoIterator<Item = T>,
    {
        Operand::List(values.into_iter().map(Param::new).collect())
    }

    fn shape(&self) -> OperandShape {
        match self {
            Operand::Scalar(_) => OperandShape::Scalar,
            Operand::Pair(..) => OperandShape::Pair,
            Operand::List(_) => OperandShape::List,
        }
    }
}

/// One `column operator operand` filter.
#[derive(Debug, Clone)]
pub struct Condition {
    column: Ident,
    op: Op,
    operand: Operand,
}

impl Condition {
    /// Create a condition, checking the operand shape against the operator.
    pub fn new(column: impl Into<String>, op: Op, operand: Operand) -> ReadResult<Self> {
        let column = Ident::for_field(Op::FIELD, column)?;
        let expected = op.expects();
        if operand.shape() != expected {
            return Err(ReadError::validation(
                Op::FIELD,
                format!(
                    "operator {} on '{}' takes {}, got {}",
                    op.as_sql(),
                    column.name(),
                    expected.describe(),
                    operand.shape().describe()
                ),
            ));
        }
        Ok(Self { column, op, operand })
    }

    pub fn column(&self) -> &Ident {
        &self.column
    }

    pub fn op(&self) -> Op {
        self.op
    }

    pub fn operand(&self) -> &Operand {
        &self.operand
    }

    /// Append this condition into a [`Sql`] builder.
    pub fn append_to_sql(&self, sql: &mut Sql) {
        match &self.operand {
            // Empty IN list - always false / true
            Operand::List(values) if values.is_empty() => {
                if self.op == Op::In {
                    sql.push("1=0");
                } else {
                    sql.push("1=1");
                }
            }
            Operand::Scalar(value) => {
                self.push_head(sql);
                sql.push(" ");
                sql.push_param(value.clone());
            }
            Operand::Pair(low, high) => {
                self.push_head(sql);
                sql.push(" ");
                sql.push_param(low.clone());
                sql.push(" AND ");
                sql.push_param(high.clone());
            }
            Operand::List(values) => {
                self.push_head(sql);
                sql.push(" (");
                sql.push_param_list(values);
                sql.push(")");
            }
        }
    }

    fn push_head(&self, sql: &mut Sql) {
        sql.push_ident_ref(&self.column);
        sql.push(" ");
        sql.push(self.op.as_sql());
    }
}
