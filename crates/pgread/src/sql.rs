//! Parameter-safe statement builder.
//!
//! `Sql` stores raw SQL pieces and bound values separately and generates
//! `$1, $2, ...` placeholders when rendered. Identifiers go through
//! [`Sql::push_ident`] / [`Sql::push_ident_ref`]; values only ever go through
//! [`Sql::push_bind`]. Raw text pushed with [`Sql::push`] is reserved for keywords
//! and punctuation chosen by this crate.
//!
//! # Example
//!
//! ```ignore
//! use pgread::Sql;
//!
//! let mut q = Sql::new("SELECT * FROM ");
//! q.push_ident("film_list")?.push(" WHERE length > ").push_bind(60_i32);
//! assert_eq!(q.to_sql(), "SELECT * FROM film_list WHERE length > $1");
//! # Ok::<(), pgread::ReadError>(())
//! ```

use crate::error::ReadResult;
use crate::ident::{Ident, IntoIdent};
use std::fmt::Write;
use std::sync::Arc;
use tokio_postgres::types::ToSql;

/// A clone-friendly bound value.
#[derive(Clone)]
pub struct Param(Arc<dyn ToSql + Send + Sync>);

impl Param {
    /// Wrap any `ToSql` value.
    pub fn new<T: ToSql + Send + Sync + 'static>(value: T) -> Self {
        Param(Arc::new(value))
    }

    /// Borrow the value as a parameter reference for `tokio-postgres`.
    pub fn as_param(&self) -> &(dyn ToSql + Sync) {
        &*self.0 as &(dyn ToSql + Sync)
    }
}

impl std::fmt::Debug for Param {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Param").field(&self.0).finish()
    }
}

#[derive(Debug, Clone)]
enum SqlPart {
    Raw(String),
    Param,
}

/// A parameter-safe SQL statement.
#[derive(Debug, Clone)]
#[must_use]
pub struct Sql {
    parts: Vec<SqlPart>,
    params: Vec<Param>,
}

impl Sql {
    /// Create a new builder with an initial SQL fragment.
    pub fn new(initial_sql: impl Into<String>) -> Self {
        Self {
            parts: vec![SqlPart::Raw(initial_sql.into())],
            params: Vec::new(),
        }
    }

    /// Create an empty builder.
    pub fn empty() -> Self {
        Self {
            parts: Vec::new(),
            params: Vec::new(),
        }
    }

    /// Append raw SQL (no parameters).
    pub fn push(&mut self, sql: &str) -> &mut Self {
        if sql.is_empty() {
            return self;
        }

        match self.parts.last_mut() {
            Some(SqlPart::Raw(last)) => last.push_str(sql),
            _ => self.parts.push(SqlPart::Raw(sql.to_string())),
        }
        self
    }

    /// Append a parameter placeholder and bind its value.
    pub fn push_bind<T>(&mut self, value: T) -> &mut Self
    where
        T: ToSql + Sync + Send + 'static,
    {
        self.push_param(Param::new(value))
    }

    /// Append a placeholder for an already wrapped [`Param`].
    pub fn push_param(&mut self, param: Param) -> &mut Self {
        self.parts.push(SqlPart::Param);
        self.params.push(param);
        self
    }

    /// Append a comma-separated list of placeholders, one per value.
    ///
    /// An empty list appends `NULL`, so `IN (NULL)` stays valid SQL.
    pub fn push_param_list<'a>(&mut self, values: impl IntoIterator<Item = &'a Param>) -> &mut Self {
        let mut iter = values.into_iter();
        let Some(first) = iter.next() else {
            return self.push("NULL");
        };

        self.push_param(first.clone());
        for v in iter {
            self.push(", ");
            self.push_param(v.clone());
        }
        self
    }

    /// Append a SQL identifier (schema/table/column) safely.
    ///
    /// Identifiers cannot be parameterized; they are validated and quoted via
    /// [`crate::Ident`] instead.
    pub fn push_ident<I>(&mut self, ident: I) -> ReadResult<&mut Self>
    where
        I: IntoIdent,
    {
        let ident = ident.into_ident()?;
        Ok(self.push_ident_ref(&ident))
    }

    /// Append a pre-validated [`Ident`] without returning `Result`.
    pub fn push_ident_ref(&mut self, ident: &Ident) -> &mut Self {
        match self.parts.last_mut() {
            Some(SqlPart::Raw(last)) => ident.write_sql(last),
            _ => {
                let mut s = String::new();
                ident.write_sql(&mut s);
                self.parts.push(SqlPart::Raw(s));
            }
        }
        self
    }

    /// Append another `Sql` fragment, consuming it.
    pub fn push_sql(&mut self, mut other: Sql) -> &mut Self {
        self.parts.append(&mut other.parts);
        self.params.append(&mut other.params);
        self
    }

    /// Render SQL with `$1, $2, ...` placeholders.
    pub fn to_sql(&self) -> String {
        let mut out = String::new();
        let mut idx: usize = 0;

        for part in &self.parts {
            match part {
                SqlPart::Raw(s) => out.push_str(s),
                SqlPart::Param => {
                    idx += 1;
                    let _ = write!(&mut out, "${idx}");
                }
            }
        }
        out
    }

    /// Parameter refs compatible with `tokio-postgres`.
    pub fn params_ref(&self) -> Vec<&(dyn ToSql + Sync)> {
        self.params.iter().map(Param::as_param).collect()
    }

    /// Number of bound parameters.
    pub fn param_count(&self) -> usize {
        self.params.len()
    }

    /// Whether the statement has no text at all (ignoring whitespace).
    pub fn is_blank(&self) -> bool {
        self.parts.iter().all(|p| match p {
            SqlPart::Raw(s) => s.trim().is_empty(),
            SqlPart::Param => false,
        })
    }
}

impl From<&str> for Sql {
    fn from(sql: &str) -> Self {
        Sql::new(sql)
    }
}

impl From<String> for Sql {
    fn from(sql: String) -> Self {
        Sql::new(sql)
    }
}

impl From<&String> for Sql {
    fn from(sql: &String) -> Self {
        Sql::new(sql.as_str())
    }
}

/// Strip leading whitespace, SQL comments (`--` and `/* */`), and parentheses
/// from a SQL string to find the first meaningful keyword.
pub(crate) fn strip_sql_prefix(sql: &str) -> &str {
    let mut s = sql;
    loop {
        let before = s;
        s = s.trim_start();
        if s.starts_with("--") {
            if let Some(pos) = s.find('\n') {
                s = &s[pos + 1..];
                continue;
            }
            return "";
        }
        if s.starts_with("/*") {
            if let Some(pos) = s.find("*/") {
                s = &s[pos + 2..];
                continue;
            }
            return "";
        }
        if let Some(rest) = s.strip_prefix('(') {
            s = rest;
            continue;
        }
        if s == before {
            break;
        }
    }
    s
}

/// The first word of `sql` after [`strip_sql_prefix`], if any.
pub(crate) fn first_keyword(sql: &str) -> Option<&str> {
    let s = strip_sql_prefix(sql);
    let end = s
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(s.len());
    (end > 0).then(|| &s[..end])
}
