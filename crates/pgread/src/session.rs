//! The session seam between the reader and a live connection.
//!
//! [`Session`] is the three round trips the reader needs: run a statement, fetch
//! its rows, and describe its columns without fetching. It is implemented for
//! [`tokio_postgres::Client`], [`tokio_postgres::Transaction`], and
//! [`crate::Connection`]; tests implement it with an in-memory recorder.
//!
//! Every call goes through `prepare` + bind (the extended protocol), so a
//! statement string holding more than one command is rejected by the server.

use crate::error::{ReadError, ReadResult};
use crate::value::Value;
use serde::Serialize;
use tokio_postgres::types::ToSql;
use tokio_postgres::{Row, Statement};

/// Fetched rows plus the column names reported by the statement.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ResultSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl ResultSet {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self { columns, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of the first column called `name`.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Decode rows returned for `stmt`.
    ///
    /// Column names come from the statement, so an empty result still knows its shape.
    pub fn from_rows(stmt: &Statement, rows: &[Row]) -> ReadResult<Self> {
        let columns: Vec<String> = stmt.columns().iter().map(|c| c.name().to_string()).collect();
        let rows = rows
            .iter()
            .map(|row| decode_row(row, &columns))
            .collect::<ReadResult<Vec<_>>>()?;
        Ok(Self { columns, rows })
    }
}

fn decode_row(row: &Row, columns: &[String]) -> ReadResult<Vec<Value>> {
    (0..row.len())
        .map(|idx| {
            row.try_get::<_, Value>(idx).map_err(|e| {
                let column = columns.get(idx).map_or("?", String::as_str);
                ReadError::decode(column, decode_message(&e))
            })
        })
        .collect()
}

/// The driver's message followed by its cause, which carries the actual type mismatch.
fn decode_message(err: &(dyn std::error::Error + 'static)) -> String {
    match err.source() {
        Some(source) => format!("{err}: {source}"),
        None => err.to_string(),
    }
}

/// A connection the reader can run statements on.
///
/// A session is used by one call at a time; the reader never issues concurrent
/// statements on it.
pub trait Session: Send + Sync {
    /// Run a statement and return the number of affected rows.
    fn execute(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl std::future::Future<Output = ReadResult<u64>> + Send;

    /// Run a statement and decode every returned row.
    fn fetch(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl std::future::Future<Output = ReadResult<ResultSet>> + Send;

    /// Column names a statement would return, read from its metadata.
    fn describe(&self, sql: &str) -> impl std::future::Future<Output = ReadResult<Vec<String>>> + Send;
}

macro_rules! impl_session_for_client {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Session for $ty {
                async fn execute(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> ReadResult<u64> {
                    let stmt = self.prepare(sql).await?;
                    Ok(Self::execute(self, &stmt, params).await?)
                }

                async fn fetch(
                    &self,
                    sql: &str,
                    params: &[&(dyn ToSql + Sync)],
                ) -> ReadResult<ResultSet> {
                    let stmt = self.prepare(sql).await?;
                    let rows = Self::query(self, &stmt, params).await?;
                    ResultSet::from_rows(&stmt, &rows)
                }

                async fn describe(&self, sql: &str) -> ReadResult<Vec<String>> {
                    let stmt = self.prepare(sql).await?;
                    Ok(stmt.columns().iter().map(|c| c.name().to_string()).collect())
                }
            }
        )*
    };
}

impl_session_for_client!(tokio_postgres::Client, tokio_postgres::Transaction<'_>);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_index_finds_first_match() {
        let rs = ResultSet::new(
            vec!["a".into(), "b".into(), "a".into()],
            vec![vec![Value::Int(1), Value::Int(2), Value::Int(3)]],
        );
        assert_eq!(rs.column_index("a"), Some(0));
        assert_eq!(rs.column_index("b"), Some(1));
        assert_eq!(rs.column_index("c"), None);
        assert_eq!(rs.len(), 1);
    }

    #[derive(Debug)]
    struct Outer(std::num::ParseIntError);

    impl std::fmt::Display for Outer {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str("error deserializing column 1")
        }
    }

    impl std::error::Error for Outer {
        fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
            Some(&self.0)
        }
    }

    #[test]
    fn decode_message_keeps_the_cause() {
        let cause = "x".parse::<i32>().unwrap_err();
        let msg = decode_message(&Outer(cause.clone()));
        assert_eq!(msg, format!("error deserializing column 1: {cause}"));

        assert_eq!(decode_message(&cause), cause.to_string());
    }

    #[test]
    fn default_is_empty() {
        let rs = ResultSet::default();
        assert!(rs.is_empty());
        assert!(rs.columns.is_empty());
    }
}
