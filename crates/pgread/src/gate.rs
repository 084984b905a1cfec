//! Read-only gate for raw statements.
//!
//! A raw statement is accepted only when its first keyword, after leading
//! whitespace, comments and opening parentheses, is `SELECT`.

use crate::error::{ReadError, ReadResult};
use crate::sql::{Sql, first_keyword};

/// Reject blank and non-SELECT statements.
pub fn check_statement(sql: &Sql) -> ReadResult<()> {
    if sql.is_blank() {
        return Err(ReadError::validation("query", "statement cannot be empty"));
    }

    let text = sql.to_sql();
    match first_keyword(&text) {
        Some(keyword) if keyword.eq_ignore_ascii_case("SELECT") => Ok(()),
        Some(keyword) => Err(ReadError::query_constraint(format!(
            "only SELECT statements may be run, got {}",
            keyword.to_ascii_uppercase()
        ))),
        None => Err(ReadError::query_constraint(
            "only SELECT statements may be run, found no keyword",
        )),
    }
}
