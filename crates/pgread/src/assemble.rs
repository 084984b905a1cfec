//! SELECT statement assembly.
//!
//! Clause order is fixed: SELECT, FROM, WHERE, GROUP BY, ORDER BY, LIMIT. A clause
//! whose field is empty is omitted. Identifiers are quoted through [`Ident`]; every
//! value, including the limit, is a bound parameter.

use crate::error::{ReadError, ReadResult};
use crate::ident::Ident;
use crate::request::{ReadSpec, check_aggregate_columns};
use crate::sql::Sql;

/// Assemble the statement for `spec` over the resolved `columns`.
pub fn assemble(spec: &ReadSpec, columns: &[Ident]) -> ReadResult<Sql> {
    if columns.is_empty() {
        return Err(ReadError::constraint("no columns to select"));
    }
    if !spec.aggregate().is_empty() && spec.group_by().is_empty() {
        return Err(ReadError::constraint(
            "aggregate requires a non-empty group_by",
        ));
    }
    check_aggregate_columns(spec.aggregate(), columns)?;

    let mut sql = Sql::new("SELECT ");
    for (i, column) in columns.iter().enumerate() {
        if i > 0 {
            sql.push(", ");
        }
        match spec.aggregate().get(column.name()) {
            Some(func) => {
                sql.push(func.as_sql()).push("(").push_ident_ref(column).push(")");
            }
            None => {
                sql.push_ident_ref(column);
            }
        }
    }

    sql.push(" FROM ");
    push_table(&mut sql, spec.schema(), spec.table());

    if !spec.conditions().is_empty() {
        let joiner = format!(" {} ", spec.conjunction().as_sql());
        sql.push(" WHERE ");
        for (i, condition) in spec.conditions().iter().enumerate() {
            if i > 0 {
                sql.push(&joiner);
            }
            condition.append_to_sql(&mut sql);
        }
    }

    if !spec.group_by().is_empty() {
        sql.push(" GROUP BY ");
        push_ident_list(&mut sql, spec.group_by());
    }

    if !spec.order_by().is_empty() {
        sql.push(" ORDER BY ");
        for (i, (column, direction)) in spec.order_by().iter().enumerate() {
            if i > 0 {
                sql.push(", ");
            }
            sql.push_ident_ref(column).push(" ").push(direction.as_sql());
        }
    }

    if let Some(limit) = spec.effective_limit() {
        sql.push(" LIMIT ").push_bind(limit);
    }

    Ok(sql)
}

/// Zero-row-cost probe used to discover the column list of `schema.table`.
pub fn probe_statement(schema: &Ident, table: &Ident) -> Sql {
    let mut sql = Sql::new("SELECT * FROM ");
    push_table(&mut sql, schema, table);
    sql.push(" LIMIT 1");
    sql
}

fn push_table(sql: &mut Sql, schema: &Ident, table: &Ident) {
    sql.push_ident_ref(schema).push(".").push_ident_ref(table);
}

fn push_ident_list(sql: &mut Sql, idents: &[Ident]) {
    for (i, ident) in idents.iter().enumerate() {
        if i > 0 {
            sql.push(", ");
        }
        sql.push_ident_ref(ident);
    }
}
