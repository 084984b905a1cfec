//! Column discovery for requests without an explicit column list.

use crate::assemble::probe_statement;
use crate::config::ReaderConfig;
use crate::error::ReadResult;
use crate::ident::Ident;
use crate::request::ReadSpec;
use crate::session::Session;

/// Columns to select for `spec`.
///
/// Explicit columns are returned as given, with no check against the table.
/// Otherwise one `SELECT * ... LIMIT 1` probe is described (prepared, not
/// fetched) and its column names are returned in table order.
pub async fn resolve_columns<S: Session>(
    session: &S,
    spec: &ReadSpec,
    config: &ReaderConfig,
) -> ReadResult<Vec<Ident>> {
    if let Some(columns) = spec.columns() {
        return Ok(columns.to_vec());
    }

    let probe = probe_statement(spec.schema(), spec.table());
    let sql = probe.to_sql();
    config.log_statement("probe", &sql, probe.param_count());
    let names = session.describe(&sql).await?;
    names.into_iter().map(|name| Ident::for_field("columns", name)).collect()
}
