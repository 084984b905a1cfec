//! The reader: validate, resolve, assemble, fetch, format.

use crate::aggregate::AggregateMap;
use crate::assemble::assemble;
use crate::config::ReaderConfig;
use crate::error::ReadResult;
use crate::format::{QueryOutput, ReturnType, format};
use crate::gate::check_statement;
use crate::ident::Ident;
use crate::keyword::IntoKeyword;
use crate::request::{ReadRequest, ReadSpec};
use crate::resolve::resolve_columns;
use crate::session::Session;
use crate::sql::Sql;

/// Entry point for declarative reads and gated raw SELECTs.
///
/// A `Reader` holds only its construction-time configuration. Resolved columns,
/// statements and rows are returned to the caller, never stored.
///
/// # Example
///
/// ```ignore
/// use pgread::{Connection, ConnectionParams, ReadRequest, Reader};
///
/// let conn = Connection::open(&ConnectionParams::new().database("dvdrental")).await?;
/// let reader = Reader::with_return_type("frame")?;
/// let out = reader
///     .read(&conn, &ReadRequest::new("public", "film_list").limit(5))
///     .await?;
/// println!("{}", out.as_frame().unwrap());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Reader {
    config: ReaderConfig,
}

impl Reader {
    /// Reader with the default configuration (records output).
    pub fn new() -> Self {
        Self::default()
    }

    /// Reader with a default return shape given as a keyword (`"list"`, `"dict"`, `"frame"`, ...).
    pub fn with_return_type(return_type: impl IntoKeyword<ReturnType>) -> ReadResult<Self> {
        let return_type = return_type.into_keyword()?;
        Ok(Self::with_config(ReaderConfig::new().return_type(return_type)))
    }

    pub fn with_config(config: ReaderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    /// Validate `request`, resolve its columns and assemble its statement.
    ///
    /// Validation runs before any I/O. When the request has no explicit columns,
    /// one metadata probe is issued on `session`.
    pub async fn plan<S: Session>(&self, session: &S, request: &ReadRequest) -> ReadResult<ReadPlan> {
        let spec = request.validate().inspect_err(|err| {
            tracing::debug!(error = %err, "read request rejected");
        })?;
        let columns = resolve_columns(session, &spec, &self.config).await?;
        let statement = assemble(&spec, &columns)?;
        let return_type = spec.return_type().unwrap_or(self.config.return_type);
        Ok(ReadPlan {
            spec,
            columns,
            statement,
            return_type,
        })
    }

    /// Run a planned read and format its rows.
    pub async fn run<S: Session>(&self, session: &S, plan: &ReadPlan) -> ReadResult<QueryOutput> {
        let sql = plan.statement.to_sql();
        self.config.log_statement("read", &sql, plan.statement.param_count());
        let mut result = session.fetch(&sql, &plan.statement.params_ref()).await?;
        // Cells are keyed by the selected column, not the server's label (`SUM(price)` is "sum").
        result.columns = plan.columns.iter().map(|c| c.name().to_string()).collect();
        Ok(format(&result, plan.return_type, plan.spec.aggregate()))
    }

    /// Plan and run a read.
    pub async fn read<S: Session>(&self, session: &S, request: &ReadRequest) -> ReadResult<QueryOutput> {
        let plan = self.plan(session, request).await?;
        self.run(session, &plan).await
    }

    /// Run a raw SELECT statement.
    ///
    /// Anything but a SELECT is rejected before reaching the session. With `fetch`
    /// the rows come back in the reader's default shape (headers are never
    /// relabelled); without it the statement is only executed.
    pub async fn query<S: Session>(
        &self,
        session: &S,
        sql: impl Into<Sql>,
        fetch: bool,
    ) -> ReadResult<Option<QueryOutput>> {
        let sql = sql.into();
        check_statement(&sql).inspect_err(|err| {
            tracing::debug!(error = %err, "raw statement rejected");
        })?;

        let text = sql.to_sql();
        self.config.log_statement("query", &text, sql.param_count());
        let params = sql.params_ref();
        if fetch {
            let result = session.fetch(&text, &params).await?;
            Ok(Some(format(&result, self.config.return_type, &AggregateMap::new())))
        } else {
            session.execute(&text, &params).await?;
            Ok(None)
        }
    }
}

/// A validated read with its columns resolved and statement assembled.
#[derive(Debug, Clone)]
pub struct ReadPlan {
    spec: ReadSpec,
    columns: Vec<Ident>,
    statement: Sql,
    return_type: ReturnType,
}

impl ReadPlan {
    pub fn spec(&self) -> &ReadSpec {
        &self.spec
    }

    /// Columns the statement selects, explicit or resolved.
    pub fn columns(&self) -> &[Ident] {
        &self.columns
    }

    pub fn statement(&self) -> &Sql {
        &self.statement
    }

    /// Statement text with `$n` placeholders.
    pub fn sql(&self) -> String {
        self.statement.to_sql()
    }

    pub fn return_type(&self) -> ReturnType {
        self.return_type
    }

    /// Same plan, formatted differently.
    pub fn with_return_type(mut self, return_type: ReturnType) -> Self {
        self.return_type = return_type;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_reader_returns_records() {
        assert_eq!(Reader::new().config().return_type, ReturnType::Records);
    }

    #[test]
    fn return_type_keyword_is_validated() {
        assert_eq!(
            Reader::with_return_type("frame").unwrap().config().return_type,
            ReturnType::Frame
        );
        let err = Reader::with_return_type("parquet").unwrap_err();
        assert_eq!(err.field(), Some("return_type"));
        assert_eq!(
            Reader::with_return_type(ReturnType::Rows).unwrap().config().return_type,
            ReturnType::Rows
        );
    }
}
