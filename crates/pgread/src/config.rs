//! Construction-time reader configuration.

use crate::format::ReturnType;
use tracing::Level;

/// Configuration for [`crate::Reader`].
#[derive(Debug, Clone)]
pub struct ReaderConfig {
    /// Output shape used when a request does not override it.
    pub return_type: ReturnType,
    /// Tracing level for executed statements.
    pub sql_log_level: Level,
    /// Truncate logged SQL to this many bytes. `None` means no truncation.
    pub max_sql_length: Option<usize>,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            return_type: ReturnType::default(),
            sql_log_level: Level::DEBUG,
            max_sql_length: Some(200),
        }
    }
}

impl ReaderConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the default output shape.
    pub fn return_type(mut self, return_type: ReturnType) -> Self {
        self.return_type = return_type;
        self
    }

    /// Override the tracing level for statements.
    pub fn sql_log_level(mut self, level: Level) -> Self {
        self.sql_log_level = level;
        self
    }

    /// Set maximum logged SQL length.
    pub fn max_sql_length(mut self, len: usize) -> Self {
        self.max_sql_length = Some(len);
        self
    }

    /// Disable SQL truncation in logs.
    pub fn no_truncate(mut self) -> Self {
        self.max_sql_length = None;
        self
    }

    /// Emit one executed statement on the `pgread.sql` target.
    pub(crate) fn log_statement(&self, phase: &str, sql: &str, param_count: usize) {
        macro_rules! emit_at_level {
            ($level:expr, $($field:tt)*) => {
                match $level {
                    Level::ERROR => tracing::error!($($field)*),
                    Level::WARN  => tracing::warn!($($field)*),
                    Level::INFO  => tracing::info!($($field)*),
                    Level::DEBUG => tracing::debug!($($field)*),
                    Level::TRACE => tracing::trace!($($field)*),
                }
            };
        }

        let sql = self.truncate_sql(sql);
        emit_at_level!(
            self.sql_log_level,
            target: "pgread.sql",
            phase,
            param_count,
            sql = %sql,
        );
    }

    pub(crate) fn truncate_sql<'a>(&self, sql: &'a str) -> std::borrow::Cow<'a, str> {
        match self.max_sql_length {
            Some(max) if sql.len() > max => format!("{}...", truncate_sql_bytes(sql, max)).into(),
            _ => sql.into(),
        }
    }
}

fn truncate_sql_bytes(sql: &str, max_bytes: usize) -> &str {
    if sql.len() <= max_bytes {
        return sql;
    }
    let mut end = max_bytes;
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    &sql[..end]
}
