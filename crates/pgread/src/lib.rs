//! # pgread
//!
//! Declarative, read-only SELECTs for PostgreSQL.
//!
//! ## Features
//!
//! - **Declarative reads**: describe table, columns, aggregates, filters, grouping,
//!   ordering and limit; get back a correctly quoted, fully parameterized SELECT
//! - **Column discovery**: omit the column list and it is read from the table's metadata
//! - **Output shapes**: positional rows, ordinal-keyed records, or a tabular frame
//! - **Read-only gate**: raw statements run only if they are SELECTs
//! - **Scoped connections**: a [`Connection`] is released when dropped
//!
//! ## Reading
//!
//! ```ignore
//! use pgread::{Connection, ConnectionParams, Op, ReadRequest, Reader};
//!
//! let conn = Connection::open(&ConnectionParams::new().database("dvdrental")).await?;
//! let reader = Reader::with_return_type("frame")?;
//!
//! let out = reader
//!     .read(
//!         &conn,
//!         &ReadRequest::new("public", "film_list")
//!             .columns(["category", "price"])
//!             .aggregate("price", "SUM")
//!             .condition("length", Op::Gt, 60_i32)
//!             .group_by(["category", "price"])
//!             .order_by(("price", "DESC"))
//!             .limit(10),
//!     )
//!     .await?;
//! // SELECT category, SUM(price) FROM public.film_list WHERE length > $1
//! //   GROUP BY category, price ORDER BY price DESC LIMIT $2
//! ```
//!
//! ## Raw SELECTs
//!
//! ```ignore
//! let out = reader.query(&conn, "SELECT count(*) FROM public.actor", true).await?;
//! reader.query(&conn, "DELETE FROM public.actor", false).await; // QueryConstraint error
//! ```

pub mod aggregate;
pub mod assemble;
pub mod condition;
pub mod config;
pub mod connect;
pub mod error;
pub mod format;
pub mod gate;
pub mod ident;
pub mod keyword;
pub mod order;
pub mod reader;
pub mod request;
pub mod resolve;
pub mod session;
pub mod sql;
pub mod value;

pub use aggregate::{Aggregate, AggregateMap};
pub use assemble::{assemble, probe_statement};
pub use condition::{Condition, Conjunction, Op, Operand};
pub use config::ReaderConfig;
pub use connect::{Connection, ConnectionParams};
pub use error::{ReadError, ReadResult};
pub use format::{Frame, QueryOutput, Record, ReturnType, format};
pub use gate::check_statement;
pub use ident::{Ident, IntoIdent};
pub use keyword::{IntoKeyword, Keyword};
pub use order::{Direction, IntoOrderBy, OrderBy};
pub use reader::{ReadPlan, Reader};
pub use request::{ReadRequest, ReadSpec};
pub use resolve::resolve_columns;
pub use session::{ResultSet, Session};
pub use sql::{Param, Sql};
pub use value::Value;
