//! Safe SQL identifier handling.
//!
//! [`Ident`] holds one schema, table, or column name exactly as the caller spelled it.
//! The name is never parsed for dots; `"public.users"` is one identifier, not two.
//!
//! Rendering:
//! - names matching `[a-z_][a-z0-9_$]*` that are not keywords are emitted bare
//! - everything else is double-quoted, with `"` escaped as `""`
//!
//! Quoting preserves case, so `Name` reaches the server as `"Name"` rather than
//! being folded to `name`.
//!
//! # Example
//! ```ignore
//! use pgread::Ident;
//!
//! assert_eq!(Ident::new("film_list")?.to_sql(), "film_list");
//! assert_eq!(Ident::new("Grade")?.to_sql(), r#""Grade""#);
//! # Ok::<(), pgread::ReadError>(())
//! ```

use crate::error::{ReadError, ReadResult};

/// Keywords that cannot appear bare as a column or table name.
///
/// Reserved words plus the "type or function name" category from the
/// PostgreSQL keyword appendix.
const KEYWORDS: &[&str] = &[
    "all", "analyse", "analyze", "and", "any", "array", "as", "asc", "asymmetric",
    "authorization", "binary", "both", "case", "cast", "check", "collate", "collation",
    "column", "concurrently", "constraint", "create", "cross", "current_catalog",
    "current_date", "current_role", "current_schema", "current_time", "current_timestamp",
    "current_user", "default", "deferrable", "desc", "distinct", "do", "else", "end",
    "except", "false", "fetch", "for", "foreign", "freeze", "from", "full", "grant",
    "group", "having", "ilike", "in", "initially", "inner", "intersect", "into", "is",
    "isnull", "join", "lateral", "leading", "left", "like", "limit", "localtime",
    "localtimestamp", "natural", "not", "notnull", "null", "offset", "on", "only", "or",
    "order", "outer", "overlaps", "placing", "primary", "references", "returning",
    "right", "select", "session_user", "similar", "some", "symmetric", "system_user",
    "table", "tablesample", "then", "to", "trailing", "true", "union", "unique", "user",
    "using", "variadic", "verbose", "when", "where", "window", "with",
];

/// A single SQL identifier (schema, table, or column name).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Ident {
    name: String,
}

impl Ident {
    /// Validate a name for use as an identifier.
    ///
    /// Rejects empty names and names containing NUL.
    pub fn new(name: impl Into<String>) -> ReadResult<Self> {
        Self::for_field("identifier", name)
    }

    /// Like [`Ident::new`], but validation errors name `field`.
    pub(crate) fn for_field(field: &str, name: impl Into<String>) -> ReadResult<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(ReadError::validation(field, "identifier cannot be empty"));
        }
        if name.contains('\0') {
            return Err(ReadError::validation(
                field,
                "identifier cannot contain NUL character",
            ));
        }
        Ok(Self { name })
    }

    /// The name as given, without quotes.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether this name can be emitted without quotes.
    pub fn is_bare(&self) -> bool {
        let mut chars = self.name.chars();
        let Some(first) = chars.next() else {
            return false;
        };
        let first_ok = first == '_' || first.is_ascii_lowercase();
        first_ok
            && chars.all(|c| c == '_' || c == '$' || c.is_ascii_lowercase() || c.is_ascii_digit())
            && !KEYWORDS.contains(&self.name.as_str())
    }

    /// Render the identifier as SQL.
    pub fn to_sql(&self) -> String {
        let mut out = String::with_capacity(self.name.len() + 2);
        self.write_sql(&mut out);
        out
    }

    pub(crate) fn write_sql(&self, out: &mut String) {
        if self.is_bare() {
            out.push_str(&self.name);
            return;
        }
        out.push('"');
        for ch in self.name.chars() {
            if ch == '"' {
                out.push('"');
                out.push('"');
            } else {
                out.push(ch);
            }
        }
        out.push('"');
    }
}

impl std::fmt::Display for Ident {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_sql())
    }
}

/// Convert an input into an [`Ident`].
///
/// This is mainly for ergonomics in builder APIs.
pub trait IntoIdent {
    fn into_ident(self) -> ReadResult<Ident>;
}

impl IntoIdent for Ident {
    fn into_ident(self) -> ReadResult<Ident> {
        Ok(self)
    }
}

impl IntoIdent for &Ident {
    fn into_ident(self) -> ReadResult<Ident> {
        Ok(self.clone())
    }
}

impl IntoIdent for &str {
    fn into_ident(self) -> ReadResult<Ident> {
        Ident::new(self)
    }
}

impl IntoIdent for String {
    fn into_ident(self) -> ReadResult<Ident> {
        Ident::new(self)
    }
}

impl IntoIdent for &String {
    fn into_ident(self) -> ReadResult<Ident> {
        Ident::new(self.as_str())
    }
}
