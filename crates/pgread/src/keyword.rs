//! Whitelisted SQL keywords supplied by callers.
//!
//! Aggregate functions, operators, conjunctions, sort directions and return types
//! arrive either as typed enums or as strings. [`IntoKeyword`] lets builder methods
//! accept both, while only the closed enum ever reaches the assembled statement.

use crate::error::{ReadError, ReadResult};

/// A closed set of keywords parseable from caller input.
pub trait Keyword: Sized + Copy {
    /// Field name reported in validation errors.
    const FIELD: &'static str;

    /// Human-readable list of accepted spellings.
    const EXPECTED: &'static str;

    /// Parse a normalized (trimmed, upper-cased, single-spaced) spelling.
    fn from_normalized(s: &str) -> Option<Self>;

    /// Parse caller input case-insensitively, collapsing inner whitespace.
    fn parse_keyword(input: &str) -> ReadResult<Self> {
        let normalized = input.split_whitespace().collect::<Vec<_>>().join(" ");
        Self::from_normalized(&normalized.to_ascii_uppercase()).ok_or_else(|| {
            ReadError::validation(
                Self::FIELD,
                format!("unsupported value '{input}', expected one of: {}", Self::EXPECTED),
            )
        })
    }
}

/// Convert an input into a [`Keyword`].
pub trait IntoKeyword<K> {
    fn into_keyword(self) -> ReadResult<K>;
}

macro_rules! impl_into_keyword {
    ($($ty:ty),* $(,)?) => {
        $(
            impl $crate::keyword::IntoKeyword<$ty> for $ty {
                fn into_keyword(self) -> $crate::error::ReadResult<$ty> {
                    Ok(self)
                }
            }

            impl $crate::keyword::IntoKeyword<$ty> for &str {
                fn into_keyword(self) -> $crate::error::ReadResult<$ty> {
                    <$ty as $crate::keyword::Keyword>::parse_keyword(self)
                }
            }

            impl $crate::keyword::IntoKeyword<$ty> for String {
                fn into_keyword(self) -> $crate::error::ReadResult<$ty> {
                    <$ty as $crate::keyword::Keyword>::parse_keyword(&self)
                }
            }

            impl $crate::keyword::IntoKeyword<$ty> for &String {
                fn into_keyword(self) -> $crate::error::ReadResult<$ty> {
                    <$ty as $crate::keyword::Keyword>::parse_keyword(self)
                }
            }

            impl std::str::FromStr for $ty {
                type Err = $crate::error::ReadError;

                fn from_str(s: &str) -> Result<Self, Self::Err> {
                    <$ty as $crate::keyword::Keyword>::parse_keyword(s)
                }
            }
        )*
    };
}

pub(crate) use impl_into_keyword;
