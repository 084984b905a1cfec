//! Dynamically typed cell values.
//!
//! A [`Value`] is what one column of one row decodes to when the column list is
//! only known at runtime. Decoding follows the column's PostgreSQL type; no further
//! coercion happens. Enum labels decode as text, domains decode as their base type,
//! and any type without a dedicated variant is kept as [`Value::Raw`]. `Value` also implements [`ToSql`], so it can be bound as a
//! condition operand when filter values themselves arrive dynamically.

use bytes::BytesMut;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::error::Error;
use std::fmt;
use tokio_postgres::types::{FromSql, IsNull, Kind, ToSql, Type};
use uuid::Uuid;

/// One decoded cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    /// `int2`, `int4`, `int8`, `oid`
    Int(i64),
    /// `float4`, `float8`
    Float(f64),
    /// `numeric` (also what `AVG` and `SUM` over integers return)
    Numeric(Decimal),
    /// `text`, `varchar`, `bpchar`, `name`, and other text-like types
    Text(String),
    Bytes(Vec<u8>),
    Date(NaiveDate),
    Time(NaiveTime),
    Timestamp(NaiveDateTime),
    TimestampTz(DateTime<Utc>),
    Uuid(Uuid),
    /// `json`, `jsonb`
    Json(serde_json::Value),
    /// One-dimensional arrays of any of the above
    Array(Vec<Value>),
    /// Binary wire form of a type with no dedicated variant (`interval`, `inet`,
    /// ranges, composites, ...)
    Raw { type_name: String, bytes: Vec<u8> },
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Value::Numeric(v) => Some(*v),
            _ => None,
        }
    }
}

impl<'a> FromSql<'a> for Value {
    fn from_sql(ty: &Type, raw: &'a [u8]) -> Result<Self, Box<dyn Error + Sync + Send>> {
        match ty.kind() {
            Kind::Array(_) => return Ok(Value::Array(Vec::<Value>::from_sql(ty, raw)?)),
            Kind::Enum(_) => return Ok(Value::Text(std::str::from_utf8(raw)?.to_string())),
            Kind::Domain(base) => return Value::from_sql(base, raw),
            _ => {}
        }

        let value = match *ty {
            Type::BOOL => Value::Bool(bool::from_sql(ty, raw)?),
            Type::INT2 => Value::Int(i16::from_sql(ty, raw)?.into()),
            Type::INT4 => Value::Int(i32::from_sql(ty, raw)?.into()),
            Type::INT8 => Value::Int(i64::from_sql(ty, raw)?),
            Type::OID => Value::Int(u32::from_sql(ty, raw)?.into()),
            Type::FLOAT4 => Value::Float(f32::from_sql(ty, raw)?.into()),
            Type::FLOAT8 => Value::Float(f64::from_sql(ty, raw)?),
            Type::NUMERIC => Value::Numeric(Decimal::from_sql(ty, raw)?),
            Type::BYTEA => Value::Bytes(Vec::<u8>::from_sql(ty, raw)?),
            Type::DATE => Value::Date(NaiveDate::from_sql(ty, raw)?),
            Type::TIME => Value::Time(NaiveTime::from_sql(ty, raw)?),
            Type::TIMESTAMP => Value::Timestamp(NaiveDateTime::from_sql(ty, raw)?),
            Type::TIMESTAMPTZ => Value::TimestampTz(DateTime::<Utc>::from_sql(ty, raw)?),
            Type::UUID => Value::Uuid(Uuid::from_sql(ty, raw)?),
            Type::JSON | Type::JSONB => Value::Json(serde_json::Value::from_sql(ty, raw)?),
            _ if <String as FromSql>::accepts(ty) => Value::Text(String::from_sql(ty, raw)?),
            _ => Value::Raw {
                type_name: ty.name().to_string(),
                bytes: raw.to_vec(),
            },
        };
        Ok(value)
    }

    fn from_sql_null(_ty: &Type) -> Result<Self, Box<dyn Error + Sync + Send>> {
        Ok(Value::Null)
    }

    // Anything the server sends decodes to some variant.
    fn accepts(_ty: &Type) -> bool {
        true
    }
}

impl ToSql for Value {
    fn to_sql(
        &self,
        ty: &Type,
        out: &mut BytesMut,
    ) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
        match self {
            Value::Null => Ok(IsNull::Yes),
            Value::Bool(v) => v.to_sql_checked(ty, out),
            Value::Int(v) => match *ty {
                Type::INT2 => i16::try_from(*v)?.to_sql(ty, out),
                Type::INT4 => i32::try_from(*v)?.to_sql(ty, out),
                Type::NUMERIC => Decimal::from(*v).to_sql(ty, out),
                _ => v.to_sql_checked(ty, out),
            },
            Value::Float(v) => match *ty {
                Type::FLOAT4 => (*v as f32).to_sql(ty, out),
                _ => v.to_sql_checked(ty, out),
            },
            Value::Numeric(v) => v.to_sql_checked(ty, out),
            Value::Text(v) => v.to_sql_checked(ty, out),
            Value::Bytes(v) => v.to_sql_checked(ty, out),
            Value::Date(v) => v.to_sql_checked(ty, out),
            Value::Time(v) => v.to_sql_checked(ty, out),
            Value::Timestamp(v) => v.to_sql_checked(ty, out),
            Value::TimestampTz(v) => v.to_sql_checked(ty, out),
            Value::Uuid(v) => v.to_sql_checked(ty, out),
            Value::Json(v) => v.to_sql_checked(ty, out),
            Value::Array(items) => items.to_sql_checked(ty, out),
            Value::Raw { type_name, bytes } if type_name == ty.name() => {
                out.extend_from_slice(bytes);
                Ok(IsNull::No)
            }
            Value::Raw { type_name, .. } => {
                Err(format!("cannot bind {type_name} value to a {ty} parameter").into())
            }
        }
    }

    // Each variant checks its concrete type in `to_sql`.
    fn accepts(_ty: &Type) -> bool {
        true
    }

    tokio_postgres::types::to_sql_checked!();
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Numeric(v) => write!(f, "{v}"),
            Value::Text(v) => f.write_str(v),
            Value::Bytes(v) | Value::Raw { bytes: v, .. } => {
                f.write_str("\\x")?;
                for b in v {
                    write!(f, "{b:02x}")?;
                }
                Ok(())
            }
            Value::Date(v) => write!(f, "{v}"),
            Value::Time(v) => write!(f, "{v}"),
            Value::Timestamp(v) => write!(f, "{v}"),
            Value::TimestampTz(v) => write!(f, "{v}"),
            Value::Uuid(v) => write!(f, "{v}"),
            Value::Json(v) => write!(f, "{v}"),
            Value::Array(items) => {
                f.write_str("{")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("}")
            }
        }
    }
}

macro_rules! impl_from_for_value {
    ($($ty:ty => $variant:ident $(via $conv:ty)?),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant($(<$conv>::from)?(v))
                }
            }
        )*
    };
}

impl_from_for_value! {
    bool => Bool,
    i16 => Int via i64,
    i32 => Int via i64,
    i64 => Int,
    f32 => Float via f64,
    f64 => Float,
    Decimal => Numeric,
    String => Text,
    Vec<u8> => Bytes,
    NaiveDate => Date,
    NaiveTime => Time,
    NaiveDateTime => Timestamp,
    DateTime<Utc> => TimestampTz,
    Uuid => Uuid,
    serde_json::Value => Json,
    Vec<Value> => Array,
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_supported_scalars_and_arrays() {
        assert!(<Value as FromSql>::accepts(&Type::INT4));
        assert!(<Value as FromSql>::accepts(&Type::NUMERIC));
        assert!(<Value as FromSql>::accepts(&Type::VARCHAR));
        assert!(<Value as FromSql>::accepts(&Type::TEXT_ARRAY));
        assert!(<Value as FromSql>::accepts(&Type::INT8_ARRAY));
    }

    #[test]
    fn accepts_every_type() {
        assert!(<Value as FromSql>::accepts(&Type::INTERVAL));
        assert!(<Value as FromSql>::accepts(&Type::INET));
        assert!(<Value as FromSql>::accepts(&Type::TS_VECTOR));
        assert!(<Value as FromSql>::accepts(&Type::INT4_RANGE));
        assert!(<Value as FromSql>::accepts(&mpaa_rating()));
    }

    fn mpaa_rating() -> Type {
        Type::new(
            "mpaa_rating".into(),
            16_400,
            Kind::Enum(vec!["G".into(), "PG".into(), "R".into()]),
            "public".into(),
        )
    }

    #[test]
    fn enum_decodes_to_its_label() {
        let v = Value::from_sql(&mpaa_rating(), b"PG").unwrap();
        assert_eq!(v, Value::Text("PG".into()));
    }

    #[test]
    fn domain_decodes_as_its_base_type() {
        let year = Type::new("year".into(), 16_410, Kind::Domain(Type::INT4), "public".into());
        let v = Value::from_sql(&year, &2006_i32.to_be_bytes()).unwrap();
        assert_eq!(v, Value::Int(2006));
    }

    #[test]
    fn unknown_type_is_kept_raw() {
        let mut raw = Vec::new();
        raw.extend_from_slice(&90_000_000_i64.to_be_bytes());
        raw.extend_from_slice(&0_i32.to_be_bytes());
        raw.extend_from_slice(&0_i32.to_be_bytes());

        let v = Value::from_sql(&Type::INTERVAL, &raw).unwrap();
        assert_eq!(
            v,
            Value::Raw {
                type_name: "interval".into(),
                bytes: raw.clone(),
            }
        );

        let mut buf = BytesMut::new();
        v.to_sql(&Type::INTERVAL, &mut buf).unwrap();
        assert_eq!(&buf[..], raw.as_slice());
        assert!(v.to_sql(&Type::INET, &mut BytesMut::new()).is_err());
    }

    #[test]
    fn decodes_binary_int4() {
        let raw = 42_i32.to_be_bytes();
        let v = Value::from_sql(&Type::INT4, &raw).unwrap();
        assert_eq!(v, Value::Int(42));
    }

    #[test]
    fn decodes_text() {
        let v = Value::from_sql(&Type::TEXT, b"Drama").unwrap();
        assert_eq!(v, Value::Text("Drama".into()));
    }

    #[test]
    fn null_decodes_to_null() {
        assert_eq!(Value::from_sql_null(&Type::INT4).unwrap(), Value::Null);
    }

    #[test]
    fn int_binds_to_narrower_columns() {
        let mut buf = BytesMut::new();
        Value::Int(60).to_sql(&Type::INT4, &mut buf).unwrap();
        assert_eq!(&buf[..], &60_i32.to_be_bytes());

        let mut buf = BytesMut::new();
        assert!(Value::Int(i64::MAX).to_sql(&Type::INT2, &mut buf).is_err());
    }

    #[test]
    fn text_refuses_integer_column() {
        let mut buf = BytesMut::new();
        assert!(Value::from("abc").to_sql(&Type::INT4, &mut buf).is_err());
    }

    #[test]
    fn null_binds_as_null() {
        let mut buf = BytesMut::new();
        let is_null = Value::Null.to_sql(&Type::TEXT, &mut buf).unwrap();
        assert!(matches!(is_null, IsNull::Yes));
    }

    #[test]
    fn display_formats() {
        assert_eq!(Value::Null.to_string(), "NULL");
        assert_eq!(Value::Bytes(vec![0xde, 0xad]).to_string(), "\\xdead");
        assert_eq!(
            Value::Array(vec![Value::Int(1), Value::Int(2)]).to_string(),
            "{1,2}"
        );
    }

    #[test]
    fn from_option() {
        assert_eq!(Value::from(None::<i32>), Value::Null);
        assert_eq!(Value::from(Some(3_i32)), Value::Int(3));
    }

    #[test]
    fn serializes_untagged() {
        let json = serde_json::to_string(&vec![Value::Int(1), Value::Null, Value::from("a")]).unwrap();
        assert_eq!(json, r#"[1,null,"a"]"#);
    }
}
