//! Dynamically typed column values.
//!
//! [`Value`] is what flows through the builder as a bound parameter and what comes
//! back from the database as a column of a [`Record`](crate::Record). It binds
//! through `tokio-postgres` by adapting to the parameter type the server infers,
//! so `Value::Int(1)` can be sent to an `int4`, `int8`, `float8` or `numeric` column
//! alike.

use bytes::BytesMut;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Serialize, Serializer};
use std::error::Error;
use std::fmt;
use tokio_postgres::types::{FromSql, IsNull, Kind, ToSql, Type, to_sql_checked};

use crate::error::{OrmError, OrmResult};

type BoxError = Box<dyn Error + Sync + Send>;

/// A single column or parameter value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Json(serde_json::Value),
    Uuid(uuid::Uuid),
    Timestamp(DateTime<Utc>),
    Date(NaiveDate),
    Time(NaiveTime),
    Decimal(Decimal),
    Bytes(Vec<u8>),
}

impl Value {
    /// Short name of the variant, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Text(_) => "text",
            Value::Json(_) => "json",
            Value::Uuid(_) => "uuid",
            Value::Timestamp(_) => "timestamp",
            Value::Date(_) => "date",
            Value::Time(_) => "time",
            Value::Decimal(_) => "decimal",
            Value::Bytes(_) => "bytes",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
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
            Value::Int(v) => Some(*v as f64),
            Value::Decimal(v) => v.to_f64(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(v) => Some(v),
            _ => None,
        }
    }

    /// Render the value as a SQL literal.
    ///
    /// Only meant for display (see `QueryBuilder::statement`); statements sent to
    /// the database always bind values as parameters.
    pub fn to_sql_literal(&self) -> String {
        match self {
            Value::Null => "NULL".to_string(),
            Value::Bool(true) => "TRUE".to_string(),
            Value::Bool(false) => "FALSE".to_string(),
            Value::Int(v) => v.to_string(),
            Value::Float(v) => v.to_string(),
            Value::Text(v) => quote_literal(v),
            Value::Json(v) => quote_literal(&v.to_string()),
            Value::Uuid(v) => quote_literal(&v.to_string()),
            Value::Timestamp(v) => quote_literal(&v.to_rfc3339()),
            Value::Date(v) => quote_literal(&v.to_string()),
            Value::Time(v) => quote_literal(&v.to_string()),
            Value::Decimal(v) => v.to_string(),
            Value::Bytes(v) => {
                let hex: String = v.iter().map(|b| format!("{b:02x}")).collect();
                format!("'\\x{hex}'")
            }
        }
    }
}

fn quote_literal(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_sql_literal())
    }
}

// ==================== conversions into Value ====================

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i16> for Value {
    fn from(v: i16) -> Self {
        Value::Int(v.into())
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v.into())
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Int(v.into())
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(v.into())
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&String> for Value {
    fn from(v: &String) -> Self {
        Value::Text(v.clone())
    }
}

impl From<uuid::Uuid> for Value {
    fn from(v: uuid::Uuid) -> Self {
        Value::Uuid(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::Timestamp(v)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Value::Timestamp(v.and_utc())
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Value::Date(v)
    }
}

impl From<NaiveTime> for Value {
    fn from(v: NaiveTime) -> Self {
        Value::Time(v)
    }
}

impl From<Decimal> for Value {
    fn from(v: Decimal) -> Self {
        Value::Decimal(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl From<&[u8]> for Value {
    fn from(v: &[u8]) -> Self {
        Value::Bytes(v.to_vec())
    }
}

/// Scalars map onto their own variants; arrays and objects stay JSON.
impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::Text(s),
            other => Value::Json(other),
        }
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

// ==================== conversions out of Value ====================

/// Typed extraction from a [`Value`].
pub trait FromValue: Sized {
    fn from_value(value: &Value) -> OrmResult<Self>;
}

fn mismatch<T>(expected: &str, value: &Value) -> OrmResult<T> {
    Err(OrmError::decode(
        "<value>",
        format!("expected {expected}, found {}", value.type_name()),
    ))
}

impl FromValue for Value {
    fn from_value(value: &Value) -> OrmResult<Self> {
        Ok(value.clone())
    }
}

impl FromValue for bool {
    fn from_value(value: &Value) -> OrmResult<Self> {
        match value {
            Value::Bool(v) => Ok(*v),
            other => mismatch("bool", other),
        }
    }
}

impl FromValue for i64 {
    fn from_value(value: &Value) -> OrmResult<Self> {
        match value {
            Value::Int(v) => Ok(*v),
            other => mismatch("int", other),
        }
    }
}

impl FromValue for i32 {
    fn from_value(value: &Value) -> OrmResult<Self> {
        let v = i64::from_value(value)?;
        i32::try_from(v).map_err(|e| OrmError::decode("<value>", e.to_string()))
    }
}

impl FromValue for f64 {
    fn from_value(value: &Value) -> OrmResult<Self> {
        match value.as_f64() {
            Some(v) => Ok(v),
            None => mismatch("float", value),
        }
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> OrmResult<Self> {
        match value {
            Value::Text(v) => Ok(v.clone()),
            other => mismatch("text", other),
        }
    }
}

impl FromValue for serde_json::Value {
    fn from_value(value: &Value) -> OrmResult<Self> {
        serde_json::to_value(value).map_err(|e| OrmError::decode("<value>", e.to_string()))
    }
}

impl FromValue for uuid::Uuid {
    fn from_value(value: &Value) -> OrmResult<Self> {
        match value {
            Value::Uuid(v) => Ok(*v),
            Value::Text(s) => {
                uuid::Uuid::parse_str(s).map_err(|e| OrmError::decode("<value>", e.to_string()))
            }
            other => mismatch("uuid", other),
        }
    }
}

impl FromValue for DateTime<Utc> {
    fn from_value(value: &Value) -> OrmResult<Self> {
        match value {
            Value::Timestamp(v) => Ok(*v),
            other => mismatch("timestamp", other),
        }
    }
}

impl FromValue for NaiveDate {
    fn from_value(value: &Value) -> OrmResult<Self> {
        match value {
            Value::Date(v) => Ok(*v),
            Value::Timestamp(v) => Ok(v.date_naive()),
            other => mismatch("date", other),
        }
    }
}

impl FromValue for NaiveTime {
    fn from_value(value: &Value) -> OrmResult<Self> {
        match value {
            Value::Time(v) => Ok(*v),
            other => mismatch("time", other),
        }
    }
}

impl FromValue for Decimal {
    fn from_value(value: &Value) -> OrmResult<Self> {
        match value {
            Value::Decimal(v) => Ok(*v),
            Value::Int(v) => Ok(Decimal::from(*v)),
            Value::Float(v) => {
                Decimal::try_from(*v).map_err(|e| OrmError::decode("<value>", e.to_string()))
            }
            other => mismatch("decimal", other),
        }
    }
}

impl FromValue for Vec<u8> {
    fn from_value(value: &Value) -> OrmResult<Self> {
        match value {
            Value::Bytes(v) => Ok(v.clone()),
            other => mismatch("bytes", other),
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: &Value) -> OrmResult<Self> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_none(),
            Value::Bool(v) => serializer.serialize_bool(*v),
            Value::Int(v) => serializer.serialize_i64(*v),
            Value::Float(v) => serializer.serialize_f64(*v),
            Value::Text(v) => serializer.serialize_str(v),
            Value::Json(v) => v.serialize(serializer),
            Value::Uuid(v) => v.serialize(serializer),
            Value::Timestamp(v) => v.serialize(serializer),
            Value::Date(v) => v.serialize(serializer),
            Value::Time(v) => v.serialize(serializer),
            Value::Decimal(v) => Serialize::serialize(v, serializer),
            Value::Bytes(v) => serializer.serialize_bytes(v),
        }
    }
}

// ==================== tokio-postgres binding ====================

fn accepts_text(ty: &Type) -> bool {
    <&str as ToSql>::accepts(ty)
}

fn cannot_bind(value: &Value, ty: &Type) -> BoxError {
    format!("cannot bind {} value to parameter of type `{}`", value.type_name(), ty).into()
}

impl ToSql for Value {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
        if let Kind::Domain(base) = ty.kind() {
            return self.to_sql(base, out);
        }

        match self {
            Value::Null => Ok(IsNull::Yes),
            Value::Bool(v) => match *ty {
                Type::BOOL => v.to_sql(ty, out),
                _ if accepts_text(ty) => v.to_string().to_sql(ty, out),
                _ => Err(cannot_bind(self, ty)),
            },
            Value::Int(v) => match *ty {
                Type::INT2 => i16::try_from(*v)?.to_sql(ty, out),
                Type::INT4 => i32::try_from(*v)?.to_sql(ty, out),
                Type::INT8 => v.to_sql(ty, out),
                Type::OID => u32::try_from(*v)?.to_sql(ty, out),
                Type::FLOAT4 => (*v as f32).to_sql(ty, out),
                Type::FLOAT8 => (*v as f64).to_sql(ty, out),
                Type::NUMERIC => Decimal::from(*v).to_sql(ty, out),
                _ if accepts_text(ty) => v.to_string().to_sql(ty, out),
                _ => Err(cannot_bind(self, ty)),
            },
            Value::Float(v) => match *ty {
                Type::FLOAT4 => (*v as f32).to_sql(ty, out),
                Type::FLOAT8 => v.to_sql(ty, out),
                Type::NUMERIC => Decimal::try_from(*v)?.to_sql(ty, out),
                _ if accepts_text(ty) => v.to_string().to_sql(ty, out),
                _ => Err(cannot_bind(self, ty)),
            },
            Value::Text(v) => match *ty {
                Type::UUID => uuid::Uuid::parse_str(v)?.to_sql(ty, out),
                Type::NUMERIC => v.parse::<Decimal>()?.to_sql(ty, out),
                Type::JSON | Type::JSONB => {
                    serde_json::from_str::<serde_json::Value>(v)?.to_sql(ty, out)
                }
                _ if accepts_text(ty) => v.as_str().to_sql(ty, out),
                _ => Err(cannot_bind(self, ty)),
            },
            Value::Json(v) => match *ty {
                Type::JSON | Type::JSONB => v.to_sql(ty, out),
                _ if accepts_text(ty) => v.to_string().to_sql(ty, out),
                _ => Err(cannot_bind(self, ty)),
            },
            Value::Uuid(v) => match *ty {
                Type::UUID => v.to_sql(ty, out),
                _ if accepts_text(ty) => v.to_string().to_sql(ty, out),
                _ => Err(cannot_bind(self, ty)),
            },
            Value::Timestamp(v) => match *ty {
                Type::TIMESTAMPTZ => v.to_sql(ty, out),
                Type::TIMESTAMP => v.naive_utc().to_sql(ty, out),
                Type::DATE => v.date_naive().to_sql(ty, out),
                _ if accepts_text(ty) => v.to_rfc3339().to_sql(ty, out),
                _ => Err(cannot_bind(self, ty)),
            },
            Value::Date(v) => match *ty {
                Type::DATE => v.to_sql(ty, out),
                Type::TIMESTAMP => v.and_time(NaiveTime::MIN).to_sql(ty, out),
                Type::TIMESTAMPTZ => v.and_time(NaiveTime::MIN).and_utc().to_sql(ty, out),
                _ if accepts_text(ty) => v.to_string().to_sql(ty, out),
                _ => Err(cannot_bind(self, ty)),
            },
            Value::Time(v) => match *ty {
                Type::TIME => v.to_sql(ty, out),
                _ if accepts_text(ty) => v.to_string().to_sql(ty, out),
                _ => Err(cannot_bind(self, ty)),
            },
            Value::Decimal(v) => match *ty {
                Type::NUMERIC => v.to_sql(ty, out),
                Type::FLOAT4 | Type::FLOAT8 => match v.to_f64() {
                    Some(f) if *ty == Type::FLOAT4 => (f as f32).to_sql(ty, out),
                    Some(f) => f.to_sql(ty, out),
                    None => Err(cannot_bind(self, ty)),
                },
                _ if accepts_text(ty) => v.to_string().to_sql(ty, out),
                _ => Err(cannot_bind(self, ty)),
            },
            Value::Bytes(v) => match *ty {
                Type::BYTEA => v.as_slice().to_sql(ty, out),
                _ => Err(cannot_bind(self, ty)),
            },
        }
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }

    to_sql_checked!();
}

impl<'a> FromSql<'a> for Value {
    fn from_sql(ty: &Type, raw: &'a [u8]) -> Result<Self, BoxError> {
        if let Kind::Domain(base) = ty.kind() {
            return Self::from_sql(base, raw);
        }

        match *ty {
            Type::BOOL => bool::from_sql(ty, raw).map(Value::Bool),
            Type::INT2 => i16::from_sql(ty, raw).map(|v| Value::Int(v.into())),
            Type::INT4 => i32::from_sql(ty, raw).map(|v| Value::Int(v.into())),
            Type::INT8 => i64::from_sql(ty, raw).map(Value::Int),
            Type::OID => u32::from_sql(ty, raw).map(|v| Value::Int(v.into())),
            Type::FLOAT4 => f32::from_sql(ty, raw).map(|v| Value::Float(v.into())),
            Type::FLOAT8 => f64::from_sql(ty, raw).map(Value::Float),
            Type::JSON | Type::JSONB => serde_json::Value::from_sql(ty, raw).map(Value::Json),
            Type::UUID => uuid::Uuid::from_sql(ty, raw).map(Value::Uuid),
            Type::TIMESTAMPTZ => DateTime::<Utc>::from_sql(ty, raw).map(Value::Timestamp),
            Type::TIMESTAMP => {
                NaiveDateTime::from_sql(ty, raw).map(|v| Value::Timestamp(v.and_utc()))
            }
            Type::DATE => NaiveDate::from_sql(ty, raw).map(Value::Date),
            Type::TIME => NaiveTime::from_sql(ty, raw).map(Value::Time),
            Type::NUMERIC => Decimal::from_sql(ty, raw).map(Value::Decimal),
            Type::BYTEA => Vec::<u8>::from_sql(ty, raw).map(Value::Bytes),
            _ if <&str as FromSql>::accepts(ty) => String::from_sql(ty, raw).map(Value::Text),
            _ => Err(format!("unsupported column type `{ty}`").into()),
        }
    }

    fn from_sql_null(_ty: &Type) -> Result<Self, BoxError> {
        Ok(Value::Null)
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }
}
