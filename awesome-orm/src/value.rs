//! Column values exchanged between records and the query layer.
//!
//! `Value` is the closed set of scalars a column can hold. Typed record
//! fields convert to and from it through [`FieldValue`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{OrmError, Result};

/// A single column value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Variant name used in diagnostics
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Text(_) => "text",
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            Value::Bool(b) => Some(i64::from(*b)),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(n) => Some(*n as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(x) => write!(f, "{}", x),
            Value::Text(s) => f.write_str(s),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(i64::from(value))
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::Int(i64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_owned())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}

/// Conversion between a typed record field and [`Value`].
///
/// `from_value` never sees `Value::Null`; unset fields are `None` on the
/// record itself.
pub trait FieldValue: Sized {
    fn into_value(self) -> Value;
    fn from_value(field: &str, value: Value) -> Result<Self>;
}

impl FieldValue for String {
    fn into_value(self) -> Value {
        Value::Text(self)
    }

    fn from_value(field: &str, value: Value) -> Result<Self> {
        match value {
            Value::Text(s) => Ok(s),
            other => Err(OrmError::type_mismatch(field, "text", other.kind_name())),
        }
    }
}

impl FieldValue for bool {
    fn into_value(self) -> Value {
        Value::Bool(self)
    }

    // MySQL and SQLite hand booleans back as integers
    fn from_value(field: &str, value: Value) -> Result<Self> {
        match value {
            Value::Bool(b) => Ok(b),
            Value::Int(n) => Ok(n != 0),
            other => Err(OrmError::type_mismatch(field, "bool", other.kind_name())),
        }
    }
}

impl FieldValue for i64 {
    fn into_value(self) -> Value {
        Value::Int(self)
    }

    fn from_value(field: &str, value: Value) -> Result<Self> {
        value
            .as_i64()
            .ok_or_else(|| OrmError::type_mismatch(field, "int", value.kind_name()))
    }
}

impl FieldValue for i32 {
    fn into_value(self) -> Value {
        Value::Int(i64::from(self))
    }

    fn from_value(field: &str, value: Value) -> Result<Self> {
        let wide = i64::from_value(field, value)?;
        i32::try_from(wide).map_err(|_| OrmError::type_mismatch(field, "int32", "int"))
    }
}

impl FieldValue for f64 {
    fn into_value(self) -> Value {
        Value::Float(self)
    }

    fn from_value(field: &str, value: Value) -> Result<Self> {
        value
            .as_f64()
            .ok_or_else(|| OrmError::type_mismatch(field, "float", value.kind_name()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_option_into_value() {
        assert_eq!(Value::from(None::<String>), Value::Null);
        assert_eq!(Value::from(Some(3_i64)), Value::Int(3));
    }

    #[test]
    fn test_bool_accepts_integer_storage() {
        assert!(bool::from_value("admin", Value::Int(1)).unwrap());
        assert!(!bool::from_value("admin", Value::Int(0)).unwrap());
    }

    #[test]
    fn test_float_widens_integers() {
        assert_eq!(f64::from_value("created_at", Value::Int(2)).unwrap(), 2.0);
    }

    #[test]
    fn test_type_mismatch_names_field() {
        let err = String::from_value("email", Value::Int(1)).unwrap_err();
        assert!(matches!(err, OrmError::TypeMismatch { ref field, .. } if field == "email"));
    }

    #[test]
    fn test_untagged_json() {
        let json = serde_json::to_string(&vec![
            Value::Null,
            Value::Bool(true),
            Value::Int(7),
            Value::Text("a".into()),
        ])
        .unwrap();
        assert_eq!(json, r#"[null,true,7,"a"]"#);
    }
}
