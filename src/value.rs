//! The canonical value type stored through the client.
//!
//! `Value` is a closed sum type covering everything the codec can round-trip:
//! primitive scalars, binary blobs, ordered sequences, and string-keyed
//! mappings. The codec serializes and deserializes this enum with an
//! exhaustive match instead of runtime type inspection.
//!
//! ## Equality rules
//!
//! - Different variants are never equal (no type coercion)
//! - `Int(1) != Float(1.0)`
//! - `String("abc") != Bytes([97, 98, 99])`
//! - Floats use IEEE-754 equality: `NaN != NaN`, `-0.0 == 0.0`

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A native value as seen by callers of the client.
///
/// Strings occupy a special place: the codec writes them verbatim as UTF-8
/// rather than through the binary serializer. Everything else goes through
/// MessagePack. `Bytes` doubles as the last-resort decode fallback for store
/// contents that are neither valid UTF-8 nor a recognized binary encoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Absence of a value.
    Null,

    /// Boolean true or false.
    Bool(bool),

    /// 64-bit signed integer.
    Int(i64),

    /// 64-bit IEEE-754 floating point.
    Float(f64),

    /// UTF-8 encoded string.
    String(String),

    /// Arbitrary binary data, distinct from `String`.
    Bytes(Vec<u8>),

    /// Ordered sequence of values.
    Array(Vec<Value>),

    /// String-keyed map of values.
    Object(HashMap<String, Value>),
}

impl Value {
    /// Returns the variant name, for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Bytes(_) => "bytes",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }

    /// Check if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Try to get as bool.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Try to get as i64.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Try to get as f64.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Try to get as string slice.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get as bytes slice.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Try to get as array slice.
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Try to get as object reference.
    pub fn as_object(&self) -> Option<&HashMap<String, Value>> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }
}

// ============================================================================
// From conversions for common native types
// ============================================================================

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i as i64)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<u32> for Value {
    fn from(i: u32) -> Self {
        Value::Int(i as i64)
    }
}

impl From<f32> for Value {
    fn from(f: f32) -> Self {
        Value::Float(f as f64)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Value::Bytes(b)
    }
}

impl From<Vec<Value>> for Value {
    fn from(a: Vec<Value>) -> Self {
        Value::Array(a)
    }
}

impl From<HashMap<String, Value>> for Value {
    fn from(o: HashMap<String, Value>) -> Self {
        Value::Object(o)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        match opt {
            Some(v) => v.into(),
            None => Value::Null,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_conversions() {
        assert_eq!(Value::from(true), Value::Bool(true));
        assert_eq!(Value::from(42i64), Value::Int(42));
        assert_eq!(Value::from(42i32), Value::Int(42));
        assert_eq!(Value::from(1.5f64), Value::Float(1.5));
        assert_eq!(Value::from("hi"), Value::String("hi".into()));
        assert_eq!(Value::from(vec![1u8, 2]), Value::Bytes(vec![1, 2]));
        assert_eq!(Value::from(None::<i64>), Value::Null);
        assert_eq!(Value::from(Some(7i64)), Value::Int(7));
    }

    #[test]
    fn no_type_coercion() {
        assert_ne!(Value::Int(1), Value::Float(1.0));
        assert_ne!(
            Value::String("abc".into()),
            Value::Bytes(b"abc".to_vec())
        );
        assert_ne!(Value::Null, Value::Bool(false));
    }

    #[test]
    fn float_equality_is_ieee754() {
        assert_ne!(Value::Float(f64::NAN), Value::Float(f64::NAN));
        assert_eq!(Value::Float(-0.0), Value::Float(0.0));
    }

    #[test]
    fn accessors() {
        assert_eq!(Value::Int(3).as_int(), Some(3));
        assert_eq!(Value::Int(3).as_float(), None);
        assert_eq!(Value::String("x".into()).as_str(), Some("x"));
        assert!(Value::Null.is_null());

        let arr = Value::Array(vec![Value::Int(1), Value::Int(2)]);
        assert_eq!(arr.as_array().unwrap().len(), 2);
        assert_eq!(arr.type_name(), "array");
    }
}
