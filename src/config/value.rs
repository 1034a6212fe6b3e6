//! Configuration values and the nested attribute shape documents are made of.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::{self, DeserializeSeed, Deserializer, MapAccess, Unexpected, Visitor};
use serde::Deserialize;

use super::key::Key;

/// A single configuration value.
///
/// Tiers only ever hold these five shapes. Nested mappings are flattened into
/// dotted keys before they reach a tier.
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the value as a float, widening integers.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }
}

/// Integers and floats compare by numeric value, so `5` equals `5.0`.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Integer(i), Value::Float(f)) | (Value::Float(f), Value::Integer(i)) => {
                *i as f64 == *f
            }
            (Value::String(a), Value::String(b)) => a == b,
            _ => false,
        }
    }
}

/// The canonical string form, as written to environment variables.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("nil"),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Integer(i) => write!(f, "{i}"),
            // Keep a fractional part so the string coerces back to a float.
            Value::Float(x) if x.is_finite() && x.fract() == 0.0 => write!(f, "{x:.1}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::String(s) => f.write_str(s),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Integer(i64::from(i))
    }
}

impl From<u16> for Value {
    fn from(i: u16) -> Self {
        Value::Integer(i64::from(i))
    }
}

impl From<u32> for Value {
    fn from(i: u32) -> Self {
        Value::Integer(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

/// A string-keyed nested mapping, as produced by a parsed document.
pub type Attributes = BTreeMap<String, Attribute>;

/// A node in a configuration document: a leaf value or a nested table.
#[derive(Debug, Clone, PartialEq)]
pub enum Attribute {
    Table(Attributes),
    Scalar(Value),
}

impl Attribute {
    pub fn as_table(&self) -> Option<&Attributes> {
        match self {
            Attribute::Table(t) => Some(t),
            Attribute::Scalar(_) => None,
        }
    }
}

impl From<Attributes> for Attribute {
    fn from(table: Attributes) -> Self {
        Attribute::Table(table)
    }
}

macro_rules! scalar_attribute {
    ($($t:ty),* $(,)?) => {
        $(
            impl From<$t> for Attribute {
                fn from(v: $t) -> Self {
                    Attribute::Scalar(Value::from(v))
                }
            }
        )*
    };
}

scalar_attribute!(Value, bool, i64, i32, u16, u32, f64, &str, String);

/// Key the `toml` deserializer uses to pass datetimes through serde.
const TOML_DATETIME_FIELD: &str = "$__toml_private_datetime";

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(ValueVisitor)
    }
}

struct ValueVisitor;

impl<'de> Visitor<'de> for ValueVisitor {
    type Value = Value;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a string, integer, float, boolean or null")
    }

    fn visit_bool<E>(self, b: bool) -> Result<Value, E> {
        Ok(Value::Boolean(b))
    }

    fn visit_i64<E>(self, i: i64) -> Result<Value, E> {
        Ok(Value::Integer(i))
    }

    fn visit_u64<E>(self, u: u64) -> Result<Value, E>
    where
        E: de::Error,
    {
        i64::try_from(u).map(Value::Integer).map_err(|_| {
            E::invalid_value(Unexpected::Unsigned(u), &"an integer within i64 range")
        })
    }

    fn visit_f64<E>(self, f: f64) -> Result<Value, E> {
        Ok(Value::Float(f))
    }

    fn visit_str<E>(self, s: &str) -> Result<Value, E> {
        Ok(Value::String(s.to_owned()))
    }

    fn visit_string<E>(self, s: String) -> Result<Value, E> {
        Ok(Value::String(s))
    }

    fn visit_unit<E>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_none<E>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }
}

/// Tables must be keyed by strings; numeric or boolean keys are rejected.
struct TableKey;

impl<'de> DeserializeSeed<'de> for TableKey {
    type Value = String;

    fn deserialize<D>(self, deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(self)
    }
}

impl<'de> Visitor<'de> for TableKey {
    type Value = String;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a string key")
    }

    fn visit_str<E>(self, s: &str) -> Result<String, E> {
        Ok(s.to_owned())
    }

    fn visit_string<E>(self, s: String) -> Result<String, E> {
        Ok(s)
    }
}

impl<'de> Deserialize<'de> for Attribute {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(AttributeVisitor)
    }
}

struct AttributeVisitor;

impl<'de> Visitor<'de> for AttributeVisitor {
    type Value = Attribute;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a scalar value or a table")
    }

    fn visit_bool<E>(self, b: bool) -> Result<Attribute, E> {
        Ok(Attribute::Scalar(Value::Boolean(b)))
    }

    fn visit_i64<E>(self, i: i64) -> Result<Attribute, E> {
        Ok(Attribute::Scalar(Value::Integer(i)))
    }

    fn visit_u64<E>(self, u: u64) -> Result<Attribute, E>
    where
        E: de::Error,
    {
        ValueVisitor.visit_u64(u).map(Attribute::Scalar)
    }

    fn visit_f64<E>(self, f: f64) -> Result<Attribute, E> {
        Ok(Attribute::Scalar(Value::Float(f)))
    }

    fn visit_str<E>(self, s: &str) -> Result<Attribute, E> {
        Ok(Attribute::Scalar(Value::String(s.to_owned())))
    }

    fn visit_string<E>(self, s: String) -> Result<Attribute, E> {
        Ok(Attribute::Scalar(Value::String(s)))
    }

    fn visit_unit<E>(self) -> Result<Attribute, E> {
        Ok(Attribute::Scalar(Value::Null))
    }

    fn visit_none<E>(self) -> Result<Attribute, E> {
        Ok(Attribute::Scalar(Value::Null))
    }

    fn visit_map<A>(self, mut map: A) -> Result<Attribute, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut table = Attributes::new();
        while let Some(key) = map.next_key_seed(TableKey)? {
            if key == TOML_DATETIME_FIELD {
                return Err(de::Error::custom("datetimes are not supported"));
            }
            let value = map.next_value()?;
            table.insert(key, value);
        }
        Ok(Attribute::Table(table))
    }
}

/// Decomposes `attribute` written at `key` into dotted leaf entries.
///
/// A table at `agent` holding `interval` yields `agent.interval`. Empty tables
/// yield nothing.
pub fn flatten(key: Key, attribute: Attribute) -> Vec<(Key, Value)> {
    let mut leaves = Vec::new();
    flatten_into(key, attribute, &mut leaves);
    leaves
}

fn flatten_into(key: Key, attribute: Attribute, leaves: &mut Vec<(Key, Value)>) {
    match attribute {
        Attribute::Scalar(value) => leaves.push((key, value)),
        Attribute::Table(table) => {
            for (child, attribute) in table {
                flatten_into(Key::scoped(key.as_str(), &child), attribute, leaves);
            }
        }
    }
}
