//! Observation result values
//!
//! A result arrives either from a parsed document or from the server and the
//! two sides do not agree on numeric representation. `ResultValue` is the
//! single tagged shape both are converted into before comparison.

use super::decimal::Decimal;
use crate::types::JsonValue;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

/// The result of an observation
///
/// All machine integer widths collapse into `Int`; numbers that do not fit an
/// `i64` (fractions, very large integers) become `Decimal`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "JsonValue", into = "JsonValue")]
pub enum ResultValue {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Decimal(Decimal),
    Text(String),
    Sequence(Vec<ResultValue>),
    Object(BTreeMap<String, ResultValue>),
}

impl ResultValue {
    /// Check for the null result
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Short name of the variant, for logging
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Decimal(_) => "decimal",
            Self::Text(_) => "text",
            Self::Sequence(_) => "sequence",
            Self::Object(_) => "object",
        }
    }

    /// Interpret this value as a decimal number, if it is numeric or numeric text
    pub fn to_decimal(&self) -> Option<Decimal> {
        match self {
            Self::Int(v) => Some(Decimal::from(*v)),
            Self::Decimal(d) => Some(d.clone()),
            Self::Text(s) => Decimal::from_str(s).ok(),
            _ => None,
        }
    }
}

impl From<JsonValue> for ResultValue {
    fn from(value: JsonValue) -> Self {
        match value {
            JsonValue::Null => Self::Null,
            JsonValue::Bool(b) => Self::Bool(b),
            JsonValue::Number(n) => match n.as_i64() {
                Some(i) => Self::Int(i),
                None => {
                    let text = n.to_string();
                    Decimal::from_str(&text).map_or(Self::Text(text), Self::Decimal)
                }
            },
            JsonValue::String(s) => Self::Text(s),
            JsonValue::Array(items) => Self::Sequence(items.into_iter().map(Self::from).collect()),
            JsonValue::Object(map) => {
                Self::Object(map.into_iter().map(|(k, v)| (k, Self::from(v))).collect())
            }
        }
    }
}

impl From<ResultValue> for JsonValue {
    fn from(value: ResultValue) -> Self {
        match value {
            ResultValue::Null => JsonValue::Null,
            ResultValue::Bool(b) => JsonValue::Bool(b),
            ResultValue::Int(i) => JsonValue::from(i),
            ResultValue::Decimal(d) => {
                let text = d.to_string();
                serde_json::Number::from_str(&text)
                    .map_or(JsonValue::String(text), JsonValue::Number)
            }
            ResultValue::Text(s) => JsonValue::String(s),
            ResultValue::Sequence(items) => {
                JsonValue::Array(items.into_iter().map(JsonValue::from).collect())
            }
            ResultValue::Object(map) => {
                JsonValue::Object(map.into_iter().map(|(k, v)| (k, JsonValue::from(v))).collect())
            }
        }
    }
}

macro_rules! impl_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for ResultValue {
                fn from(value: $t) -> Self {
                    Self::Int(i64::from(value))
                }
            }
        )*
    };
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<u64> for ResultValue {
    fn from(value: u64) -> Self {
        i64::try_from(value).map_or_else(|_| Self::Decimal(Decimal::from(value)), Self::Int)
    }
}

impl From<bool> for ResultValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for ResultValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for ResultValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Decimal> for ResultValue {
    fn from(value: Decimal) -> Self {
        Self::Decimal(value)
    }
}

impl<T: Into<ResultValue>> From<Vec<T>> for ResultValue {
    fn from(values: Vec<T>) -> Self {
        Self::Sequence(values.into_iter().map(Into::into).collect())
    }
}
