use std::{collections::BTreeSet, fmt, str::FromStr};

use itertools::Itertools;
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

use crate::error::{InferenceError, InferenceResult};

/// Inferred type of a field, ordered from most to least specific.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Int,
    Float,
    Boolean,
    String,
}

impl DataType {
    pub const ALL: [DataType; 4] = [
        DataType::Int,
        DataType::Float,
        DataType::Boolean,
        DataType::String,
    ];

    /// Most specific type able to hold values of both `self` and `other`.
    ///
    /// Integers widen to floats, any mix of booleans with numbers falls back
    /// to strings, and strings absorb everything.
    pub fn widen(self, other: DataType) -> DataType {
        match (self, other) {
            (DataType::Int, DataType::Int) => DataType::Int,
            (DataType::Int, DataType::Float)
            | (DataType::Float, DataType::Int)
            | (DataType::Float, DataType::Float) => DataType::Float,
            (DataType::Boolean, DataType::Boolean) => DataType::Boolean,
            (DataType::Int | DataType::Float, DataType::Boolean)
            | (DataType::Boolean, DataType::Int | DataType::Float)
            | (DataType::String, _)
            | (_, DataType::String) => DataType::String,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::Int => "Int",
            DataType::Float => "Float",
            DataType::Boolean => "Boolean",
            DataType::String => "String",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataType {
    type Err = InferenceError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "int" | "integer" => Ok(DataType::Int),
            "float" | "double" => Ok(DataType::Float),
            "boolean" | "bool" => Ok(DataType::Boolean),
            "string" | "text" => Ok(DataType::String),
            _ => Err(InferenceError::UnknownType(value.to_string())),
        }
    }
}

impl Serialize for DataType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for DataType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        DataType::from_str(&raw).map_err(de::Error::custom)
    }
}

/// A raw value read back as its inferred type.
///
/// Integers outside the `i64` range keep their digits as text.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    BigInt(String),
    Float(f64),
    Boolean(bool),
    String(String),
}

/// Literal strings that denote `true` and `false`.
///
/// Matching is exact and case-sensitive. Both sets are non-empty and disjoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BooleanTokens {
    true_tokens: BTreeSet<String>,
    false_tokens: BTreeSet<String>,
}

impl BooleanTokens {
    pub fn new<T, F>(true_tokens: T, false_tokens: F) -> InferenceResult<Self>
    where
        T: IntoIterator,
        T::Item: Into<String>,
        F: IntoIterator,
        F::Item: Into<String>,
    {
        let true_tokens: BTreeSet<String> = true_tokens.into_iter().map(Into::into).collect();
        let false_tokens: BTreeSet<String> = false_tokens.into_iter().map(Into::into).collect();
        if true_tokens.is_empty() || false_tokens.is_empty() {
            return Err(InferenceError::Configuration(
                "true and false values must both be specified".to_string(),
            ));
        }
        let overlap = true_tokens.intersection(&false_tokens).join(", ");
        if !overlap.is_empty() {
            return Err(InferenceError::Configuration(format!(
                "values cannot be both true and false: {overlap}"
            )));
        }
        Ok(Self {
            true_tokens,
            false_tokens,
        })
    }

    pub fn parse(&self, value: &str) -> Option<bool> {
        if self.true_tokens.contains(value) {
            Some(true)
        } else if self.false_tokens.contains(value) {
            Some(false)
        } else {
            None
        }
    }

    pub fn true_tokens(&self) -> impl Iterator<Item = &str> {
        self.true_tokens.iter().map(String::as_str)
    }

    pub fn false_tokens(&self) -> impl Iterator<Item = &str> {
        self.false_tokens.iter().map(String::as_str)
    }
}

impl Default for BooleanTokens {
    fn default() -> Self {
        Self {
            true_tokens: BTreeSet::from(["True".to_string()]),
            false_tokens: BTreeSet::from(["False".to_string()]),
        }
    }
}

/// Classifies a single raw value.
///
/// Integer parsing is tried first, then floating point, then the boolean
/// tokens. Anything else is a string. A boolean token that also parses as a
/// number is therefore classified as a number.
pub fn classify(value: &str, tokens: &BooleanTokens) -> InferenceResult<(DataType, Value)> {
    if value.trim().is_empty() {
        return Err(InferenceError::EmptyValue);
    }
    if let Some(parsed) = parse_int(value) {
        return Ok((DataType::Int, parsed));
    }
    if let Ok(parsed) = value.parse::<f64>() {
        return Ok((DataType::Float, Value::Float(parsed)));
    }
    if let Some(parsed) = tokens.parse(value) {
        return Ok((DataType::Boolean, Value::Boolean(parsed)));
    }
    Ok((DataType::String, Value::String(value.to_string())))
}

/// Optional sign followed by ASCII digits, of any length.
fn parse_int(value: &str) -> Option<Value> {
    let digits = value.strip_prefix(['+', '-']).unwrap_or(value);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(match value.parse::<i64>() {
        Ok(parsed) => Value::Int(parsed),
        Err(_) => Value::BigInt(value.to_string()),
    })
}
