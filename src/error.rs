//! Error taxonomy for type inference, schema merging, and statement building.
//!
//! Every variant is raised at the point of detection and propagated to the
//! caller unchanged. Orchestration code wraps these in `anyhow` context.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InferenceError {
    /// The value is empty or whitespace only and carries no type evidence.
    #[error("Unable to determine the type of an empty value")]
    EmptyValue,

    /// True/false token sets are empty or overlap.
    #[error("Invalid boolean token configuration: {0}")]
    Configuration(String),

    /// Field-name sets differ between a map and a record, or between two maps.
    #[error("Field names differ: missing {missing:?}, unexpected {unexpected:?}")]
    SchemaMismatch {
        missing: Vec<String>,
        unexpected: Vec<String>,
    },

    /// A type tag without a storage mapping reached the statement builder.
    #[error("Unknown data type: {0}")]
    UnknownType(String),

    /// A value in a Boolean column matches neither token set.
    #[error("Unable to parse boolean value: {0}")]
    Value(String),

    #[error("Field names must not be empty")]
    InvalidFieldName,

    #[error("Duplicate field name '{0}'")]
    DuplicateField(String),
}

pub type InferenceResult<T> = std::result::Result<T, InferenceError>;
