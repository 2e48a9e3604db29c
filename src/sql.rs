//! Schema-driven statement building.
//!
//! Turns a finalized [`Schema`] into a table definition and each raw
//! [`Record`] into a row insert. Statements keep their column names and
//! literals apart so that an executor can bind parameters; `to_sql` renders
//! the literal text form.

use std::fmt;

use itertools::Itertools;

use crate::{
    data::{BooleanTokens, DataType},
    error::{InferenceError, InferenceResult},
    record::Record,
    schema::Schema,
};

/// Suffix appended to the sanitized table name to form the identity column.
pub const ID_COLUMN_SUFFIX: &str = "____ID";

/// Replaces every character that is not a letter or digit with `_`.
///
/// Distinct names may collide after sanitizing; collisions are not detected.
pub fn safe_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageType {
    BigInt,
    Double,
    Text,
    Boolean,
}

impl StorageType {
    pub fn as_sql(&self) -> &'static str {
        match self {
            StorageType::BigInt => "BIGINT",
            StorageType::Double => "DOUBLE",
            StorageType::Text => "TEXT",
            StorageType::Boolean => "BOOLEAN",
        }
    }
}

impl fmt::Display for StorageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

impl From<DataType> for StorageType {
    fn from(datatype: DataType) -> Self {
        match datatype {
            DataType::Int => StorageType::BigInt,
            DataType::Float => StorageType::Double,
            DataType::String => StorageType::Text,
            DataType::Boolean => StorageType::Boolean,
        }
    }
}

/// Storage type for a textual type tag such as `Int` or `Boolean`.
pub fn storage_type_for_tag(tag: &str) -> InferenceResult<StorageType> {
    tag.parse::<DataType>().map(StorageType::from)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDefinition {
    pub name: String,
    pub storage: StorageType,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDefinition {
    pub table: String,
    pub id_column: String,
    pub columns: Vec<ColumnDefinition>,
}

impl TableDefinition {
    pub fn from_schema(schema: &Schema) -> Self {
        let table = safe_name(schema.table());
        let id_column = format!("{table}{ID_COLUMN_SUFFIX}");
        let columns = schema
            .fields()
            .iter()
            .map(|(name, datatype)| ColumnDefinition {
                name: safe_name(name.as_str()),
                storage: StorageType::from(datatype),
            })
            .collect();
        Self {
            table,
            id_column,
            columns,
        }
    }

    pub fn to_sql(&self) -> String {
        let columns = self
            .columns
            .iter()
            .map(|column| format!("{} {}", column.name, column.storage))
            .join(", ");
        format!(
            "CREATE TABLE {table} ({id} INT NOT NULL AUTO_INCREMENT, {columns}, PRIMARY KEY ({id}));",
            table = self.table,
            id = self.id_column,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlLiteral {
    Text(String),
    Boolean(bool),
}

impl fmt::Display for SqlLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlLiteral::Text(text) => write!(f, "\"{}\"", text.replace('"', "\"\"")),
            SqlLiteral::Boolean(value) => write!(f, "{value}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowInsert {
    pub table: String,
    pub columns: Vec<String>,
    pub values: Vec<SqlLiteral>,
}

impl RowInsert {
    /// Pairs each field of `record`, in record order, with the literal its
    /// schema type calls for.
    pub fn build(schema: &Schema, record: &Record, tokens: &BooleanTokens) -> InferenceResult<Self> {
        schema.fields().ensure_same_fields(record.field_names())?;
        let mut columns = Vec::with_capacity(record.len());
        let mut values = Vec::with_capacity(record.len());
        for (name, raw) in record.iter() {
            let literal = match schema.fields().get(name.as_str()) {
                Some(DataType::Boolean) => tokens
                    .parse(raw)
                    .map(SqlLiteral::Boolean)
                    .ok_or_else(|| InferenceError::Value(raw.to_string()))?,
                _ => SqlLiteral::Text(raw.to_string()),
            };
            columns.push(safe_name(name.as_str()));
            values.push(literal);
        }
        Ok(Self {
            table: safe_name(schema.table()),
            columns,
            values,
        })
    }

    pub fn to_sql(&self) -> String {
        format!(
            "INSERT INTO {} ({}) VALUES ({});",
            self.table,
            self.columns.iter().join(", "),
            self.values.iter().join(", ")
        )
    }
}

pub fn create_database_statement(database: &str) -> String {
    format!("CREATE DATABASE IF NOT EXISTS {};", safe_name(database))
}

pub fn drop_table_statement(table: &str) -> String {
    format!("DROP TABLE IF EXISTS {};", safe_name(table))
}
