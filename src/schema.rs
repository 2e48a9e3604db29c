//! Table schema and its YAML persistence.
//!
//! A [`Schema`] is the merged [`FieldTypeMap`] that is authoritative for one
//! table. It is produced once per load run and never mutated afterwards.

use std::{fs::File, io::BufReader, path::Path};

use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};

use crate::inference::{FieldType, FieldTypeMap};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    table: String,
    fields: FieldTypeMap,
}

#[derive(Debug, Serialize, Deserialize)]
struct SchemaDocument {
    table: String,
    fields: Vec<FieldType>,
}

impl Schema {
    pub fn new(table: impl Into<String>, fields: FieldTypeMap) -> Self {
        Self {
            table: table.into(),
            fields,
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn fields(&self) -> &FieldTypeMap {
        &self.fields
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let file = File::create(path).with_context(|| format!("Creating schema file {path:?}"))?;
        serde_yaml::to_writer(file, &self.to_document()).context("Writing schema YAML")
    }

    pub fn to_yaml_string(&self) -> Result<String> {
        serde_yaml::to_string(&self.to_document()).context("Serializing schema to YAML string")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("Opening schema file {path:?}"))?;
        let reader = BufReader::new(file);
        let document: SchemaDocument =
            serde_yaml::from_reader(reader).context("Parsing schema YAML")?;
        Self::from_document(document).with_context(|| format!("Validating schema {path:?}"))
    }

    fn to_document(&self) -> SchemaDocument {
        SchemaDocument {
            table: self.table.clone(),
            fields: self.fields.to_field_types(),
        }
    }

    fn from_document(document: SchemaDocument) -> Result<Self> {
        ensure!(
            !document.table.trim().is_empty(),
            "Schema table name must not be empty"
        );
        ensure!(
            !document.fields.is_empty(),
            "Schema for table '{}' must declare at least one field",
            document.table
        );
        let fields = FieldTypeMap::from_fields(
            document
                .fields
                .into_iter()
                .map(|field| (field.name, field.datatype)),
        )?;
        Ok(Self {
            table: document.table,
            fields,
        })
    }
}
