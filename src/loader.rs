//! Two-pass loading of delimited files into tables.
//!
//! Files in a directory are grouped into tables by name. For each table the
//! first pass infers one schema from all of its files; the second pass
//! re-reads the same files and emits a row insert per record.

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
    sync::OnceLock,
};

use anyhow::{Context, Result, anyhow, ensure};
use log::{debug, info};
use regex::Regex;

use crate::{
    data::BooleanTokens,
    inference::{FieldTypeMap, infer_field_types, merge_all},
    io_utils::{ReaderOptions, RecordReader},
    schema::Schema,
    sink::{Statement, StatementSink},
    sql::{RowInsert, TableDefinition},
};

static NUMBERED_SUFFIX: OnceLock<Regex> = OnceLock::new();

fn numbered_suffix() -> &'static Regex {
    NUMBERED_SUFFIX.get_or_init(|| Regex::new(r"^(.*?)_\d+$").expect("valid suffix pattern"))
}

/// Table fed by `path`: the file stem without a trailing `_<digits>` part.
pub fn table_name_from_filename(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    match numbered_suffix().captures(&stem) {
        Some(captures) => captures[1].to_string(),
        None => stem,
    }
}

/// Groups every `.csv` file directly inside `dir` by table name.
pub fn tables_from_directory(dir: &Path) -> Result<BTreeMap<String, Vec<PathBuf>>> {
    let mut tables: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
    let entries = fs::read_dir(dir).with_context(|| format!("Listing directory {dir:?}"))?;
    for entry in entries {
        let path = entry
            .with_context(|| format!("Reading entry in {dir:?}"))?
            .path();
        let is_csv = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
        if !is_csv || !path.is_file() {
            continue;
        }
        tables
            .entry(table_name_from_filename(&path))
            .or_default()
            .push(path);
    }
    for files in tables.values_mut() {
        files.sort();
    }
    Ok(tables)
}

/// Infers the field types of one file in a single streaming pass.
pub fn build_field_types_from_file(
    path: &Path,
    options: &ReaderOptions,
    tokens: &BooleanTokens,
) -> Result<FieldTypeMap> {
    let mut rows = 0usize;
    let records = RecordReader::open(path, options)?.inspect(|_| rows += 1);
    let field_types = infer_field_types(records, tokens)
        .with_context(|| format!("Inferring types from {path:?} at line {}", rows + 1))?
        .ok_or_else(|| anyhow!("No data rows found in {path:?}"))?;
    info!("Read {rows} row(s) from {path:?}");
    debug!(
        "Field names read: {:?}",
        field_types
            .field_names()
            .map(|name| name.as_str())
            .collect::<Vec<_>>()
    );
    Ok(field_types)
}

/// Merges the per-file field types of every file feeding `table`.
pub fn build_schema_from_files(
    table: &str,
    files: &[PathBuf],
    options: &ReaderOptions,
    tokens: &BooleanTokens,
) -> Result<Schema> {
    ensure!(!files.is_empty(), "No input files provided for table '{table}'");
    info!("Building schema for '{table}' from {} file(s)", files.len());
    let mut current = &files[0];
    let per_file = files.iter().map(|file| {
        current = file;
        build_field_types_from_file(file, options, tokens)
    });
    let fields = merge_all(per_file)
        .with_context(|| format!("Merging field types of {current:?} into '{table}'"))?
        .ok_or_else(|| anyhow!("No field types inferred for '{table}'"))?;
    Ok(Schema::new(table, fields))
}

/// Emits the table definition followed by one insert per record of `files`.
pub fn emit_table<S>(
    schema: &Schema,
    files: &[PathBuf],
    options: &ReaderOptions,
    tokens: &BooleanTokens,
    sink: &mut S,
) -> Result<usize>
where
    S: StatementSink + ?Sized,
{
    let definition = TableDefinition::from_schema(schema);
    debug!("Creating table with: {}", definition.to_sql());
    sink.execute(&Statement::CreateTable(definition))
        .with_context(|| format!("Creating table '{}'", schema.table()))?;

    let mut inserted = 0usize;
    for file in files {
        info!("Inserting data from {file:?}");
        for (row_idx, record) in RecordReader::open(file, options)?.enumerate() {
            let record = record?;
            let insert = RowInsert::build(schema, &record, tokens)
                .with_context(|| format!("Line {} of {file:?}", row_idx + 2))?;
            sink.execute(&Statement::Insert(insert))
                .with_context(|| format!("Inserting line {} of {file:?}", row_idx + 2))?;
            inserted += 1;
        }
    }
    Ok(inserted)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSummary {
    pub schema: Schema,
    pub files: usize,
    pub rows: usize,
}

/// Drops, infers, creates, and fills one table.
pub fn load_table<S>(
    table: &str,
    files: &[PathBuf],
    options: &ReaderOptions,
    tokens: &BooleanTokens,
    sink: &mut S,
) -> Result<TableSummary>
where
    S: StatementSink + ?Sized,
{
    info!("Processing table '{table}'");
    sink.execute(&Statement::DropTable(table.to_string()))
        .with_context(|| format!("Dropping table '{table}'"))?;
    let schema = build_schema_from_files(table, files, options, tokens)?;
    let rows = emit_table(&schema, files, options, tokens, sink)?;
    info!("Inserted {rows} row(s) into '{table}'");
    Ok(TableSummary {
        schema,
        files: files.len(),
        rows,
    })
}

/// Loads every table found in `dir`. When `database` is given it is created
/// first if missing.
pub fn load_directory<S>(
    dir: &Path,
    options: &ReaderOptions,
    tokens: &BooleanTokens,
    database: Option<&str>,
    sink: &mut S,
) -> Result<Vec<TableSummary>>
where
    S: StatementSink + ?Sized,
{
    let tables = tables_from_directory(dir)?;
    ensure!(!tables.is_empty(), "No .csv files found in {dir:?}");
    info!(
        "Table names: {:?}",
        tables.keys().map(String::as_str).collect::<Vec<_>>()
    );

    if let Some(name) = database {
        sink.execute(&Statement::CreateDatabase(name.to_string()))
            .with_context(|| format!("Creating database '{name}'"))?;
    }

    let mut summaries = Vec::with_capacity(tables.len());
    for (table, files) in &tables {
        summaries.push(load_table(table, files, options, tokens, sink)?);
    }
    sink.finish()?;
    Ok(summaries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_name_strips_numbered_suffix() {
        assert_eq!(table_name_from_filename(Path::new("m001_test.csv")), "m001_test");
        assert_eq!(table_name_from_filename(Path::new("m001_test_1.csv")), "m001_test");
        assert_eq!(
            table_name_from_filename(Path::new("C:/test/m001_test_1.csv")),
            "m001_test"
        );
        assert_eq!(
            table_name_from_filename(Path::new("/data/raw/m001_test.csv")),
            "m001_test"
        );
        assert_eq!(table_name_from_filename(Path::new("orders_v2.csv")), "orders_v2");
    }
}
