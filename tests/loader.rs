mod common;

use csv_loader::data::{BooleanTokens, DataType};
use csv_loader::error::InferenceError;
use csv_loader::inference::FieldTypeMap;
use csv_loader::io_utils::ReaderOptions;
use csv_loader::loader::{
    build_field_types_from_file, build_schema_from_files, load_directory, tables_from_directory,
};
use csv_loader::sink::Statement;
use csv_loader::sql::SqlLiteral;

use common::{TestWorkspace, default_tokens, pedal_files, pedals_dir, pipe_quoted};

fn pedal_types() -> FieldTypeMap {
    FieldTypeMap::from_pairs([
        ("ID", DataType::Int),
        ("Pedal name", DataType::String),
        ("Manufacturer", DataType::String),
        ("Type of effect", DataType::String),
        ("Own", DataType::Boolean),
    ])
    .unwrap()
}

#[test]
fn infers_field_types_from_single_file() {
    let types = build_field_types_from_file(&pedal_files()[0], &pipe_quoted(), &default_tokens())
        .expect("infer pedals_1");
    assert_eq!(types, pedal_types());
}

#[test]
fn merges_field_types_across_files() {
    let schema =
        build_schema_from_files("pedals", &pedal_files(), &pipe_quoted(), &default_tokens())
            .expect("infer pedals");
    assert_eq!(schema.table(), "pedals");
    assert_eq!(schema.fields(), &pedal_types());
}

#[test]
fn widening_across_files_is_order_independent() {
    let workspace = TestWorkspace::new();
    let ints = workspace.write_lines("readings_1.csv", &["sensor,value", "a,1", "b,2"]);
    let floats = workspace.write_lines("readings_2.csv", &["sensor,value", "c,2.5"]);
    let options = ReaderOptions::default();
    let tokens = default_tokens();

    let forward =
        build_schema_from_files("readings", &[ints.clone(), floats.clone()], &options, &tokens)
            .unwrap();
    let backward = build_schema_from_files("readings", &[floats, ints], &options, &tokens).unwrap();
    assert_eq!(forward.fields().get("value"), Some(DataType::Float));
    assert_eq!(forward.fields(), backward.fields());
}

#[test]
fn mismatched_headers_abort_table_inference() {
    let workspace = TestWorkspace::new();
    let first = workspace.write_lines("orders_1.csv", &["id,amount", "1,10"]);
    let second = workspace.write_lines("orders_2.csv", &["id,total", "2,20"]);
    let err = build_schema_from_files(
        "orders",
        &[first, second],
        &ReaderOptions::default(),
        &default_tokens(),
    )
    .expect_err("header mismatch should fail");
    assert!(err.to_string().contains("orders_2.csv"), "unexpected error: {err:#}");
    let mismatch = err
        .chain()
        .find_map(|source| source.downcast_ref::<InferenceError>())
        .expect("inference error in chain");
    assert_eq!(
        mismatch,
        &InferenceError::SchemaMismatch {
            missing: vec!["amount".to_string()],
            unexpected: vec!["total".to_string()],
        }
    );
}

#[test]
fn empty_values_are_reported_with_their_line() {
    let workspace = TestWorkspace::new();
    let path = workspace.write_lines("gaps.csv", &["id,name", "1,Ann", "2,"]);
    let err = build_field_types_from_file(&path, &ReaderOptions::default(), &default_tokens())
        .expect_err("empty value should fail");
    let rendered = format!("{err:#}");
    assert!(rendered.contains("line 3"), "unexpected error: {rendered}");
    assert!(rendered.contains("empty value"), "unexpected error: {rendered}");
}

#[test]
fn header_only_file_is_rejected() {
    let workspace = TestWorkspace::new();
    let path = workspace.write_lines("empty.csv", &["id,name"]);
    let err = build_field_types_from_file(&path, &ReaderOptions::default(), &default_tokens())
        .expect_err("no rows should fail");
    assert!(err.to_string().contains("No data rows"));
}

#[test]
fn groups_directory_files_by_table() {
    let tables = tables_from_directory(&pedals_dir()).expect("list fixtures");
    let names: Vec<&str> = tables.keys().map(String::as_str).collect();
    assert_eq!(names, vec!["m002_prices", "pedals"]);
    assert_eq!(tables["pedals"], pedal_files());
}

#[test]
fn load_directory_emits_two_passes_per_table() {
    let mut statements: Vec<Statement> = Vec::new();
    let summaries = load_directory(
        &pedals_dir(),
        &pipe_quoted(),
        &default_tokens(),
        Some("comet"),
        &mut statements,
    )
    .expect("load fixtures");

    assert_eq!(summaries.len(), 2);
    assert_eq!(summaries[0].schema.table(), "m002_prices");
    assert_eq!(summaries[0].rows, 2);
    assert_eq!(summaries[1].files, 2);
    assert_eq!(summaries[1].rows, 5);

    assert_eq!(statements[0], Statement::CreateDatabase("comet".to_string()));
    assert_eq!(statements[1], Statement::DropTable("m002_prices".to_string()));
    let Statement::CreateTable(prices) = &statements[2] else {
        panic!("expected table definition, got {:?}", statements[2]);
    };
    assert_eq!(
        prices.to_sql(),
        "CREATE TABLE m002_prices (m002_prices____ID INT NOT NULL AUTO_INCREMENT, \
         id BIGINT, price DOUBLE, PRIMARY KEY (m002_prices____ID));"
    );

    let inserts: Vec<_> = statements
        .iter()
        .filter_map(|statement| match statement {
            Statement::Insert(insert) if insert.table == "pedals" => Some(insert),
            _ => None,
        })
        .collect();
    assert_eq!(inserts.len(), 5);
    assert_eq!(
        inserts[0].columns,
        vec!["ID", "Pedal_name", "Manufacturer", "Type_of_effect", "Own"]
    );
    assert_eq!(inserts[0].values[4], SqlLiteral::Boolean(true));
    assert_eq!(
        inserts[4].to_sql(),
        r#"INSERT INTO pedals (ID, Pedal_name, Manufacturer, Type_of_effect, Own) VALUES ("5", "El Capistan", "Strymon", "Delay, tape", true);"#
    );
}

#[test]
fn custom_boolean_tokens_drive_inference_and_inserts() {
    let workspace = TestWorkspace::new();
    workspace.write_lines("flags.csv", &["name;active", "a;Y", "b;N"]);
    let options = ReaderOptions {
        delimiter: b';',
        ..ReaderOptions::default()
    };
    let tokens = BooleanTokens::new(["Y"], ["N"]).unwrap();
    let mut statements: Vec<Statement> = Vec::new();
    let summaries = load_directory(workspace.path(), &options, &tokens, None, &mut statements)
        .expect("load flags");
    assert_eq!(summaries[0].schema.fields().get("active"), Some(DataType::Boolean));
    let Some(Statement::Insert(last)) = statements.last() else {
        panic!("expected an insert last");
    };
    assert_eq!(
        last.to_sql(),
        r#"INSERT INTO flags (name, active) VALUES ("b", false);"#
    );
}
