pub mod cli;
pub mod data;
pub mod error;
pub mod inference;
pub mod io_utils;
pub mod loader;
pub mod record;
pub mod schema;
pub mod sink;
pub mod sql;

use std::{
    env,
    fs::File,
    io::{self, BufWriter, Write},
    path::Path,
    sync::OnceLock,
};

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use log::{LevelFilter, info};

use crate::{
    cli::{Cli, Commands, InferArgs, InputOptions, LoadArgs, SqlArgs},
    data::BooleanTokens,
    io_utils::ReaderOptions,
    schema::Schema,
    sink::{ScriptSink, Statement, StatementSink},
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("csv_loader", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Infer(args) => handle_infer(&args),
        Commands::Load(args) => handle_load(&args),
        Commands::Sql(args) => handle_sql(&args),
    }
}

fn resolve_input(options: &InputOptions) -> Result<(ReaderOptions, BooleanTokens)> {
    let encoding = io_utils::resolve_encoding(options.input_encoding.as_deref())?;
    let tokens = BooleanTokens::new(
        options.true_values.iter().filter(|v| !v.is_empty()).cloned(),
        options.false_values.iter().filter(|v| !v.is_empty()).cloned(),
    )
    .context("Validating --true-value/--false-value")?;
    info!(
        "Delimiter '{}', quote '{}', encoding {}",
        printable_delimiter(options.delimiter),
        printable_delimiter(options.quote),
        encoding.name()
    );
    info!(
        "Values defined as true: {:?}; as false: {:?}",
        tokens.true_tokens().collect::<Vec<_>>(),
        tokens.false_tokens().collect::<Vec<_>>()
    );
    let reader = ReaderOptions {
        delimiter: options.delimiter,
        quote: options.quote,
        encoding,
    };
    Ok((reader, tokens))
}

fn handle_infer(args: &InferArgs) -> Result<()> {
    let (options, tokens) = resolve_input(&args.input)?;
    let table = match &args.table {
        Some(name) => name.clone(),
        None => args
            .inputs
            .first()
            .map(|path| loader::table_name_from_filename(path))
            .ok_or_else(|| anyhow!("At least one input file must be provided"))?,
    };
    let schema = loader::build_schema_from_files(&table, &args.inputs, &options, &tokens)
        .with_context(|| format!("Inferring schema for table '{table}'"))?;

    match &args.output {
        Some(path) => {
            schema
                .save(path)
                .with_context(|| format!("Writing schema to {path:?}"))?;
            info!(
                "Inferred schema for {} field(s) written to {:?}",
                schema.fields().len(),
                path
            );
        }
        None => {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            writeln!(out, "table: {}", schema.table())?;
            for (name, datatype) in schema.fields().iter() {
                writeln!(out, "  {name}: {datatype}")?;
            }
        }
    }
    Ok(())
}

fn handle_load(args: &LoadArgs) -> Result<()> {
    let (options, tokens) = resolve_input(&args.input)?;
    info!("Processing files in {:?}", args.dir);
    let mut sink = ScriptSink::new(open_output(args.output.as_deref())?);
    let summaries = loader::load_directory(
        &args.dir,
        &options,
        &tokens,
        args.database.as_deref(),
        &mut sink,
    )?;
    let rows: usize = summaries.iter().map(|summary| summary.rows).sum();
    info!(
        "Loaded {} table(s), {} row(s); wrote {} statement(s)",
        summaries.len(),
        rows,
        sink.written()
    );
    Ok(())
}

fn handle_sql(args: &SqlArgs) -> Result<()> {
    let (options, tokens) = resolve_input(&args.input)?;
    let schema = Schema::load(&args.schema)
        .with_context(|| format!("Loading schema from {:?}", args.schema))?;
    let mut sink = ScriptSink::new(open_output(args.output.as_deref())?);
    sink.execute(&Statement::DropTable(schema.table().to_string()))?;
    let rows = loader::emit_table(&schema, &args.inputs, &options, &tokens, &mut sink)?;
    sink.finish()?;
    info!("Wrote {rows} insert(s) for table '{}'", schema.table());
    Ok(())
}

fn open_output(path: Option<&Path>) -> Result<Box<dyn Write>> {
    Ok(match path {
        Some(p) => Box::new(BufWriter::new(
            File::create(p).with_context(|| format!("Creating output file {p:?}"))?,
        )),
        None => Box::new(io::stdout()),
    })
}

pub(crate) fn printable_delimiter(delimiter: u8) -> String {
    match delimiter {
        b',' => ",".to_string(),
        b'\t' => "\\t".to_string(),
        b'\n' => "\\n".to_string(),
        other => (other as char).to_string(),
    }
}
