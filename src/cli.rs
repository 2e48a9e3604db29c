use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(author, version, about = "Infer table schemas from delimited files and load them", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Infer one merged schema from one or more files feeding the same table
    Infer(InferArgs),
    /// Generate the SQL script that creates and fills every table in a directory
    Load(LoadArgs),
    /// Generate table creation and inserts for files using a saved schema
    Sql(SqlArgs),
}

#[derive(Debug, Args, Clone)]
pub struct InputOptions {
    /// Field delimiter (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter, default_value = ",")]
    pub delimiter: u8,
    /// Quote character wrapping fields that contain the delimiter
    #[arg(long, value_parser = parse_delimiter, default_value = "\"")]
    pub quote: u8,
    /// Character encoding of the input files (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
    /// Literal value meaning true (repeatable, matched exactly including whitespace)
    #[arg(long = "true-value", value_delimiter = ',', default_value = "True")]
    pub true_values: Vec<String>,
    /// Literal value meaning false (repeatable, matched exactly including whitespace)
    #[arg(long = "false-value", value_delimiter = ',', default_value = "False")]
    pub false_values: Vec<String>,
}

#[derive(Debug, Args)]
pub struct InferArgs {
    /// Input files; all must share the same header fields
    #[arg(short = 'i', long = "input", required = true, action = clap::ArgAction::Append)]
    pub inputs: Vec<PathBuf>,
    /// Table name (defaults to the name derived from the first input file)
    #[arg(short = 't', long = "table")]
    pub table: Option<String>,
    /// Destination schema YAML file (prints a summary when omitted)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    #[command(flatten)]
    pub input: InputOptions,
}

#[derive(Debug, Args)]
pub struct LoadArgs {
    /// Directory containing the .csv files to load
    #[arg(short = 'd', long = "dir")]
    pub dir: PathBuf,
    /// Destination SQL script (stdout if omitted)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    /// Database to create before loading
    #[arg(long)]
    pub database: Option<String>,
    #[command(flatten)]
    pub input: InputOptions,
}

#[derive(Debug, Args)]
pub struct SqlArgs {
    /// Schema YAML produced by `infer`
    #[arg(short = 's', long = "schema")]
    pub schema: PathBuf,
    /// Input files to turn into inserts
    #[arg(short = 'i', long = "input", required = true, action = clap::ArgAction::Append)]
    pub inputs: Vec<PathBuf>,
    /// Destination SQL script (stdout if omitted)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    #[command(flatten)]
    pub input: InputOptions,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}
