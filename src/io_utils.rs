//! Delimited-file reading.
//!
//! All input flows through this module. It provides:
//!
//! - **Encoding**: input decoding via `encoding_rs`, defaulting to UTF-8.
//! - **Reader construction**: `open_csv_reader` configured with the field
//!   delimiter and the quote (encapsulator) character.
//! - **Record stream**: [`RecordReader`] yields one [`Record`] at a time so a
//!   file is never materialized in memory.

use std::{
    fs::File,
    io::{BufReader, Read},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, anyhow};
use encoding_rs::{Encoding, UTF_8};

use crate::record::{FieldName, Record};

pub const DEFAULT_DELIMITER: u8 = b',';
pub const DEFAULT_QUOTE: u8 = b'"';

#[derive(Debug, Clone, Copy)]
pub struct ReaderOptions {
    pub delimiter: u8,
    pub quote: u8,
    pub encoding: &'static Encoding,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            delimiter: DEFAULT_DELIMITER,
            quote: DEFAULT_QUOTE,
            encoding: UTF_8,
        }
    }
}

pub fn resolve_encoding(label: Option<&str>) -> Result<&'static Encoding> {
    if let Some(value) = label {
        Encoding::for_label(value.trim().as_bytes())
            .ok_or_else(|| anyhow!("Unknown encoding '{value}'"))
    } else {
        Ok(UTF_8)
    }
}

pub fn open_csv_reader<R>(reader: R, options: &ReaderOptions) -> csv::Reader<R>
where
    R: Read,
{
    let mut builder = csv::ReaderBuilder::new();
    builder
        .has_headers(true)
        .delimiter(options.delimiter)
        .quote(options.quote)
        .double_quote(true)
        .flexible(false);
    builder.from_reader(reader)
}

pub fn decode_bytes(bytes: &[u8], encoding: &'static Encoding) -> Result<String> {
    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        Err(anyhow!(
            "Failed to decode text with encoding {}",
            encoding.name()
        ))
    } else {
        Ok(text.into_owned())
    }
}

pub fn decode_record(record: &csv::ByteRecord, encoding: &'static Encoding) -> Result<Vec<String>> {
    record
        .iter()
        .map(|field| decode_bytes(field, encoding))
        .collect()
}

/// Lazy, single-pass stream of records from a delimited file with a header row.
pub struct RecordReader<R: Read> {
    path: PathBuf,
    reader: csv::Reader<R>,
    headers: Vec<FieldName>,
    encoding: &'static Encoding,
    record: csv::ByteRecord,
    line: usize,
}

impl RecordReader<BufReader<File>> {
    pub fn open(path: &Path, options: &ReaderOptions) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("Opening input file {path:?}"))?;
        Self::from_reader(path, BufReader::new(file), options)
    }
}

impl<R: Read> RecordReader<R> {
    /// `path` is only used to label errors.
    pub fn from_reader(path: &Path, reader: R, options: &ReaderOptions) -> Result<Self> {
        let mut reader = open_csv_reader(reader, options);
        let raw_headers = reader
            .byte_headers()
            .with_context(|| format!("Reading header row of {path:?}"))?
            .clone();
        let headers = decode_record(&raw_headers, options.encoding)
            .with_context(|| format!("Decoding header row of {path:?}"))?
            .into_iter()
            .enumerate()
            .map(|(idx, name)| {
                FieldName::new(name)
                    .with_context(|| format!("Header column {} of {path:?}", idx + 1))
            })
            .collect::<Result<Vec<_>>>()?;
        // Validates uniqueness once so every record built below is well formed.
        Record::new(headers.iter().map(|name| (name.clone(), String::new())).collect())
            .with_context(|| format!("Header row of {path:?}"))?;
        Ok(Self {
            path: path.to_path_buf(),
            reader,
            headers,
            encoding: options.encoding,
            record: csv::ByteRecord::new(),
            line: 1,
        })
    }

    fn read_next(&mut self) -> Result<Option<Record>> {
        let more = self
            .reader
            .read_byte_record(&mut self.record)
            .with_context(|| format!("Reading line {} of {:?}", self.line + 1, self.path))?;
        if !more {
            return Ok(None);
        }
        self.line += 1;
        let values = decode_record(&self.record, self.encoding)
            .with_context(|| format!("Decoding line {} of {:?}", self.line, self.path))?;
        let fields = self.headers.iter().cloned().zip(values).collect();
        let record = Record::new(fields)
            .with_context(|| format!("Line {} of {:?}", self.line, self.path))?;
        Ok(Some(record))
    }
}

impl<R: Read> Iterator for RecordReader<R> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_next().transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use encoding_rs::WINDOWS_1252;

    fn read_all(contents: &[u8], options: &ReaderOptions) -> Result<Vec<Record>> {
        RecordReader::from_reader(Path::new("inline.csv"), contents, options)?.collect()
    }

    #[test]
    fn reads_records_with_custom_quote() {
        let options = ReaderOptions {
            quote: b'|',
            ..ReaderOptions::default()
        };
        let data = b"|Pedal name|,|Manufacturer|\n|TS-808|,|Ibanez|\n|Timeline, v2|,|Strymon|\n";
        let records = read_all(data, &options).expect("read records");
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("Pedal name"), Some("TS-808"));
        assert_eq!(records[1].get("Pedal name"), Some("Timeline, v2"));
        assert_eq!(records[1].get("Manufacturer"), Some("Strymon"));
    }

    #[test]
    fn decodes_non_utf8_input() {
        let (encoded, _, _) = WINDOWS_1252.encode("id;name\n1;Caf\u{e9}\n");
        let options = ReaderOptions {
            delimiter: b';',
            encoding: WINDOWS_1252,
            ..ReaderOptions::default()
        };
        let records = read_all(&encoded, &options).expect("read records");
        assert_eq!(records[0].get("name"), Some("Caf\u{e9}"));
    }

    #[test]
    fn rejects_duplicate_headers() {
        let err = read_all(b"a,a\n1,2\n", &ReaderOptions::default()).unwrap_err();
        assert!(format!("{err:#}").contains("Duplicate field name 'a'"));
    }

    #[test]
    fn reports_line_of_ragged_row() {
        let err = read_all(b"a,b\n1,2\n3\n", &ReaderOptions::default()).unwrap_err();
        assert!(format!("{err:#}").contains("line 3"), "unexpected error: {err:#}");
    }

    #[test]
    fn resolve_encoding_defaults_to_utf8() {
        assert_eq!(resolve_encoding(None).unwrap(), UTF_8);
        assert_eq!(resolve_encoding(Some("windows-1252")).unwrap(), WINDOWS_1252);
        assert!(resolve_encoding(Some("klingon")).is_err());
    }
}
