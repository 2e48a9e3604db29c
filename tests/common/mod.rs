#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use csv_loader::data::BooleanTokens;
use csv_loader::io_utils::ReaderOptions;
use tempfile::{TempDir, tempdir};

/// Directory holding the pipe-quoted pedal fixtures.
pub fn pedals_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join("pedals")
}

pub fn pedal_files() -> Vec<PathBuf> {
    vec![
        pedals_dir().join("pedals_1.csv"),
        pedals_dir().join("pedals_2.csv"),
    ]
}

/// Comma delimited, `|` quoted, utf-8.
pub fn pipe_quoted() -> ReaderOptions {
    ReaderOptions {
        quote: b'|',
        ..ReaderOptions::default()
    }
}

pub fn default_tokens() -> BooleanTokens {
    BooleanTokens::new(["True"], ["False"]).expect("valid tokens")
}

/// Scratch directory of input files, removed on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `lines` joined by newlines into `name` and returns its path.
    pub fn write_lines(&self, name: &str, lines: &[&str]) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut contents = lines.join("\n");
        contents.push('\n');
        fs::write(&path, contents).expect("write temp file");
        path
    }
}
