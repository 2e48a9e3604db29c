//! Destinations for generated statements.
//!
//! The loader never talks to a database directly. It hands each
//! [`Statement`] to a [`StatementSink`]; [`ScriptSink`] renders them as a SQL
//! script and `Vec<Statement>` simply collects them.

use std::io::Write;

use anyhow::{Context, Result};

use crate::sql::{RowInsert, TableDefinition, create_database_statement, drop_table_statement};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    CreateDatabase(String),
    DropTable(String),
    CreateTable(TableDefinition),
    Insert(RowInsert),
}

impl Statement {
    pub fn to_sql(&self) -> String {
        match self {
            Statement::CreateDatabase(name) => create_database_statement(name),
            Statement::DropTable(table) => drop_table_statement(table),
            Statement::CreateTable(definition) => definition.to_sql(),
            Statement::Insert(insert) => insert.to_sql(),
        }
    }
}

pub trait StatementSink {
    fn execute(&mut self, statement: &Statement) -> Result<()>;

    /// Called once after the last statement of a load.
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

impl StatementSink for Vec<Statement> {
    fn execute(&mut self, statement: &Statement) -> Result<()> {
        self.push(statement.clone());
        Ok(())
    }
}

/// Writes one statement per line.
pub struct ScriptSink<W: Write> {
    writer: W,
    written: usize,
}

impl<W: Write> ScriptSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, written: 0 }
    }

    pub fn written(&self) -> usize {
        self.written
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> StatementSink for ScriptSink<W> {
    fn execute(&mut self, statement: &Statement) -> Result<()> {
        writeln!(self.writer, "{}", statement.to_sql())
            .with_context(|| format!("Writing statement {}", self.written + 1))?;
        self.written += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.writer.flush().context("Flushing SQL script")
    }
}
