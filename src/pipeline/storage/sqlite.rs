use std::path::Path;

use rusqlite::types::{Null, ToSqlOutput};
use rusqlite::{params, params_from_iter, Connection, ToSql};
use tracing::{debug, info};

use super::TableSink;
use crate::domain::{CellValue, Table};
use crate::error::{EtlError, Result};

impl ToSql for CellValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            CellValue::Null => ToSqlOutput::from(Null),
            CellValue::Integer(v) => ToSqlOutput::from(*v),
            CellValue::Real(v) => ToSqlOutput::from(*v),
            CellValue::Bool(v) => ToSqlOutput::from(*v),
            CellValue::Text(s) => ToSqlOutput::from(s.as_str()),
            CellValue::Date(d) => ToSqlOutput::from(d.format("%Y-%m-%d").to_string()),
            CellValue::Json(v) => ToSqlOutput::from(v.to_string()),
        })
    }
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Declared column type, taken from the first non-null cell in that column.
fn column_type(table: &Table, idx: usize) -> &'static str {
    let first = table
        .rows
        .iter()
        .filter_map(|row| row.get(idx))
        .find(|cell| !cell.is_null());
    match first {
        Some(CellValue::Integer(_)) | Some(CellValue::Bool(_)) => "INTEGER",
        Some(CellValue::Real(_)) => "REAL",
        Some(CellValue::Date(_)) => "DATE",
        _ => "TEXT",
    }
}

fn insert_sql(name: &str, columns: &[String]) -> String {
    let names: Vec<String> = columns.iter().map(|c| quote_ident(c)).collect();
    let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("?{i}")).collect();
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quote_ident(name),
        names.join(", "),
        placeholders.join(", ")
    )
}

/// SQLite-backed destination store.
pub struct SqliteSink {
    conn: Connection,
}

impl SqliteSink {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        info!("Opened destination store at {}", path.display());
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
        })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn table_exists(&self, name: &str) -> Result<bool> {
        let mut stmt = self
            .conn
            .prepare("SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1")?;
        let mut rows = stmt.query(params![name])?;
        let exists = rows.next()?.is_some();
        Ok(exists)
    }

    pub fn row_count(&self, name: &str) -> Result<i64> {
        let sql = format!("SELECT COUNT(*) FROM {}", quote_ident(name));
        Ok(self.conn.query_row(&sql, [], |row| row.get(0))?)
    }

    fn insert_rows(tx: &rusqlite::Transaction<'_>, name: &str, table: &Table) -> Result<usize> {
        let mut stmt = tx.prepare(&insert_sql(name, &table.columns))?;
        for row in &table.rows {
            stmt.execute(params_from_iter(row.iter()))?;
        }
        Ok(table.len())
    }
}

impl TableSink for SqliteSink {
    fn replace_table(&mut self, name: &str, table: &Table) -> Result<()> {
        let definitions: Vec<String> = table
            .columns
            .iter()
            .enumerate()
            .map(|(idx, column)| format!("{} {}", quote_ident(column), column_type(table, idx)))
            .collect();

        let tx = self.conn.transaction()?;
        tx.execute_batch(&format!(
            "DROP TABLE IF EXISTS {0}; CREATE TABLE {0} ({1});",
            quote_ident(name),
            definitions.join(", ")
        ))?;
        let written = Self::insert_rows(&tx, name, table)?;
        tx.commit()?;

        debug!("Replaced table {} with {} rows", name, written);
        Ok(())
    }

    fn append_rows(&mut self, name: &str, table: &Table) -> Result<usize> {
        if !self.table_exists(name)? {
            return Err(EtlError::Storage(format!("table {name} does not exist")));
        }
        let tx = self.conn.transaction()?;
        let written = Self::insert_rows(&tx, name, table)?;
        tx.commit()?;

        debug!("Appended {} rows to {}", written, name);
        Ok(written)
    }
}
