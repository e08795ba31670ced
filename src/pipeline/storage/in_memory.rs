use std::collections::HashMap;

use tracing::debug;

use super::TableSink;
use crate::domain::Table;
use crate::error::{EtlError, Result};

/// In-memory sink for dry runs and tests
#[derive(Debug, Default)]
pub struct InMemorySink {
    tables: HashMap<String, Table>,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.get(name)
    }

    pub fn table_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tables.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl TableSink for InMemorySink {
    fn replace_table(&mut self, name: &str, table: &Table) -> Result<()> {
        debug!("Replacing in-memory table {} with {} rows", name, table.len());
        self.tables.insert(name.to_string(), table.clone());
        Ok(())
    }

    fn append_rows(&mut self, name: &str, table: &Table) -> Result<usize> {
        let existing = self
            .tables
            .get_mut(name)
            .ok_or_else(|| EtlError::Storage(format!("table {name} does not exist")))?;
        if existing.columns != table.columns {
            return Err(EtlError::Storage(format!(
                "column mismatch appending to {name}: expected {:?}, got {:?}",
                existing.columns, table.columns
            )));
        }
        existing.rows.extend(table.rows.iter().cloned());
        Ok(table.len())
    }
}
