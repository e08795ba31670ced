// Destination store: named tables, replaced or appended to as a unit

pub mod in_memory;
pub mod sqlite;

pub use in_memory::InMemorySink;
pub use sqlite::SqliteSink;

use crate::domain::Table;
use crate::error::Result;

/// A destination that accepts whole tables.
///
/// Every call is atomic: on error the named table is left exactly as it was.
pub trait TableSink {
    /// Drops any existing table called `name` and writes `table` in its place.
    fn replace_table(&mut self, name: &str, table: &Table) -> Result<()>;

    /// Appends the rows of `table` to an existing table with the same columns.
    /// Returns the number of rows written.
    fn append_rows(&mut self, name: &str, table: &Table) -> Result<usize>;
}
