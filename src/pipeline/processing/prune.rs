use serde_json::Value;
use tracing::debug;

use crate::constants::SPARSE_COLUMN_THRESHOLD;
use crate::domain::CanonicalMovieRecord;

/// Drops scraped columns that are too sparse to be worth parsing or keeping.
#[derive(Debug, Clone)]
pub struct ColumnPruner {
    threshold: f64,
}

impl Default for ColumnPruner {
    fn default() -> Self {
        Self {
            threshold: SPARSE_COLUMN_THRESHOLD,
        }
    }
}

#[derive(Debug, Default)]
pub struct PruneOutcome {
    pub records: Vec<CanonicalMovieRecord>,
    /// Surviving columns in first-seen order.
    pub kept_columns: Vec<String>,
    pub dropped_columns: Vec<String>,
}

impl ColumnPruner {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    /// Every attribute name seen across `records`, in first-seen order.
    pub fn columns(records: &[CanonicalMovieRecord]) -> Vec<String> {
        let mut columns: Vec<String> = Vec::new();
        for record in records {
            for key in record.keys() {
                if !columns.contains(key) {
                    columns.push(key.clone());
                }
            }
        }
        columns
    }

    /// Keeps a column only while its missing count (absent or null) stays under
    /// `threshold * rows`.
    pub fn prune(&self, mut records: Vec<CanonicalMovieRecord>) -> PruneOutcome {
        let columns = Self::columns(&records);
        let limit = records.len() as f64 * self.threshold;

        let (kept_columns, dropped_columns): (Vec<String>, Vec<String>) =
            columns.into_iter().partition(|column| {
                let missing = records
                    .iter()
                    .filter(|r| matches!(r.get(column), None | Some(Value::Null)))
                    .count();
                (missing as f64) < limit
            });

        if !dropped_columns.is_empty() {
            debug!("dropping sparse columns: {:?}", dropped_columns);
            for record in &mut records {
                for column in &dropped_columns {
                    record.remove(column);
                }
            }
        }

        PruneOutcome {
            records,
            kept_columns,
            dropped_columns,
        }
    }
}
