//! Run metrics for the ETL pipeline
//!
//! Every metric name lives in [`MetricName`]; recording goes through the `metrics` facade and,
//! once [`init`] has installed the Prometheus recorder, can be rendered as text exposition.

use std::fmt;
use std::path::Path;
use std::sync::OnceLock;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing::{debug, info};

use crate::error::{EtlError, Result};

/// Enum representing all metric names used by the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricName {
    // Scraped source
    ScrapedRecords,
    ScrapedRecordsFiltered,
    ScrapedMissingIdentifier,
    DuplicatesRemoved,
    ColumnsPruned,
    UnparsedValues,

    // Catalog source
    CatalogRows,
    CatalogRowsRejected,

    // Reconciliation
    MergedRows,
    UnmatchedRows,
    ChronologyRejects,
    ConflictsFilled,

    // Ratings
    RatingsRows,
    RatedMovies,
    RatingsRowsLoaded,

    // Run
    StageDuration,
    OutputRows,
}

impl MetricName {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricName::ScrapedRecords => "etl_scraped_records_total",
            MetricName::ScrapedRecordsFiltered => "etl_scraped_records_filtered_total",
            MetricName::ScrapedMissingIdentifier => "etl_scraped_missing_identifier_total",
            MetricName::DuplicatesRemoved => "etl_duplicates_removed_total",
            MetricName::ColumnsPruned => "etl_columns_pruned_total",
            MetricName::UnparsedValues => "etl_unparsed_values_total",

            MetricName::CatalogRows => "etl_catalog_rows_total",
            MetricName::CatalogRowsRejected => "etl_catalog_rows_rejected_total",

            MetricName::MergedRows => "etl_merged_rows_total",
            MetricName::UnmatchedRows => "etl_unmatched_rows_total",
            MetricName::ChronologyRejects => "etl_chronology_rejects_total",
            MetricName::ConflictsFilled => "etl_conflicts_filled_total",

            MetricName::RatingsRows => "etl_ratings_rows_total",
            MetricName::RatedMovies => "etl_rated_movies",
            MetricName::RatingsRowsLoaded => "etl_ratings_rows_loaded_total",

            MetricName::StageDuration => "etl_stage_duration_seconds",
            MetricName::OutputRows => "etl_output_rows",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            MetricName::ScrapedRecords => "Scraped records read",
            MetricName::ScrapedRecordsFiltered => "Scraped records failing the film prerequisites",
            MetricName::ScrapedMissingIdentifier => "Scraped records without an extractable identifier",
            MetricName::DuplicatesRemoved => "Records removed as duplicate identifiers",
            MetricName::ColumnsPruned => "Sparse scraped columns dropped",
            MetricName::UnparsedValues => "Free-text values matching no accepted shape",
            MetricName::CatalogRows => "Catalog rows read",
            MetricName::CatalogRowsRejected => "Catalog rows excluded before the join",
            MetricName::MergedRows => "Rows surviving the cross-source join",
            MetricName::UnmatchedRows => "Scraped rows without a catalog match",
            MetricName::ChronologyRejects => "Joined rows excluded for implausible release dates",
            MetricName::ConflictsFilled => "Catalog zero values filled from the scraped source",
            MetricName::RatingsRows => "Rating rows aggregated",
            MetricName::RatedMovies => "Movies with at least one rating",
            MetricName::RatingsRowsLoaded => "Raw rating rows written to the destination",
            MetricName::StageDuration => "Stage duration",
            MetricName::OutputRows => "Rows in the consolidated table",
        }
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn emit_counter(name: MetricName, value: u64) {
    ::metrics::counter!(name.as_str()).increment(value);
}

pub fn emit_labeled_counter(name: MetricName, label: &'static str, label_value: &str, value: u64) {
    ::metrics::counter!(name.as_str(), label => label_value.to_string()).increment(value);
}

pub fn emit_gauge(name: MetricName, value: f64) {
    ::metrics::gauge!(name.as_str()).set(value);
}

pub fn emit_histogram(name: MetricName, stage: &'static str, value: f64) {
    ::metrics::histogram!(name.as_str(), "stage" => stage).record(value);
}

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Install the Prometheus recorder. Calling it again is a no-op.
pub fn init() -> Result<()> {
    if METRICS_HANDLE.get().is_some() {
        return Ok(());
    }
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| EtlError::Config(format!("Failed to install Prometheus recorder: {e}")))?;
    let _ = METRICS_HANDLE.set(handle);
    info!("Metrics recorder installed");
    Ok(())
}

/// Render the current metrics in Prometheus text format, if the recorder is installed.
pub fn render() -> Option<String> {
    METRICS_HANDLE.get().map(|handle| handle.render())
}

/// Write the rendered metrics to `path`.
pub fn write_snapshot(path: &Path) -> Result<()> {
    match render() {
        Some(body) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, body)?;
            info!("Wrote metrics snapshot to {}", path.display());
        }
        None => debug!("Metrics recorder not installed; no snapshot written"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metric_names_are_prefixed_and_unique() {
        let all = [
            MetricName::ScrapedRecords,
            MetricName::ScrapedRecordsFiltered,
            MetricName::ScrapedMissingIdentifier,
            MetricName::DuplicatesRemoved,
            MetricName::ColumnsPruned,
            MetricName::UnparsedValues,
            MetricName::CatalogRows,
            MetricName::CatalogRowsRejected,
            MetricName::MergedRows,
            MetricName::UnmatchedRows,
            MetricName::ChronologyRejects,
            MetricName::ConflictsFilled,
            MetricName::RatingsRows,
            MetricName::RatedMovies,
            MetricName::RatingsRowsLoaded,
            MetricName::StageDuration,
            MetricName::OutputRows,
        ];
        let mut names: Vec<_> = all.iter().map(|m| m.as_str()).collect();
        assert!(names.iter().all(|n| n.starts_with("etl_")));
        names.sort();
        names.dedup();
        assert_eq!(names.len(), all.len());
    }

    #[test]
    fn emitting_without_recorder_is_harmless() {
        emit_counter(MetricName::ScrapedRecords, 3);
        emit_gauge(MetricName::OutputRows, 1.0);
        emit_histogram(MetricName::StageDuration, "normalize", 0.01);
    }
}
