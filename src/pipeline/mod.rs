// Data processing pipeline: ingestion, processing, and storage

pub mod ingestion;
pub mod processing;
pub mod storage;

use std::collections::BTreeMap;
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info, info_span};

use crate::config::Config;
use crate::domain::{CellValue, Rating, RawCatalogRow, RawMovieRecord, RawRatingRow, Table};
use crate::error::Result;
use crate::observability::{emit_counter, emit_gauge, emit_histogram, emit_labeled_counter, MetricName};
use processing::filter::{assign_ids_and_dedupe, filter_film_candidates, retain_catalog_rows};
use processing::parse::parse_scraped_movie;
use processing::projection::project;
use processing::{ColumnPruner, DefaultNormalizer, Normalizer, RatingHistogram, RatingsAggregator, Reconciler};
use storage::TableSink;

/// Columns of the persisted raw ratings table.
pub const RATINGS_TABLE_COLUMNS: [&str; 4] = ["user_id", "movie_id", "rating", "timestamp"];

/// Counts gathered over one run, printed by the CLI.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PipelineResult {
    pub scraped_records: usize,
    pub film_candidates: usize,
    pub scraped_missing_identifier: usize,
    pub scraped_duplicates: usize,
    pub pruned_columns: Vec<String>,
    pub unparsed_values: BTreeMap<String, usize>,
    pub catalog_rows: usize,
    pub catalog_retained: usize,
    pub catalog_adult_or_flagged: usize,
    pub catalog_missing_identifier: usize,
    pub catalog_duplicates: usize,
    pub merged_rows: usize,
    pub unmatched_rows: usize,
    pub chronology_rejects: usize,
    pub conflicts_filled: BTreeMap<String, usize>,
    pub ratings_rows: u64,
    pub rated_movies: usize,
    pub rating_columns: usize,
    pub output_rows: usize,
    pub ratings_rows_loaded: u64,
    pub elapsed_seconds: f64,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Skip the chunked raw-ratings load; only the consolidated table is written.
    pub skip_raw_ratings: bool,
}

fn timed<T>(stage: &'static str, f: impl FnOnce() -> T) -> T {
    let span = info_span!("stage", stage);
    let _enter = span.enter();
    let start = Instant::now();
    let out = f();
    let elapsed = start.elapsed().as_secs_f64();
    emit_histogram(MetricName::StageDuration, stage, elapsed);
    debug!("{} finished in {:.3}s", stage, elapsed);
    out
}

fn ratings_table(chunk: &[RawRatingRow]) -> Table {
    let mut table = Table::new(RATINGS_TABLE_COLUMNS.iter().map(|c| c.to_string()).collect());
    table.rows = chunk
        .iter()
        .map(|row| {
            let rating = Rating::from(row);
            vec![
                CellValue::Integer(rating.user_id),
                CellValue::Integer(rating.movie_id),
                CellValue::Real(rating.rating.value()),
                rating
                    .rated_at
                    .map(|t| CellValue::Text(t.format("%Y-%m-%d %H:%M:%S").to_string()))
                    .unwrap_or(CellValue::Null),
            ]
        })
        .collect();
    table
}

/// Orchestrates one batch run, strictly stage after stage.
pub struct EtlPipeline {
    config: Config,
    normalizer: Box<dyn Normalizer>,
    pruner: ColumnPruner,
    reconciler: Reconciler,
}

impl EtlPipeline {
    pub fn new(config: Config) -> Self {
        let transform = &config.transform;
        let pruner = ColumnPruner::new(transform.sparse_column_threshold);
        let reconciler = Reconciler::new(transform.late_release_cutoff, transform.early_release_cutoff);
        Self {
            config,
            normalizer: Box::new(DefaultNormalizer::new()),
            pruner,
            reconciler,
        }
    }

    /// Streams the ratings source through the aggregator one chunk at a time.
    pub fn aggregate_ratings(&self) -> Result<RatingsAggregator> {
        let destination = &self.config.destination;
        let mut aggregator = RatingsAggregator::new();
        for chunk in ingestion::read_rating_chunks(&self.config.sources.ratings, destination.ratings_chunk_size)? {
            let ratings: Vec<Rating> = chunk?.iter().map(Rating::from).collect();
            aggregator.extend(&ratings);
        }
        Ok(aggregator)
    }

    /// Runs every transformation stage over already-read sources and returns the
    /// consolidated table.
    pub fn transform_sources(
        &self,
        scraped: Vec<RawMovieRecord>,
        catalog: Vec<RawCatalogRow>,
        histogram: &RatingHistogram,
        result: &mut PipelineResult,
    ) -> Result<Table> {
        result.scraped_records = scraped.len();
        emit_counter(MetricName::ScrapedRecords, scraped.len() as u64);

        let (candidates, rejected) = timed("filter", || filter_film_candidates(scraped));
        result.film_candidates = candidates.len();
        emit_counter(MetricName::ScrapedRecordsFiltered, rejected as u64);
        info!("{} of {} scraped records are film candidates", candidates.len(), result.scraped_records);

        let normalized: Vec<_> = timed("normalize", || {
            candidates.iter().map(|r| self.normalizer.normalize(r)).collect()
        });

        let deduped = timed("dedupe", || assign_ids_and_dedupe(normalized));
        result.scraped_missing_identifier = deduped.missing_identifier;
        result.scraped_duplicates = deduped.duplicates;
        emit_counter(MetricName::ScrapedMissingIdentifier, deduped.missing_identifier as u64);
        emit_counter(MetricName::DuplicatesRemoved, deduped.duplicates as u64);

        let pruned = timed("prune", || self.pruner.prune(deduped.records));
        emit_counter(MetricName::ColumnsPruned, pruned.dropped_columns.len() as u64);
        info!(
            "Kept {} scraped columns, dropped {}",
            pruned.kept_columns.len(),
            pruned.dropped_columns.len()
        );
        result.pruned_columns = pruned.dropped_columns;

        let movies: Vec<_> = timed("parse", || {
            let mut movies = Vec::with_capacity(pruned.records.len());
            for record in pruned.records {
                let Some((movie, unparsed)) = parse_scraped_movie(record) else {
                    continue;
                };
                for key in unparsed {
                    *result.unparsed_values.entry(key.to_string()).or_default() += 1;
                    emit_labeled_counter(MetricName::UnparsedValues, "field", key, 1);
                }
                movies.push(movie);
            }
            movies
        });

        result.catalog_rows = catalog.len();
        emit_counter(MetricName::CatalogRows, catalog.len() as u64);
        let catalog = timed("catalog", || retain_catalog_rows(catalog))?;
        result.catalog_retained = catalog.records.len();
        result.catalog_adult_or_flagged = catalog.adult_or_flagged;
        result.catalog_missing_identifier = catalog.missing_identifier;
        result.catalog_duplicates = catalog.duplicates;
        emit_counter(
            MetricName::CatalogRowsRejected,
            (catalog.adult_or_flagged + catalog.missing_identifier + catalog.duplicates) as u64,
        );
        emit_counter(MetricName::DuplicatesRemoved, catalog.duplicates as u64);

        let reconciled = timed("reconcile", || self.reconciler.reconcile(movies, catalog.records));
        result.merged_rows = reconciled.records.len();
        result.unmatched_rows = reconciled.unmatched;
        result.chronology_rejects = reconciled.chronology_rejects;
        emit_counter(MetricName::MergedRows, reconciled.records.len() as u64);
        emit_counter(MetricName::UnmatchedRows, reconciled.unmatched as u64);
        emit_counter(MetricName::ChronologyRejects, reconciled.chronology_rejects as u64);
        for (field, count) in &reconciled.filled {
            result.conflicts_filled.insert(field.as_str().to_string(), *count);
            emit_labeled_counter(MetricName::ConflictsFilled, "field", field.as_str(), *count as u64);
        }
        info!(
            "Merged {} movies ({} unmatched, {} implausible)",
            result.merged_rows, result.unmatched_rows, result.chronology_rejects
        );

        result.rated_movies = histogram.movie_count();
        result.rating_columns = histogram.rating_values().len();
        emit_gauge(MetricName::RatedMovies, histogram.movie_count() as f64);

        let table = timed("project", || project(&reconciled.records, histogram));
        result.output_rows = table.len();
        emit_gauge(MetricName::OutputRows, table.len() as f64);
        Ok(table)
    }

    /// Reads and transforms all three sources. Every source must exist before anything runs.
    pub fn transform(&self) -> Result<(Table, PipelineResult)> {
        let sources = &self.config.sources;
        ingestion::ensure_sources_exist(sources)?;

        let scraped = timed("read_scraped", || ingestion::read_scraped_movies(&sources.scraped))?;
        let catalog = timed("read_catalog", || ingestion::read_catalog(&sources.catalog))?;
        let aggregator = timed("ratings", || self.aggregate_ratings())?;

        let mut result = PipelineResult {
            ratings_rows: aggregator.rows(),
            ..Default::default()
        };
        emit_counter(MetricName::RatingsRows, aggregator.rows());
        let histogram = aggregator.finish();

        let table = self.transform_sources(scraped, catalog, &histogram, &mut result)?;
        Ok((table, result))
    }

    /// Full run: transform, replace the consolidated table, then load the raw ratings.
    pub fn run(&self, sink: &mut dyn TableSink, options: RunOptions) -> Result<PipelineResult> {
        let start = Instant::now();
        let (table, mut result) = self.transform()?;

        let movies_table = &self.config.destination.movies_table;
        timed("write_movies", || sink.replace_table(movies_table, &table))?;
        info!("Wrote {} rows to {}", table.len(), movies_table);

        if options.skip_raw_ratings {
            info!("Skipping raw ratings load");
        } else {
            result.ratings_rows_loaded = self.load_raw_ratings(sink)?;
        }

        result.elapsed_seconds = start.elapsed().as_secs_f64();
        info!("Pipeline finished in {:.2}s", result.elapsed_seconds);
        Ok(result)
    }

    /// Loads the ratings source into the raw ratings table in fixed-size chunks.
    ///
    /// The first chunk replaces the table, later chunks append; each chunk is its own
    /// transaction, so a failure leaves the chunks already written in place.
    pub fn load_raw_ratings(&self, sink: &mut dyn TableSink) -> Result<u64> {
        let span = info_span!("stage", stage = "load_ratings");
        let _enter = span.enter();

        let destination = &self.config.destination;
        let table_name = destination.ratings_table.as_str();
        let start = Instant::now();
        let mut loaded: u64 = 0;
        let mut first = true;

        for chunk in ingestion::read_rating_chunks(&self.config.sources.ratings, destination.ratings_chunk_size)? {
            let chunk = chunk?;
            let chunk_start = Instant::now();
            let table = ratings_table(&chunk);
            if first {
                sink.replace_table(table_name, &table)?;
                first = false;
            } else {
                sink.append_rows(table_name, &table)?;
            }
            loaded += chunk.len() as u64;
            emit_counter(MetricName::RatingsRowsLoaded, chunk.len() as u64);
            info!(
                "Loaded ratings rows {} to {}: chunk took {:.2}s, {:.2}s total",
                loaded - chunk.len() as u64,
                loaded,
                chunk_start.elapsed().as_secs_f64(),
                start.elapsed().as_secs_f64()
            );
        }

        if first {
            sink.replace_table(table_name, &ratings_table(&[]))?;
            info!("Ratings source is empty; created empty {}", table_name);
        }
        emit_histogram(MetricName::StageDuration, "load_ratings", start.elapsed().as_secs_f64());
        Ok(loaded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RatingValue;
    use serde_json::json;

    fn scraped() -> Vec<RawMovieRecord> {
        vec![
            json!({
                "title": "Heat",
                "url": "https://en.wikipedia.org/wiki/Heat_(1995_film)",
                "Directed by": "Michael Mann",
                "imdb_link": "https://www.imdb.com/title/tt0113277/",
                "Budget": "$60 million[2]",
                "Box office": "$187.4 million",
                "Running time": "170 minutes",
                "Release date": ["December 15, 1995"]
            }),
            json!({
                "title": "Heat (duplicate)",
                "Directed by": "Michael Mann",
                "imdb_link": "https://www.imdb.com/title/tt0113277/"
            }),
            json!({
                "title": "No director",
                "imdb_link": "https://www.imdb.com/title/tt0000009/"
            }),
        ]
        .into_iter()
        .map(|v| v.as_object().cloned().unwrap())
        .collect()
    }

    fn catalog() -> Vec<RawCatalogRow> {
        vec![RawCatalogRow {
            adult: "False".into(),
            budget: "0".into(),
            id: "949".into(),
            imdb_id: "tt0113277".into(),
            popularity: "17.9".into(),
            release_date: "1995-12-15".into(),
            revenue: "187436818.0".into(),
            runtime: "170.0".into(),
            title: "Heat".into(),
            video: "False".into(),
            ..Default::default()
        }]
    }

    #[test]
    fn test_transform_sources() {
        let histogram = RatingHistogram::from_ratings(&[Rating {
            user_id: 1,
            movie_id: 949,
            rating: RatingValue(4.5),
            rated_at: None,
        }]);
        let pipeline = EtlPipeline::new(Config::default());
        let mut result = PipelineResult::default();

        let table = pipeline
            .transform_sources(scraped(), catalog(), &histogram, &mut result)
            .unwrap();

        assert_eq!(result.scraped_records, 3);
        assert_eq!(result.film_candidates, 2);
        assert_eq!(result.scraped_duplicates, 1);
        assert_eq!(result.merged_rows, 1);
        assert_eq!(result.conflicts_filled.get("budget"), Some(&1));

        assert_eq!(table.len(), 1);
        assert_eq!(table.cell(0, "imdb_id"), Some(&CellValue::Text("tt0113277".into())));
        assert_eq!(table.cell(0, "kaggle_id"), Some(&CellValue::Integer(949)));
        assert_eq!(table.cell(0, "budget"), Some(&CellValue::Real(60_000_000.0)));
        assert_eq!(table.cell(0, "revenue"), Some(&CellValue::Real(187_436_818.0)));
        assert_eq!(
            table.cell(0, "director"),
            Some(&CellValue::Text("Michael Mann".into()))
        );
        assert_eq!(table.cell(0, "rating_4.5"), Some(&CellValue::Integer(1)));
    }

    #[test]
    fn test_release_cutoffs_come_from_config() {
        let mut catalog = catalog();
        catalog[0].release_date = "1960-05-01".into();
        let histogram = RatingHistogram::from_ratings(&Vec::<Rating>::new());

        let mut result = PipelineResult::default();
        let table = EtlPipeline::new(Config::default())
            .transform_sources(scraped(), catalog.clone(), &histogram, &mut result)
            .unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(result.chronology_rejects, 0);

        let mut config = Config::default();
        config.transform.late_release_cutoff = chrono::NaiveDate::from_ymd_opt(1990, 1, 1).unwrap();
        let mut result = PipelineResult::default();
        let table = EtlPipeline::new(config)
            .transform_sources(scraped(), catalog, &histogram, &mut result)
            .unwrap();
        assert!(table.is_empty());
        assert_eq!(result.chronology_rejects, 1);
    }

    #[test]
    fn test_ratings_table_converts_timestamps() {
        let table = ratings_table(&[RawRatingRow {
            user_id: 1,
            movie_id: 31,
            rating: 2.5,
            timestamp: 1_260_759_144,
        }]);
        assert_eq!(table.columns, RATINGS_TABLE_COLUMNS);
        assert_eq!(
            table.cell(0, "timestamp"),
            Some(&CellValue::Text("2009-12-14 02:52:24".into()))
        );
    }
}
