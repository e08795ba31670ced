//! Cross-source reconciliation: joins scraped movies with catalog rows on the external
//! identifier and resolves the fields both sources report.

use std::collections::HashMap;

use chrono::NaiveDate;
use tracing::debug;

use crate::constants::{early_release_cutoff, late_release_cutoff, MERGE_DROPPED_KEYS};
use crate::domain::{CatalogRecord, MergedMovieRecord, ScrapedMovie};

/// Fields reported by both sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OverlapField {
    Runtime,
    Budget,
    Revenue,
}

impl OverlapField {
    pub fn as_str(self) -> &'static str {
        match self {
            OverlapField::Runtime => "runtime",
            OverlapField::Budget => "budget",
            OverlapField::Revenue => "revenue",
        }
    }
}

/// Fill-priority policy: the catalog wins unless it reported exactly zero, which is the
/// catalog's way of saying "unknown"; then the scraped value is used.
pub fn fill_from_scraped(catalog: Option<f64>, scraped: Option<f64>) -> Option<f64> {
    match catalog {
        Some(value) if value == 0.0 => scraped,
        other => other,
    }
}

#[derive(Debug, Default)]
pub struct ReconcileOutcome {
    pub records: Vec<MergedMovieRecord>,
    /// Scraped movies with no catalog row sharing their identifier.
    pub unmatched: usize,
    /// Joined pairs excluded because their release dates are decades apart.
    pub chronology_rejects: usize,
    /// How often each overlapping field was filled from the scraped source.
    pub filled: HashMap<OverlapField, usize>,
}

pub struct Reconciler {
    late_cutoff: NaiveDate,
    early_cutoff: NaiveDate,
}

impl Default for Reconciler {
    fn default() -> Self {
        Self {
            late_cutoff: late_release_cutoff(),
            early_cutoff: early_release_cutoff(),
        }
    }
}

impl Reconciler {
    pub fn new(late_cutoff: NaiveDate, early_cutoff: NaiveDate) -> Self {
        Self {
            late_cutoff,
            early_cutoff,
        }
    }

    /// A scraped release after the late cutoff paired with a catalog release before the early
    /// cutoff is an identifier collision between unrelated films. Missing dates never reject.
    pub fn is_implausible(&self, scraped: &ScrapedMovie, catalog: &CatalogRecord) -> bool {
        match (scraped.release_date, catalog.release_date) {
            (Some(scraped_date), Some(catalog_date)) => {
                scraped_date > self.late_cutoff && catalog_date < self.early_cutoff
            }
            _ => false,
        }
    }

    /// Inner join on `imdb_id`, in scraped order. Both inputs are already unique per identifier.
    pub fn reconcile(&self, scraped: Vec<ScrapedMovie>, catalog: Vec<CatalogRecord>) -> ReconcileOutcome {
        let mut by_id: HashMap<String, CatalogRecord> = catalog
            .into_iter()
            .filter_map(|record| record.imdb_id.clone().map(|id| (id, record)))
            .collect();

        let mut outcome = ReconcileOutcome::default();
        for movie in scraped {
            let Some(catalog) = by_id.remove(&movie.imdb_id) else {
                outcome.unmatched += 1;
                continue;
            };
            if self.is_implausible(&movie, &catalog) {
                debug!(
                    "rejecting {}: scraped release {:?} vs catalog release {:?}",
                    movie.imdb_id, movie.release_date, catalog.release_date
                );
                outcome.chronology_rejects += 1;
                continue;
            }
            let merged = self.merge(movie, catalog, &mut outcome.filled);
            outcome.records.push(merged);
        }
        outcome
    }

    fn merge(
        &self,
        movie: ScrapedMovie,
        catalog: CatalogRecord,
        filled: &mut HashMap<OverlapField, usize>,
    ) -> MergedMovieRecord {
        let mut resolve = |field: OverlapField, catalog_value: Option<f64>, scraped_value: Option<f64>| {
            if catalog_value == Some(0.0) {
                *filled.entry(field).or_default() += 1;
            }
            fill_from_scraped(catalog_value, scraped_value)
        };
        let runtime = resolve(OverlapField::Runtime, catalog.runtime, movie.running_time);
        let budget = resolve(OverlapField::Budget, Some(catalog.budget as f64), movie.budget);
        let revenue = resolve(OverlapField::Revenue, catalog.revenue, movie.box_office);

        let mut attributes = movie.attributes;
        for key in MERGE_DROPPED_KEYS {
            attributes.remove(key);
        }

        MergedMovieRecord {
            imdb_id: movie.imdb_id,
            catalog,
            attributes,
            runtime,
            budget,
            revenue,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map};

    fn date(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    fn scraped(imdb_id: &str, release: Option<NaiveDate>) -> ScrapedMovie {
        let mut attributes = Map::new();
        attributes.insert("title".into(), json!("Scraped Title"));
        attributes.insert("Language".into(), json!("English"));
        attributes.insert("Production company(s)".into(), json!(["Forward Pass"]));
        attributes.insert("Director".into(), json!("Someone"));
        ScrapedMovie {
            imdb_id: imdb_id.to_string(),
            release_date: release,
            running_time: Some(104.0),
            budget: Some(5_000_000.0),
            box_office: Some(20_000_000.0),
            attributes,
        }
    }

    fn catalog(id: i64, imdb_id: &str, release: Option<NaiveDate>) -> CatalogRecord {
        CatalogRecord {
            id,
            imdb_id: Some(imdb_id.to_string()),
            title: Some("Catalog Title".into()),
            original_title: None,
            tagline: None,
            belongs_to_collection: None,
            homepage: None,
            poster_path: None,
            status: None,
            genres: None,
            original_language: Some("en".into()),
            overview: None,
            spoken_languages: None,
            production_companies: None,
            production_countries: None,
            budget: 0,
            revenue: Some(0.0),
            runtime: Some(98.0),
            popularity: Some(1.5),
            vote_average: None,
            vote_count: None,
            release_date: release,
            video: false,
        }
    }

    #[test]
    fn test_fill_rule() {
        assert_eq!(fill_from_scraped(Some(0.0), Some(7.0)), Some(7.0));
        assert_eq!(fill_from_scraped(Some(0.0), None), None);
        assert_eq!(fill_from_scraped(Some(3.0), Some(7.0)), Some(3.0));
        assert_eq!(fill_from_scraped(Some(3.0), None), Some(3.0));
        assert_eq!(fill_from_scraped(None, Some(7.0)), None);
    }

    #[test]
    fn test_inner_join_and_conflict_resolution() {
        let outcome = Reconciler::default().reconcile(
            vec![
                scraped("tt0000001", date(1994, 5, 1)),
                scraped("tt0000002", date(1994, 5, 1)),
            ],
            vec![
                catalog(10, "tt0000001", date(1994, 5, 2)),
                catalog(30, "tt0000003", date(1994, 5, 2)),
            ],
        );

        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.unmatched, 1);

        let merged = &outcome.records[0];
        assert_eq!(merged.catalog.id, 10);
        // catalog non-zero runtime wins
        assert_eq!(merged.runtime, Some(98.0));
        // catalog zeros are filled from the scraped source
        assert_eq!(merged.budget, Some(5_000_000.0));
        assert_eq!(merged.revenue, Some(20_000_000.0));
        assert_eq!(outcome.filled.get(&OverlapField::Budget), Some(&1));
        assert_eq!(outcome.filled.get(&OverlapField::Revenue), Some(&1));
        assert_eq!(outcome.filled.get(&OverlapField::Runtime), None);
    }

    #[test]
    fn test_scraped_columns_dropped_after_merge() {
        let outcome = Reconciler::default().reconcile(
            vec![scraped("tt0000001", None)],
            vec![catalog(1, "tt0000001", None)],
        );
        let merged = &outcome.records[0];
        assert!(!merged.attributes.contains_key("title"));
        assert!(!merged.attributes.contains_key("Language"));
        assert!(!merged.attributes.contains_key("Production company(s)"));
        assert!(merged.attributes.contains_key("Director"));
        assert_eq!(merged.attributes.len(), 1);
    }

    #[test]
    fn test_implausible_chronology_rejected() {
        let outcome = Reconciler::default().reconcile(
            vec![
                scraped("tt0000001", date(2006, 3, 1)),
                scraped("tt0000002", date(2006, 3, 1)),
                scraped("tt0000003", None),
            ],
            vec![
                catalog(1, "tt0000001", date(1951, 1, 1)),
                catalog(2, "tt0000002", date(2006, 2, 28)),
                catalog(3, "tt0000003", date(1951, 1, 1)),
            ],
        );
        assert_eq!(outcome.chronology_rejects, 1);
        let ids: Vec<_> = outcome.records.iter().map(|r| r.imdb_id.as_str()).collect();
        assert_eq!(ids, vec!["tt0000002", "tt0000003"]);
    }
}
