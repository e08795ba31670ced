//! Structural prerequisites and identity deduplication for both movie sources.

use std::collections::HashSet;

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::debug;

use crate::constants::{DIRECTOR_KEYS, EPISODE_COUNT_KEY, IMDB_ID_KEY, IMDB_LINK_KEY, NON_ADULT_MARKER};
use crate::domain::{CanonicalMovieRecord, CatalogRecord, RawCatalogRow, RawMovieRecord};
use crate::error::{EtlError, Result};

/// Two letters and exactly seven digits, e.g. `tt0111161`.
static IMDB_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(tt\d{7})\b").unwrap());

/// Extracts the external identifier from an identifier-bearing link.
pub fn extract_imdb_id(link: &Value) -> Option<String> {
    let link = link.as_str()?;
    IMDB_ID
        .captures(link)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Whether a scraped record looks like a film: a director under either legacy name, a
/// recognizable identifier link, and no episode count (which marks a TV series).
pub fn is_film_candidate(record: &RawMovieRecord) -> bool {
    let has_director = DIRECTOR_KEYS.iter().any(|key| record.contains_key(*key));
    let has_identifier = record
        .get(IMDB_LINK_KEY)
        .and_then(extract_imdb_id)
        .is_some();
    let is_series = record.contains_key(EPISODE_COUNT_KEY);
    has_director && has_identifier && !is_series
}

/// Keeps only film candidates, returning them with the count of rejected records.
pub fn filter_film_candidates(records: Vec<RawMovieRecord>) -> (Vec<RawMovieRecord>, usize) {
    let total = records.len();
    let kept: Vec<_> = records.into_iter().filter(is_film_candidate).collect();
    let rejected = total - kept.len();
    debug!("film filter kept {} of {} records", kept.len(), total);
    (kept, rejected)
}

#[derive(Debug, Default)]
pub struct DedupeOutcome {
    pub records: Vec<CanonicalMovieRecord>,
    pub missing_identifier: usize,
    pub duplicates: usize,
}

/// Stamps each record with its extracted `imdb_id` and keeps the first record per identifier.
pub fn assign_ids_and_dedupe(records: Vec<CanonicalMovieRecord>) -> DedupeOutcome {
    let mut seen = HashSet::new();
    let mut outcome = DedupeOutcome::default();

    for mut record in records {
        let Some(imdb_id) = record.get(IMDB_LINK_KEY).and_then(extract_imdb_id) else {
            outcome.missing_identifier += 1;
            continue;
        };
        if !seen.insert(imdb_id.clone()) {
            debug!("dropping duplicate scraped record for {}", imdb_id);
            outcome.duplicates += 1;
            continue;
        }
        record.insert(IMDB_ID_KEY.to_string(), Value::String(imdb_id));
        outcome.records.push(record);
    }
    outcome
}

#[derive(Debug, Default)]
pub struct CatalogOutcome {
    pub records: Vec<CatalogRecord>,
    pub adult_or_flagged: usize,
    pub missing_identifier: usize,
    pub duplicates: usize,
}

/// Retains non-adult catalog rows, coerces their typed fields and deduplicates on `imdb_id`.
///
/// Coercion failures on strictly numeric fields abort: they mean the source schema changed.
pub fn retain_catalog_rows(rows: Vec<RawCatalogRow>) -> Result<CatalogOutcome> {
    let mut seen = HashSet::new();
    let mut outcome = CatalogOutcome::default();

    for (idx, row) in rows.into_iter().enumerate() {
        if row.adult != NON_ADULT_MARKER {
            outcome.adult_or_flagged += 1;
            continue;
        }
        let record = coerce_catalog_row(row, idx + 1)?;
        let Some(imdb_id) = record.imdb_id.clone() else {
            outcome.missing_identifier += 1;
            continue;
        };
        if !seen.insert(imdb_id) {
            outcome.duplicates += 1;
            continue;
        }
        outcome.records.push(record);
    }
    Ok(outcome)
}

fn text(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

fn lenient_float(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok().filter(|v| !v.is_nan())
}

/// Converts a retained raw row into its typed form. `row` is the 1-based data row number.
pub fn coerce_catalog_row(raw: RawCatalogRow, row: usize) -> Result<CatalogRecord> {
    let budget = raw
        .budget
        .trim()
        .parse::<i64>()
        .map_err(|_| EtlError::coercion("budget", row, raw.budget.as_str()))?;
    let id = raw
        .id
        .trim()
        .parse::<i64>()
        .map_err(|_| EtlError::coercion("id", row, raw.id.as_str()))?;
    let popularity = match raw.popularity.trim() {
        "" => None,
        value => Some(
            value
                .parse::<f64>()
                .map_err(|_| EtlError::coercion("popularity", row, value))?,
        ),
    };
    let release_date = match raw.release_date.trim() {
        "" => None,
        value => Some(
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .map_err(|_| EtlError::coercion("release_date", row, value))?,
        ),
    };

    Ok(CatalogRecord {
        id,
        budget,
        popularity,
        release_date,
        revenue: lenient_float(&raw.revenue),
        runtime: lenient_float(&raw.runtime),
        vote_average: lenient_float(&raw.vote_average),
        vote_count: lenient_float(&raw.vote_count),
        video: raw.video == "True",
        imdb_id: text(raw.imdb_id),
        title: text(raw.title),
        original_title: text(raw.original_title),
        tagline: text(raw.tagline),
        belongs_to_collection: text(raw.belongs_to_collection),
        homepage: text(raw.homepage),
        poster_path: text(raw.poster_path),
        status: text(raw.status),
        genres: text(raw.genres),
        original_language: text(raw.original_language),
        overview: text(raw.overview),
        spoken_languages: text(raw.spoken_languages),
        production_companies: text(raw.production_companies),
        production_countries: text(raw.production_countries),
    })
}
