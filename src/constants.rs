//! Fixed vocabularies and thresholds used by the transformation stages.

use chrono::NaiveDate;

/// Scraped attribute names that hold an alternate title in some language or script.
pub const ALT_TITLE_KEYS: [&str; 20] = [
    "Also known as",
    "Arabic",
    "Cantonese",
    "Chinese",
    "French",
    "Hangul",
    "Hebrew",
    "Hepburn",
    "Japanese",
    "Literally",
    "Mandarin",
    "McCune-Reischauer",
    "Original title",
    "Polish",
    "Revised Romanization",
    "Romanized",
    "Russian",
    "Simplified",
    "Traditional",
    "Yiddish",
];

/// Attribute that receives the folded alternate titles.
pub const ALT_TITLES_KEY: &str = "alt_titles";

/// Legacy → canonical attribute renames, applied in this order.
///
/// `Released` → `Release Date` → `Release date` is a chain; the two rules must stay in this order.
/// Some legacy names carry a trailing space in the source data.
pub const RENAME_RULES: [(&str, &str); 19] = [
    ("Adaptation by", "Writer(s)"),
    ("Country of origin", "Country"),
    ("Directed by", "Director"),
    ("Distributed by", "Distributor"),
    ("Edited by", "Editor(s)"),
    ("Length", "Running time"),
    ("Original release", "Release date"),
    ("Music by", "Composer(s)"),
    ("Produced by", "Producer(s)"),
    ("Producer", "Producer(s)"),
    ("Productioncompanies ", "Production company(s)"),
    ("Productioncompany ", "Production company(s)"),
    ("Released", "Release Date"),
    ("Release Date", "Release date"),
    ("Screen story by", "Writer(s)"),
    ("Screenplay by", "Writer(s)"),
    ("Story by", "Writer(s)"),
    ("Theme music composer", "Composer(s)"),
    ("Written by", "Writer(s)"),
];

// Scraped attribute names read by the filter and parsers
pub const DIRECTOR_KEYS: [&str; 2] = ["Director", "Directed by"];
pub const IMDB_LINK_KEY: &str = "imdb_link";
pub const EPISODE_COUNT_KEY: &str = "No. of episodes";
pub const IMDB_ID_KEY: &str = "imdb_id";
pub const BOX_OFFICE_KEY: &str = "Box office";
pub const BUDGET_KEY: &str = "Budget";
pub const RELEASE_DATE_KEY: &str = "Release date";
pub const RUNNING_TIME_KEY: &str = "Running time";

/// Scraped attributes discarded once the catalog row is joined in. The scraped release
/// date is already consumed by the parsers and never reaches the attributes.
pub const MERGE_DROPPED_KEYS: [&str; 3] = ["title", "Language", "Production company(s)"];

/// A column is dropped when its missing count reaches this share of all rows.
pub const SPARSE_COLUMN_THRESHOLD: f64 = 0.9;

/// Marker the catalog's `adult` column must carry for a row to be retained.
pub const NON_ADULT_MARKER: &str = "False";

pub const DEFAULT_RATINGS_CHUNK_SIZE: usize = 1_000_000;
pub const DEFAULT_MOVIES_TABLE: &str = "movies";
pub const DEFAULT_RATINGS_TABLE: &str = "ratings";

/// Scraped release dates after this day...
pub fn late_release_cutoff() -> NaiveDate {
    NaiveDate::from_ymd_opt(1996, 1, 1).unwrap_or(NaiveDate::MIN)
}

/// ...paired with catalog release dates before this day mark a mis-join.
pub fn early_release_cutoff() -> NaiveDate {
    NaiveDate::from_ymd_opt(1965, 1, 1).unwrap_or(NaiveDate::MAX)
}

/// Prefix of the per-value histogram columns.
pub const RATING_COLUMN_PREFIX: &str = "rating_";
