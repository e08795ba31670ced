//! Data shapes shared by the pipeline stages.

use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::constants::RATING_COLUMN_PREFIX;

/// One scraped movie page: free-form attribute name → string, list of strings, or null.
pub type RawMovieRecord = Map<String, Value>;

/// A scraped record after field normalization.
///
/// Attribute names come from the canonical vocabulary; alternate titles live in one
/// nested `alt_titles` object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanonicalMovieRecord(Map<String, Value>);

impl CanonicalMovieRecord {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn insert(&mut self, key: String, value: Value) -> Option<Value> {
        self.0.insert(key, value)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for CanonicalMovieRecord {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// A catalog row exactly as it appears in the metadata CSV.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawCatalogRow {
    pub adult: String,
    pub belongs_to_collection: String,
    pub budget: String,
    pub genres: String,
    pub homepage: String,
    pub id: String,
    pub imdb_id: String,
    pub original_language: String,
    pub original_title: String,
    pub overview: String,
    pub popularity: String,
    pub poster_path: String,
    pub production_companies: String,
    pub production_countries: String,
    pub release_date: String,
    pub revenue: String,
    pub runtime: String,
    pub spoken_languages: String,
    pub status: String,
    pub tagline: String,
    pub title: String,
    pub video: String,
    pub vote_average: String,
    pub vote_count: String,
}

/// A retained, typed catalog row. The `adult` marker has already been checked and dropped.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogRecord {
    pub id: i64,
    pub imdb_id: Option<String>,
    pub title: Option<String>,
    pub original_title: Option<String>,
    pub tagline: Option<String>,
    pub belongs_to_collection: Option<String>,
    pub homepage: Option<String>,
    pub poster_path: Option<String>,
    pub status: Option<String>,
    pub genres: Option<String>,
    pub original_language: Option<String>,
    pub overview: Option<String>,
    pub spoken_languages: Option<String>,
    pub production_companies: Option<String>,
    pub production_countries: Option<String>,
    pub budget: i64,
    pub revenue: Option<f64>,
    pub runtime: Option<f64>,
    pub popularity: Option<f64>,
    pub vote_average: Option<f64>,
    pub vote_count: Option<f64>,
    pub release_date: Option<NaiveDate>,
    pub video: bool,
}

/// A scraped movie with its free-text money, date and runtime fields parsed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScrapedMovie {
    pub imdb_id: String,
    pub release_date: Option<NaiveDate>,
    pub running_time: Option<f64>,
    pub budget: Option<f64>,
    pub box_office: Option<f64>,
    /// Remaining canonical attributes (parsed source columns removed).
    pub attributes: Map<String, Value>,
}

/// One scraped movie joined 1:1 with its catalog row.
///
/// `runtime`, `budget` and `revenue` hold the reconciled values; `catalog` keeps the
/// catalog's own readings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergedMovieRecord {
    pub imdb_id: String,
    pub catalog: CatalogRecord,
    pub attributes: Map<String, Value>,
    pub runtime: Option<f64>,
    pub budget: Option<f64>,
    pub revenue: Option<f64>,
}

/// A discrete rating value (e.g. 0.5 … 5.0), totally ordered so it can key a histogram.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RatingValue(pub f64);

impl RatingValue {
    pub fn value(self) -> f64 {
        self.0
    }

    /// Self-describing column label, e.g. `rating_3.5`.
    pub fn column_label(self) -> String {
        format!("{}{:?}", RATING_COLUMN_PREFIX, self.0)
    }
}

impl PartialEq for RatingValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for RatingValue {}

impl PartialOrd for RatingValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RatingValue {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl fmt::Display for RatingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

/// A ratings CSV row as stored on disk.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RawRatingRow {
    #[serde(rename = "userId")]
    pub user_id: i64,
    #[serde(rename = "movieId")]
    pub movie_id: i64,
    pub rating: f64,
    pub timestamp: i64,
}

/// A single user rating with its timestamp converted to calendar time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rating {
    pub user_id: i64,
    pub movie_id: i64,
    pub rating: RatingValue,
    pub rated_at: Option<DateTime<Utc>>,
}

impl From<&RawRatingRow> for Rating {
    fn from(row: &RawRatingRow) -> Self {
        Self {
            user_id: row.user_id,
            movie_id: row.movie_id,
            rating: RatingValue(row.rating),
            rated_at: DateTime::<Utc>::from_timestamp(row.timestamp, 0),
        }
    }
}

/// A single cell of a table headed for the destination store.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    Null,
    Integer(i64),
    Real(f64),
    Bool(bool),
    Text(String),
    Date(NaiveDate),
    /// Lists and nested objects from the scraped source, stored as JSON text.
    Json(Value),
}

impl CellValue {
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// Converts a scraped attribute value into a cell.
    pub fn from_json(value: Option<&Value>) -> Self {
        match value {
            None | Some(Value::Null) => CellValue::Null,
            Some(Value::String(s)) => CellValue::Text(s.clone()),
            Some(Value::Bool(b)) => CellValue::Bool(*b),
            Some(Value::Number(n)) => match n.as_i64() {
                Some(i) => CellValue::Integer(i),
                None => n.as_f64().map(CellValue::Real).unwrap_or(CellValue::Null),
            },
            Some(other) => CellValue::Json(other.clone()),
        }
    }
}

impl From<Option<String>> for CellValue {
    fn from(value: Option<String>) -> Self {
        value.map(CellValue::Text).unwrap_or(CellValue::Null)
    }
}

impl From<Option<f64>> for CellValue {
    fn from(value: Option<f64>) -> Self {
        match value {
            Some(v) if !v.is_nan() => CellValue::Real(v),
            _ => CellValue::Null,
        }
    }
}

impl From<Option<NaiveDate>> for CellValue {
    fn from(value: Option<NaiveDate>) -> Self {
        value.map(CellValue::Date).unwrap_or(CellValue::Null)
    }
}

/// A named-column table: the unit handed to the destination store.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Cell at `row` for column `name`, if both exist.
    pub fn cell(&self, row: usize, name: &str) -> Option<&CellValue> {
        let idx = self.column_index(name)?;
        self.rows.get(row).and_then(|r| r.get(idx))
    }
}
