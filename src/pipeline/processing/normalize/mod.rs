use serde_json::{Map, Value};
use tracing::debug;

use crate::constants::{ALT_TITLES_KEY, ALT_TITLE_KEYS, RENAME_RULES};
use crate::domain::{CanonicalMovieRecord, RawMovieRecord};

/// Trait for collapsing scraped attribute names into the canonical vocabulary
pub trait Normalizer {
    fn normalize(&self, record: &RawMovieRecord) -> CanonicalMovieRecord;
}

/// Normalizer driven by the fixed alternate-title list and the ordered rename table
pub struct DefaultNormalizer {
    alt_title_keys: Vec<&'static str>,
    rename_rules: Vec<(&'static str, &'static str)>,
}

impl Default for DefaultNormalizer {
    fn default() -> Self {
        Self {
            alt_title_keys: ALT_TITLE_KEYS.to_vec(),
            rename_rules: RENAME_RULES.to_vec(),
        }
    }
}

impl DefaultNormalizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move every alternate-title attribute into one nested object keyed by its original name.
    fn fold_alt_titles(&self, record: &mut Map<String, Value>) {
        let mut alt_titles = Map::new();
        for key in &self.alt_title_keys {
            if let Some(value) = record.remove(*key) {
                alt_titles.insert((*key).to_string(), value);
            }
        }
        if !alt_titles.is_empty() {
            debug!("folded {} alternate titles", alt_titles.len());
            record.insert(ALT_TITLES_KEY.to_string(), Value::Object(alt_titles));
        }
    }

    fn apply_renames(&self, record: &mut Map<String, Value>) {
        for (old_name, new_name) in &self.rename_rules {
            if let Some(value) = record.remove(*old_name) {
                record.insert((*new_name).to_string(), value);
            }
        }
    }
}

impl Normalizer for DefaultNormalizer {
    fn normalize(&self, record: &RawMovieRecord) -> CanonicalMovieRecord {
        let mut movie = record.clone();
        self.fold_alt_titles(&mut movie);
        self.apply_renames(&mut movie);
        CanonicalMovieRecord::from(movie)
    }
}
