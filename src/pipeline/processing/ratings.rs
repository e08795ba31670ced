use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::domain::{Rating, RatingValue};

/// Accumulates (movie, rating value) counts; feed it ratings in any order, in any number of
/// chunks, then call [`RatingsAggregator::finish`].
#[derive(Debug, Default)]
pub struct RatingsAggregator {
    counts: HashMap<i64, BTreeMap<RatingValue, u64>>,
    values: BTreeSet<RatingValue>,
    rows: u64,
}

impl RatingsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, rating: &Rating) {
        *self
            .counts
            .entry(rating.movie_id)
            .or_default()
            .entry(rating.rating)
            .or_default() += 1;
        self.values.insert(rating.rating);
        self.rows += 1;
    }

    pub fn extend<'a>(&mut self, ratings: impl IntoIterator<Item = &'a Rating>) {
        for rating in ratings {
            self.add(rating);
        }
    }

    pub fn rows(&self) -> u64 {
        self.rows
    }

    pub fn finish(self) -> RatingHistogram {
        RatingHistogram {
            values: self.values.into_iter().collect(),
            counts: self.counts,
        }
    }
}

/// Per-movie count of ratings at each rating value observed anywhere in the dataset.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RatingHistogram {
    values: Vec<RatingValue>,
    counts: HashMap<i64, BTreeMap<RatingValue, u64>>,
}

impl RatingHistogram {
    pub fn from_ratings<'a>(ratings: impl IntoIterator<Item = &'a Rating>) -> Self {
        let mut aggregator = RatingsAggregator::new();
        aggregator.extend(ratings);
        aggregator.finish()
    }

    /// Distinct rating values in ascending order; one output column each.
    pub fn rating_values(&self) -> &[RatingValue] {
        &self.values
    }

    pub fn column_labels(&self) -> Vec<String> {
        self.values.iter().map(|v| v.column_label()).collect()
    }

    pub fn movie_count(&self) -> usize {
        self.counts.len()
    }

    /// One count per rating column for `movie_id`, zero-filled (also for unrated movies).
    pub fn row_for(&self, movie_id: i64) -> Vec<u64> {
        let counts = self.counts.get(&movie_id);
        self.values
            .iter()
            .map(|value| counts.and_then(|m| m.get(value)).copied().unwrap_or(0))
            .collect()
    }
}
