// Pipeline processing: normalization, parsing, filtering, reconciliation and projection

pub mod conflation;
pub mod filter;
pub mod normalize;
pub mod parse;
pub mod projection;
pub mod prune;
pub mod ratings;

pub use conflation::{ReconcileOutcome, Reconciler};
pub use normalize::{DefaultNormalizer, Normalizer};
pub use prune::ColumnPruner;
pub use ratings::{RatingHistogram, RatingsAggregator};
