// Observability: metrics

pub mod metrics;

pub use self::metrics::{emit_counter, emit_gauge, emit_histogram, emit_labeled_counter, init, render, write_snapshot, MetricName};
