pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod observability;
pub mod pipeline;

// Domain data shapes shared across stages
pub mod domain;

pub use config::Config;
pub use error::{EtlError, Result};
pub use pipeline::{EtlPipeline, PipelineResult, RunOptions};
