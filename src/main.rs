use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing::{error, info};

use movies_etl::config::Config;
use movies_etl::logging;
use movies_etl::observability;
use movies_etl::pipeline::ingestion;
use movies_etl::pipeline::storage::{InMemorySink, SqliteSink};
use movies_etl::{EtlPipeline, PipelineResult, RunOptions};

#[derive(Parser)]
#[command(name = "movies_etl")]
#[command(about = "Consolidates scraped, catalog and ratings movie data into one store")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Options shared by every subcommand; each overrides the config file and environment.
#[derive(Args, Debug, Default)]
struct SourceArgs {
    /// Path to a TOML config file (defaults to ./config.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Scraped movies JSON
    #[arg(long)]
    scraped: Option<PathBuf>,
    /// Catalog metadata CSV
    #[arg(long)]
    catalog: Option<PathBuf>,
    /// Ratings CSV
    #[arg(long)]
    ratings: Option<PathBuf>,
    /// SQLite database to write
    #[arg(long)]
    database: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline and write both tables
    Run {
        #[command(flatten)]
        sources: SourceArgs,
        /// Transform everything but write to an in-memory store
        #[arg(long)]
        dry_run: bool,
        /// Only write the consolidated movie table
        #[arg(long)]
        skip_raw_ratings: bool,
    },
    /// Only load the raw ratings table, chunk by chunk
    LoadRatings {
        #[command(flatten)]
        sources: SourceArgs,
    },
    /// Check that all three sources exist
    CheckSources {
        #[command(flatten)]
        sources: SourceArgs,
    },
}

fn resolve_config(args: SourceArgs) -> anyhow::Result<Config> {
    let mut config = Config::load_or_default(args.config.as_deref()).context("loading configuration")?;
    config.apply_env().context("applying environment overrides")?;

    if let Some(path) = args.scraped {
        config.sources.scraped = path;
    }
    if let Some(path) = args.catalog {
        config.sources.catalog = path;
    }
    if let Some(path) = args.ratings {
        config.sources.ratings = path;
    }
    if let Some(path) = args.database {
        config.destination.database = path;
    }
    config.validate().context("validating configuration")?;
    Ok(config)
}

fn print_summary(result: &PipelineResult) {
    println!("\n📊 Pipeline Results:");
    println!("   Scraped records: {}", result.scraped_records);
    println!("   Film candidates: {}", result.film_candidates);
    println!("   Duplicates removed: {}", result.scraped_duplicates + result.catalog_duplicates);
    println!("   Sparse columns dropped: {}", result.pruned_columns.len());
    println!("   Catalog rows retained: {} of {}", result.catalog_retained, result.catalog_rows);
    println!("   Merged movies: {}", result.merged_rows);
    println!("   Implausible joins removed: {}", result.chronology_rejects);
    println!("   Ratings aggregated: {}", result.ratings_rows);
    println!("   Output rows: {}", result.output_rows);
    println!("   Raw ratings loaded: {}", result.ratings_rows_loaded);
    println!("   Elapsed: {:.2}s", result.elapsed_seconds);
    if !result.unparsed_values.is_empty() {
        println!("\n⚠️  Unparsed values:");
        for (field, count) in &result.unparsed_values {
            println!("   - {}: {}", field, count);
        }
    }
}

fn open_sink(config: &Config) -> anyhow::Result<SqliteSink> {
    SqliteSink::open(&config.destination.database)
        .with_context(|| format!("opening {}", config.destination.database.display()))
}

fn finish(config: &Config) {
    if let Some(path) = &config.metrics.output {
        if let Err(e) = observability::write_snapshot(path) {
            error!("Failed to write metrics snapshot: {}", e);
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            sources,
            dry_run,
            skip_raw_ratings,
        } => {
            let config = resolve_config(sources)?;
            logging::init_logging(&config.logging.directory);
            observability::init()?;

            let pipeline = EtlPipeline::new(config.clone());
            let options = RunOptions { skip_raw_ratings };
            let result = if dry_run {
                info!("Dry run: writing to an in-memory store");
                let mut sink = InMemorySink::new();
                pipeline.run(&mut sink, options)
            } else {
                let mut sink = open_sink(&config)?;
                pipeline.run(&mut sink, options)
            };
            finish(&config);

            let result = result.context("pipeline run failed")?;
            print_summary(&result);
        }
        Commands::LoadRatings { sources } => {
            let config = resolve_config(sources)?;
            logging::init_logging(&config.logging.directory);
            observability::init()?;

            let mut sink = open_sink(&config)?;
            let loaded = EtlPipeline::new(config.clone())
                .load_raw_ratings(&mut sink)
                .context("loading raw ratings")?;
            finish(&config);
            println!("✅ Loaded {} ratings into {}", loaded, config.destination.ratings_table);
        }
        Commands::CheckSources { sources } => {
            let config = resolve_config(sources)?;
            logging::init_logging(&config.logging.directory);

            ingestion::ensure_sources_exist(&config.sources)?;
            println!("✅ All sources present");
            println!("   Scraped: {}", config.sources.scraped.display());
            println!("   Catalog: {}", config.sources.catalog.display());
            println!("   Ratings: {}", config.sources.ratings.display());
        }
    }

    Ok(())
}
