//! altdir-ingest - catalog reconciliation CLI
//!
//! Loads curated batch files into the altdir catalog database. Every run is
//! idempotent: records that already exist are skipped, never overwritten.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sqlx::SqlitePool;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use altdir_common::config::load_config;
use altdir_common::db::{init_database, max_lock_wait_ms};
use altdir_ingest::config::{CliOverrides, IngestSettings};
use altdir_ingest::db::runs::list_recent_runs;
use altdir_ingest::pipeline::{seed_categories, RandomScoreSynthesizer};
use altdir_ingest::{Batch, BatchExecutor, ExecutorOptions, ItemOutcome};

/// Command-line arguments for altdir-ingest
#[derive(Parser, Debug)]
#[command(name = "altdir-ingest")]
#[command(about = "Merge curated batches into the altdir catalog")]
#[command(version)]
struct Args {
    /// Config file (defaults to <config_dir>/altdir/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Root folder holding the catalog database
    #[arg(long, global = true)]
    root_folder: Option<PathBuf>,

    /// Catalog database file
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one or more batch files, in order
    Run {
        /// Batch files (JSON)
        #[arg(required = true)]
        batches: Vec<PathBuf>,

        /// Keyword dictionary (TOML)
        #[arg(long)]
        dictionary: Option<PathBuf>,

        /// Create the dictionary's categories before processing
        #[arg(long)]
        seed_categories: bool,

        /// Print run summaries as JSON
        #[arg(long)]
        json: bool,

        /// Seed for synthesized scores
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Create the categories declared in the keyword dictionary
    SeedCategories {
        /// Keyword dictionary (TOML)
        #[arg(long)]
        dictionary: Option<PathBuf>,
    },

    /// List recent batch runs
    Runs {
        /// Number of runs to show, newest first
        #[arg(long, default_value = "10", value_parser = clap::value_parser!(u32).range(1..))]
        limit: u32,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let toml_config = load_config(args.config.as_deref()).context("Failed to load configuration")?;

    let level = if args.verbose {
        "debug".to_string()
    } else {
        toml_config.logging.level.clone()
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&level)))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        git_hash = env!("GIT_HASH"),
        built = env!("BUILD_TIMESTAMP"),
        profile = env!("BUILD_PROFILE"),
        "Starting altdir-ingest"
    );

    let dictionary_override = match &args.command {
        Command::Run { dictionary, .. } | Command::SeedCategories { dictionary } => {
            dictionary.clone()
        }
        Command::Runs { .. } => None,
    };
    let overrides = CliOverrides {
        root_folder: args.root_folder.clone(),
        database_path: args.database.clone(),
        dictionary_path: dictionary_override,
    };
    let settings =
        IngestSettings::resolve(&overrides, &toml_config).context("Failed to resolve settings")?;

    let pool = init_database(&settings.database_path)
        .await
        .with_context(|| format!("Failed to open database {}", settings.database_path.display()))?;

    match args.command {
        Command::Run {
            batches,
            seed_categories,
            json,
            seed,
            ..
        } => run_batches(&pool, &settings, &batches, seed_categories, json, seed).await,
        Command::SeedCategories { .. } => run_seed_categories(&pool, &settings).await,
        Command::Runs { limit, json } => show_runs(&pool, limit, json).await,
    }
}

async fn run_batches(
    pool: &SqlitePool,
    settings: &IngestSettings,
    batch_paths: &[PathBuf],
    seed_categories: bool,
    json: bool,
    seed: Option<u64>,
) -> Result<()> {
    let dictionary = Arc::new(settings.load_dictionary().context("Failed to load keyword dictionary")?);

    let synthesizer = match seed {
        Some(seed) => RandomScoreSynthesizer::seeded(&settings.scoring, seed)?,
        None => RandomScoreSynthesizer::new(&settings.scoring)?,
    };

    let options = ExecutorOptions {
        default_status: settings.default_status,
        seed_categories,
        max_lock_wait_ms: None,
    };
    let mut executor = BatchExecutor::new(pool.clone(), dictionary, synthesizer, options);

    let mut any_failures = false;
    for path in batch_paths {
        let batch = Batch::load(path)
            .with_context(|| format!("Failed to read batch {}", path.display()))?;

        let summary = executor
            .run(&batch)
            .await
            .with_context(|| format!("Batch {} aborted", batch.display_name()))?;

        any_failures |= summary.has_failures();
        if json {
            println!("{}", serde_json::to_string_pretty(&summary)?);
        } else {
            println!("{}", summary);
        }
    }

    if any_failures {
        error!("Some candidates failed; see the run summary");
    }
    Ok(())
}

async fn run_seed_categories(pool: &SqlitePool, settings: &IngestSettings) -> Result<()> {
    let dictionary = settings.load_dictionary().context("Failed to load keyword dictionary")?;
    let max_wait_ms = max_lock_wait_ms(pool).await?;

    let items = seed_categories(pool, &dictionary, max_wait_ms).await?;
    let created = items
        .iter()
        .filter(|item| item.outcome == ItemOutcome::Created)
        .count();
    let failed = items
        .iter()
        .filter(|item| item.outcome == ItemOutcome::Failed)
        .count();

    println!(
        "Categories: {} created, {} already present, {} failed",
        created,
        items.len() - created - failed,
        failed
    );
    Ok(())
}

async fn show_runs(pool: &SqlitePool, limit: u32, json: bool) -> Result<()> {
    let runs = list_recent_runs(pool, limit).await?;

    for run in runs {
        if json {
            let value = serde_json::json!({
                "run_id": run.run_id,
                "batch_name": run.batch_name,
                "state": run.state,
                "summary": run.summary,
                "error": run.error,
                "started_at": run.started_at,
                "ended_at": run.ended_at,
            });
            println!("{}", value);
            continue;
        }

        let created = run.summary.as_ref().map(|s| s.total_created()).unwrap_or(0);
        println!(
            "{}  {:<9}  {:<24}  created {}{}",
            run.started_at.format("%Y-%m-%d %H:%M:%S"),
            run.state.as_str(),
            run.batch_name,
            created,
            run.error
                .as_deref()
                .map(|e| format!("  error: {}", e))
                .unwrap_or_default()
        );
    }
    Ok(())
}
