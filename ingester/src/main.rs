mod app;
mod dedup;
mod filter;
mod ingest;
mod model;
mod pipeline;
mod store;
mod writer;

#[cfg(test)]
mod testing;

use clap::{Parser, Subcommand};
use std::process;
use tenders_core::{telemetry, Config, ErrorPolicy};
use tracing::{error, info, warn};

#[derive(Parser)]
#[clap(name = "tender-ingester")]
#[clap(about = "Mirrors recent Contracts Finder notices into the tenders table", version)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one ingestion pass and exit
    Run {
        /// Override the recency window in days
        #[clap(long)]
        window_days: Option<i64>,

        /// Notice types to ingest, in order (repeatable)
        #[clap(long = "category")]
        categories: Vec<String>,

        /// Fail the run instead of degrading on store read or page decode failures
        #[clap(long)]
        abort_on_error: bool,
    },

    /// Print the effective configuration with secrets masked
    CheckConfig,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!(error = %e, "Fatal error");
        eprintln!("tender-ingester: {:#}", e);
        process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let mut config = Config::load()
        .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    // Initialize telemetry
    telemetry::init(&config.telemetry)?;

    match cli.command {
        Commands::CheckConfig => {
            println!("{}", serde_json::to_string_pretty(&config.redacted())?);
        }

        Commands::Run {
            window_days,
            categories,
            abort_on_error,
        } => {
            // Override config with CLI args
            if let Some(days) = window_days {
                config.ingest.window_days = days;
            }
            if !categories.is_empty() {
                config.ingest.categories = categories;
            }
            if abort_on_error {
                config.ingest.error_policy = ErrorPolicy::Abort;
            }
            config
                .validate()
                .map_err(|e| anyhow::anyhow!("Invalid overrides: {}", e))?;

            info!(
                window_days = config.ingest.window_days,
                categories = ?config.ingest.categories,
                policy = ?config.ingest.error_policy,
                "Starting ingestion run"
            );

            let app = app::App::new(config)?;
            let summary = app.run_once().await.map_err(|e| {
                if e.is_policy_abort() {
                    warn!("Run aborted by error policy; without --abort-on-error it would have degraded");
                }
                anyhow::Error::from(e)
            })?;

            for stats in &summary.categories {
                info!(
                    category = %stats.category,
                    pages = stats.pages_fetched,
                    evaluated = stats.evaluated,
                    accepted = stats.accepted,
                    inserted = stats.inserted,
                    duplicates = stats.duplicates,
                    malformed = stats.malformed,
                    undecodable = stats.undecodable,
                    failed_batches = stats.failed_batches,
                    reached_cutoff = stats.reached_cutoff,
                    "Category summary"
                );
            }

            info!(
                total_inserted = summary.total_inserted(),
                known_before_run = summary.known_before_run,
                run_at = %summary.run_at,
                cutoff = %summary.cutoff,
                "Run complete"
            );
        }
    }

    telemetry::shutdown();
    Ok(())
}
