//! One-off backfill of the Federal Register archive into Postgres.
//!
//! Walks the listing API page by page and inserts every document not
//! already stored. No AI calls are made, so the backfill is cheap to
//! rerun and safe to extend with a wider date range later.
//!
//! Usage: cargo run --bin policypulse-bulk -- --from 2025-01-20

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use chrono::NaiveDate;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use policypulse_common::Config;
use policypulse_ingest::bulk::{BulkRunner, BACKFILL_START};
use policypulse_ingest::federal_register::FederalRegisterClient;
use policypulse_ingest::store::PostgresStore;

#[derive(Parser)]
#[command(name = "policypulse-bulk", about = "Backfill Federal Register documents into PolicyPulse")]
struct Cli {
    /// First publication date to fetch (YYYY-MM-DD)
    #[arg(long, default_value = BACKFILL_START)]
    from: NaiveDate,

    /// Last publication date to fetch; omit to backfill to present
    #[arg(long)]
    to: Option<NaiveDate>,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(had_errors) => ExitCode::from(if had_errors { 1 } else { 0 }),
        Err(e) => {
            eprintln!("Fatal error: {e:#}");
            ExitCode::from(2)
        }
    }
}

async fn run(cli: Cli) -> Result<bool> {
    let config = Config::bulk_from_env();
    let store = PostgresStore::connect(&config.database_url).await?;
    store.migrate().await?;

    let runner = BulkRunner::new(
        Arc::new(store),
        Arc::new(FederalRegisterClient::from_env()),
    );

    println!("=== PolicyPulse Bulk Ingestion ===");
    match cli.to {
        Some(to) => println!("Date range: {} → {to}", cli.from),
        None => println!("Date range: {} → present", cli.from),
    }
    println!();

    let report = runner
        .run(cli.from, cli.to, &|message: &str| println!("{message}"))
        .await?;

    println!();
    println!("=== Results ===");
    println!("Total fetched:  {}", report.total_fetched);
    println!("New documents:  {}", report.total_new);
    println!("Inserted:       {}", report.total_inserted);
    println!("Errors:         {}", report.errors.len());

    if !report.errors.is_empty() {
        println!();
        println!("=== Errors ===");
        for err in report.errors.iter().take(10) {
            eprintln!("  - {err}");
        }
        if report.errors.len() > 10 {
            eprintln!("  ... and {} more", report.errors.len() - 10);
        }
    }

    Ok(!report.errors.is_empty())
}
