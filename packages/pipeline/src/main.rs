#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for the taxi demand pipeline.

use clap::{Parser, Subcommand};
use taxi_demand_geocoder::nominatim::NominatimReverse;
use taxi_demand_geocoder::service::nominatim_service;
use taxi_demand_pipeline::progress::{IndicatifProgress, MultiProgress};
use taxi_demand_pipeline::{BatchOptions, run_batch};

#[derive(Parser)]
#[command(name = "taxi_demand_pipeline", about = "Taxi demand forecast pipeline")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full batch: load, resolve, enrich, aggregate, forecast,
    /// publish
    Run {
        /// Maximum number of raw rows to fetch from the lake (for testing)
        #[arg(long)]
        limit: Option<u64>,
        /// Minimum delay between geocoder calls in milliseconds
        /// (overrides the service TOML)
        #[arg(long)]
        rate_limit_ms: Option<u64>,
    },
    /// Print the forecast table currently stored in the mart
    Forecasts {
        /// Only show rows for this zone
        #[arg(long)]
        zone: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    let multi = taxi_demand_pipeline::progress::init_logger();

    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Run {
        limit: None,
        rate_limit_ms: None,
    });

    let result = match command {
        Commands::Run {
            limit,
            rate_limit_ms,
        } => run(&multi, limit, rate_limit_ms).await,
        Commands::Forecasts { zone } => show_forecasts(zone.as_deref()),
    };

    // Outermost catch: report the failure and exit cleanly instead of
    // crashing with a stack trace.
    if let Err(e) = result {
        log::error!("Batch failed: {e}");
        std::process::exit(1);
    }
}

async fn run(
    multi: &MultiProgress,
    limit: Option<u64>,
    rate_limit_ms: Option<u64>,
) -> Result<(), Box<dyn std::error::Error>> {
    let service = nominatim_service();
    let options = BatchOptions {
        limit,
        rate_limit_ms: rate_limit_ms.unwrap_or(service.rate_limit_ms),
    };

    log::info!(
        "Starting batch (geocoder: {}, rate limit {}ms)",
        service.name,
        options.rate_limit_ms
    );

    let geocoder = NominatimReverse::new(&service)?;
    let bar = IndicatifProgress::resolver_bar(multi, "Resolving zones");

    let summary = run_batch(&geocoder, options, Some(&bar)).await;
    bar.finish_and_clear();
    let summary = summary?;

    if summary.report.all_succeeded() {
        log::info!("success");
        Ok(())
    } else {
        // Underlying causes were already logged by the publisher.
        Err("one or more mart table writes failed".into())
    }
}

fn show_forecasts(zone: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let mart = taxi_demand_mart::open_from_env()?;
    let rows = taxi_demand_mart::forecasts::fetch_forecasts(&mart)?;

    println!(
        "{:<12} {:<10} {:>8} {:>14} {:>15}",
        "DATE", "ZONE", "TRIPS", "PRED_NEXT_DAY", "PRED_NEXT_WEEK"
    );
    println!("{}", "-".repeat(64));

    for row in rows
        .iter()
        .filter(|r| zone.is_none() || r.zone.as_deref() == zone)
    {
        println!(
            "{:<12} {:<10} {:>8} {:>14.2} {:>15.2}",
            row.date.to_string(),
            row.zone.as_deref().unwrap_or("(none)"),
            row.trips,
            row.pred_next_day,
            row.pred_next_week
        );
    }

    Ok(())
}
