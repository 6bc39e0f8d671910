//! usage-metrics - report token usage, costs and projects for an organization.

#![allow(clippy::disallowed_macros)]

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use usage_metrics::{collect_report, ui, Config, MetricsClient};

/// Retrieve usage, cost and project metrics over the configured lookback window.
#[derive(Parser)]
#[command(name = "usage-metrics")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the YAML config file.
    config: PathBuf,

    /// Print the report as JSON instead of tables.
    #[arg(long)]
    json: bool,

    /// Skip the endpoint access check.
    #[arg(long)]
    skip_probe: bool,

    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli).await {
        ui::print_error(&format!("{e:#}"));
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::from_file(&cli.config)
        .with_context(|| format!("Failed to load config from {}", cli.config.display()))?;
    let range = config.date_range().context("Invalid lookback window")?;
    let client = MetricsClient::new(&config).context("Failed to create API client")?;

    info!(base_url = client.base_url(), range = %range, "Starting metrics retrieval");

    let access = if cli.skip_probe {
        Vec::new()
    } else {
        client.probe_access(&range).await
    };

    let report = collect_report(&client, range)
        .await
        .context("Failed to retrieve metrics")?
        .with_access(access);

    if cli.json {
        let json = serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
        println!("{json}");
    } else {
        ui::print_report(&report);
    }

    Ok(())
}
