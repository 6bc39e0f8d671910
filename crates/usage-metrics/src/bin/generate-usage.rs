//! generate-usage - issue a small, bounded batch of billed API calls.

#![allow(clippy::disallowed_macros)]

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use usage_metrics::{ui, Config, GenerationPlan, GeneratorProfile, MetricsClient, UsageGenerator};

/// Generate API usage so the metrics endpoints have data to report.
///
/// Every request is billed to the configured key.
#[derive(Parser)]
#[command(name = "generate-usage")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the YAML config file.
    config: PathBuf,

    /// Request profile; overrides `generator.profile`.
    #[arg(long)]
    profile: Option<GeneratorProfile>,

    /// Number of chat completions; overrides `generator.requests`.
    #[arg(long)]
    requests: Option<u32>,

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
    let mut config = Config::from_file(&cli.config)
        .with_context(|| format!("Failed to load config from {}", cli.config.display()))?;

    if let Some(profile) = cli.profile {
        config.generator.profile = profile;
    }
    if let Some(requests) = cli.requests {
        if requests == 0 {
            bail!("--requests must be at least 1");
        }
        config.generator.requests = Some(requests);
    }

    let plan = GenerationPlan::for_config(&config.generator);
    let client = MetricsClient::new(&config).context("Failed to create API client")?;

    info!(
        base_url = client.base_url(),
        profile = %config.generator.profile,
        requests = plan.len(),
        "Starting usage generation"
    );
    ui::print_warning(&format!(
        "Issuing {} billed requests against {}",
        plan.len(),
        client.base_url()
    ));

    let summary = UsageGenerator::new(&client, &config.generator)
        .run(&plan)
        .await
        .context("Usage generation aborted")?;

    ui::print_generation_summary(&summary);
    Ok(())
}
