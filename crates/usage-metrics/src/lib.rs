#![allow(clippy::doc_markdown)] // Allow brand names like OpenAI without backticks

//! Usage, cost and project metrics for OpenAI-compatible organization APIs.
//!
//! The crate reads a YAML config, computes a lookback window, pulls every
//! page of the usage, costs and projects endpoints, and aggregates the
//! results per day and model.
//!
//! - **Usage API** - token counts per day and model
//! - **Costs API** - spend per day and line item
//! - **Projects API** - organization project list
//!
//! A companion [`generator`] issues a small, bounded batch of billed
//! requests so there is usage to report.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use usage_metrics::{collect_report, Config, MetricsClient};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_file("config.yaml")?;
//!     let client = MetricsClient::new(&config)?;
//!
//!     let report = collect_report(&client, config.date_range()?).await?;
//!     for row in report.usage.rows() {
//!         println!(
//!             "{} {}: {} input, {} output tokens",
//!             row.date, row.model, row.totals.input_tokens, row.totals.output_tokens
//!         );
//!     }
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod date_range;
pub mod error;
pub mod generator;
pub mod report;
pub mod ui;

pub use client::{Endpoint, MetricsClient, MetricsSource, Page, PageStream, Project, UsagePage};
pub use config::{Config, GeneratorConfig, GeneratorProfile, SecretString};
pub use date_range::DateRange;
pub use error::{MetricsError, MetricsResult};
pub use generator::{GenerationPlan, GenerationSummary, UsageGenerator};
pub use report::{collect_report, AggregatedReport, MetricsReport, UsageRecord};
