//! Companion tool that issues a small, bounded batch of billed requests so
//! the metrics endpoints have something to report.
//!
//! Every call here costs money. Plans are fixed and capped at
//! [`MAX_GENERATED_REQUESTS`].

mod models;
mod plan;
mod runner;

pub use plan::{GenerationPlan, GenerationRequest, MAX_GENERATED_REQUESTS};
pub use runner::{CallOutcome, GenerationSummary, UsageGenerator};
