//! Report assembly: fetch every endpoint, then aggregate.

mod aggregator;
mod record;

use serde::Serialize;
use tracing::info;

use crate::client::{EndpointProbe, MetricsSource, Project};
use crate::date_range::DateRange;
use crate::error::MetricsResult;

pub use aggregator::{AggregatedReport, ReportRow};
pub use record::{micros_to_usd, usd_to_micros, BucketKey, BucketTotals, UsageRecord};

/// Structured result of one retrieval run, handed to presentation.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsReport {
    /// Lookback window queried.
    pub range: DateRange,
    /// Token usage per (date, model).
    pub usage: AggregatedReport,
    /// Spend per (date, line item).
    pub costs: AggregatedReport,
    /// Organization projects.
    pub projects: Vec<Project>,
    /// Endpoint access checks, when run.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub access: Vec<EndpointProbe>,
}

impl MetricsReport {
    /// Attach endpoint access checks.
    #[must_use]
    pub fn with_access(mut self, access: Vec<EndpointProbe>) -> Self {
        self.access = access;
        self
    }

    /// Whether neither usage nor cost data was found.
    #[must_use]
    pub fn has_no_metrics(&self) -> bool {
        self.usage.is_empty() && self.costs.is_empty()
    }
}

/// Fetch projects, usage and costs for `range`, in that order, and
/// aggregate them.
///
/// # Errors
///
/// Returns the first retrieval error, or [`MetricsError::Validation`] if
/// a sum overflows; no partial report is produced.
///
/// [`MetricsError::Validation`]: crate::error::MetricsError::Validation
pub async fn collect_report<S>(source: &S, range: DateRange) -> MetricsResult<MetricsReport>
where
    S: MetricsSource + ?Sized,
{
    info!(range = %range, "Retrieving metrics");

    let projects = source.projects().await?;
    let usage_pages = source.usage_pages(&range).await?;
    let cost_pages = source.cost_pages(&range).await?;

    let usage = AggregatedReport::from_pages(&usage_pages)?;
    let costs = AggregatedReport::from_pages(&cost_pages)?;

    info!(
        usage_buckets = usage.len(),
        cost_buckets = costs.len(),
        projects = projects.len(),
        "Aggregated metrics"
    );

    Ok(MetricsReport {
        range,
        usage,
        costs,
        projects,
        access: Vec::new(),
    })
}
