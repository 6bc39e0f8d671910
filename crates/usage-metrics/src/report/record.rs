//! Normalized usage records and bucket totals.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Micro-dollars per dollar.
const MICROS_PER_USD: f64 = 1_000_000.0;

/// Convert a dollar amount to integer micro-dollars.
///
/// Costs are summed as integers so aggregation is exact and independent of
/// page arrival order.
#[must_use]
#[allow(clippy::cast_possible_truncation)] // Vendor amounts are far below i64::MAX micro-dollars
pub fn usd_to_micros(value: f64) -> i64 {
    (value * MICROS_PER_USD).round() as i64
}

/// Convert integer micro-dollars back to dollars for display.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn micros_to_usd(micros: i64) -> f64 {
    micros as f64 / MICROS_PER_USD
}

/// One normalized result row from the usage or costs endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageRecord {
    /// UTC day of the bucket the row came from.
    pub date: NaiveDate,
    /// Model name (usage) or line item (costs).
    pub model: String,
    /// Input tokens.
    pub input_tokens: i64,
    /// Output tokens.
    pub output_tokens: i64,
    /// Cached input tokens.
    pub cached_input_tokens: i64,
    /// Number of model requests.
    pub num_requests: i64,
    /// Cost in micro-dollars.
    pub cost_micros: i64,
}

impl UsageRecord {
    /// A token-only record, as produced by the usage endpoint.
    #[must_use]
    pub fn tokens(
        date: NaiveDate,
        model: impl Into<String>,
        input_tokens: i64,
        output_tokens: i64,
    ) -> Self {
        Self {
            date,
            model: model.into(),
            input_tokens,
            output_tokens,
            cached_input_tokens: 0,
            num_requests: 0,
            cost_micros: 0,
        }
    }

    /// A cost-only record, as produced by the costs endpoint.
    #[must_use]
    pub fn cost(date: NaiveDate, line_item: impl Into<String>, usd: f64) -> Self {
        Self {
            date,
            model: line_item.into(),
            input_tokens: 0,
            output_tokens: 0,
            cached_input_tokens: 0,
            num_requests: 0,
            cost_micros: usd_to_micros(usd),
        }
    }

    /// Set the request count.
    #[must_use]
    pub fn with_requests(mut self, num_requests: i64) -> Self {
        self.num_requests = num_requests;
        self
    }

    /// Set the cached input token count.
    #[must_use]
    pub fn with_cached(mut self, cached_input_tokens: i64) -> Self {
        self.cached_input_tokens = cached_input_tokens;
        self
    }
}

/// Aggregation key: one bucket per (date, model) pair.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BucketKey {
    /// UTC day.
    pub date: NaiveDate,
    /// Model name or line item.
    pub model: String,
}

/// Summed numeric fields for a bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketTotals {
    /// Input tokens.
    pub input_tokens: i64,
    /// Output tokens.
    pub output_tokens: i64,
    /// Cached input tokens.
    pub cached_input_tokens: i64,
    /// Number of model requests.
    pub num_requests: i64,
    /// Cost in micro-dollars.
    pub cost_micros: i64,
}

impl BucketTotals {
    /// Field-wise sum, or `None` if any field overflows.
    #[must_use]
    pub fn checked_add(&self, other: &Self) -> Option<Self> {
        Some(Self {
            input_tokens: self.input_tokens.checked_add(other.input_tokens)?,
            output_tokens: self.output_tokens.checked_add(other.output_tokens)?,
            cached_input_tokens: self
                .cached_input_tokens
                .checked_add(other.cached_input_tokens)?,
            num_requests: self.num_requests.checked_add(other.num_requests)?,
            cost_micros: self.cost_micros.checked_add(other.cost_micros)?,
        })
    }

    /// Input plus output tokens, saturating at the `i64` bounds.
    #[must_use]
    pub fn total_tokens(&self) -> i64 {
        self.input_tokens.saturating_add(self.output_tokens)
    }

    /// Cost in dollars.
    #[must_use]
    pub fn cost_usd(&self) -> f64 {
        micros_to_usd(self.cost_micros)
    }
}

impl From<&UsageRecord> for BucketTotals {
    fn from(record: &UsageRecord) -> Self {
        Self {
            input_tokens: record.input_tokens,
            output_tokens: record.output_tokens,
            cached_input_tokens: record.cached_input_tokens,
            num_requests: record.num_requests,
            cost_micros: record.cost_micros,
        }
    }
}
