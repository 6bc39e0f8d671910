//! Merge paginated records into per-(date, model) totals.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::ser::SerializeSeq;
use serde::{Serialize, Serializer};

use super::record::{BucketKey, BucketTotals, UsageRecord};
use crate::client::UsagePage;
use crate::error::{MetricsError, MetricsResult};

/// Summed usage keyed by (date, model).
///
/// Buckets are created on first encounter and only ever grow; none is
/// removed. Keys iterate in (date, model) order. Sums are checked: a record
/// that would overflow a bucket or the grand total is rejected and leaves
/// the report unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregatedReport {
    buckets: BTreeMap<BucketKey, BucketTotals>,
    grand: BucketTotals,
}

/// Flattened row used for serialization and display.
#[derive(Debug, Clone, Serialize)]
pub struct ReportRow<'a> {
    /// UTC day.
    pub date: NaiveDate,
    /// Model name or line item.
    pub model: &'a str,
    /// Totals for the bucket.
    #[serde(flatten)]
    pub totals: BucketTotals,
}

impl AggregatedReport {
    /// Create an empty report.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a report from records in any order.
    ///
    /// # Errors
    ///
    /// Returns [`MetricsError::Validation`] if a sum overflows.
    pub fn from_records<'a>(
        records: impl IntoIterator<Item = &'a UsageRecord>,
    ) -> MetricsResult<Self> {
        let mut report = Self::new();
        for record in records {
            report.ingest(record)?;
        }
        Ok(report)
    }

    /// Build a report from a sequence of pages.
    ///
    /// # Errors
    ///
    /// Returns [`MetricsError::Validation`] if a sum overflows.
    pub fn from_pages<'a>(pages: impl IntoIterator<Item = &'a UsagePage>) -> MetricsResult<Self> {
        let mut report = Self::new();
        for page in pages {
            report.ingest_page(page)?;
        }
        Ok(report)
    }

    /// Add one record to its bucket.
    ///
    /// # Errors
    ///
    /// Returns [`MetricsError::Validation`] if the bucket or the grand
    /// total would overflow.
    pub fn ingest(&mut self, record: &UsageRecord) -> MetricsResult<()> {
        let key = BucketKey {
            date: record.date,
            model: record.model.clone(),
        };
        self.add_to(key, &BucketTotals::from(record))
    }

    /// Add every record of a page.
    ///
    /// # Errors
    ///
    /// See [`AggregatedReport::ingest`].
    pub fn ingest_page(&mut self, page: &UsagePage) -> MetricsResult<()> {
        for record in &page.data {
            self.ingest(record)?;
        }
        Ok(())
    }

    /// Fold another report into this one. On error `self` is unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`MetricsError::Validation`] if a sum overflows.
    pub fn merge(&mut self, other: &Self) -> MetricsResult<()> {
        let mut merged = self.clone();
        for (key, totals) in &other.buckets {
            merged.add_to(key.clone(), totals)?;
        }
        *self = merged;
        Ok(())
    }

    fn add_to(&mut self, key: BucketKey, totals: &BucketTotals) -> MetricsResult<()> {
        let current = self.buckets.get(&key).copied().unwrap_or_default();
        let bucket = current.checked_add(totals).ok_or_else(|| {
            MetricsError::Validation(format!(
                "totals for {} / {} overflow",
                key.date, key.model
            ))
        })?;
        let grand = self
            .grand
            .checked_add(totals)
            .ok_or_else(|| MetricsError::Validation("report totals overflow".to_string()))?;

        self.buckets.insert(key, bucket);
        self.grand = grand;
        Ok(())
    }

    /// Totals for a single bucket.
    #[must_use]
    pub fn bucket(&self, date: NaiveDate, model: &str) -> Option<&BucketTotals> {
        self.buckets.get(&BucketKey {
            date,
            model: model.to_string(),
        })
    }

    /// Iterate buckets in (date, model) order.
    pub fn iter(&self) -> impl Iterator<Item = (&BucketKey, &BucketTotals)> {
        self.buckets.iter()
    }

    /// Buckets as flat rows.
    pub fn rows(&self) -> impl Iterator<Item = ReportRow<'_>> {
        self.buckets.iter().map(|(key, totals)| ReportRow {
            date: key.date,
            model: &key.model,
            totals: *totals,
        })
    }

    /// Every distinct model name seen, sorted.
    #[must_use]
    pub fn models(&self) -> BTreeSet<&str> {
        self.buckets.keys().map(|k| k.model.as_str()).collect()
    }

    /// Every distinct date seen, ascending.
    #[must_use]
    pub fn dates(&self) -> BTreeSet<NaiveDate> {
        self.buckets.keys().map(|k| k.date).collect()
    }

    /// Grand total across all buckets, kept up to date on ingest.
    #[must_use]
    pub fn totals(&self) -> BucketTotals {
        self.grand
    }

    /// Totals collapsed across dates, per model.
    ///
    /// # Errors
    ///
    /// Returns [`MetricsError::Validation`] if a per-model sum overflows.
    pub fn totals_by_model(&self) -> MetricsResult<BTreeMap<&str, BucketTotals>> {
        let mut by_model: BTreeMap<&str, BucketTotals> = BTreeMap::new();
        for (key, totals) in &self.buckets {
            let entry = by_model.entry(key.model.as_str()).or_default();
            *entry = entry.checked_add(totals).ok_or_else(|| {
                MetricsError::Validation(format!("totals for {} overflow", key.model))
            })?;
        }
        Ok(by_model)
    }

    /// Number of buckets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    /// Whether no bucket has been created.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

impl Serialize for AggregatedReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.buckets.len()))?;
        for row in self.rows() {
            seq.serialize_element(&row)?;
        }
        seq.end()
    }
}
