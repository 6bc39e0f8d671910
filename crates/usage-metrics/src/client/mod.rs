//! Organization metrics API client.
//!
//! This module provides access to:
//!
//! - **Usage API**: completions and embeddings token consumption per day
//!   and model
//! - **Costs API**: daily spend per line item
//! - **Projects API**: organization project list
//!
//! ## Authentication
//!
//! Every request carries the configured key as a bearer token. Usage and
//! cost endpoints require an admin key with usage read permission.
//!
//! ## Example
//!
//! ```rust,ignore
//! use usage_metrics::{Config, DateRange, MetricsClient};
//!
//! let config = Config::from_file("config.yaml")?;
//! let client = MetricsClient::new(&config)?;
//! let range = DateRange::from_days_back(config.days_back)?;
//!
//! let mut stream = client.pages::<serde_json::Value>(
//!     Endpoint::Usage,
//!     MetricsClient::usage_query(&range),
//! );
//! while let Some(page) = stream.next_page().await? {
//!     println!("{} buckets", page.data.len());
//! }
//! ```

mod http;
mod models;
mod pagination;
mod probe;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::date_range::DateRange;
use crate::error::MetricsResult;
use crate::report::UsageRecord;

pub use http::{MetricsClient, UNATTRIBUTED_LINE_ITEM, UNKNOWN_MODEL};
pub use models::{
    ApiErrorBody, Bucket, CompletionsUsage, CostResult, EmbeddingsUsage, ProjectEntry, RawPage,
};
pub use pagination::{Page, PageStream};
pub use probe::{AccessStatus, EndpointProbe};

/// A page of normalized usage or cost records.
pub type UsagePage = Page<UsageRecord>;

/// API resources the client knows how to reach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Endpoint {
    /// Model list; basic connectivity.
    Models,
    /// Organization projects.
    Projects,
    /// Organization costs.
    Costs,
    /// Completions usage.
    Usage,
    /// Embeddings usage.
    EmbeddingsUsage,
}

impl Endpoint {
    /// Every endpoint, in probe order.
    pub const ALL: [Self; 5] = [
        Self::Models,
        Self::Projects,
        Self::Costs,
        Self::Usage,
        Self::EmbeddingsUsage,
    ];

    /// Path relative to the configured base URL.
    #[must_use]
    pub fn path(self) -> &'static str {
        match self {
            Self::Models => "/models",
            Self::Projects => "/organization/projects",
            Self::Costs => "/organization/costs",
            Self::Usage => "/organization/usage/completions",
            Self::EmbeddingsUsage => "/organization/usage/embeddings",
        }
    }

    /// Query parameter that carries the pagination cursor.
    #[must_use]
    pub fn cursor_param(self) -> &'static str {
        match self {
            Self::Models | Self::Projects => "after",
            Self::Costs | Self::Usage | Self::EmbeddingsUsage => "page",
        }
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.path())
    }
}

/// Organization project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    /// Project ID.
    pub id: String,
    /// Display name.
    pub name: String,
    /// `active` or `archived`, when reported.
    pub status: Option<String>,
    /// Creation time, when reported.
    pub created_at: Option<DateTime<Utc>>,
}

impl From<ProjectEntry> for Project {
    fn from(entry: ProjectEntry) -> Self {
        Self {
            name: entry.name.unwrap_or_else(|| entry.id.clone()),
            id: entry.id,
            status: entry.status,
            created_at: entry
                .created_at
                .and_then(|ts| DateTime::from_timestamp(ts, 0)),
        }
    }
}

/// Source of usage, cost and project data for a report.
#[async_trait]
pub trait MetricsSource: Send + Sync {
    /// Every completions and embeddings usage page in the window, in fetch
    /// order.
    ///
    /// # Errors
    ///
    /// Returns an error if any page cannot be retrieved.
    async fn usage_pages(&self, range: &DateRange) -> MetricsResult<Vec<UsagePage>>;

    /// Every cost page in the window, in fetch order.
    ///
    /// # Errors
    ///
    /// Returns an error if any page cannot be retrieved.
    async fn cost_pages(&self, range: &DateRange) -> MetricsResult<Vec<UsagePage>>;

    /// Every project in the organization.
    ///
    /// # Errors
    ///
    /// Returns an error if any page cannot be retrieved.
    async fn projects(&self) -> MetricsResult<Vec<Project>>;
}
