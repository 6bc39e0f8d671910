//! Endpoint access check run before the report.

use serde::Serialize;
use tracing::{info, warn};

use super::http::MetricsClient;
use super::models::RawPage;
use super::Endpoint;
use crate::date_range::DateRange;
use crate::error::MetricsError;

/// Outcome of a single access check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "access", rename_all = "snake_case")]
pub enum AccessStatus {
    /// 2xx; `items` is the size of the first page when it could be read.
    Accessible { items: Option<usize> },
    /// 401/403, typically a key without the needed scope.
    Unauthorized { status: u16, message: String },
    /// Any other failure.
    Failed {
        status: Option<u16>,
        message: String,
    },
}

impl AccessStatus {
    /// Whether the endpoint answered successfully.
    #[must_use]
    pub fn is_accessible(&self) -> bool {
        matches!(self, Self::Accessible { .. })
    }
}

/// Access check result for one endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EndpointProbe {
    /// Endpoint checked.
    pub endpoint: Endpoint,
    /// What happened.
    #[serde(flatten)]
    pub status: AccessStatus,
}

impl MetricsClient {
    /// Issue one request per endpoint and record whether each is reachable.
    ///
    /// Diagnostic only: failures are reported in the result, never returned
    /// as errors.
    pub async fn probe_access(&self, range: &DateRange) -> Vec<EndpointProbe> {
        let mut probes = Vec::with_capacity(Endpoint::ALL.len());

        for endpoint in Endpoint::ALL {
            let query = match endpoint {
                Endpoint::Models => Vec::new(),
                Endpoint::Projects => vec![("limit".to_string(), "1".to_string())],
                Endpoint::Costs => Self::cost_query(range, &[]),
                Endpoint::Usage | Endpoint::EmbeddingsUsage => Self::usage_query(range),
            };

            let status = match self
                .get_json::<RawPage<serde_json::Value>>(endpoint, &query)
                .await
            {
                Ok(page) => AccessStatus::Accessible {
                    items: Some(page.data.len()),
                },
                Err(MetricsError::Decode { .. }) => AccessStatus::Accessible { items: None },
                Err(MetricsError::Api {
                    status: status @ (401 | 403),
                    message,
                    ..
                }) => AccessStatus::Unauthorized { status, message },
                Err(err) => AccessStatus::Failed {
                    status: err.status(),
                    message: err.to_string(),
                },
            };

            if status.is_accessible() {
                info!(endpoint = endpoint.path(), "Endpoint accessible");
            } else {
                warn!(endpoint = endpoint.path(), ?status, "Endpoint not accessible");
            }

            probes.push(EndpointProbe { endpoint, status });
        }

        probes
    }
}
