//! Organization metrics API client.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use super::models::{
    ApiErrorBody, Bucket, CompletionsUsage, CostResult, EmbeddingsUsage, ProjectEntry,
};
use super::pagination::{Page, PageStream};
use super::{Endpoint, MetricsSource, Project, UsagePage};
use crate::config::{Config, SecretString};
use crate::date_range::DateRange;
use crate::error::{MetricsError, MetricsResult};
use crate::report::{usd_to_micros, UsageRecord};

/// Per-request timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Page size requested from list endpoints.
const PROJECTS_PAGE_LIMIT: u32 = 100;

/// Model key used when the API does not group a usage row by model.
pub const UNKNOWN_MODEL: &str = "unknown";

/// Line-item key used when a cost row carries no line item.
pub const UNATTRIBUTED_LINE_ITEM: &str = "unattributed";

/// Authenticated client for the usage, costs and projects endpoints.
///
/// Requests are issued one at a time; nothing is retried.
#[derive(Debug, Clone)]
pub struct MetricsClient {
    http: Client,
    base_url: String,
    api_key: SecretString,
    project_ids: Vec<String>,
}

impl MetricsClient {
    /// Create a client from a validated config.
    ///
    /// # Errors
    ///
    /// Returns [`MetricsError::Config`] if the HTTP client cannot be built.
    pub fn new(config: &Config) -> MetricsResult<Self> {
        let http = Client::builder()
            .user_agent(concat!("usage-metrics/", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| MetricsError::Config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
            project_ids: config.project_ids.clone(),
        })
    }

    /// API root the client talks to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Issue one authenticated GET and decode the JSON body.
    pub(crate) async fn get_json<T>(
        &self,
        endpoint: Endpoint,
        query: &[(String, String)],
    ) -> MetricsResult<T>
    where
        T: DeserializeOwned,
    {
        let path = endpoint.path();
        let url = self.url(path);
        debug!(url = %url, params = query.len(), "Making API request");

        let response = self
            .http
            .get(&url)
            .bearer_auth(self.api_key.expose())
            .query(query)
            .send()
            .await
            .map_err(|source| MetricsError::Network {
                endpoint: path.to_string(),
                source,
            })?;

        Self::decode(path, response).await
    }

    /// Issue one authenticated POST with a JSON body and decode the reply.
    pub(crate) async fn post_json<B, T>(&self, path: &str, body: &B) -> MetricsResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(path);
        debug!(url = %url, "Making API request");

        let response = self
            .http
            .post(&url)
            .bearer_auth(self.api_key.expose())
            .json(body)
            .send()
            .await
            .map_err(|source| MetricsError::Network {
                endpoint: path.to_string(),
                source,
            })?;

        Self::decode(path, response).await
    }

    async fn decode<T>(path: &str, response: Response) -> MetricsResult<T>
    where
        T: DeserializeOwned,
    {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|source| MetricsError::Network {
                endpoint: path.to_string(),
                source,
            })?;

        if !status.is_success() {
            let message = match serde_json::from_str::<ApiErrorBody>(&body) {
                Ok(error) => error.error.message,
                Err(_) if body.trim().is_empty() => status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string(),
                Err(_) => body,
            };
            return Err(MetricsError::Api {
                endpoint: path.to_string(),
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&body).map_err(|source| MetricsError::Decode {
            endpoint: path.to_string(),
            source,
        })
    }

    /// Page stream over an endpoint with the given base query.
    #[must_use]
    pub fn pages<T>(&self, endpoint: Endpoint, query: Vec<(String, String)>) -> PageStream<'_, T>
    where
        T: DeserializeOwned,
    {
        PageStream::new(self, endpoint, query)
    }

    /// Query for the completions usage endpoint, grouped by model per day.
    #[must_use]
    pub fn usage_query(range: &DateRange) -> Vec<(String, String)> {
        vec![
            ("start_time".to_string(), range.start_timestamp().to_string()),
            ("end_time".to_string(), range.end_timestamp().to_string()),
            ("bucket_width".to_string(), "1d".to_string()),
            ("group_by[]".to_string(), "model".to_string()),
        ]
    }

    /// Query for the costs endpoint, grouped by line item per day.
    #[must_use]
    pub fn cost_query(range: &DateRange, project_ids: &[String]) -> Vec<(String, String)> {
        let mut params = vec![
            ("start_time".to_string(), range.start_timestamp().to_string()),
            ("end_time".to_string(), range.end_timestamp().to_string()),
            ("bucket_width".to_string(), "1d".to_string()),
            ("group_by[]".to_string(), "line_item".to_string()),
        ];
        for id in project_ids {
            params.push(("project_ids[]".to_string(), id.clone()));
        }
        params
    }

    /// Fetch every completions and embeddings usage page in the window,
    /// completions first.
    ///
    /// # Errors
    ///
    /// Fails on the first page that cannot be fetched or decoded.
    pub async fn fetch_usage(&self, range: &DateRange) -> MetricsResult<Vec<UsagePage>> {
        let mut pages = self.fetch_completions_usage(range).await?;
        pages.extend(self.fetch_embeddings_usage(range).await?);
        Ok(pages)
    }

    /// Fetch every completions usage page in the window.
    ///
    /// # Errors
    ///
    /// Fails on the first page that cannot be fetched or decoded.
    #[instrument(skip(self, range), fields(range = %range))]
    pub async fn fetch_completions_usage(
        &self,
        range: &DateRange,
    ) -> MetricsResult<Vec<UsagePage>> {
        let pages = self
            .pages::<Bucket<CompletionsUsage>>(Endpoint::Usage, Self::usage_query(range))
            .collect_pages()
            .await?;

        let pages = pages
            .into_iter()
            .map(|page| convert_page(page, usage_records))
            .collect::<MetricsResult<Vec<_>>>()?;

        info!(
            pages = pages.len(),
            records = pages.iter().map(|p| p.data.len()).sum::<usize>(),
            "Retrieved completions usage"
        );
        Ok(pages)
    }

    /// Fetch every embeddings usage page in the window.
    ///
    /// # Errors
    ///
    /// Fails on the first page that cannot be fetched or decoded.
    #[instrument(skip(self, range), fields(range = %range))]
    pub async fn fetch_embeddings_usage(
        &self,
        range: &DateRange,
    ) -> MetricsResult<Vec<UsagePage>> {
        let pages = self
            .pages::<Bucket<EmbeddingsUsage>>(Endpoint::EmbeddingsUsage, Self::usage_query(range))
            .collect_pages()
            .await?;

        let pages = pages
            .into_iter()
            .map(|page| convert_page(page, embeddings_records))
            .collect::<MetricsResult<Vec<_>>>()?;

        info!(
            pages = pages.len(),
            records = pages.iter().map(|p| p.data.len()).sum::<usize>(),
            "Retrieved embeddings usage"
        );
        Ok(pages)
    }

    /// Fetch every cost page in the window, normalized to records.
    ///
    /// # Errors
    ///
    /// Fails on the first page that cannot be fetched or decoded.
    #[instrument(skip(self, range), fields(range = %range))]
    pub async fn fetch_costs(&self, range: &DateRange) -> MetricsResult<Vec<UsagePage>> {
        let pages = self
            .pages::<Bucket<CostResult>>(
                Endpoint::Costs,
                Self::cost_query(range, &self.project_ids),
            )
            .collect_pages()
            .await?;

        let pages = pages
            .into_iter()
            .map(|page| convert_page(page, cost_records))
            .collect::<MetricsResult<Vec<_>>>()?;

        info!(
            pages = pages.len(),
            records = pages.iter().map(|p| p.data.len()).sum::<usize>(),
            "Retrieved cost data"
        );
        Ok(pages)
    }

    /// Fetch every project in the organization.
    ///
    /// # Errors
    ///
    /// Fails on the first page that cannot be fetched or decoded.
    #[instrument(skip(self))]
    pub async fn fetch_projects(&self) -> MetricsResult<Vec<Project>> {
        let query = vec![("limit".to_string(), PROJECTS_PAGE_LIMIT.to_string())];
        let pages = self
            .pages::<ProjectEntry>(Endpoint::Projects, query)
            .collect_pages()
            .await?;

        let projects: Vec<Project> = pages
            .into_iter()
            .flat_map(|page| page.data)
            .map(Project::from)
            .collect();

        info!(projects = projects.len(), "Retrieved project data");
        Ok(projects)
    }
}

#[async_trait]
impl MetricsSource for MetricsClient {
    async fn usage_pages(&self, range: &DateRange) -> MetricsResult<Vec<UsagePage>> {
        self.fetch_usage(range).await
    }

    async fn cost_pages(&self, range: &DateRange) -> MetricsResult<Vec<UsagePage>> {
        self.fetch_costs(range).await
    }

    async fn projects(&self) -> MetricsResult<Vec<Project>> {
        self.fetch_projects().await
    }
}

/// UTC day for a bucket start timestamp.
fn bucket_date(timestamp: i64) -> MetricsResult<NaiveDate> {
    DateTime::from_timestamp(timestamp, 0)
        .map(|dt| dt.date_naive())
        .ok_or_else(|| {
            MetricsError::Validation(format!("bucket timestamp {timestamp} is out of range"))
        })
}

fn convert_page<T>(
    page: Page<Bucket<T>>,
    convert: fn(&Bucket<T>) -> MetricsResult<Vec<UsageRecord>>,
) -> MetricsResult<UsagePage> {
    let mut data = Vec::new();
    for bucket in &page.data {
        data.extend(convert(bucket)?);
    }
    Ok(Page {
        data,
        next_cursor: page.next_cursor,
    })
}

fn usage_records(bucket: &Bucket<CompletionsUsage>) -> MetricsResult<Vec<UsageRecord>> {
    let date = bucket_date(bucket.start_time)?;
    Ok(bucket
        .results
        .iter()
        .map(|result| UsageRecord {
            date,
            model: result
                .model
                .clone()
                .unwrap_or_else(|| UNKNOWN_MODEL.to_string()),
            input_tokens: result.input_tokens,
            output_tokens: result.output_tokens,
            cached_input_tokens: result.input_cached_tokens,
            num_requests: result.num_model_requests,
            cost_micros: 0,
        })
        .collect())
}

fn embeddings_records(bucket: &Bucket<EmbeddingsUsage>) -> MetricsResult<Vec<UsageRecord>> {
    let date = bucket_date(bucket.start_time)?;
    Ok(bucket
        .results
        .iter()
        .map(|result| {
            UsageRecord::tokens(
                date,
                result.model.as_deref().unwrap_or(UNKNOWN_MODEL),
                result.input_tokens,
                0,
            )
            .with_requests(result.num_model_requests)
        })
        .collect())
}

fn cost_records(bucket: &Bucket<CostResult>) -> MetricsResult<Vec<UsageRecord>> {
    let date = bucket_date(bucket.start_time)?;
    let mut records = Vec::with_capacity(bucket.results.len());
    for result in &bucket.results {
        if !result.amount.currency.eq_ignore_ascii_case("usd") {
            warn!(
                currency = %result.amount.currency,
                line_item = result.line_item.as_deref().unwrap_or("-"),
                "Skipping non-USD cost row"
            );
            continue;
        }
        records.push(UsageRecord {
            date,
            model: result
                .line_item
                .clone()
                .unwrap_or_else(|| UNATTRIBUTED_LINE_ITEM.to_string()),
            input_tokens: 0,
            output_tokens: 0,
            cached_input_tokens: 0,
            num_requests: 0,
            cost_micros: usd_to_micros(result.amount.value),
        });
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn range() -> DateRange {
        DateRange::ending_on(NaiveDate::from_ymd_opt(2024, 6, 10).unwrap(), 7).unwrap()
    }

    #[test]
    fn test_url_joins_base_and_path() {
        let config = Config::new("https://api.example.com/v1/", "sk-test", 7).unwrap();
        let client = MetricsClient::new(&config).unwrap();
        assert_eq!(client.base_url(), "https://api.example.com/v1");
        assert_eq!(
            client.url(Endpoint::Usage.path()),
            "https://api.example.com/v1/organization/usage/completions"
        );
    }

    #[test]
    fn test_usage_query() {
        let query = MetricsClient::usage_query(&range());
        assert!(query.contains(&("start_time".to_string(), "1717372800".to_string())));
        assert!(query.contains(&("end_time".to_string(), "1718064000".to_string())));
        assert!(query.contains(&("bucket_width".to_string(), "1d".to_string())));
        assert!(query.contains(&("group_by[]".to_string(), "model".to_string())));
    }

    #[test]
    fn test_cost_query_with_projects() {
        let query = MetricsClient::cost_query(&range(), &["proj_a".to_string()]);
        assert!(query.contains(&("group_by[]".to_string(), "line_item".to_string())));
        assert!(query.contains(&("project_ids[]".to_string(), "proj_a".to_string())));
    }

    #[test]
    fn test_usage_records_default_model() {
        let bucket: Bucket<CompletionsUsage> = serde_json::from_value(json!({
            "start_time": 1_717_977_600,
            "results": [{"input_tokens": 5, "output_tokens": 1, "num_model_requests": 1}]
        }))
        .unwrap();
        let records = usage_records(&bucket).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].model, UNKNOWN_MODEL);
        assert_eq!(records[0].date, NaiveDate::from_ymd_opt(2024, 6, 10).unwrap());
    }

    #[test]
    fn test_embeddings_records() {
        let bucket: Bucket<EmbeddingsUsage> = serde_json::from_value(json!({
            "start_time": 1_717_977_600,
            "results": [{
                "object": "organization.usage.embeddings.result",
                "input_tokens": 16,
                "num_model_requests": 4,
                "model": "text-embedding-3-small"
            }]
        }))
        .unwrap();
        let records = embeddings_records(&bucket).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].model, "text-embedding-3-small");
        assert_eq!(records[0].input_tokens, 16);
        assert_eq!(records[0].output_tokens, 0);
        assert_eq!(records[0].num_requests, 4);
    }

    #[test]
    fn test_cost_records_skip_non_usd() {
        let bucket: Bucket<CostResult> = serde_json::from_value(json!({
            "start_time": 1_717_977_600,
            "results": [
                {"amount": {"value": 0.42, "currency": "usd"}, "line_item": "gpt-4o, input"},
                {"amount": {"value": 9.0, "currency": "eur"}, "line_item": "gpt-4o, output"},
                {"amount": {"value": 0.08, "currency": "usd"}}
            ]
        }))
        .unwrap();
        let records = cost_records(&bucket).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].model, "gpt-4o, input");
        assert_eq!(records[0].cost_micros, 420_000);
        assert_eq!(records[1].model, UNATTRIBUTED_LINE_ITEM);
    }

    #[test]
    fn test_bucket_date_out_of_range() {
        assert!(matches!(
            bucket_date(i64::MAX),
            Err(MetricsError::Validation(_))
        ));
    }
}
