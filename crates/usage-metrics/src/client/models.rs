//! Wire models for the organization metrics API.

use serde::Deserialize;

// ============================================================================
// Common response wrapper
// ============================================================================

/// One page as returned by the API.
///
/// Usage and cost endpoints report `has_more` + `next_page`; list endpoints
/// (projects, models) report `has_more` + `last_id`. Some proxies emit
/// `next_cursor` instead; all three are accepted.
#[derive(Debug, Clone, Deserialize)]
pub struct RawPage<T> {
    /// Data items.
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
    /// Whether there are more pages.
    #[serde(default)]
    pub has_more: Option<bool>,
    /// Cursor for the next page (usage/costs).
    #[serde(default)]
    pub next_page: Option<String>,
    /// Cursor for the next page (alternate spelling).
    #[serde(default)]
    pub next_cursor: Option<String>,
    /// Last item ID, used as the `after` cursor on list endpoints.
    #[serde(default)]
    pub last_id: Option<String>,
}

impl<T> RawPage<T> {
    /// Cursor to request next, if pagination continues.
    #[must_use]
    pub fn cursor(&self) -> Option<String> {
        if self.has_more == Some(false) {
            return None;
        }

        let explicit = self
            .next_page
            .as_deref()
            .or(self.next_cursor.as_deref())
            .filter(|c| !c.is_empty());
        if let Some(cursor) = explicit {
            return Some(cursor.to_string());
        }

        if self.has_more == Some(true) {
            return self.last_id.clone().filter(|c| !c.is_empty());
        }

        None
    }
}

/// Time bucket from the usage and costs endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct Bucket<T> {
    /// Start time (Unix timestamp).
    pub start_time: i64,
    /// End time (Unix timestamp).
    #[serde(default)]
    pub end_time: i64,
    /// Results within this bucket.
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
}

// ============================================================================
// Completions usage
// ============================================================================

/// Completions usage result.
#[derive(Debug, Clone, Deserialize)]
pub struct CompletionsUsage {
    /// Input tokens used.
    #[serde(default)]
    pub input_tokens: i64,
    /// Output tokens used.
    #[serde(default)]
    pub output_tokens: i64,
    /// Cached input tokens.
    #[serde(default)]
    pub input_cached_tokens: i64,
    /// Number of model requests.
    #[serde(default)]
    pub num_model_requests: i64,
    /// Model name (if grouped).
    pub model: Option<String>,
    /// Project ID (if grouped).
    pub project_id: Option<String>,
}

// ============================================================================
// Embeddings usage
// ============================================================================

/// Embeddings usage result.
#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingsUsage {
    /// Input tokens used.
    #[serde(default)]
    pub input_tokens: i64,
    /// Number of model requests.
    #[serde(default)]
    pub num_model_requests: i64,
    /// Model name (if grouped).
    pub model: Option<String>,
    /// Project ID (if grouped).
    pub project_id: Option<String>,
}

// ============================================================================
// Costs
// ============================================================================

/// Cost amount.
#[derive(Debug, Clone, Deserialize)]
pub struct CostAmount {
    /// The value, in dollars.
    #[serde(default)]
    pub value: f64,
    /// Currency code.
    #[serde(default)]
    pub currency: String,
}

/// Cost result.
#[derive(Debug, Clone, Deserialize)]
pub struct CostResult {
    /// Cost amount.
    pub amount: CostAmount,
    /// Line item description (if grouped).
    pub line_item: Option<String>,
    /// Project ID (if grouped).
    pub project_id: Option<String>,
}

// ============================================================================
// Projects
// ============================================================================

/// Project entry from the projects list endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectEntry {
    /// Project ID.
    pub id: String,
    /// Display name.
    #[serde(default)]
    pub name: Option<String>,
    /// `active` or `archived`.
    #[serde(default)]
    pub status: Option<String>,
    /// Creation time (Unix timestamp).
    #[serde(default)]
    pub created_at: Option<i64>,
}

// ============================================================================
// Error response
// ============================================================================

/// Error response body.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    /// Error details.
    pub error: ApiErrorDetails,
}

/// Error details.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorDetails {
    /// Error message.
    pub message: String,
    /// Error type.
    #[serde(rename = "type", default)]
    pub error_type: Option<String>,
    /// Error code.
    #[serde(default)]
    pub code: Option<String>,
}
