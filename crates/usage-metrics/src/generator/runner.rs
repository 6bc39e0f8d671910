//! Sequential execution of a generation plan.

use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use super::models::{
    ChatMessage, ChatRequest, ChatResponse, EmbeddingRequest, EmbeddingResponse,
    ModerationRequest, ModerationResponse,
};
use super::plan::{GenerationPlan, GenerationRequest};
use crate::client::MetricsClient;
use crate::config::GeneratorConfig;
use crate::error::MetricsResult;

const CHAT_PATH: &str = "/chat/completions";
const EMBEDDINGS_PATH: &str = "/embeddings";
const MODERATIONS_PATH: &str = "/moderations";

const ACCOUNT_CHECK_MODEL: &str = "gpt-3.5-turbo";

/// Result of one successful generated call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallOutcome {
    /// Request kind, e.g. `chat completion`.
    pub kind: &'static str,
    /// Model that served the call, when known.
    pub model: Option<String>,
    /// Prompt/input tokens billed.
    pub input_tokens: u64,
    /// Completion tokens billed.
    pub output_tokens: u64,
    /// Moderation verdict, for moderation calls.
    pub flagged: Option<bool>,
}

/// Per-call outcomes and totals of a completed run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GenerationSummary {
    /// Outcomes in issue order.
    pub calls: Vec<CallOutcome>,
}

impl GenerationSummary {
    /// Number of successful calls.
    #[must_use]
    pub fn successful_calls(&self) -> usize {
        self.calls.len()
    }

    /// Input tokens across all calls, saturating.
    #[must_use]
    pub fn total_input_tokens(&self) -> u64 {
        self.calls
            .iter()
            .fold(0, |acc, c| acc.saturating_add(c.input_tokens))
    }

    /// Output tokens across all calls, saturating.
    #[must_use]
    pub fn total_output_tokens(&self) -> u64 {
        self.calls
            .iter()
            .fold(0, |acc, c| acc.saturating_add(c.output_tokens))
    }
}

/// Issues billed requests through a [`MetricsClient`].
pub struct UsageGenerator<'a> {
    client: &'a MetricsClient,
    delay: Duration,
}

impl<'a> UsageGenerator<'a> {
    /// Create a generator using the configured pause between calls.
    #[must_use]
    pub fn new(client: &'a MetricsClient, config: &GeneratorConfig) -> Self {
        Self {
            client,
            delay: Duration::from_millis(config.delay_ms),
        }
    }

    /// Override the pause between calls.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Issue every request in `plan`, in order.
    ///
    /// # Errors
    ///
    /// The first failing call aborts the run and its error is returned;
    /// no later request is issued.
    #[instrument(skip(self, plan), fields(requests = plan.len()))]
    pub async fn run(&self, plan: &GenerationPlan) -> MetricsResult<GenerationSummary> {
        let mut summary = GenerationSummary::default();
        let total = plan.len();

        for (index, request) in plan.requests().iter().enumerate() {
            if index > 0 && !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }

            debug!(call = index + 1, total, kind = request.label(), "Issuing request");
            let outcome = match self.issue(request).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    warn!(
                        call = index + 1,
                        total,
                        kind = request.label(),
                        error = %e,
                        "Generated request failed, aborting"
                    );
                    return Err(e);
                }
            };
            summary.calls.push(outcome);
        }

        info!(
            calls = summary.successful_calls(),
            input_tokens = summary.total_input_tokens(),
            output_tokens = summary.total_output_tokens(),
            "Usage generation complete"
        );
        Ok(summary)
    }

    async fn issue(&self, request: &GenerationRequest) -> MetricsResult<CallOutcome> {
        match request {
            GenerationRequest::AccountCheck => {
                let mut outcome = self.chat(ACCOUNT_CHECK_MODEL, "Hi", 1).await?;
                outcome.kind = request.label();
                Ok(outcome)
            }
            GenerationRequest::Chat {
                model,
                prompt,
                max_tokens,
            } => self.chat(model, prompt, *max_tokens).await,
            GenerationRequest::Embedding { model, input } => {
                let body = EmbeddingRequest { model, input };
                let response: EmbeddingResponse =
                    self.client.post_json(EMBEDDINGS_PATH, &body).await?;
                Ok(CallOutcome {
                    kind: request.label(),
                    model: Some(model.clone()),
                    input_tokens: response.usage.prompt_tokens,
                    output_tokens: 0,
                    flagged: None,
                })
            }
            GenerationRequest::Moderation { input } => {
                let body = ModerationRequest { input };
                let response: ModerationResponse =
                    self.client.post_json(MODERATIONS_PATH, &body).await?;
                Ok(CallOutcome {
                    kind: request.label(),
                    model: None,
                    input_tokens: 0,
                    output_tokens: 0,
                    flagged: Some(response.results.iter().any(|r| r.flagged)),
                })
            }
        }
    }

    async fn chat(&self, model: &str, prompt: &str, max_tokens: u32) -> MetricsResult<CallOutcome> {
        let body = ChatRequest {
            model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            max_tokens,
            temperature: Some(0.7),
        };
        let response: ChatResponse = self.client.post_json(CHAT_PATH, &body).await?;
        Ok(CallOutcome {
            kind: "chat completion",
            model: Some(response.model.unwrap_or_else(|| model.to_string())),
            input_tokens: response.usage.prompt_tokens,
            output_tokens: response.usage.completion_tokens,
            flagged: None,
        })
    }
}
