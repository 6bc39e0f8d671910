//! Fixed, bounded request plans for the usage generator.

use serde::Serialize;

use crate::config::{GeneratorConfig, GeneratorProfile};

/// Hard upper bound on requests in any plan.
pub const MAX_GENERATED_REQUESTS: usize = 25;

const CHAT_MODELS: &[&str] = &["gpt-4o-mini", "gpt-4o", "gpt-3.5-turbo"];

const CHEAP_CHAT_MODEL: &str = "gpt-3.5-turbo";

const EMBEDDING_MODEL: &str = "text-embedding-3-small";

const CHAT_PROMPTS: &[&str] = &[
    "Write a short poem about artificial intelligence",
    "Explain quantum computing in simple terms",
    "Create a recipe for chocolate chip cookies",
    "Write a brief story about a robot learning to paint",
    "Explain the difference between machine learning and deep learning",
    "Create a marketing slogan for a sustainable energy company",
    "Write a short description of a futuristic city",
    "Explain how photosynthesis works",
];

const SHORT_PROMPTS: &[&str] = &["Say hi", "Count to 3", "Name a color", "What is 2+2?"];

const EMBEDDING_INPUTS: &[&str] = &[
    "Artificial intelligence is transforming the way we work and live",
    "Machine learning algorithms can identify patterns in large datasets",
    "Natural language processing enables computers to understand human language",
    "Computer vision allows machines to interpret and analyze visual information",
];

const SHORT_EMBEDDING_INPUTS: &[&str] = &["Hello", "Test", "AI", "Data"];

const MODERATION_INPUTS: &[&str] = &[
    "This is a completely normal and appropriate text for testing.",
    "I love spending time with my family and friends on weekends.",
    "Programming is a great skill to learn for career development.",
];

/// One billed request the generator will issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GenerationRequest {
    /// Single-token chat completion to confirm the key can be billed.
    AccountCheck,
    /// Chat completion.
    Chat {
        model: String,
        prompt: String,
        max_tokens: u32,
    },
    /// Embedding of one input string.
    Embedding { model: String, input: String },
    /// Moderation check of one input string.
    Moderation { input: String },
}

impl GenerationRequest {
    /// Short label for logs and summaries.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::AccountCheck => "account check",
            Self::Chat { .. } => "chat completion",
            Self::Embedding { .. } => "embedding",
            Self::Moderation { .. } => "moderation",
        }
    }
}

/// Ordered, bounded list of requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationPlan {
    requests: Vec<GenerationRequest>,
}

impl GenerationPlan {
    /// Wrap an explicit request list, truncated to [`MAX_GENERATED_REQUESTS`].
    #[must_use]
    pub fn from_requests(mut requests: Vec<GenerationRequest>) -> Self {
        requests.truncate(MAX_GENERATED_REQUESTS);
        Self { requests }
    }

    /// Build the plan described by the generator settings.
    #[must_use]
    pub fn for_config(config: &GeneratorConfig) -> Self {
        let chat_override = config.requests.map(|n| n as usize);
        match config.profile {
            GeneratorProfile::Minimal => Self::minimal(chat_override),
            GeneratorProfile::Standard => Self::standard(chat_override),
        }
    }

    /// Account check, short chats on the cheapest model, one tiny embedding.
    #[must_use]
    pub fn minimal(chat_count: Option<usize>) -> Self {
        let mut requests = vec![GenerationRequest::AccountCheck];
        requests.extend((0..chat_count.unwrap_or(2)).map(|i| GenerationRequest::Chat {
            model: CHEAP_CHAT_MODEL.to_string(),
            prompt: rotate(SHORT_PROMPTS, i).to_string(),
            max_tokens: 10,
        }));
        requests.push(GenerationRequest::Embedding {
            model: EMBEDDING_MODEL.to_string(),
            input: rotate(SHORT_EMBEDDING_INPUTS, 0).to_string(),
        });
        Self::from_requests(requests)
    }

    /// Chats across several models, embeddings and moderations.
    #[must_use]
    pub fn standard(chat_count: Option<usize>) -> Self {
        let mut requests = chat_requests(chat_count.unwrap_or(8));
        requests.extend((0..4).map(|i| GenerationRequest::Embedding {
            model: EMBEDDING_MODEL.to_string(),
            input: rotate(EMBEDDING_INPUTS, i).to_string(),
        }));
        requests.extend((0..3).map(|i| GenerationRequest::Moderation {
            input: rotate(MODERATION_INPUTS, i).to_string(),
        }));
        Self::from_requests(requests)
    }

    /// Exactly `count` chat completions, rotating models and prompts.
    #[must_use]
    pub fn chat_completions(count: usize) -> Self {
        Self::from_requests(chat_requests(count))
    }

    /// Requests in issue order.
    #[must_use]
    pub fn requests(&self) -> &[GenerationRequest] {
        &self.requests
    }

    /// Number of requests.
    #[must_use]
    pub fn len(&self) -> usize {
        self.requests.len()
    }

    /// Whether the plan issues nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }
}

fn chat_requests(count: usize) -> Vec<GenerationRequest> {
    (0..count.min(MAX_GENERATED_REQUESTS))
        .map(|i| GenerationRequest::Chat {
            model: rotate(CHAT_MODELS, i).to_string(),
            prompt: rotate(CHAT_PROMPTS, i).to_string(),
            max_tokens: 100 + 50 * u32::try_from(i % 5).unwrap_or(0),
        })
        .collect()
}

fn rotate<'a>(items: &[&'a str], i: usize) -> &'a str {
    items[i % items.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_plan_shape() {
        let plan = GenerationPlan::minimal(None);
        assert_eq!(plan.len(), 4);
        assert_eq!(plan.requests()[0], GenerationRequest::AccountCheck);
        assert!(matches!(
            plan.requests()[3],
            GenerationRequest::Embedding { .. }
        ));
    }

    #[test]
    fn test_standard_plan_shape() {
        let plan = GenerationPlan::standard(None);
        assert_eq!(plan.len(), 15);
        let chats = plan
            .requests()
            .iter()
            .filter(|r| matches!(r, GenerationRequest::Chat { .. }))
            .count();
        assert_eq!(chats, 8);
    }

    #[test]
    fn test_chat_override() {
        let config = GeneratorConfig {
            profile: GeneratorProfile::Minimal,
            requests: Some(5),
            delay_ms: 0,
        };
        let plan = GenerationPlan::for_config(&config);
        assert_eq!(plan.len(), 7);
    }

    #[test]
    fn test_plan_is_bounded() {
        assert_eq!(
            GenerationPlan::chat_completions(1_000).len(),
            MAX_GENERATED_REQUESTS
        );
        assert_eq!(
            GenerationPlan::standard(Some(100)).len(),
            MAX_GENERATED_REQUESTS
        );
    }

    #[test]
    fn test_plan_is_deterministic() {
        assert_eq!(
            GenerationPlan::standard(None),
            GenerationPlan::standard(None)
        );
    }

    #[test]
    fn test_chats_rotate_models() {
        let plan = GenerationPlan::chat_completions(3);
        let models: Vec<&str> = plan
            .requests()
            .iter()
            .filter_map(|r| match r {
                GenerationRequest::Chat { model, .. } => Some(model.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(models, vec!["gpt-4o-mini", "gpt-4o", "gpt-3.5-turbo"]);
    }
}
