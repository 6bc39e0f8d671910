//! Wire types for the billed endpoints the generator calls.

use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub(crate) struct ChatMessage<'a> {
    pub role: &'static str,
    pub content: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct ChatRequest<'a> {
    pub model: &'a str,
    pub messages: Vec<ChatMessage<'a>>,
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

#[derive(Debug, Default, Deserialize)]
#[allow(clippy::struct_field_names)]
pub(crate) struct ChatUsage {
    #[serde(default)]
    pub prompt_tokens: u64,
    #[serde(default)]
    pub completion_tokens: u64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatResponse {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub usage: ChatUsage,
}

#[derive(Debug, Serialize)]
pub(crate) struct EmbeddingRequest<'a> {
    pub model: &'a str,
    pub input: &'a str,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct EmbeddingUsage {
    #[serde(default)]
    pub prompt_tokens: u64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EmbeddingResponse {
    #[serde(default)]
    pub usage: EmbeddingUsage,
}

#[derive(Debug, Serialize)]
pub(crate) struct ModerationRequest<'a> {
    pub input: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ModerationResult {
    #[serde(default)]
    pub flagged: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ModerationResponse {
    #[serde(default)]
    pub results: Vec<ModerationResult>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_chat_request_shape() {
        let request = ChatRequest {
            model: "gpt-3.5-turbo",
            messages: vec![ChatMessage {
                role: "user",
                content: "Say hi",
            }],
            max_tokens: 10,
            temperature: None,
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "model": "gpt-3.5-turbo",
                "messages": [{"role": "user", "content": "Say hi"}],
                "max_tokens": 10
            })
        );
    }

    #[test]
    fn test_chat_response_without_usage() {
        let response: ChatResponse = serde_json::from_value(json!({"id": "chatcmpl-1"})).unwrap();
        assert_eq!(response.usage.prompt_tokens, 0);
        assert!(response.model.is_none());
    }

    #[test]
    fn test_moderation_response() {
        let response: ModerationResponse =
            serde_json::from_value(json!({"results": [{"flagged": true}]})).unwrap();
        assert!(response.results[0].flagged);
    }
}
