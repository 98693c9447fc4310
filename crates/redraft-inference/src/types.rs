//! Wire types for OpenAI-compatible chat completion and embedding APIs.

use serde::{Deserialize, Serialize};

use redraft_core::PromptMessage;

// ---------------------------------------------------------------------------
// Chat completion request
// ---------------------------------------------------------------------------

/// One role-tagged message on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl From<&PromptMessage> for ChatMessage {
    fn from(msg: &PromptMessage) -> Self {
        Self {
            role: msg.role.to_string(),
            content: msg.content.clone(),
        }
    }
}

/// Chat completion request body.
#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub stream: bool,
}

// ---------------------------------------------------------------------------
// Non-streamed response
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionResponse {
    pub choices: Vec<ChatCompletionChoice>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionChoice {
    pub message: ChatMessage,
}

// ---------------------------------------------------------------------------
// Streamed payload shapes
// ---------------------------------------------------------------------------

/// Incremental content delta inside a streamed chat chunk.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatDelta {
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatChunkChoice {
    pub delta: ChatDelta,
}

/// One SSE payload from a streaming endpoint. Two shapes are recognized:
/// the plain `{response}` record some gateway-style endpoints emit, and
/// the OpenAI chat-delta `{choices[0].delta.content}` shape.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum StreamPayload {
    Text { response: String },
    Chat { choices: Vec<ChatChunkChoice> },
}

impl StreamPayload {
    /// Extract the text delta carried by this payload, if any.
    pub fn into_delta(self) -> Option<String> {
        match self {
            StreamPayload::Text { response } => (!response.is_empty()).then_some(response),
            StreamPayload::Chat { choices } => {
                let mut content = String::new();
                for choice in choices {
                    if let Some(c) = choice.delta.content {
                        content.push_str(&c);
                    }
                }
                (!content.is_empty()).then_some(content)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Embeddings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct EmbeddingRequest {
    pub model: String,
    pub input: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingResponse {
    pub data: Vec<EmbeddingData>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingData {
    pub index: usize,
    pub embedding: Vec<f32>,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiError,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiError {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use redraft_core::Role;

    #[test]
    fn chat_message_from_prompt_message() {
        let msg = PromptMessage {
            role: Role::System,
            content: "you are helpful".to_string(),
        };
        let wire: ChatMessage = (&msg).into();
        assert_eq!(wire.role, "system");
        assert_eq!(wire.content, "you are helpful");
    }

    #[test]
    fn stream_payload_parses_text_shape() {
        let payload: StreamPayload = serde_json::from_str(r#"{"response":"Hello"}"#).unwrap();
        assert_eq!(payload.into_delta(), Some("Hello".to_string()));
    }

    #[test]
    fn stream_payload_parses_chat_delta_shape() {
        let payload: StreamPayload = serde_json::from_str(
            r#"{"id":"x","choices":[{"index":0,"delta":{"content":"Hi"},"finish_reason":null}]}"#,
        )
        .unwrap();
        assert_eq!(payload.into_delta(), Some("Hi".to_string()));
    }

    #[test]
    fn stream_payload_empty_delta_is_none() {
        let payload: StreamPayload =
            serde_json::from_str(r#"{"choices":[{"delta":{}}]}"#).unwrap();
        assert_eq!(payload.into_delta(), None);

        let payload: StreamPayload = serde_json::from_str(r#"{"response":""}"#).unwrap();
        assert_eq!(payload.into_delta(), None);
    }

    #[test]
    fn stream_payload_role_only_delta_is_none() {
        let payload: StreamPayload =
            serde_json::from_str(r#"{"choices":[{"delta":{"role":"assistant"}}]}"#).unwrap();
        assert_eq!(payload.into_delta(), None);
    }
}
