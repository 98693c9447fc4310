//! OpenAI-compatible HTTP backend for completion and embedding.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, instrument, warn};

use redraft_core::{
    EmbeddingBackend, Error, GenerationBackend, PromptMessage, Result, TokenStream, Vector,
};

use crate::config::CompletionConfig;
use crate::decoder::decode_stream;
use crate::types::{
    ApiErrorResponse, ChatCompletionRequest, ChatCompletionResponse, ChatMessage,
    EmbeddingRequest, EmbeddingResponse,
};

/// Backend speaking the OpenAI chat-completions and embeddings protocol.
/// Works against api.openai.com as well as local OpenAI-compatible servers.
#[derive(Debug, Clone)]
pub struct OpenAICompatBackend {
    client: Client,
    config: CompletionConfig,
}

impl OpenAICompatBackend {
    pub fn new(config: CompletionConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, config })
    }

    /// Build a backend from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::new(CompletionConfig::from_env())
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn post(&self, path: &str) -> reqwest::RequestBuilder {
        let mut req = self.client.post(self.endpoint(path));
        if let Some(key) = &self.config.api_key {
            req = req.bearer_auth(key);
        }
        req
    }

    async fn error_from_response(response: reqwest::Response) -> Error {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ApiErrorResponse>(&body)
            .map(|e| e.error.message)
            .unwrap_or(body);
        Error::Inference(format!("API returned {status}: {message}"))
    }

    fn chat_request(&self, messages: &[PromptMessage], stream: bool) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.config.gen_model.clone(),
            messages: messages.iter().map(ChatMessage::from).collect(),
            stream,
        }
    }
}

#[async_trait]
impl GenerationBackend for OpenAICompatBackend {
    #[instrument(skip(self, messages), fields(
        subsystem = "inference",
        op = "complete",
        model = %self.config.gen_model,
        prompt_len = messages.iter().map(|m| m.content.len()).sum::<usize>(),
    ))]
    async fn complete(&self, messages: &[PromptMessage]) -> Result<String> {
        let response = self
            .post("chat/completions")
            .json(&self.chat_request(messages, false))
            .send()
            .await
            .map_err(|e| Error::Request(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| Error::Inference(format!("malformed completion response: {e}")))?;

        let content = completion
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| Error::Inference("completion returned no choices".to_string()))?;

        debug!(response_len = content.len(), "completion received");
        Ok(content)
    }

    async fn complete_stream(&self, messages: &[PromptMessage]) -> Result<TokenStream> {
        debug!(
            model = %self.config.gen_model,
            message_count = messages.len(),
            "starting streaming completion"
        );
        let response = self
            .post("chat/completions")
            .json(&self.chat_request(messages, true))
            .send()
            .await
            .map_err(|e| Error::Request(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        Ok(decode_stream(response.bytes_stream()))
    }

    fn model_name(&self) -> &str {
        &self.config.gen_model
    }
}

#[async_trait]
impl EmbeddingBackend for OpenAICompatBackend {
    #[instrument(skip(self, texts), fields(
        subsystem = "inference",
        op = "embed_texts",
        model = %self.config.embed_model,
        chunk_count = texts.len(),
    ))]
    async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vector>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let request = EmbeddingRequest {
            model: self.config.embed_model.clone(),
            input: texts.to_vec(),
        };
        let response = self
            .post("embeddings")
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Request(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        let parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| Error::Embedding(format!("malformed embedding response: {e}")))?;

        if parsed.data.len() != texts.len() {
            return Err(Error::Embedding(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                parsed.data.len()
            )));
        }

        // The API is free to reorder; restore input order by index.
        let mut data = parsed.data;
        data.sort_by_key(|d| d.index);

        for d in &data {
            if d.embedding.len() != self.config.embed_dimension {
                warn!(
                    expected = self.config.embed_dimension,
                    actual = d.embedding.len(),
                    "embedding dimension mismatch"
                );
                return Err(Error::Embedding(format!(
                    "expected dimension {}, got {}",
                    self.config.embed_dimension,
                    d.embedding.len()
                )));
            }
        }

        Ok(data.into_iter().map(|d| d.embedding).collect())
    }

    fn dimension(&self) -> usize {
        self.config.embed_dimension
    }

    fn model_name(&self) -> &str {
        &self.config.embed_model
    }
}
