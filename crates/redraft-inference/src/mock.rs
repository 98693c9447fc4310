//! Mock backends for deterministic testing.
//!
//! Provides scripted implementations of [`GenerationBackend`] and
//! [`EmbeddingBackend`] so store, prompt, and pipeline code can be tested
//! without a live inference endpoint.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::stream::{self, StreamExt};

use redraft_core::{
    EmbeddingBackend, Error, GenerationBackend, PromptMessage, Result, TokenStream, Vector,
};

// ---------------------------------------------------------------------------
// Generation
// ---------------------------------------------------------------------------

/// Scripted generation backend.
///
/// Responses are popped from a queue in order; when the queue is exhausted
/// the default response is returned. Every call records the full message
/// list for later assertion.
#[derive(Clone)]
pub struct MockGenerationBackend {
    config: Arc<MockConfig>,
    scripted: Arc<Mutex<VecDeque<String>>>,
    calls: Arc<Mutex<Vec<Vec<PromptMessage>>>>,
}

#[derive(Debug, Clone)]
struct MockConfig {
    default_response: String,
    latency_ms: u64,
    failure_rate: f64,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            default_response: "Mock response".to_string(),
            latency_ms: 0,
            failure_rate: 0.0,
        }
    }
}

impl MockGenerationBackend {
    pub fn new() -> Self {
        Self {
            config: Arc::new(MockConfig::default()),
            scripted: Arc::new(Mutex::new(VecDeque::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Set the response returned when no scripted response is queued.
    pub fn with_default_response(mut self, response: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.config).default_response = response.into();
        self
    }

    /// Queue a response to be returned by the next unanswered call.
    pub fn with_scripted_response(self, response: impl Into<String>) -> Self {
        self.scripted.lock().unwrap().push_back(response.into());
        self
    }

    /// Set simulated latency for all operations.
    pub fn with_latency_ms(mut self, latency_ms: u64) -> Self {
        Arc::make_mut(&mut self.config).latency_ms = latency_ms;
        self
    }

    /// Set failure rate (0.0 - 1.0) for testing error handling.
    pub fn with_failure_rate(mut self, rate: f64) -> Self {
        Arc::make_mut(&mut self.config).failure_rate = rate.clamp(0.0, 1.0);
        self
    }

    /// All message lists received so far, in call order.
    pub fn calls(&self) -> Vec<Vec<PromptMessage>> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn next_response(&self, messages: &[PromptMessage]) -> Result<String> {
        self.calls.lock().unwrap().push(messages.to_vec());
        if self.should_fail() {
            return Err(Error::Inference("simulated failure".to_string()));
        }
        Ok(self
            .scripted
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.config.default_response.clone()))
    }

    fn should_fail(&self) -> bool {
        use rand::Rng;
        self.config.failure_rate > 0.0
            && rand::thread_rng().gen::<f64>() < self.config.failure_rate
    }

    async fn simulate_latency(&self) {
        if self.config.latency_ms > 0 {
            tokio::time::sleep(tokio::time::Duration::from_millis(self.config.latency_ms)).await;
        }
    }
}

impl Default for MockGenerationBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GenerationBackend for MockGenerationBackend {
    async fn complete(&self, messages: &[PromptMessage]) -> Result<String> {
        self.simulate_latency().await;
        self.next_response(messages)
    }

    /// Stream the scripted response split into word-sized deltas, mimicking
    /// how a real endpoint trickles tokens. The configured latency applies
    /// before each delta, not up front, so cancellation mid-stream is
    /// exercisable.
    async fn complete_stream(&self, messages: &[PromptMessage]) -> Result<TokenStream> {
        let response = self.next_response(messages)?;
        let latency_ms = self.config.latency_ms;

        let deltas: Vec<Result<String>> = response
            .split_inclusive(' ')
            .map(|piece| Ok(piece.to_string()))
            .collect();

        Ok(Box::pin(stream::iter(deltas).then(move |delta| async move {
            if latency_ms > 0 {
                tokio::time::sleep(tokio::time::Duration::from_millis(latency_ms)).await;
            }
            delta
        })))
    }

    fn model_name(&self) -> &str {
        "mock-gen"
    }
}

// ---------------------------------------------------------------------------
// Embedding
// ---------------------------------------------------------------------------

/// Deterministic embedding backend.
///
/// The same text always produces the same unit vector, so similarity-based
/// assertions are stable across runs.
#[derive(Debug, Clone)]
pub struct MockEmbeddingBackend {
    dimension: usize,
}

impl MockEmbeddingBackend {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }

    /// Character-hash embedding, normalized to unit length.
    pub fn embed_one(&self, text: &str) -> Vector {
        let mut vec = vec![0.0f32; self.dimension];
        for (i, c) in text.chars().enumerate() {
            let idx = (c as usize + i) % self.dimension;
            vec[idx] += 0.1;
        }
        let norm: f32 = vec.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vec {
                *v /= norm;
            }
        }
        vec
    }
}

impl Default for MockEmbeddingBackend {
    fn default() -> Self {
        Self::new(8)
    }
}

#[async_trait]
impl EmbeddingBackend for MockEmbeddingBackend {
    async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vector>> {
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        "mock-embed"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test]
    async fn scripted_responses_pop_in_order() {
        let backend = MockGenerationBackend::new()
            .with_scripted_response("first")
            .with_scripted_response("second")
            .with_default_response("fallback");

        let messages = vec![PromptMessage::user("hi")];
        assert_eq!(backend.complete(&messages).await.unwrap(), "first");
        assert_eq!(backend.complete(&messages).await.unwrap(), "second");
        assert_eq!(backend.complete(&messages).await.unwrap(), "fallback");
        assert_eq!(backend.call_count(), 3);
    }

    #[tokio::test]
    async fn calls_record_full_message_lists() {
        let backend = MockGenerationBackend::new();
        let messages = vec![
            PromptMessage::system("rules"),
            PromptMessage::user("question"),
        ];
        backend.complete(&messages).await.unwrap();

        let calls = backend.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].len(), 2);
        assert_eq!(calls[0][1].content, "question");
    }

    #[tokio::test]
    async fn stream_concatenates_to_full_response() {
        let backend =
            MockGenerationBackend::new().with_scripted_response("one two three");
        let mut stream = backend
            .complete_stream(&[PromptMessage::user("go")])
            .await
            .unwrap();

        let mut collected = String::new();
        let mut count = 0;
        while let Some(delta) = stream.next().await {
            collected.push_str(&delta.unwrap());
            count += 1;
        }
        assert_eq!(collected, "one two three");
        assert!(count > 1, "response should be split into multiple deltas");
    }

    #[tokio::test]
    async fn full_failure_rate_always_errors() {
        let backend = MockGenerationBackend::new().with_failure_rate(1.0);
        let result = backend.complete(&[PromptMessage::user("hi")]).await;
        assert!(matches!(result, Err(Error::Inference(_))));
    }

    #[tokio::test]
    async fn embeddings_are_deterministic_unit_vectors() {
        let backend = MockEmbeddingBackend::new(16);
        let texts = vec!["alpha".to_string(), "alpha".to_string(), "beta".to_string()];
        let vecs = backend.embed_texts(&texts).await.unwrap();

        assert_eq!(vecs[0], vecs[1]);
        assert_ne!(vecs[0], vecs[2]);
        let norm: f32 = vecs[0].iter().map(|v| v * v).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }
}
