//! Core traits for redraft abstractions.
//!
//! These traits define the seams between the pipeline and its external
//! collaborators: the completion/embedding provider, the durable turn log,
//! and the document store. Persistence and the model endpoint are out of
//! scope for this crate; concrete implementations live elsewhere and tests
//! use in-memory or mock versions.

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{ChatTurn, PromptMessage, Vector};

// =============================================================================
// INFERENCE TRAITS
// =============================================================================

/// Ordered stream of decoded text deltas from a completion endpoint.
///
/// Items arrive in decode order; an `Err` item is terminal (transport
/// failure). Dropping the stream closes the underlying transport.
pub type TokenStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// Backend for generating text embeddings.
#[async_trait]
pub trait EmbeddingBackend: Send + Sync {
    /// Generate embeddings for the given texts.
    ///
    /// Returns a vector of embedding vectors, one per input text.
    async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vector>>;

    /// Get the expected dimension of embedding vectors.
    fn dimension(&self) -> usize;

    /// Get the model name being used.
    fn model_name(&self) -> &str;
}

/// Backend for chat completion (LLM).
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Complete a role-tagged message sequence, returning the full response.
    async fn complete(&self, messages: &[PromptMessage]) -> Result<String>;

    /// Complete a message sequence as a live stream of text deltas.
    async fn complete_stream(&self, messages: &[PromptMessage]) -> Result<TokenStream>;

    /// Get the model name being used.
    fn model_name(&self) -> &str;
}

// =============================================================================
// PERSISTENCE TRAITS (interfaces only — implementations are external)
// =============================================================================

/// Durable append-only log of conversational turns.
#[async_trait]
pub trait TurnLog: Send + Sync {
    /// Append a turn. Turns are immutable once appended.
    async fn append(&self, turn: &ChatTurn) -> Result<()>;

    /// The most recent `limit` turns for a user, newest first.
    async fn recent(&self, user_id: Uuid, limit: usize) -> Result<Vec<ChatTurn>>;

    /// All turns for a user, oldest first (the history listing surface).
    async fn list(&self, user_id: Uuid) -> Result<Vec<ChatTurn>>;
}

/// Store of document markup, owned by the excluded persistence layer.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch the current markup of a document.
    async fn get_content(&self, document_id: Uuid) -> Result<String>;

    /// Replace the markup of a document.
    async fn set_content(&self, document_id: Uuid, markup: &str) -> Result<()>;
}
