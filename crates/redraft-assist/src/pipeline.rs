//! The request-scoped assistant pipeline.
//!
//! One [`Assistant`] instance wires the knowledge store, history cache,
//! prompt assembler, and completion backend together. Each request is an
//! independent invocation; the only shared mutable state is the store and
//! the cache, which serialize their own writers.
//!
//! Conversational requests stream: every decoded delta is pushed to the
//! caller as soon as it arrives, and cancellation drops the transport
//! without persisting a partial assistant turn. Agent rewrites are a
//! single non-streamed call guarded by a document size cap.

use std::sync::Arc;
use std::time::Instant;

use futures::StreamExt;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use redraft_core::{
    defaults, AgentRewrite, AssistRequest, ChatMode, ChatTurn, ChunkScope, DocumentStore,
    EmbeddingBackend, Error, GenerationBackend, Result, Role, StreamFrame,
};
use redraft_store::{ChunkerConfig, HistoryCache, KnowledgeStore, RetrievalQuery};

use crate::diff;
use crate::prompt::{select_template, PromptAssembler, PromptContext, PromptTemplate};
use crate::review::ReviewSession;

/// Tunables for one assistant instance.
#[derive(Debug, Clone)]
pub struct AssistantConfig {
    /// Maximum chunks pulled into the prompt per request.
    pub retrieve_k: usize,
    /// Token budget for history included in a prompt.
    pub history_token_budget: usize,
    /// Byte cap on documents eligible for a full rewrite.
    pub rewrite_max_bytes: usize,
    /// Character cap on incoming prompt text.
    pub prompt_max_chars: usize,
    /// Chunking parameters used at ingestion.
    pub chunker: ChunkerConfig,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            retrieve_k: defaults::RETRIEVE_K,
            history_token_budget: defaults::HISTORY_TOKEN_BUDGET,
            rewrite_max_bytes: defaults::REWRITE_MAX_BYTES,
            prompt_max_chars: defaults::PROMPT_MAX_CHARS,
            chunker: ChunkerConfig::default(),
        }
    }
}

/// The assistant pipeline. Cheap to clone; all fields are shared handles.
#[derive(Clone)]
pub struct Assistant {
    knowledge: Arc<KnowledgeStore>,
    history: Arc<HistoryCache>,
    generation: Arc<dyn GenerationBackend>,
    embedding: Option<Arc<dyn EmbeddingBackend>>,
    documents: Arc<dyn DocumentStore>,
    assembler: PromptAssembler,
    config: AssistantConfig,
}

impl Assistant {
    pub fn new(
        knowledge: Arc<KnowledgeStore>,
        history: Arc<HistoryCache>,
        generation: Arc<dyn GenerationBackend>,
        documents: Arc<dyn DocumentStore>,
    ) -> Self {
        Self {
            knowledge,
            history,
            generation,
            embedding: None,
            documents,
            assembler: PromptAssembler::new(),
            config: AssistantConfig::default(),
        }
    }

    /// Attach an embedding backend; retrieval queries then carry a query
    /// vector and ingestion embeds chunks.
    pub fn with_embedding(mut self, embedding: Arc<dyn EmbeddingBackend>) -> Self {
        self.embedding = Some(embedding);
        self
    }

    pub fn with_config(mut self, config: AssistantConfig) -> Self {
        self.config = config;
        self
    }

    /// Chunk, embed, and index one document's extracted text.
    #[instrument(skip(self, text), fields(subsystem = "assist", op = "ingest"))]
    pub async fn ingest_document(
        &self,
        scope: ChunkScope,
        title: &str,
        file_name: &str,
        text: &str,
    ) -> Result<usize> {
        self.knowledge
            .ingest(
                scope,
                title,
                file_name,
                text,
                &self.config.chunker,
                self.embedding.as_deref(),
            )
            .await
    }

    /// Handle one conversational turn as a stream of frames.
    ///
    /// Returns as soon as the model call is dispatched; frames arrive on
    /// the receiver in decode order. Cancelling `cancel` closes the
    /// transport, stops decoding, and skips persisting the partial
    /// assistant turn. A token already cancelled at dispatch rejects the
    /// request with [`Error::Cancelled`].
    #[instrument(skip(self, request, cancel), fields(
        subsystem = "assist",
        op = "chat",
        user_id = %user_id,
        mode = %request.mode,
    ))]
    pub async fn chat(
        &self,
        user_id: Uuid,
        request: AssistRequest,
        cancel: CancellationToken,
    ) -> Result<mpsc::Receiver<StreamFrame>> {
        self.validate_prompt(&request.prompt_text)?;
        let template = select_template(request.mode, request.document_id.is_some(), false)?;
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        // Assemble from prior history only: the new turn is persisted after
        // message building so the prompt carries the query exactly once, in
        // the final templated user message.
        let messages = self.build_messages(user_id, &request, template).await?;

        // Best-effort persistence: a log failure must not block the answer,
        // but it has to be observable.
        if let Err(e) = self
            .history
            .append(user_id, Role::User, &request.prompt_text, request.mode, None)
            .await
        {
            warn!(user_id = %user_id, error = %e, "Failed to persist user turn");
        }

        let mut stream = self.generation.complete_stream(&messages).await?;

        let (tx, rx) = mpsc::channel(defaults::STREAM_CHANNEL_CAPACITY);
        let history = Arc::clone(&self.history);
        let mode = request.mode;

        tokio::spawn(async move {
            let started = Instant::now();
            let mut response = String::new();
            let mut delta_count = 0usize;

            loop {
                let delta = tokio::select! {
                    _ = cancel.cancelled() => {
                        debug!(user_id = %user_id, delta_count, "Stream cancelled");
                        return;
                    }
                    delta = stream.next() => delta,
                };

                match delta {
                    Some(Ok(content)) => {
                        delta_count += 1;
                        response.push_str(&content);
                        if tx.send(StreamFrame::Chunk { content }).await.is_err() {
                            // Receiver gone: treat like cancellation.
                            return;
                        }
                    }
                    Some(Err(e)) => {
                        warn!(user_id = %user_id, error = %e, "Stream failed");
                        let _ = tx
                            .send(StreamFrame::Error {
                                message: e.to_string(),
                            })
                            .await;
                        return;
                    }
                    None => break,
                }
            }

            if !response.is_empty() {
                if let Err(e) = history
                    .append(user_id, Role::Assistant, &response, mode, None)
                    .await
                {
                    warn!(user_id = %user_id, error = %e, "Failed to persist assistant turn");
                }
            }

            info!(
                user_id = %user_id,
                delta_count,
                response_len = response.len(),
                duration_ms = started.elapsed().as_millis() as u64,
                "Chat turn completed"
            );
        });

        Ok(rx)
    }

    /// Handle one agent full-rewrite request.
    ///
    /// Fetches the document, rejects it if over the size cap before any
    /// model call, asks for an exhaustive rewrite, validates the output
    /// shape, and returns the original, the proposal, and their diff.
    #[instrument(skip(self, request), fields(
        subsystem = "assist",
        op = "agent_rewrite",
        user_id = %user_id,
    ))]
    pub async fn agent_rewrite(
        &self,
        user_id: Uuid,
        request: &AssistRequest,
    ) -> Result<AgentRewrite> {
        self.validate_prompt(&request.prompt_text)?;
        select_template(request.mode, request.document_id.is_some(), true)?;
        let document_id = request
            .document_id
            .ok_or_else(|| Error::InvalidInput("agent rewrite requires a document".to_string()))?;

        let original = self.documents.get_content(document_id).await?;
        if original.len() > self.config.rewrite_max_bytes {
            return Err(Error::DocumentTooLarge {
                size: original.len(),
                max: self.config.rewrite_max_bytes,
            });
        }

        if let Err(e) = self
            .history
            .append(user_id, Role::User, &request.prompt_text, ChatMode::Agent, None)
            .await
        {
            warn!(user_id = %user_id, error = %e, "Failed to persist user turn");
        }

        let messages = self
            .assembler
            .assemble_rewrite(&request.prompt_text, None, &original);
        let proposed = self.generation.complete(&messages).await?;
        let proposed = proposed.trim().to_string();

        // A valid full rewrite is the document markup itself, so it must
        // open with a tag. Anything else (commentary, fencing, emptiness)
        // is retryable and produces no diff.
        if !proposed.starts_with('<') {
            return Err(Error::MalformedRewrite(
                "rewrite output does not start with a markup tag".to_string(),
            ));
        }

        let diff_html = diff::diff(&original, &proposed);

        if let Err(e) = self
            .history
            .append(user_id, Role::Assistant, &proposed, ChatMode::Agent, None)
            .await
        {
            warn!(user_id = %user_id, error = %e, "Failed to persist assistant turn");
        }

        info!(
            user_id = %user_id,
            document_id = %document_id,
            prompt_len = original.len(),
            response_len = proposed.len(),
            "Agent rewrite produced"
        );

        Ok(AgentRewrite {
            original_content: original,
            suggested_content: proposed,
            diff_html,
        })
    }

    /// Open a review session over a rewrite's diff. The session lives with
    /// the caller and dies when review ends.
    pub fn review(&self, rewrite: &AgentRewrite) -> Result<ReviewSession> {
        ReviewSession::from_markup(&rewrite.diff_html)
    }

    /// Commit reviewed content back to the document store.
    pub async fn commit(&self, document_id: Uuid, content: &str) -> Result<()> {
        self.documents.set_content(document_id, content).await
    }

    /// Full conversation listing, oldest first.
    pub async fn history(&self, user_id: Uuid) -> Result<Vec<ChatTurn>> {
        self.history.list(user_id).await
    }

    fn validate_prompt(&self, prompt_text: &str) -> Result<()> {
        if prompt_text.trim().is_empty() {
            return Err(Error::InvalidInput("prompt text is empty".to_string()));
        }
        if prompt_text.chars().count() > self.config.prompt_max_chars {
            return Err(Error::InvalidInput(format!(
                "prompt text exceeds {} characters",
                self.config.prompt_max_chars
            )));
        }
        Ok(())
    }

    async fn build_messages(
        &self,
        user_id: Uuid,
        request: &AssistRequest,
        template: PromptTemplate,
    ) -> Result<Vec<redraft_core::PromptMessage>> {
        let scope = match (request.document_id, request.project_id) {
            (Some(document_id), project_id) => {
                ChunkScope::document(user_id, project_id, document_id)
            }
            (None, Some(project_id)) => ChunkScope::project(user_id, project_id),
            (None, None) => ChunkScope::user(user_id),
        };

        let mut query = RetrievalQuery::text(&request.prompt_text);
        if let Some(embedding) = &self.embedding {
            // Retrieval degrades gracefully: an embedding failure falls
            // back to keyword scoring rather than aborting the turn.
            match embedding.embed_texts(&[request.prompt_text.clone()]).await {
                Ok(mut vectors) if !vectors.is_empty() => {
                    query = query.with_embedding(vectors.remove(0));
                }
                Ok(_) => {}
                Err(e) => {
                    warn!(user_id = %user_id, error = %e, "Query embedding failed");
                }
            }
        }

        let chunks = self
            .knowledge
            .retrieve(&query, &scope, self.config.retrieve_k)
            .await;

        // Same degradation for history: chat proceeds without it.
        let history = match self
            .history
            .recent(user_id, self.config.history_token_budget)
            .await
        {
            Ok(entries) => entries,
            Err(e) => {
                warn!(user_id = %user_id, error = %e, "History lookup failed");
                Vec::new()
            }
        };

        debug!(
            user_id = %user_id,
            chunk_count = chunks.len(),
            turn_count = history.len(),
            "Assembled prompt inputs"
        );

        let ctx = PromptContext {
            chunks: &chunks,
            history: &history,
            custom_instructions: None,
            project_title: None,
        };
        self.assembler.assemble(template, &ctx, &request.prompt_text)
    }
}
