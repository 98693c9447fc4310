//! Scoped knowledge-chunk store with a pluggable retrieval strategy.
//!
//! Holds the chunks produced at document ingestion time, keyed by owning
//! user, and answers scoped similarity/keyword queries for prompt context.
//! Scope precedence: a document scope restricts to that document, else a
//! project scope restricts to that project, else the whole user corpus.
//!
//! The scoring function is a strategy trait. [`KeywordScorer`] implements
//! the keyword-containment matching the retrieval layer currently uses;
//! [`CosineScorer`] scores by nearest-neighbor over stored embeddings when
//! a query embedding is supplied. Callers must treat retrieval quality as
//! best-effort and must not assume ranking stability.

use std::collections::HashMap;

use tokio::sync::RwLock;
use tracing::{debug, warn};
use uuid::Uuid;

use redraft_core::{
    estimate_tokens, ChunkMetadata, ChunkScope, EmbeddingBackend, KnowledgeChunk, Result, Vector,
};

use crate::chunker::ChunkerConfig;

// ---------------------------------------------------------------------------
// Retrieval query and result
// ---------------------------------------------------------------------------

/// A retrieval query: the user's text plus an optional precomputed
/// embedding for strategies that score in vector space.
#[derive(Debug, Clone)]
pub struct RetrievalQuery {
    pub text: String,
    pub embedding: Option<Vector>,
}

impl RetrievalQuery {
    /// Text-only query.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            embedding: None,
        }
    }

    /// Attach a query embedding.
    pub fn with_embedding(mut self, embedding: Vector) -> Self {
        self.embedding = Some(embedding);
        self
    }
}

/// One retrieved chunk, ready for prompt assembly.
#[derive(Debug, Clone)]
pub struct RetrievedChunk {
    pub content: String,
    pub metadata: ChunkMetadata,
    pub score: f32,
}

// ---------------------------------------------------------------------------
// Scoring strategies
// ---------------------------------------------------------------------------

/// Pluggable relevance scoring. A score of zero (or less) excludes the
/// chunk from results.
pub trait ScoringStrategy: Send + Sync {
    /// Strategy name, for logging.
    fn name(&self) -> &str;

    /// Relevance of `chunk` to `query`.
    fn score(&self, query: &RetrievalQuery, chunk: &KnowledgeChunk) -> f32;
}

/// Keyword-containment scoring: the fraction of query terms contained in
/// the chunk content (case-insensitive substring match).
///
/// This is the current matching strategy of the retrieval layer; it stands
/// in for a proper nearest-neighbor search and makes no ranking-quality
/// promises.
#[derive(Debug, Clone, Default)]
pub struct KeywordScorer;

/// Query terms shorter than this are ignored; they match almost anything.
const MIN_TERM_LEN: usize = 3;

impl ScoringStrategy for KeywordScorer {
    fn name(&self) -> &str {
        "keyword"
    }

    fn score(&self, query: &RetrievalQuery, chunk: &KnowledgeChunk) -> f32 {
        let content = chunk.content.to_lowercase();
        let query_text = query.text.to_lowercase();

        let terms: Vec<&str> = query_text
            .split_whitespace()
            .filter(|t| t.len() >= MIN_TERM_LEN)
            .collect();

        if terms.is_empty() {
            // Nothing but short words — fall back to whole-phrase containment.
            let phrase = query_text.trim();
            if !phrase.is_empty() && content.contains(phrase) {
                return 1.0;
            }
            return 0.0;
        }

        let matched = terms.iter().filter(|t| content.contains(**t)).count();
        matched as f32 / terms.len() as f32
    }
}

/// Cosine similarity over stored embeddings. Chunks without an embedding,
/// or queries without one, score zero.
#[derive(Debug, Clone, Default)]
pub struct CosineScorer;

impl ScoringStrategy for CosineScorer {
    fn name(&self) -> &str {
        "cosine"
    }

    fn score(&self, query: &RetrievalQuery, chunk: &KnowledgeChunk) -> f32 {
        match (&query.embedding, &chunk.embedding) {
            (Some(q), Some(c)) => cosine_similarity(q, c),
            _ => 0.0,
        }
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

// ---------------------------------------------------------------------------
// Knowledge store
// ---------------------------------------------------------------------------

/// In-memory store of knowledge chunks, keyed by owning user.
///
/// Writers are serialized per store through the write lock; chunk inserts
/// and deletes are atomic per call.
pub struct KnowledgeStore {
    chunks: RwLock<HashMap<Uuid, Vec<KnowledgeChunk>>>,
    scorer: Box<dyn ScoringStrategy>,
}

impl Default for KnowledgeStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KnowledgeStore {
    /// Create a store with the keyword-containment strategy.
    pub fn new() -> Self {
        Self::with_scorer(Box::new(KeywordScorer))
    }

    /// Create a store with an explicit scoring strategy.
    pub fn with_scorer(scorer: Box<dyn ScoringStrategy>) -> Self {
        Self {
            chunks: RwLock::new(HashMap::new()),
            scorer,
        }
    }

    /// Chunk and index one document's extracted text.
    ///
    /// When an embedding backend is supplied, chunk embeddings are computed
    /// in one batch; an embedding failure degrades to keyword-only chunks
    /// rather than failing the ingestion.
    pub async fn ingest(
        &self,
        scope: ChunkScope,
        title: &str,
        file_name: &str,
        text: &str,
        config: &ChunkerConfig,
        embedder: Option<&dyn EmbeddingBackend>,
    ) -> Result<usize> {
        let pieces = config.chunk(text);
        if pieces.is_empty() {
            return Ok(0);
        }

        let embeddings: Vec<Option<Vector>> = match embedder {
            Some(backend) => match backend.embed_texts(&pieces).await {
                Ok(vectors) => vectors.into_iter().map(Some).collect(),
                Err(e) => {
                    warn!(error = %e, title = title, "Embedding failed, indexing without vectors");
                    vec![None; pieces.len()]
                }
            },
            None => vec![None; pieces.len()],
        };

        let uploaded_at = chrono::Utc::now();
        let user_id = scope.user_id;
        let new_chunks: Vec<KnowledgeChunk> = pieces
            .into_iter()
            .zip(embeddings)
            .enumerate()
            .map(|(chunk_index, (content, embedding))| KnowledgeChunk {
                id: Uuid::new_v4(),
                metadata: ChunkMetadata {
                    title: title.to_string(),
                    file_name: file_name.to_string(),
                    uploaded_at,
                    char_count: content.len(),
                },
                content,
                embedding,
                chunk_index,
                scope: scope.clone(),
            })
            .collect();

        let count = new_chunks.len();
        let mut store = self.chunks.write().await;
        store.entry(user_id).or_default().extend(new_chunks);

        debug!(
            user_id = %user_id,
            chunk_count = count,
            title = title,
            "Indexed document"
        );
        Ok(count)
    }

    /// Insert pre-built chunks directly (ingestion done elsewhere).
    pub async fn insert(&self, chunks: Vec<KnowledgeChunk>) {
        let mut store = self.chunks.write().await;
        for chunk in chunks {
            store.entry(chunk.scope.user_id).or_default().push(chunk);
        }
    }

    /// Retrieve up to `k` chunks relevant to `query` within `scope`.
    ///
    /// An empty result is valid — the prompt layer frames it as "no
    /// relevant context", never as an error.
    pub async fn retrieve(
        &self,
        query: &RetrievalQuery,
        scope: &ChunkScope,
        k: usize,
    ) -> Vec<RetrievedChunk> {
        let store = self.chunks.read().await;
        let Some(user_chunks) = store.get(&scope.user_id) else {
            return Vec::new();
        };

        let mut hits: Vec<RetrievedChunk> = user_chunks
            .iter()
            .filter(|chunk| scope_matches(&chunk.scope, scope))
            .filter_map(|chunk| {
                let score = self.scorer.score(query, chunk);
                (score > 0.0).then(|| RetrievedChunk {
                    content: chunk.content.clone(),
                    metadata: chunk.metadata.clone(),
                    score,
                })
            })
            .collect();

        // Stable sort: ties keep ingestion order, but callers must not
        // rely on ranking stability across strategies.
        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        hits.truncate(k);

        debug!(
            user_id = %scope.user_id,
            strategy = self.scorer.name(),
            chunk_count = hits.len(),
            "Retrieved context chunks"
        );
        hits
    }

    /// Delete all chunks belonging to one document. Returns the number
    /// removed. Chunks are owned by their document and die with it.
    pub async fn delete_document(&self, user_id: Uuid, document_id: Uuid) -> usize {
        let mut store = self.chunks.write().await;
        let Some(user_chunks) = store.get_mut(&user_id) else {
            return 0;
        };
        let before = user_chunks.len();
        user_chunks.retain(|c| c.scope.document_id != Some(document_id));
        before - user_chunks.len()
    }

    /// Delete all chunks belonging to one project.
    pub async fn delete_project(&self, user_id: Uuid, project_id: Uuid) -> usize {
        let mut store = self.chunks.write().await;
        let Some(user_chunks) = store.get_mut(&user_id) else {
            return 0;
        };
        let before = user_chunks.len();
        user_chunks.retain(|c| c.scope.project_id != Some(project_id));
        before - user_chunks.len()
    }

    /// Number of chunks indexed for a user.
    pub async fn chunk_count(&self, user_id: Uuid) -> usize {
        self.chunks
            .read()
            .await
            .get(&user_id)
            .map_or(0, Vec::len)
    }

    /// Approximate token total of a user's indexed corpus.
    pub async fn token_count(&self, user_id: Uuid) -> usize {
        self.chunks
            .read()
            .await
            .get(&user_id)
            .map_or(0, |chunks| {
                chunks.iter().map(|c| estimate_tokens(&c.content)).sum()
            })
    }
}

/// Scope precedence: document scope wins over project scope wins over the
/// whole user corpus.
fn scope_matches(chunk: &ChunkScope, query: &ChunkScope) -> bool {
    if chunk.user_id != query.user_id {
        return false;
    }
    if let Some(document_id) = query.document_id {
        return chunk.document_id == Some(document_id);
    }
    if let Some(project_id) = query.project_id {
        return chunk.project_id == Some(project_id);
    }
    true
}
