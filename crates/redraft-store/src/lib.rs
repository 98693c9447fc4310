//! # redraft-store
//!
//! The retrieval and memory layer of the redraft assistant: document
//! chunking for embedding, the scoped in-memory knowledge store with a
//! pluggable scoring strategy, and the token-budgeted conversation
//! history cache backed by a durable turn log.

pub mod chunker;
pub mod history;
pub mod knowledge;

pub use chunker::{chunk, ChunkerConfig};
pub use history::{HistoryCache, InMemoryTurnLog};
pub use knowledge::{
    CosineScorer, KeywordScorer, KnowledgeStore, RetrievalQuery, RetrievedChunk, ScoringStrategy,
};
