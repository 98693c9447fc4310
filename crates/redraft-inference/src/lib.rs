//! # redraft-inference
//!
//! Completion and embedding backend abstraction for the redraft assistant:
//! an OpenAI-compatible HTTP backend, the incremental SSE stream decoder
//! that turns raw response bytes into ordered text deltas, and a scripted
//! mock backend for tests.

pub mod backend;
pub mod config;
pub mod decoder;
pub mod mock;
pub mod types;

pub use backend::OpenAICompatBackend;
pub use config::CompletionConfig;
pub use decoder::{decode_stream, SseDecoder};
pub use mock::{MockEmbeddingBackend, MockGenerationBackend};
