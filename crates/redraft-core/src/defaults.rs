//! Centralized default constants for the redraft assistant.
//!
//! **This module is the single source of truth** for all shared default
//! values. The other crates reference these constants instead of defining
//! their own magic numbers.
//!
//! Organized by domain area. When adding new constants, place them in the
//! appropriate section and document the rationale for the chosen value.

// =============================================================================
// CHUNKING
// =============================================================================

/// Target characters per chunk for document indexing.
pub const CHUNK_SIZE: usize = 1000;

/// Overlap parameter between adjacent chunks. The chunker seeds each new
/// chunk with `CHUNK_OVERLAP / 10` trailing words of the previous one.
pub const CHUNK_OVERLAP: usize = 100;

// =============================================================================
// TOKEN ACCOUNTING
// =============================================================================

/// Characters-per-token proxy used when no exact count is supplied.
/// `tokens = ceil(len / TOKEN_CHARS)` — cheap and close enough for budgets.
pub const TOKEN_CHARS: usize = 4;

/// Default token budget for conversation history in one model call.
pub const HISTORY_TOKEN_BUDGET: usize = 2000;

// =============================================================================
// HISTORY CACHE
// =============================================================================

/// Maximum cached turns per user (the durable log is unbounded).
pub const HISTORY_CACHE_CAPACITY: usize = 100;

/// Time-to-live for a user's cached history list, in seconds.
pub const HISTORY_CACHE_TTL_SECS: u64 = 3600;

// =============================================================================
// RETRIEVAL
// =============================================================================

/// Default number of chunks pulled into the prompt context.
pub const RETRIEVE_K: usize = 5;

// =============================================================================
// REQUEST LIMITS
// =============================================================================

/// Maximum characters accepted in a single user prompt.
pub const PROMPT_MAX_CHARS: usize = 8000;

/// Maximum document markup size for the agent full-rewrite path, in bytes.
/// The rewrite is O(document length) in both the model call and the diff,
/// so oversized documents are rejected before the model is invoked.
pub const REWRITE_MAX_BYTES: usize = 500 * 1024;

// =============================================================================
// INFERENCE
// =============================================================================

/// Default OpenAI-compatible API endpoint.
pub const COMPLETION_URL: &str = "https://api.openai.com/v1";

/// Default generation model name.
pub const GEN_MODEL: &str = "gpt-4o-mini";

/// Default embedding model name.
pub const EMBED_MODEL: &str = "text-embedding-3-small";

/// Default embedding vector dimension for text-embedding-3-small.
pub const EMBED_DIMENSION: usize = 1536;

/// Timeout for completion/embedding requests in seconds.
pub const GEN_TIMEOUT_SECS: u64 = 120;

// =============================================================================
// STREAMING
// =============================================================================

/// Capacity of the per-request frame channel between the pipeline and the
/// caller. Small on purpose: backpressure keeps push-as-you-go honest.
pub const STREAM_CHANNEL_CAPACITY: usize = 32;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunking_defaults_are_consistent() {
        const {
            assert!(CHUNK_OVERLAP < CHUNK_SIZE);
            assert!(CHUNK_OVERLAP / 10 > 0);
        }
    }

    #[test]
    fn budget_defaults_are_consistent() {
        const {
            assert!(TOKEN_CHARS > 0);
            assert!(HISTORY_TOKEN_BUDGET > 0);
            assert!(HISTORY_CACHE_CAPACITY > 0);
        }
    }

    #[test]
    fn rewrite_cap_is_500_kib() {
        assert_eq!(REWRITE_MAX_BYTES, 512_000);
    }
}
