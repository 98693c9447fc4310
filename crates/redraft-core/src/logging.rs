//! Structured logging schema and field name constants for redraft.
//!
//! All crates use these constants for consistent structured logging fields,
//! so log aggregation tools can query by standardized names across every
//! subsystem.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Recoverable issue, automatic fallback applied |
//! | INFO  | Lifecycle events, operation completions |
//! | DEBUG | Decision points, intermediate values, config choices |
//! | TRACE | Per-item iteration (deltas, chunks, spans) |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Correlation ID propagated across one request pipeline invocation.
pub const REQUEST_ID: &str = "request_id";

/// Subsystem originating the log event.
/// Values: "store", "inference", "assist"
pub const SUBSYSTEM: &str = "subsystem";

/// Logical operation name.
/// Examples: "retrieve", "append", "chat", "agent_rewrite"
pub const OPERATION: &str = "op";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// User UUID owning the conversation or corpus.
pub const USER_ID: &str = "user_id";

/// Document UUID being chatted about or rewritten.
pub const DOCUMENT_ID: &str = "document_id";

/// Project UUID scoping a retrieval.
pub const PROJECT_ID: &str = "project_id";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of chunks retrieved or ingested.
pub const CHUNK_COUNT: &str = "chunk_count";

/// Number of history turns selected under the token budget.
pub const TURN_COUNT: &str = "turn_count";

/// Token sum of the selected history turns.
pub const TOKEN_SUM: &str = "token_sum";

/// Number of text deltas decoded from a completion stream.
pub const DELTA_COUNT: &str = "delta_count";

/// Number of suggestions bound from a diff.
pub const SUGGESTION_COUNT: &str = "suggestion_count";

/// Byte length of a prompt or document.
pub const PROMPT_LEN: &str = "prompt_len";

/// Byte length of a model response.
pub const RESPONSE_LEN: &str = "response_len";

// ─── Inference fields ──────────────────────────────────────────────────────

/// Model name used for inference.
pub const MODEL: &str = "model";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Boolean success/failure indicator.
pub const SUCCESS: &str = "success";

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";

/// Initialize a tracing subscriber from `RUST_LOG` with a sensible default.
///
/// Intended for binaries and integration tests; safe to call more than once
/// (subsequent calls are no-ops).
pub fn init_tracing(default_filter: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter.to_string()));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_names_are_snake_case() {
        for name in [
            REQUEST_ID,
            SUBSYSTEM,
            OPERATION,
            USER_ID,
            DOCUMENT_ID,
            PROJECT_ID,
            DURATION_MS,
            CHUNK_COUNT,
            TURN_COUNT,
            TOKEN_SUM,
            DELTA_COUNT,
            SUGGESTION_COUNT,
            PROMPT_LEN,
            RESPONSE_LEN,
            MODEL,
            SUCCESS,
            ERROR_MSG,
        ] {
            assert!(!name.is_empty());
            assert!(name
                .chars()
                .all(|c| c.is_ascii_lowercase() || c == '_'));
        }
    }

    #[test]
    fn init_tracing_is_idempotent() {
        init_tracing("warn");
        init_tracing("debug");
    }
}
