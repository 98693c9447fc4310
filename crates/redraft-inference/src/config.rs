//! Configuration for the OpenAI-compatible completion backend.

use redraft_core::defaults;

/// Configuration for an OpenAI-compatible endpoint.
#[derive(Debug, Clone)]
pub struct CompletionConfig {
    /// Base URL for the API endpoint.
    pub base_url: String,
    /// API key for authentication (optional for local endpoints).
    pub api_key: Option<String>,
    /// Model to use for chat completion.
    pub gen_model: String,
    /// Model to use for embeddings.
    pub embed_model: String,
    /// Expected embedding dimension.
    pub embed_dimension: usize,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::COMPLETION_URL.to_string(),
            api_key: None,
            gen_model: defaults::GEN_MODEL.to_string(),
            embed_model: defaults::EMBED_MODEL.to_string(),
            embed_dimension: defaults::EMBED_DIMENSION,
            timeout_seconds: defaults::GEN_TIMEOUT_SECS,
        }
    }
}

impl CompletionConfig {
    /// Load configuration from environment variables with fallback to
    /// defaults.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | REDRAFT_API_BASE | https://api.openai.com/v1 |
    /// | REDRAFT_API_KEY | (none) |
    /// | REDRAFT_GEN_MODEL | gpt-4o-mini |
    /// | REDRAFT_EMBED_MODEL | text-embedding-3-small |
    /// | REDRAFT_EMBED_DIM | 1536 |
    /// | REDRAFT_TIMEOUT | 120 |
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            base_url: std::env::var("REDRAFT_API_BASE").unwrap_or(defaults.base_url),
            api_key: std::env::var("REDRAFT_API_KEY").ok().filter(|k| !k.is_empty()),
            gen_model: std::env::var("REDRAFT_GEN_MODEL").unwrap_or(defaults.gen_model),
            embed_model: std::env::var("REDRAFT_EMBED_MODEL").unwrap_or(defaults.embed_model),
            embed_dimension: std::env::var("REDRAFT_EMBED_DIM")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.embed_dimension),
            timeout_seconds: std::env::var("REDRAFT_TIMEOUT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.timeout_seconds),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_uses_core_defaults() {
        let config = CompletionConfig::default();
        assert_eq!(config.base_url, defaults::COMPLETION_URL);
        assert_eq!(config.gen_model, defaults::GEN_MODEL);
        assert_eq!(config.embed_dimension, defaults::EMBED_DIMENSION);
        assert!(config.api_key.is_none());
    }
}
