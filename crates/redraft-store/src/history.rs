//! Token-budgeted conversation history cache backed by a durable turn log.
//!
//! Every turn is persisted to the [`TurnLog`] first, then mirrored into a
//! capacity-bounded, most-recent-first cache list with a TTL. Selection
//! for prompt assembly walks from the most recent turn backward, greedily
//! including turns while the running token sum stays within the budget,
//! and returns the selection in chronological order.
//!
//! Concurrent writers for the same user are serialized by the cache lock;
//! each append is atomic.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

use redraft_core::{
    defaults, estimate_tokens, ChatMode, ChatTurn, HistoryEntry, Result, Role, TurnLog,
};

struct CacheEntry {
    /// Most-recent-first list of cached turns.
    turns: Vec<ChatTurn>,
    expires_at: Instant,
}

/// Conversation history cache, one bounded list per user.
pub struct HistoryCache {
    log: Arc<dyn TurnLog>,
    cache: Mutex<HashMap<Uuid, CacheEntry>>,
    capacity: usize,
    ttl: Duration,
}

impl HistoryCache {
    /// Create a cache over the given durable log with default bounds.
    pub fn new(log: Arc<dyn TurnLog>) -> Self {
        Self {
            log,
            cache: Mutex::new(HashMap::new()),
            capacity: defaults::HISTORY_CACHE_CAPACITY,
            ttl: Duration::from_secs(defaults::HISTORY_CACHE_TTL_SECS),
        }
    }

    /// Override the cached-turn capacity.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Override the cache entry time-to-live.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Append a turn: persist to the log, then mirror into the cache.
    ///
    /// When `tokens` is not supplied, the `ceil(len/4)` proxy is used.
    /// The durable write happens first; a log failure propagates and the
    /// cache is left untouched.
    pub async fn append(
        &self,
        user_id: Uuid,
        role: Role,
        content: &str,
        mode: ChatMode,
        tokens: Option<usize>,
    ) -> Result<ChatTurn> {
        let token_count = tokens.unwrap_or_else(|| estimate_tokens(content));
        let turn = ChatTurn::with_tokens(user_id, role, content, mode, token_count);

        self.log.append(&turn).await?;

        let mut cache = self.cache.lock().await;
        let entry = cache.entry(user_id).or_insert_with(|| CacheEntry {
            turns: Vec::new(),
            expires_at: Instant::now() + self.ttl,
        });
        entry.turns.insert(0, turn.clone());
        entry.turns.truncate(self.capacity);
        entry.expires_at = Instant::now() + self.ttl;

        Ok(turn)
    }

    /// Select recent turns within `token_budget`, oldest first.
    ///
    /// Walks the cached most-recent-first list, including turns greedily
    /// until the first one that would exceed the budget; older turns are
    /// silently dropped. On a cache miss (or expired entry) the list is
    /// rebuilt from the log's most recent turns and the cache rehydrated
    /// with exactly the selected turns.
    pub async fn recent(&self, user_id: Uuid, token_budget: usize) -> Result<Vec<HistoryEntry>> {
        {
            let cache = self.cache.lock().await;
            if let Some(entry) = cache.get(&user_id) {
                if entry.expires_at > Instant::now() {
                    let selected = select_within_budget(&entry.turns, token_budget);
                    return Ok(to_chronological(selected));
                }
            }
        }

        // Cache miss — rebuild from the durable log.
        let turns = self.log.recent(user_id, self.capacity).await?;
        let selected = select_within_budget(&turns, token_budget);

        debug!(
            user_id = %user_id,
            turn_count = selected.len(),
            token_sum = selected.iter().map(|t| t.token_count).sum::<usize>(),
            "Rebuilt history cache from log"
        );

        let mut cache = self.cache.lock().await;
        cache.insert(
            user_id,
            CacheEntry {
                turns: selected.clone(),
                expires_at: Instant::now() + self.ttl,
            },
        );

        Ok(to_chronological(selected))
    }

    /// Full history listing from the durable log, oldest first.
    pub async fn list(&self, user_id: Uuid) -> Result<Vec<ChatTurn>> {
        self.log.list(user_id).await
    }
}

/// Greedy budget walk over a most-recent-first list. Returns the selected
/// turns, still most recent first.
fn select_within_budget(turns: &[ChatTurn], token_budget: usize) -> Vec<ChatTurn> {
    let mut selected = Vec::new();
    let mut total = 0usize;
    for turn in turns {
        if total + turn.token_count > token_budget {
            break;
        }
        total += turn.token_count;
        selected.push(turn.clone());
    }
    selected
}

/// Reverse a most-recent-first selection into chronological prompt order.
fn to_chronological(mut selected: Vec<ChatTurn>) -> Vec<HistoryEntry> {
    selected.reverse();
    selected
        .into_iter()
        .map(|t| HistoryEntry {
            role: t.role,
            content: t.content,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// In-memory turn log
// ---------------------------------------------------------------------------

/// In-memory [`TurnLog`] implementation. The durable log proper belongs to
/// the excluded persistence layer; this one backs tests and single-process
/// deployments.
#[derive(Default)]
pub struct InMemoryTurnLog {
    turns: Mutex<HashMap<Uuid, Vec<ChatTurn>>>,
}

impl InMemoryTurnLog {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TurnLog for InMemoryTurnLog {
    async fn append(&self, turn: &ChatTurn) -> Result<()> {
        let mut turns = self.turns.lock().await;
        turns.entry(turn.user_id).or_default().push(turn.clone());
        Ok(())
    }

    async fn recent(&self, user_id: Uuid, limit: usize) -> Result<Vec<ChatTurn>> {
        let turns = self.turns.lock().await;
        Ok(turns
            .get(&user_id)
            .map(|list| list.iter().rev().take(limit).cloned().collect())
            .unwrap_or_default())
    }

    async fn list(&self, user_id: Uuid) -> Result<Vec<ChatTurn>> {
        let turns = self.turns.lock().await;
        Ok(turns.get(&user_id).cloned().unwrap_or_default())
    }
}
