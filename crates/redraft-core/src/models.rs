//! Data model for the redraft assistant.
//!
//! Conversation turns, knowledge chunks, prompt messages, and the wire
//! shapes exposed to callers: stream frames and the agent rewrite
//! response.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::defaults;

/// Embedding vector type shared across crates.
pub type Vector = Vec<f32>;

// =============================================================================
// CONVERSATION
// =============================================================================

/// Role of a conversational turn or prompt message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
    System,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Assistant => write!(f, "assistant"),
            Self::System => write!(f, "system"),
        }
    }
}

/// Mode of an assistant request.
///
/// `Chat` answers questions grounded in retrieved context; `Agent` proposes
/// document edits (chunked suggestions or a full rewrite).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatMode {
    Chat,
    Agent,
}

impl std::fmt::Display for ChatMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Chat => write!(f, "chat"),
            Self::Agent => write!(f, "agent"),
        }
    }
}

/// One persisted conversational turn. Immutable once appended to the log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    pub id: Uuid,
    pub user_id: Uuid,
    pub role: Role,
    pub content: String,
    pub token_count: usize,
    pub mode: ChatMode,
    pub created_at: DateTime<Utc>,
}

impl ChatTurn {
    /// Create a new turn, estimating the token count from content length.
    pub fn new(user_id: Uuid, role: Role, content: impl Into<String>, mode: ChatMode) -> Self {
        let content = content.into();
        let token_count = estimate_tokens(&content);
        Self {
            id: Uuid::new_v4(),
            user_id,
            role,
            content,
            token_count,
            mode,
            created_at: Utc::now(),
        }
    }

    /// Create a new turn with an explicit token count.
    pub fn with_tokens(
        user_id: Uuid,
        role: Role,
        content: impl Into<String>,
        mode: ChatMode,
        token_count: usize,
    ) -> Self {
        Self {
            token_count,
            ..Self::new(user_id, role, content, mode)
        }
    }
}

/// Cheap token-count proxy: `ceil(len / 4)` characters per token.
pub fn estimate_tokens(content: &str) -> usize {
    content.len().div_ceil(defaults::TOKEN_CHARS)
}

/// A `{role, content}` pair selected from history for prompt assembly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub role: Role,
    pub content: String,
}

// =============================================================================
// KNOWLEDGE CHUNKS
// =============================================================================

/// Ownership scope of a knowledge chunk. `user_id` is always set; a chunk
/// belonging to a document carries both `project_id` and `document_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkScope {
    pub user_id: Uuid,
    pub project_id: Option<Uuid>,
    pub document_id: Option<Uuid>,
}

impl ChunkScope {
    /// Scope covering a user's whole corpus.
    pub fn user(user_id: Uuid) -> Self {
        Self {
            user_id,
            project_id: None,
            document_id: None,
        }
    }

    /// Scope restricted to one project.
    pub fn project(user_id: Uuid, project_id: Uuid) -> Self {
        Self {
            user_id,
            project_id: Some(project_id),
            document_id: None,
        }
    }

    /// Scope restricted to one document.
    pub fn document(user_id: Uuid, project_id: Option<Uuid>, document_id: Uuid) -> Self {
        Self {
            user_id,
            project_id,
            document_id: Some(document_id),
        }
    }
}

/// Source metadata carried alongside a chunk into prompt context labels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub title: String,
    pub file_name: String,
    pub uploaded_at: DateTime<Utc>,
    pub char_count: usize,
}

/// A bounded substring of an ingested document, the unit of retrieval.
/// Created once at indexing time; immutable; deleted with its owner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeChunk {
    pub id: Uuid,
    pub content: String,
    pub embedding: Option<Vector>,
    pub chunk_index: usize,
    pub scope: ChunkScope,
    pub metadata: ChunkMetadata,
}

// =============================================================================
// PROMPTS
// =============================================================================

/// Ephemeral role-tagged message for one model call. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptMessage {
    pub role: Role,
    pub content: String,
}

impl PromptMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

// =============================================================================
// REQUEST / RESPONSE WIRE SHAPES
// =============================================================================

/// One conversational or agent-edit request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistRequest {
    pub prompt_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<Uuid>,
    pub mode: ChatMode,
}

/// One frame of a streamed response. End of stream is implicit (channel
/// close); the `[DONE]` sentinel is consumed internally and never exposed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamFrame {
    Chunk { content: String },
    Error { message: String },
}

/// Non-streamed agent full-rewrite response. `diff_html` uses `<ins>` and
/// `<del>` as the only structural diff markers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentRewrite {
    pub original_content: String,
    pub suggested_content: String,
    pub diff_html: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimate_tokens_rounds_up() {
        assert_eq!(estimate_tokens(""), 0);
        assert_eq!(estimate_tokens("abc"), 1);
        assert_eq!(estimate_tokens("abcd"), 1);
        assert_eq!(estimate_tokens("abcde"), 2);
        assert_eq!(estimate_tokens(&"x".repeat(400)), 100);
    }

    #[test]
    fn test_chat_turn_new_estimates_tokens() {
        let turn = ChatTurn::new(Uuid::new_v4(), Role::User, "hello world!", ChatMode::Chat);
        assert_eq!(turn.token_count, 3); // 12 chars / 4
        assert_eq!(turn.role, Role::User);
    }

    #[test]
    fn test_chat_turn_with_explicit_tokens() {
        let turn = ChatTurn::with_tokens(Uuid::new_v4(), Role::Assistant, "hi", ChatMode::Chat, 7);
        assert_eq!(turn.token_count, 7);
    }

    #[test]
    fn test_role_serialization() {
        assert_eq!(serde_json::to_string(&Role::User).unwrap(), "\"user\"");
        assert_eq!(
            serde_json::to_string(&Role::Assistant).unwrap(),
            "\"assistant\""
        );
        let role: Role = serde_json::from_str("\"system\"").unwrap();
        assert_eq!(role, Role::System);
    }

    #[test]
    fn test_chat_mode_display() {
        assert_eq!(ChatMode::Chat.to_string(), "chat");
        assert_eq!(ChatMode::Agent.to_string(), "agent");
    }

    #[test]
    fn test_stream_frame_wire_format() {
        let frame = StreamFrame::Chunk {
            content: "Hello".to_string(),
        };
        let json = serde_json::to_string(&frame).unwrap();
        assert_eq!(json, r#"{"type":"chunk","content":"Hello"}"#);

        let frame = StreamFrame::Error {
            message: "transport closed".to_string(),
        };
        let json = serde_json::to_string(&frame).unwrap();
        assert_eq!(json, r#"{"type":"error","message":"transport closed"}"#);
    }

    #[test]
    fn test_chunk_scope_constructors() {
        let user = Uuid::new_v4();
        let project = Uuid::new_v4();
        let document = Uuid::new_v4();

        let s = ChunkScope::user(user);
        assert!(s.project_id.is_none() && s.document_id.is_none());

        let s = ChunkScope::project(user, project);
        assert_eq!(s.project_id, Some(project));
        assert!(s.document_id.is_none());

        let s = ChunkScope::document(user, Some(project), document);
        assert_eq!(s.document_id, Some(document));
    }

    #[test]
    fn test_assist_request_deserializes_without_scope() {
        let req: AssistRequest =
            serde_json::from_str(r#"{"prompt_text":"hi","mode":"chat"}"#).unwrap();
        assert!(req.document_id.is_none());
        assert!(req.project_id.is_none());
        assert_eq!(req.mode, ChatMode::Chat);
    }

    #[test]
    fn test_prompt_message_constructors() {
        assert_eq!(PromptMessage::system("s").role, Role::System);
        assert_eq!(PromptMessage::user("u").role, Role::User);
        assert_eq!(PromptMessage::assistant("a").role, Role::Assistant);
    }
}
