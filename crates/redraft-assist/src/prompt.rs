//! Prompt template selection and message assembly.
//!
//! Four templates, selected by the request's mode and document scope:
//! project-wide RAG chat, single-document chat, single-document agent
//! (localized edit proposals), and the full-document rewrite. All but the
//! rewrite interleave prior history between the system message and the
//! final user turn; the rewrite is a single-shot, document-scale task and
//! intentionally carries no history.

use redraft_core::{ChatMode, Error, HistoryEntry, PromptMessage, Result};
use redraft_store::RetrievedChunk;

/// Which prompt shape a request gets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptTemplate {
    /// RAG chat over the project or whole user corpus.
    ProjectChat,
    /// Conversational chat scoped to one document.
    DocumentChat,
    /// Localized edit proposals for one document.
    DocumentAgent,
    /// Exhaustive full-document rewrite, no retrieval, no history.
    FullRewrite,
}

/// Select the template for `(mode, has_document)`.
///
/// Agent mode without a document scope is rejected: both agent templates
/// operate on a concrete document.
pub fn select_template(
    mode: ChatMode,
    has_document: bool,
    full_rewrite: bool,
) -> Result<PromptTemplate> {
    match (mode, has_document) {
        (ChatMode::Chat, false) => Ok(PromptTemplate::ProjectChat),
        (ChatMode::Chat, true) => Ok(PromptTemplate::DocumentChat),
        (ChatMode::Agent, true) => Ok(if full_rewrite {
            PromptTemplate::FullRewrite
        } else {
            PromptTemplate::DocumentAgent
        }),
        (ChatMode::Agent, false) => Err(Error::InvalidInput(
            "agent mode requires a document scope".to_string(),
        )),
    }
}

const PROJECT_CHAT_SYSTEM: &str = "You are a writing assistant answering questions \
about a user's documents. Ground every answer in the numbered context excerpts \
provided; cite the source label of each excerpt you draw on. If the context does \
not cover the question, say so plainly instead of guessing.";

const DOCUMENT_CHAT_SYSTEM: &str = "You are a writing assistant discussing one \
specific document with its author. Ground your answers in the provided excerpts \
of that document. Answer conversationally and explain your reasoning; you may \
describe possible edits in prose, but do not emit structured edit output.";

const DOCUMENT_AGENT_SYSTEM: &str = "You are an editing assistant for one specific \
document. Given the user's request and the document excerpts, either answer with \
free-text analysis, or propose exactly one edit in this form:\n\
ORIGINAL: <an exact, contiguous snippet copied verbatim from the document>\n\
REPLACEMENT: <the revised snippet>\n\
Propose an edit only when the request clearly calls for one, and never invent \
text that is not anchored to a verbatim original snippet.";

const FULL_REWRITE_SYSTEM: &str = "You are rewriting an entire document. Apply \
the user's instruction exhaustively across the whole document, not just the \
first occurrence. Preserve the element structure of the markup: keep every tag \
that is not itself the target of the instruction. Never omit unchanged content. \
Return nothing but the complete modified markup: no commentary, no code fences, \
no explanation.";

/// Inputs shared by the conversational and agent templates.
#[derive(Debug, Clone, Default)]
pub struct PromptContext<'a> {
    pub chunks: &'a [RetrievedChunk],
    pub history: &'a [HistoryEntry],
    pub custom_instructions: Option<&'a str>,
    pub project_title: Option<&'a str>,
}

/// Stateless assembler of role-tagged message sequences.
#[derive(Debug, Clone, Copy, Default)]
pub struct PromptAssembler;

impl PromptAssembler {
    pub fn new() -> Self {
        Self
    }

    /// Assemble the message sequence for a conversational or chunked-agent
    /// turn. History goes between the system message and the final user
    /// turn, oldest first.
    pub fn assemble(
        &self,
        template: PromptTemplate,
        ctx: &PromptContext<'_>,
        user_query: &str,
    ) -> Result<Vec<PromptMessage>> {
        let system = match template {
            PromptTemplate::ProjectChat => PROJECT_CHAT_SYSTEM,
            PromptTemplate::DocumentChat => DOCUMENT_CHAT_SYSTEM,
            PromptTemplate::DocumentAgent => DOCUMENT_AGENT_SYSTEM,
            PromptTemplate::FullRewrite => {
                return Err(Error::InvalidInput(
                    "full rewrite uses assemble_rewrite".to_string(),
                ))
            }
        };

        let mut messages = Vec::with_capacity(ctx.history.len() + 2);
        messages.push(PromptMessage::system(system));

        for entry in ctx.history {
            messages.push(PromptMessage {
                role: entry.role,
                content: entry.content.clone(),
            });
        }

        messages.push(PromptMessage::user(self.user_turn(ctx, user_query)));
        Ok(messages)
    }

    /// Assemble the single-shot full-rewrite sequence: system directives,
    /// then one user message carrying the instruction and the entire
    /// current document markup. No retrieval, no history.
    pub fn assemble_rewrite(
        &self,
        instruction: &str,
        custom_instructions: Option<&str>,
        document_markup: &str,
    ) -> Vec<PromptMessage> {
        let mut user = String::new();
        user.push_str("Instruction: ");
        user.push_str(instruction);
        user.push('\n');
        if let Some(custom) = custom_instructions.filter(|c| !c.trim().is_empty()) {
            user.push_str("\nProject instructions:\n");
            user.push_str(custom);
            user.push('\n');
        }
        user.push_str("\nDocument:\n");
        user.push_str(document_markup);

        vec![
            PromptMessage::system(FULL_REWRITE_SYSTEM),
            PromptMessage::user(user),
        ]
    }

    fn user_turn(&self, ctx: &PromptContext<'_>, user_query: &str) -> String {
        let mut out = String::new();

        if let Some(title) = ctx.project_title {
            out.push_str("Project: ");
            out.push_str(title);
            out.push('\n');
        }
        if let Some(custom) = ctx.custom_instructions.filter(|c| !c.trim().is_empty()) {
            out.push_str("Instructions:\n");
            out.push_str(custom);
            out.push('\n');
        }

        out.push_str("\nContext:\n");
        out.push_str(&format_context(ctx.chunks));

        out.push_str("\nQuestion: ");
        out.push_str(user_query);
        out
    }
}

/// Number retrieved chunks and label each with its source. An empty
/// retrieval is framed as "no relevant context", never as an error.
fn format_context(chunks: &[RetrievedChunk]) -> String {
    if chunks.is_empty() {
        return "(no relevant context found)\n".to_string();
    }
    let mut out = String::new();
    for (i, chunk) in chunks.iter().enumerate() {
        out.push_str(&format!(
            "[Source {}: {} ({})]\n{}\n\n",
            i + 1,
            chunk.metadata.title,
            chunk.metadata.file_name,
            chunk.content.trim()
        ));
    }
    out
}
