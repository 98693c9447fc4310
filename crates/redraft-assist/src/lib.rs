//! # redraft-assist
//!
//! The assistant core: prompt assembly over retrieved context and history,
//! word-level document diffing, the suggestion review state machine, and
//! the pipeline that ties them to a completion backend.
//!
//! ## Architecture
//!
//! - [`prompt`] — template selection and role-tagged message assembly
//! - [`diff`] — word-level diff spans and `<ins>`/`<del>` markup
//! - [`review`] — accept/reject/undo over diff-derived suggestions
//! - [`pipeline`] — the request-scoped orchestration of all of the above

pub mod diff;
pub mod pipeline;
pub mod prompt;
pub mod review;

pub use diff::{diff, diff_spans, parse_markup, render_markup, DiffSpan, SpanKind};
pub use pipeline::{Assistant, AssistantConfig};
pub use prompt::{select_template, PromptAssembler, PromptContext, PromptTemplate};
pub use review::{ReviewSession, Suggestion, SuggestionKind, SuggestionStatus};
