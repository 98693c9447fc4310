//! Suggestion review state machine.
//!
//! A [`ReviewSession`] binds the `<ins>`/`<del>` spans of one diff into
//! independently decidable suggestions. Each suggestion moves from pending
//! to accepted or rejected; decisions are reversible only through global
//! undo, which restores whole-session snapshots. Reconstruction is a pure
//! fold over the span sequence and never fails, so callers can preview the
//! resulting document at any time.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use redraft_core::{Error, Result};

use crate::diff::{parse_markup, DiffSpan, SpanKind};

/// What a suggestion does to the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionKind {
    Insertion,
    Deletion,
    Replacement,
}

/// Review status of one suggestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionStatus {
    Pending,
    Accepted,
    Rejected,
}

/// One user-decidable edit, anchored to one or two spans of the diff.
///
/// A replacement anchors a deleted span and the inserted span immediately
/// following it; lone insertions and deletions anchor a single span.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Suggestion {
    pub id: Uuid,
    pub kind: SuggestionKind,
    pub status: SuggestionStatus,
    pub deleted_span: Option<usize>,
    pub inserted_span: Option<usize>,
}

impl Suggestion {
    /// The text this suggestion removes, if any.
    pub fn deleted_text<'a>(&self, spans: &'a [DiffSpan]) -> Option<&'a str> {
        self.deleted_span.map(|i| spans[i].text.as_str())
    }

    /// The text this suggestion adds, if any.
    pub fn inserted_text<'a>(&self, spans: &'a [DiffSpan]) -> Option<&'a str> {
        self.inserted_span.map(|i| spans[i].text.as_str())
    }
}

/// Single-writer review session over one diff.
///
/// Not safe for concurrent mutation; wrap in external serialization if more
/// than one reviewer can reach it.
#[derive(Debug, Clone)]
pub struct ReviewSession {
    spans: Vec<DiffSpan>,
    suggestions: Vec<Suggestion>,
    by_id: HashMap<Uuid, usize>,
    // Snapshot stack for undo. The statuses are the only mutable state, so
    // a snapshot is just the status vector. The initial snapshot is pushed
    // at construction and never popped.
    history: Vec<Vec<SuggestionStatus>>,
}

impl ReviewSession {
    /// Bind suggestions over a span sequence.
    ///
    /// Walks spans in document order; a deleted span immediately followed
    /// by an inserted span binds as one replacement, otherwise each changed
    /// span becomes a lone suggestion. Every changed span is bound to
    /// exactly one suggestion.
    pub fn new(spans: Vec<DiffSpan>) -> Self {
        let mut suggestions = Vec::new();
        let mut i = 0;
        while i < spans.len() {
            match spans[i].kind {
                SpanKind::Unchanged => i += 1,
                SpanKind::Deleted => {
                    let paired_insert = spans
                        .get(i + 1)
                        .filter(|next| next.kind == SpanKind::Inserted)
                        .map(|_| i + 1);
                    suggestions.push(Suggestion {
                        id: Uuid::new_v4(),
                        kind: if paired_insert.is_some() {
                            SuggestionKind::Replacement
                        } else {
                            SuggestionKind::Deletion
                        },
                        status: SuggestionStatus::Pending,
                        deleted_span: Some(i),
                        inserted_span: paired_insert,
                    });
                    i += if paired_insert.is_some() { 2 } else { 1 };
                }
                SpanKind::Inserted => {
                    suggestions.push(Suggestion {
                        id: Uuid::new_v4(),
                        kind: SuggestionKind::Insertion,
                        status: SuggestionStatus::Pending,
                        deleted_span: None,
                        inserted_span: Some(i),
                    });
                    i += 1;
                }
            }
        }

        let by_id = suggestions
            .iter()
            .enumerate()
            .map(|(idx, s)| (s.id, idx))
            .collect();
        let initial = suggestions.iter().map(|s| s.status).collect();

        debug!(
            suggestion_count = suggestions.len(),
            "Review session created"
        );

        Self {
            spans,
            suggestions,
            by_id,
            history: vec![initial],
        }
    }

    /// Build a session from rendered diff markup.
    pub fn from_markup(markup: &str) -> Result<Self> {
        Ok(Self::new(parse_markup(markup)?))
    }

    pub fn suggestions(&self) -> &[Suggestion] {
        &self.suggestions
    }

    pub fn spans(&self) -> &[DiffSpan] {
        &self.spans
    }

    pub fn pending_count(&self) -> usize {
        self.suggestions
            .iter()
            .filter(|s| s.status == SuggestionStatus::Pending)
            .count()
    }

    /// A diff with zero suggestions carries no decidable edits; the caller
    /// should present the proposed content as informational only.
    pub fn is_informational(&self) -> bool {
        self.suggestions.is_empty()
    }

    /// Accept or reject one suggestion. Pushes a snapshot for undo.
    pub fn decide(&mut self, id: Uuid, accepted: bool) -> Result<()> {
        let idx = *self
            .by_id
            .get(&id)
            .ok_or_else(|| Error::NotFound(format!("suggestion {id}")))?;
        self.suggestions[idx].status = if accepted {
            SuggestionStatus::Accepted
        } else {
            SuggestionStatus::Rejected
        };
        self.push_snapshot();
        Ok(())
    }

    /// Accept every pending suggestion in one step (one snapshot).
    pub fn accept_all(&mut self) {
        self.set_all_pending(SuggestionStatus::Accepted);
    }

    /// Reject every pending suggestion in one step (one snapshot).
    pub fn reject_all(&mut self) {
        self.set_all_pending(SuggestionStatus::Rejected);
    }

    fn set_all_pending(&mut self, status: SuggestionStatus) {
        for suggestion in &mut self.suggestions {
            if suggestion.status == SuggestionStatus::Pending {
                suggestion.status = status;
            }
        }
        self.push_snapshot();
    }

    /// Restore the state before the most recent decision.
    ///
    /// Returns `false` (and changes nothing) when only the initial snapshot
    /// remains.
    pub fn undo(&mut self) -> bool {
        if self.history.len() <= 1 {
            return false;
        }
        self.history.pop();
        let restored = self.history[self.history.len() - 1].clone();
        for (suggestion, status) in self.suggestions.iter_mut().zip(restored) {
            suggestion.status = status;
        }
        true
    }

    fn push_snapshot(&mut self) {
        self.history
            .push(self.suggestions.iter().map(|s| s.status).collect());
    }

    /// Fold the spans into a document under the current decisions.
    ///
    /// Accepted edits apply; rejected edits revert to the original text.
    /// Pending suggestions preview as the original text, so an undecided
    /// session reconstructs to the unedited document. Never fails.
    pub fn reconstruct(&self) -> String {
        let mut keep = vec![true; self.spans.len()];
        for (i, span) in self.spans.iter().enumerate() {
            keep[i] = match span.kind {
                SpanKind::Unchanged => true,
                SpanKind::Deleted => false,
                SpanKind::Inserted => false,
            };
        }

        for suggestion in &self.suggestions {
            let apply = suggestion.status == SuggestionStatus::Accepted;
            if let Some(i) = suggestion.deleted_span {
                // Deleted text survives unless the deletion is accepted.
                keep[i] = !apply;
            }
            if let Some(i) = suggestion.inserted_span {
                // Inserted text appears only once accepted.
                keep[i] = apply;
            }
        }

        self.spans
            .iter()
            .zip(keep)
            .filter_map(|(span, keep)| keep.then_some(span.text.as_str()))
            .collect()
    }

    /// Render the diff as markup with each changed span carrying the id of
    /// the suggestion that owns it, for O(1) lookups from a review surface.
    pub fn annotated_markup(&self) -> String {
        let mut owner: HashMap<usize, Uuid> = HashMap::new();
        for suggestion in &self.suggestions {
            if let Some(i) = suggestion.deleted_span {
                owner.insert(i, suggestion.id);
            }
            if let Some(i) = suggestion.inserted_span {
                owner.insert(i, suggestion.id);
            }
        }

        let mut out = String::new();
        for (i, span) in self.spans.iter().enumerate() {
            match span.kind {
                SpanKind::Unchanged => out.push_str(&span.text),
                SpanKind::Inserted | SpanKind::Deleted => {
                    let tag = if span.kind == SpanKind::Inserted {
                        "ins"
                    } else {
                        "del"
                    };
                    let id = owner
                        .get(&i)
                        .map(|id| id.to_string())
                        .unwrap_or_default();
                    out.push_str(&format!(
                        "<{tag} data-suggestion=\"{id}\">{}</{tag}>",
                        span.text
                    ));
                }
            }
        }
        out
    }
}
