//! Word-level document diffing and tagged-markup rendering.
//!
//! A diff is a flat sequence of [`DiffSpan`]s: contiguous runs of unchanged,
//! inserted, or deleted text in original document order. Rendering wraps
//! inserted runs in `<ins>` and deleted runs in `<del>`, leaving unchanged
//! text bare, so the markup stream reads as the original document annotated
//! with the proposed edits.

use similar::{ChangeTag, TextDiff};

use redraft_core::{Error, Result};

/// Classification of a contiguous run of diffed text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpanKind {
    Unchanged,
    Inserted,
    Deleted,
}

/// A contiguous run of unchanged, inserted, or deleted text. Has no
/// identity beyond its position in the span sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffSpan {
    pub kind: SpanKind,
    pub text: String,
}

impl DiffSpan {
    pub fn unchanged(text: impl Into<String>) -> Self {
        Self {
            kind: SpanKind::Unchanged,
            text: text.into(),
        }
    }

    pub fn inserted(text: impl Into<String>) -> Self {
        Self {
            kind: SpanKind::Inserted,
            text: text.into(),
        }
    }

    pub fn deleted(text: impl Into<String>) -> Self {
        Self {
            kind: SpanKind::Deleted,
            text: text.into(),
        }
    }
}

/// Compute the word-level diff of two documents as a span sequence.
///
/// Consecutive words with the same change tag coalesce into one span, so a
/// multi-word edit surfaces as a single suggestion-sized unit. Deterministic:
/// the same inputs always yield the same spans.
pub fn diff_spans(original: &str, proposed: &str) -> Vec<DiffSpan> {
    let diff = TextDiff::from_words(original, proposed);

    let mut spans: Vec<DiffSpan> = Vec::new();
    for change in diff.iter_all_changes() {
        let kind = match change.tag() {
            ChangeTag::Equal => SpanKind::Unchanged,
            ChangeTag::Insert => SpanKind::Inserted,
            ChangeTag::Delete => SpanKind::Deleted,
        };
        let text = change.value();
        match spans.last_mut() {
            Some(last) if last.kind == kind => last.text.push_str(text),
            _ => spans.push(DiffSpan {
                kind,
                text: text.to_string(),
            }),
        }
    }

    spans.retain(|s| !s.text.is_empty());
    spans
}

/// Render spans as tagged markup: `<ins>`/`<del>` wrap changed runs,
/// unchanged text passes through bare.
pub fn render_markup(spans: &[DiffSpan]) -> String {
    let mut out = String::new();
    for span in spans {
        match span.kind {
            SpanKind::Unchanged => out.push_str(&span.text),
            SpanKind::Inserted => {
                out.push_str("<ins>");
                out.push_str(&span.text);
                out.push_str("</ins>");
            }
            SpanKind::Deleted => {
                out.push_str("<del>");
                out.push_str(&span.text);
                out.push_str("</del>");
            }
        }
    }
    out
}

/// Diff two documents and render the result as tagged markup.
pub fn diff(original: &str, proposed: &str) -> String {
    render_markup(&diff_spans(original, proposed))
}

/// Parse tagged diff markup back into a span sequence.
///
/// Recognizes non-nested `<ins>`/`<del>` pairs as the only structural
/// markers; everything else (including other tags) is unchanged text.
pub fn parse_markup(markup: &str) -> Result<Vec<DiffSpan>> {
    let mut spans: Vec<DiffSpan> = Vec::new();
    let mut rest = markup;

    while !rest.is_empty() {
        let ins = rest.find("<ins>");
        let del = rest.find("<del>");
        let (pos, kind, open, close) = match (ins, del) {
            (Some(i), Some(d)) if i < d => (i, SpanKind::Inserted, "<ins>", "</ins>"),
            (Some(i), None) => (i, SpanKind::Inserted, "<ins>", "</ins>"),
            (Some(_), Some(d)) | (None, Some(d)) => (d, SpanKind::Deleted, "<del>", "</del>"),
            (None, None) => {
                spans.push(DiffSpan::unchanged(rest));
                break;
            }
        };

        if pos > 0 {
            spans.push(DiffSpan::unchanged(&rest[..pos]));
        }
        let body_start = pos + open.len();
        let body_end = rest[body_start..]
            .find(close)
            .map(|i| body_start + i)
            .ok_or_else(|| {
                Error::InvalidInput(format!("unclosed {open} tag in diff markup"))
            })?;
        spans.push(DiffSpan {
            kind,
            text: rest[body_start..body_end].to_string(),
        });
        rest = &rest[body_end + close.len()..];
    }

    Ok(spans.into_iter().filter(|s| !s.text.is_empty()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_documents_yield_single_unchanged_span() {
        let spans = diff_spans("The cat sat.", "The cat sat.");
        assert_eq!(spans, vec![DiffSpan::unchanged("The cat sat.")]);
    }

    #[test]
    fn word_replacement_yields_adjacent_del_ins() {
        let spans = diff_spans("The cat sat.", "The dog sat.");
        assert_eq!(
            spans,
            vec![
                DiffSpan::unchanged("The "),
                DiffSpan::deleted("cat"),
                DiffSpan::inserted("dog"),
                DiffSpan::unchanged(" sat."),
            ]
        );
    }

    #[test]
    fn replacement_renders_as_del_then_ins() {
        let markup = diff("The cat sat.", "The dog sat.");
        assert_eq!(markup, "The <del>cat</del><ins>dog</ins> sat.");
    }

    #[test]
    fn pure_insertion_and_deletion() {
        let spans = diff_spans("one two", "one two three");
        assert!(spans
            .iter()
            .any(|s| s.kind == SpanKind::Inserted && s.text.contains("three")));
        assert!(spans.iter().all(|s| s.kind != SpanKind::Deleted));

        let spans = diff_spans("one two three", "one three");
        assert!(spans
            .iter()
            .any(|s| s.kind == SpanKind::Deleted && s.text.contains("two")));
    }

    #[test]
    fn multi_word_edit_keeps_both_sides() {
        let spans = diff_spans("start middle end", "start totally different end");
        let deleted: String = spans
            .iter()
            .filter(|s| s.kind == SpanKind::Deleted)
            .map(|s| s.text.as_str())
            .collect();
        let inserted: String = spans
            .iter()
            .filter(|s| s.kind == SpanKind::Inserted)
            .map(|s| s.text.as_str())
            .collect();
        assert_eq!(deleted.trim(), "middle");
        assert!(inserted.contains("totally") && inserted.contains("different"));
    }

    #[test]
    fn diff_is_deterministic() {
        let a = "<p>Some longer document with several words.</p>";
        let b = "<p>Some much longer document containing several words.</p>";
        assert_eq!(diff(a, b), diff(a, b));
    }

    #[test]
    fn accepted_side_concatenation_equals_proposed() {
        let original = "<p>The quick brown fox jumps over the lazy dog.</p>";
        let proposed = "<p>The slow brown fox leaps over the energetic dog.</p>";
        let spans = diff_spans(original, proposed);

        let accepted: String = spans
            .iter()
            .filter(|s| s.kind != SpanKind::Deleted)
            .map(|s| s.text.as_str())
            .collect();
        assert_eq!(accepted, proposed);

        let rejected: String = spans
            .iter()
            .filter(|s| s.kind != SpanKind::Inserted)
            .map(|s| s.text.as_str())
            .collect();
        assert_eq!(rejected, original);
    }

    #[test]
    fn parse_round_trips_rendered_markup() {
        let spans = diff_spans("The cat sat.", "The dog sat.");
        let markup = render_markup(&spans);
        assert_eq!(parse_markup(&markup).unwrap(), spans);
    }

    #[test]
    fn parse_treats_other_tags_as_unchanged_text() {
        let spans = parse_markup("<p>plain</p> <del>old</del><ins>new</ins>").unwrap();
        assert_eq!(
            spans,
            vec![
                DiffSpan::unchanged("<p>plain</p> "),
                DiffSpan::deleted("old"),
                DiffSpan::inserted("new"),
            ]
        );
    }

    #[test]
    fn parse_rejects_unclosed_tag() {
        assert!(parse_markup("text <ins>never closed").is_err());
    }
}
