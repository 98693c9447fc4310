//! End-to-end properties of the diff → review → reconstruct round trip.

use redraft_assist::diff::{diff, diff_spans};
use redraft_assist::review::{ReviewSession, SuggestionKind};

const ORIGINAL: &str = "<h1>Field Notes</h1><p>The cat sat on the mat. \
It was a quiet afternoon and nothing moved in the garden. \
The old clock ticked in the hallway.</p>";

const PROPOSED: &str = "<h1>Field Notes</h1><p>The dog slept on the rug. \
It was a loud afternoon and everything moved in the garden. \
The old clock ticked in the hallway.</p>";

#[test]
fn accept_all_reconstructs_suggested_content() {
    let mut session = ReviewSession::new(diff_spans(ORIGINAL, PROPOSED));
    assert!(!session.is_informational());
    session.accept_all();
    assert_eq!(session.reconstruct(), PROPOSED);
}

#[test]
fn reject_all_reconstructs_original_content() {
    let mut session = ReviewSession::new(diff_spans(ORIGINAL, PROPOSED));
    session.reject_all();
    assert_eq!(session.reconstruct(), ORIGINAL);
}

#[test]
fn diff_is_byte_identical_across_runs() {
    assert_eq!(diff(ORIGINAL, PROPOSED), diff(ORIGINAL, PROPOSED));
}

#[test]
fn round_trip_survives_markup_serialization() {
    // Render the diff to markup, parse it back into a fresh session, and
    // verify both global decisions still reconstruct exactly.
    let markup = diff(ORIGINAL, PROPOSED);

    let mut accepted = ReviewSession::from_markup(&markup).unwrap();
    accepted.accept_all();
    assert_eq!(accepted.reconstruct(), PROPOSED);

    let mut rejected = ReviewSession::from_markup(&markup).unwrap();
    rejected.reject_all();
    assert_eq!(rejected.reconstruct(), ORIGINAL);
}

#[test]
fn cat_to_dog_is_a_single_replacement() {
    let mut session = ReviewSession::new(diff_spans("The cat sat.", "The dog sat."));
    assert_eq!(session.suggestions().len(), 1);
    assert_eq!(session.suggestions()[0].kind, SuggestionKind::Replacement);

    let id = session.suggestions()[0].id;
    session.decide(id, true).unwrap();
    assert_eq!(session.reconstruct(), "The dog sat.");

    assert!(session.undo());
    session.decide(id, false).unwrap();
    assert_eq!(session.reconstruct(), "The cat sat.");
}

#[test]
fn mixed_decisions_apply_independently() {
    let mut session = ReviewSession::new(diff_spans(ORIGINAL, PROPOSED));
    let ids: Vec<_> = session.suggestions().iter().map(|s| s.id).collect();
    assert!(ids.len() >= 2, "expected several independent suggestions");

    // Accept the first, reject the rest.
    session.decide(ids[0], true).unwrap();
    for id in &ids[1..] {
        session.decide(*id, false).unwrap();
    }

    let result = session.reconstruct();
    assert_ne!(result, ORIGINAL);
    assert_ne!(result, PROPOSED);
    // The rejected tail is untouched original text.
    assert!(result.ends_with("The old clock ticked in the hallway.</p>"));
}

#[test]
fn undo_chain_walks_back_to_initial_state() {
    let mut session = ReviewSession::new(diff_spans(ORIGINAL, PROPOSED));
    let initial = session.reconstruct();
    let ids: Vec<_> = session.suggestions().iter().map(|s| s.id).collect();

    for id in &ids {
        session.decide(*id, true).unwrap();
    }
    for _ in &ids {
        assert!(session.undo());
    }
    assert!(!session.undo());
    assert_eq!(session.reconstruct(), initial);
    assert_eq!(session.pending_count(), ids.len());
}

#[test]
fn identical_documents_offer_no_decisions() {
    let session = ReviewSession::new(diff_spans(ORIGINAL, ORIGINAL));
    assert!(session.is_informational());
    assert_eq!(session.reconstruct(), ORIGINAL);
}
