use once_cell::sync::Lazy;
use regex::Regex;

use tutorkit_types::{head_chars, token_count, AnswerEnvelope};

/// Characters of the previous answer carried into the augmented query
const CONTEXT_CHARS: usize = 200;

static CONTINUATION_MARKERS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"подробнее|поясни|уточни|разверни").expect("static pattern"));

/// Rule table deciding "continuation vs new question".
///
/// A follow-up is a short utterance (≤4 tokens), one opening with the
/// conjunctions «а»/«и», or one carrying an explicit continuation marker.
pub fn is_followup(text: &str) -> bool {
    let lower = text.to_lowercase();
    if token_count(&lower) <= 4 {
        return true;
    }
    if matches!(lower.split_whitespace().next(), Some("а") | Some("и")) {
        return true;
    }
    CONTINUATION_MARKERS.is_match(&lower)
}

/// Build the retrieval query for the turn. For a follow-up the previous
/// question and a slice of its answer are prepended so retrieval sees the
/// whole thread; otherwise the query is the utterance itself.
///
/// Returns `(query, in_reply_to)`.
pub fn augment_query(text: &str, history: &[AnswerEnvelope]) -> (String, Option<String>) {
    let Some(prev) = history.last() else {
        return (text.to_string(), None);
    };
    if !is_followup(text) {
        return (text.to_string(), None);
    }
    let query = format!(
        "{}. {}. Контекст: {}",
        prev.question,
        text,
        head_chars(&prev.answer, CONTEXT_CHARS)
    );
    (query, Some(prev.question.clone()))
}
