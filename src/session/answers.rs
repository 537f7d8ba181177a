//! Per-question answer text.
//!
//! [`AnswerStore::set_answer`] always *replaces* the stored text.  The
//! dictation feed re-delivers the whole accumulated transcript on every
//! update, so appending would duplicate everything said so far.

use std::collections::BTreeMap;

/// Mapping from question index to answer text.  Indices need not be
/// contiguous; an absent index reads as the empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnswerStore {
    answers: BTreeMap<usize, String>,
}

impl AnswerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the answer for `index`.  Any string is accepted, including
    /// the empty string.
    pub fn set_answer(&mut self, index: usize, text: impl Into<String>) {
        self.answers.insert(index, text.into());
    }

    /// Stored text for `index`, or `""` when nothing was recorded.
    pub fn answer(&self, index: usize) -> &str {
        self.answers.get(&index).map(String::as_str).unwrap_or("")
    }

    /// Answers for `0..count`, with gaps filled by empty strings.
    pub fn snapshot(&self, count: usize) -> Vec<String> {
        (0..count).map(|i| self.answer(i).to_string()).collect()
    }

    /// Number of indices in `0..count` holding a non-blank answer.
    pub fn answered_count(&self, count: usize) -> usize {
        (0..count)
            .filter(|i| !self.answer(*i).trim().is_empty())
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_answer_is_empty() {
        let store = AnswerStore::new();
        assert_eq!(store.answer(0), "");
        assert_eq!(store.answer(42), "");
    }

    #[test]
    fn later_update_replaces_earlier_one() {
        let mut store = AnswerStore::new();
        store.set_answer(1, "a");
        store.set_answer(1, "ab");
        assert_eq!(store.answer(1), "ab");
    }

    #[test]
    fn empty_string_is_accepted() {
        let mut store = AnswerStore::new();
        store.set_answer(0, "something");
        store.set_answer(0, "");
        assert_eq!(store.answer(0), "");
    }

    #[test]
    fn snapshot_fills_gaps() {
        let mut store = AnswerStore::new();
        store.set_answer(0, "x");
        store.set_answer(2, "z");
        assert_eq!(store.snapshot(3), vec!["x", "", "z"]);
    }

    #[test]
    fn snapshot_ignores_indices_past_count() {
        let mut store = AnswerStore::new();
        store.set_answer(5, "stray");
        assert_eq!(store.snapshot(2), vec!["", ""]);
    }

    #[test]
    fn answered_count_skips_blank_text() {
        let mut store = AnswerStore::new();
        store.set_answer(0, "yes");
        store.set_answer(1, "   ");
        store.set_answer(3, "no");
        assert_eq!(store.answered_count(4), 2);
        assert_eq!(store.answered_count(2), 1);
    }
}
