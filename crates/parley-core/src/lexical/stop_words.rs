//! Fixed English stop-word set.
//!
//! A keyword equal to one of these never matches on its own, so a rule keyed
//! on "you" does not fire for "I hate you". Phrases containing stop words are
//! unaffected.

use once_cell::sync::Lazy;
use std::collections::HashSet;

static STOP_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        // articles & determiners
        "a", "an", "the", "this", "that", "these", "those",
        // pronouns
        "i", "me", "my", "mine", "myself",
        "you", "your", "yours", "yourself",
        "he", "him", "his", "himself", "she", "her", "hers", "herself",
        "it", "its", "itself",
        "we", "us", "our", "ours", "they", "them", "their", "theirs",
        // conjunctions
        "and", "or", "but", "nor", "so", "yet", "if", "then", "than", "as", "because",
        // prepositions
        "of", "at", "by", "for", "from", "in", "into", "on", "onto", "to", "with",
        "about", "over", "under", "up", "down", "out", "off",
        // be-verbs & auxiliaries
        "is", "am", "are", "was", "were", "be", "been", "being",
        "do", "does", "did", "have", "has", "had",
        "will", "would", "can", "could", "shall", "should", "may", "might", "must",
        // contraction fragments left by the tokenizer
        "s", "t", "m", "re", "ve", "ll", "d",
    ]
    .into_iter()
    .collect()
});

/// Whether `word` (already lowercased) is a stop word.
pub fn is_stop_word(word: &str) -> bool {
    STOP_WORDS.contains(word)
}
