//! Lexical tier: exact phrase, stem and fuzzy keyword matching.
//!
//! For each rule in order and each of its keywords:
//! 1. a keyword containing whitespace is a phrase and must appear verbatim in the lowercased input;
//! 2. a single-word stop word never matches;
//! 3. the keyword's stem matching the stem of a non-stop-word input token is a match;
//! 4. otherwise keyword and tokens at least `min_fuzzy_length` long are compared by Jaro-Winkler.
//!
//! The first rule with any matching keyword wins.

mod matcher;
mod stop_words;
mod tokenizer;

pub use matcher::{match_lexical, KeywordMatch, LexicalMatch, LexicalMatcher, PreparedInput};
pub use stop_words::is_stop_word;
pub use tokenizer::TextNormalizer;
