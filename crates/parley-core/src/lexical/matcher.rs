//! First-match-wins keyword evaluation.

use std::collections::HashSet;

use crate::config::LexicalConfig;
use crate::types::Rule;

use super::stop_words::is_stop_word;
use super::tokenizer::TextNormalizer;

/// How a single keyword matched.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum KeywordMatch {
    /// Multi-word keyword found verbatim in the input.
    Phrase,
    /// Keyword stem equals the stem of a non-stop-word input token.
    Stem,
    /// Keyword is close enough to an input token.
    Fuzzy { similarity: f64 },
}

impl KeywordMatch {
    /// Similarity score, for fuzzy matches.
    pub fn similarity(&self) -> Option<f64> {
        match self {
            Self::Fuzzy { similarity } => Some(*similarity),
            _ => None,
        }
    }
}

/// A rule matched by the lexical tier.
#[derive(Debug, Clone)]
pub struct LexicalMatch<'a> {
    /// The matching rule.
    pub rule: &'a Rule,
    /// The keyword that fired.
    pub keyword: &'a str,
    /// How it fired.
    pub kind: KeywordMatch,
}

/// Input text after normalization, shared across all keyword checks.
#[derive(Debug, Clone)]
pub struct PreparedInput {
    /// Lowercased, trimmed input, used for phrase containment.
    pub normalized: String,
    /// Lowercase words of the input.
    pub tokens: Vec<String>,
    /// Stems of tokens that are not stop words.
    pub important_stems: HashSet<String>,
}

/// Lexical matcher: phrase, stem and fuzzy keyword tests over an ordered rule list.
#[derive(Debug, Clone, Default)]
pub struct LexicalMatcher {
    config: LexicalConfig,
    normalizer: TextNormalizer,
}

impl LexicalMatcher {
    /// Create a matcher with the given configuration.
    pub fn new(config: LexicalConfig) -> Self {
        Self {
            config,
            normalizer: TextNormalizer::english(),
        }
    }

    /// The active configuration.
    pub fn config(&self) -> &LexicalConfig {
        &self.config
    }

    /// Normalize and tokenize raw input.
    pub fn prepare(&self, input: &str) -> PreparedInput {
        let normalized = input.trim().to_lowercase();
        let tokens = self.normalizer.words(&normalized);
        let important_stems = tokens
            .iter()
            .filter(|t| !is_stop_word(t))
            .map(|t| self.normalizer.stem(t))
            .collect();

        PreparedInput {
            normalized,
            tokens,
            important_stems,
        }
    }

    /// Return the first rule, in slice order, with a matching keyword.
    ///
    /// Later rules are not consulted once one matches, even if they would
    /// match "better". Rules without keywords simply never match.
    pub fn match_rules<'a>(&self, input: &str, rules: &'a [Rule]) -> Option<LexicalMatch<'a>> {
        let prepared = self.prepare(input);
        if prepared.normalized.is_empty() {
            return None;
        }

        for rule in rules {
            for keyword in &rule.keywords {
                if let Some(kind) = self.match_keyword(&prepared, keyword) {
                    return Some(LexicalMatch {
                        rule,
                        keyword: keyword.as_str(),
                        kind,
                    });
                }
            }
        }

        None
    }

    /// Test one keyword against prepared input.
    pub fn match_keyword(&self, prepared: &PreparedInput, keyword: &str) -> Option<KeywordMatch> {
        let keyword = keyword.trim().to_lowercase();
        if keyword.is_empty() {
            return None;
        }

        if keyword.contains(char::is_whitespace) {
            return prepared
                .normalized
                .contains(&keyword)
                .then_some(KeywordMatch::Phrase);
        }

        if is_stop_word(&keyword) {
            return None;
        }

        if prepared
            .important_stems
            .contains(&self.normalizer.stem(&keyword))
        {
            return Some(KeywordMatch::Stem);
        }

        self.fuzzy_match(prepared, &keyword)
    }

    fn fuzzy_match(&self, prepared: &PreparedInput, keyword: &str) -> Option<KeywordMatch> {
        let min_len = self.config.min_fuzzy_length;
        if keyword.chars().count() < min_len {
            return None;
        }

        prepared
            .tokens
            .iter()
            .filter(|token| token.chars().count() >= min_len)
            .map(|token| strsim::jaro_winkler(keyword, token))
            .find(|similarity| *similarity >= self.config.fuzzy_threshold)
            .map(|similarity| KeywordMatch::Fuzzy { similarity })
    }
}

/// Match `input` against `rules` with the default lexical configuration.
pub fn match_lexical<'a>(input: &str, rules: &'a [Rule]) -> Option<LexicalMatch<'a>> {
    LexicalMatcher::default().match_rules(input, rules)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(id: &str, keywords: &[&str]) -> Rule {
        Rule::new(id)
            .with_keywords(keywords.iter().copied())
            .with_response(1.0, id)
    }

    #[test]
    fn test_stop_word_keyword_never_matches() {
        let rules = vec![rule("insult", &["you"])];
        assert!(match_lexical("I hate you", &rules).is_none());
        assert!(match_lexical("you", &rules).is_none());
    }

    #[test]
    fn test_phrase_requires_order() {
        let rules = vec![rule("bathroom", &["where is the bathroom"])];

        let hit = match_lexical("Excuse me, where is the bathroom?", &rules).unwrap();
        assert_eq!(hit.rule.id, "bathroom");
        assert_eq!(hit.kind, KeywordMatch::Phrase);

        assert!(match_lexical("bathroom where", &rules).is_none());
    }

    #[test]
    fn test_stem_match() {
        let rules = vec![rule("walk", &["walking"])];
        let hit = match_lexical("I walked home and I walk daily", &rules).unwrap();
        assert_eq!(hit.kind, KeywordMatch::Stem);
        assert_eq!(hit.keyword, "walking");
    }

    #[test]
    fn test_stem_ignores_stop_word_tokens() {
        let matcher = LexicalMatcher::default();
        let prepared = matcher.prepare("  The Dragons were HERE ");
        assert_eq!(prepared.normalized, "the dragons were here");
        assert_eq!(prepared.tokens, vec!["the", "dragons", "were", "here"]);
        assert!(prepared.important_stems.contains("dragon"));
        assert!(!prepared.important_stems.contains("the"));
    }

    #[test]
    fn test_fuzzy_typo_matches() {
        let rules = vec![rule("greeting", &["hello"])];
        let hit = match_lexical("helo", &rules).unwrap();
        match hit.kind {
            KeywordMatch::Fuzzy { similarity } => assert!(similarity >= 0.88),
            other => panic!("expected fuzzy match, got {:?}", other),
        }
    }

    #[test]
    fn test_fuzzy_floor_blocks_short_words() {
        let rules = vec![rule("cat", &["cat"])];
        assert!(match_lexical("bat", &rules).is_none());

        // Even with the floor lowered, cat/bat stays under the threshold.
        let lenient = LexicalMatcher::new(LexicalConfig {
            min_fuzzy_length: 3,
            ..Default::default()
        });
        assert!(lenient.match_rules("bat", &rules).is_none());
    }

    #[test]
    fn test_first_matching_rule_wins() {
        let rules = vec![
            rule("weather", &["rain"]),
            rule("greeting", &["hello"]),
            rule("rainy-greeting", &["hello rain"]),
        ];
        let hit = match_lexical("hello rain", &rules).unwrap();
        assert_eq!(hit.rule.id, "weather");
    }

    #[test]
    fn test_empty_input_and_empty_keywords() {
        let rules = vec![rule("blank", &["", "  "]), rule("greeting", &["hello"])];
        assert!(match_lexical("   ", &rules).is_none());
        assert_eq!(match_lexical("hello", &rules).unwrap().rule.id, "greeting");
    }

    #[test]
    fn test_keyword_case_insensitive() {
        let rules = vec![rule("dragon", &["Dragon"])];
        assert!(match_lexical("a DRAGON appears", &rules).is_some());
    }

    #[test]
    fn test_unrelated_input_no_match() {
        let rules = vec![rule("greeting", &["hello"])];
        assert!(match_lexical("what is the meaning of life", &rules).is_none());
    }
}
