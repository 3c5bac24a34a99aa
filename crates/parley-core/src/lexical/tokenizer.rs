//! Word tokenization and stemming on top of tantivy's analyzer pipeline.

use tantivy::tokenizer::{
    Language, LowerCaser, SimpleTokenizer, Stemmer, TextAnalyzer, TokenStream,
};

/// Splits text into lowercase words and reduces words to their stems.
///
/// Words are maximal runs of alphanumeric characters. Stems come from the
/// Snowball English (Porter2) stemmer.
#[derive(Clone)]
pub struct TextNormalizer {
    words: TextAnalyzer,
    stems: TextAnalyzer,
}

impl TextNormalizer {
    /// Create an English normalizer.
    pub fn english() -> Self {
        let words = TextAnalyzer::builder(SimpleTokenizer::default())
            .filter(LowerCaser)
            .build();
        let stems = TextAnalyzer::builder(SimpleTokenizer::default())
            .filter(LowerCaser)
            .filter(Stemmer::new(Language::English))
            .build();
        Self { words, stems }
    }

    /// Lowercase words of `text`, in order.
    pub fn words(&self, text: &str) -> Vec<String> {
        // token_stream needs &mut; analyzers are cheap to clone
        let mut analyzer = self.words.clone();
        collect_tokens(&mut analyzer, text)
    }

    /// Stem of a single word. Falls back to the lowercased word when the
    /// tokenizer finds nothing to stem (e.g. punctuation only).
    pub fn stem(&self, word: &str) -> String {
        let mut analyzer = self.stems.clone();
        collect_tokens(&mut analyzer, word)
            .into_iter()
            .next()
            .unwrap_or_else(|| word.to_lowercase())
    }
}

impl Default for TextNormalizer {
    fn default() -> Self {
        Self::english()
    }
}

impl std::fmt::Debug for TextNormalizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextNormalizer")
            .field("language", &"english")
            .finish()
    }
}

fn collect_tokens(analyzer: &mut TextAnalyzer, text: &str) -> Vec<String> {
    let mut stream = analyzer.token_stream(text);
    let mut tokens = Vec::new();
    while stream.advance() {
        tokens.push(stream.token().text.clone());
    }
    tokens
}
