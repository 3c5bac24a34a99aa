//! Keyword embedding cache.

use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};

use crate::error::{ParleyError, ParleyResult};
use crate::traits::{Embedder, EmbeddingAction};
use crate::types::Ruleset;

use super::vector::normalize;

/// A cached keyword vector and the rule it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedKeyword {
    /// Id of the rule that contributed the keyword first.
    pub rule_id: String,
    /// Unit-normalized embedding.
    pub vector: Vec<f32>,
    /// The keyword text as written in the rule.
    pub source_keyword: String,
}

/// Counters from one precompute pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PrecomputeStats {
    /// Keywords embedded and inserted.
    pub embedded: usize,
    /// Keywords skipped because they were already cached.
    pub reused: usize,
    /// Keywords whose embedding failed or was unusable.
    pub failed: usize,
}

/// Map from raw keyword text to its embedding.
///
/// Entries are kept in insertion order so that similarity ties resolve to
/// the earliest cached keyword. The cache is additive: precomputing a ruleset
/// never recomputes or removes existing keys, so entries for rules that were
/// later removed stay until [`KeywordEmbeddingCache::retain_rules`] is called.
#[derive(Debug, Clone, Default)]
pub struct KeywordEmbeddingCache {
    entries: Vec<CachedKeyword>,
    index: HashMap<String, usize>,
    dimension: Option<usize>,
}

impl KeywordEmbeddingCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached keywords.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Dimension shared by every cached vector, once one is inserted.
    pub fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    /// Look up a keyword.
    pub fn get(&self, keyword: &str) -> Option<&CachedKeyword> {
        self.index.get(keyword).map(|&i| &self.entries[i])
    }

    /// Whether a keyword is cached.
    pub fn contains(&self, keyword: &str) -> bool {
        self.index.contains_key(keyword)
    }

    /// Iterate entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &CachedKeyword> {
        self.entries.iter()
    }

    /// Insert a keyword vector, normalizing it.
    ///
    /// Existing keys are left untouched and `Ok(false)` is returned.
    pub fn insert(
        &mut self,
        rule_id: impl Into<String>,
        keyword: impl Into<String>,
        vector: Vec<f32>,
    ) -> ParleyResult<bool> {
        let keyword = keyword.into();
        if self.index.contains_key(&keyword) {
            return Ok(false);
        }

        if let Some(expected) = self.dimension {
            if vector.len() != expected {
                return Err(ParleyError::invalid_vector(format!(
                    "keyword '{}' has dimension {}, cache holds {}",
                    keyword,
                    vector.len(),
                    expected
                )));
            }
        }

        let vector = normalize(vector).ok_or_else(|| {
            ParleyError::invalid_vector(format!(
                "keyword '{}' has an empty or zero vector",
                keyword
            ))
        })?;

        self.dimension = Some(vector.len());
        self.index.insert(keyword.clone(), self.entries.len());
        self.entries.push(CachedKeyword {
            rule_id: rule_id.into(),
            vector,
            source_keyword: keyword,
        });
        Ok(true)
    }

    /// Embed every keyword of `ruleset` that is not cached yet.
    ///
    /// A keyword whose embedding fails is logged and skipped; the pass always
    /// completes. Keywords are keyed by their raw text, so a keyword shared by
    /// two rules stays attributed to whichever rule cached it first.
    pub async fn precompute(
        &mut self,
        ruleset: &Ruleset,
        embedder: &dyn Embedder,
    ) -> PrecomputeStats {
        let mut stats = PrecomputeStats::default();

        for rule in &ruleset.rules {
            for keyword in &rule.keywords {
                if keyword.trim().is_empty() {
                    continue;
                }
                if self.contains(keyword) {
                    stats.reused += 1;
                    continue;
                }

                let vector = match embedder.embed(keyword, Some(EmbeddingAction::Index)).await {
                    Ok(vector) => vector,
                    Err(e) => {
                        warn!(
                            rule_id = %rule.id,
                            keyword = %keyword,
                            error = %e,
                            "Failed to embed keyword, skipping"
                        );
                        stats.failed += 1;
                        continue;
                    }
                };

                match self.insert(rule.id.clone(), keyword.clone(), vector) {
                    Ok(true) => stats.embedded += 1,
                    Ok(false) => stats.reused += 1,
                    Err(e) => {
                        warn!(
                            rule_id = %rule.id,
                            keyword = %keyword,
                            error = %e,
                            "Unusable keyword embedding, skipping"
                        );
                        stats.failed += 1;
                    }
                }
            }
        }

        debug!(
            embedded = stats.embedded,
            reused = stats.reused,
            failed = stats.failed,
            total = self.len(),
            "Keyword embedding precompute finished"
        );

        stats
    }

    /// Drop entries whose rule id is not in `ruleset`. Returns how many were removed.
    pub fn retain_rules(&mut self, ruleset: &Ruleset) -> usize {
        let live: HashSet<&str> = ruleset.rules.iter().map(|r| r.id.as_str()).collect();
        let before = self.entries.len();

        self.entries.retain(|e| live.contains(e.rule_id.as_str()));
        self.index = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, e)| (e.source_keyword.clone(), i))
            .collect();
        if self.entries.is_empty() {
            self.dimension = None;
        }

        before - self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Rule;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Embeds by first letter; fails for keywords starting with 'x'.
    struct LetterEmbedder {
        calls: AtomicUsize,
    }

    impl LetterEmbedder {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Embedder for LetterEmbedder {
        async fn embed(
            &self,
            text: &str,
            _action: Option<EmbeddingAction>,
        ) -> ParleyResult<Vec<f32>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match text.chars().next() {
                Some('x') => Err(ParleyError::embedding("model down")),
                Some(c) if c < 'm' => Ok(vec![2.0, 0.0]),
                _ => Ok(vec![0.0, 3.0]),
            }
        }

        fn dimension(&self) -> usize {
            2
        }

        fn model_name(&self) -> &str {
            "letters"
        }
    }

    fn ruleset() -> Ruleset {
        Ruleset::default()
            .with_rule(Rule::new("a").with_keywords(["apple", "xylophone"]))
            .with_rule(Rule::new("b").with_keywords(["pear", "apple"]))
    }

    #[tokio::test]
    async fn test_precompute_skips_failures_and_duplicates() {
        let embedder = LetterEmbedder::new();
        let mut cache = KeywordEmbeddingCache::new();

        let stats = cache.precompute(&ruleset(), &embedder).await;

        assert_eq!(stats, PrecomputeStats { embedded: 2, reused: 1, failed: 1 });
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("apple").unwrap().rule_id, "a");
        assert_eq!(cache.get("pear").unwrap().rule_id, "b");
        assert!(!cache.contains("xylophone"));
        assert_eq!(cache.dimension(), Some(2));
    }

    #[tokio::test]
    async fn test_precompute_is_additive() {
        let embedder = LetterEmbedder::new();
        let mut cache = KeywordEmbeddingCache::new();
        cache.precompute(&ruleset(), &embedder).await;
        let calls_after_first = embedder.calls.load(Ordering::SeqCst);

        let stats = cache.precompute(&ruleset(), &embedder).await;

        // Only the failed keyword is retried
        assert_eq!(embedder.calls.load(Ordering::SeqCst), calls_after_first + 1);
        assert_eq!(stats.embedded, 0);
        assert_eq!(stats.reused, 3);
    }

    #[test]
    fn test_insert_normalizes() {
        let mut cache = KeywordEmbeddingCache::new();
        assert!(cache.insert("r", "hello", vec![3.0, 4.0]).unwrap());
        let v = &cache.get("hello").unwrap().vector;
        assert!((v[0] - 0.6).abs() < 1e-6);
        assert!((v[1] - 0.8).abs() < 1e-6);

        assert!(!cache.insert("other", "hello", vec![1.0, 0.0]).unwrap());
        assert_eq!(cache.get("hello").unwrap().rule_id, "r");
    }

    #[test]
    fn test_insert_rejects_bad_vectors() {
        let mut cache = KeywordEmbeddingCache::new();
        assert!(cache.insert("r", "zero", vec![0.0, 0.0]).is_err());
        assert!(cache.insert("r", "empty", vec![]).is_err());
        cache.insert("r", "ok", vec![1.0, 0.0]).unwrap();
        assert!(cache.insert("r", "wide", vec![1.0, 0.0, 0.0]).is_err());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_retain_rules() {
        let mut cache = KeywordEmbeddingCache::new();
        cache.insert("keep", "one", vec![1.0, 0.0]).unwrap();
        cache.insert("gone", "two", vec![0.0, 1.0]).unwrap();
        cache.insert("keep", "three", vec![1.0, 1.0]).unwrap();

        let live = Ruleset::default().with_rule(Rule::new("keep").with_keyword("one"));
        assert_eq!(cache.retain_rules(&live), 1);

        assert_eq!(cache.len(), 2);
        assert!(cache.contains("three"));
        assert!(!cache.contains("two"));
        assert_eq!(cache.get("three").unwrap().source_keyword, "three");
    }
}
