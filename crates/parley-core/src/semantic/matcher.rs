//! Nearest cached keyword search.

use tracing::{debug, error, warn};

use crate::error::{ParleyError, ParleyResult};
use crate::traits::{Embedder, EmbeddingAction};

use super::cache::{CachedKeyword, KeywordEmbeddingCache};
use super::vector::{dot, normalize};

/// Default minimum similarity; the best score must be strictly greater.
pub const DEFAULT_SIMILARITY_THRESHOLD: f32 = 0.65;

/// The best cached keyword for an input, above threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct SemanticMatch {
    /// Rule that owns the keyword.
    pub rule_id: String,
    /// The cached keyword text.
    pub keyword: String,
    /// Cosine similarity between input and keyword.
    pub score: f32,
}

/// Find the cached keyword most similar to `input`.
///
/// Degrades to `Ok(None)` when there is no embedder, the cache is empty, or
/// embedding the input fails. The only error is
/// [`ParleyError::CacheCorrupted`], raised when the input vector's dimension
/// disagrees with the cached vectors.
///
/// This is a linear scan, O(cached keywords) per query. That is fine for the
/// tens to low hundreds of keywords a persona ruleset carries; much larger
/// keyword sets would want an ANN index instead.
pub async fn match_semantic(
    input: &str,
    embedder: Option<&dyn Embedder>,
    cache: &KeywordEmbeddingCache,
    threshold: f32,
) -> ParleyResult<Option<SemanticMatch>> {
    let Some(embedder) = embedder else {
        debug!("No embedder configured, skipping semantic tier");
        return Ok(None);
    };
    if cache.is_empty() {
        debug!("Keyword embedding cache is empty, skipping semantic tier");
        return Ok(None);
    }

    let query = match embedder.embed(input, Some(EmbeddingAction::Query)).await {
        Ok(vector) => vector,
        Err(e) if e.is_embedding_unavailable() => {
            warn!(
                code = e.code().as_str(),
                error = %e,
                model = embedder.model_name(),
                "Embedder unavailable, skipping semantic tier"
            );
            return Ok(None);
        }
        Err(e) => {
            error!(
                code = e.code().as_str(),
                error = %e,
                model = embedder.model_name(),
                "Embedder returned an unusable response, skipping semantic tier"
            );
            return Ok(None);
        }
    };

    if let Some(expected) = cache.dimension() {
        if query.len() != expected {
            let err = ParleyError::dimension_mismatch(expected, query.len());
            error!(
                code = err.code().as_str(),
                error = %err,
                "Embedding cache does not match embedder"
            );
            return Err(err);
        }
    }

    let Some(query) = normalize(query) else {
        warn!("Input embedding is a zero vector, skipping semantic tier");
        return Ok(None);
    };

    let mut best: Option<(f32, &CachedKeyword)> = None;
    for entry in cache.iter() {
        let score = dot(&query, &entry.vector);
        match best {
            Some((best_score, _)) if score <= best_score => {}
            _ => best = Some((score, entry)),
        }
    }

    let Some((score, entry)) = best else {
        return Ok(None);
    };

    if score > threshold {
        debug!(rule_id = %entry.rule_id, keyword = %entry.source_keyword, score, "Semantic match");
        Ok(Some(SemanticMatch {
            rule_id: entry.rule_id.clone(),
            keyword: entry.source_keyword.clone(),
            score,
        }))
    } else {
        debug!(
            best_keyword = %entry.source_keyword,
            score,
            threshold,
            "No semantic match above threshold"
        );
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    /// Fixed vectors per text; unknown text fails.
    struct TableEmbedder(Vec<(&'static str, Vec<f32>)>);

    #[async_trait]
    impl Embedder for TableEmbedder {
        async fn embed(
            &self,
            text: &str,
            _action: Option<EmbeddingAction>,
        ) -> ParleyResult<Vec<f32>> {
            self.0
                .iter()
                .find(|(t, _)| *t == text)
                .map(|(_, v)| v.clone())
                .ok_or_else(|| ParleyError::embedding(format!("no vector for '{}'", text)))
        }

        fn dimension(&self) -> usize {
            2
        }

        fn model_name(&self) -> &str {
            "table"
        }
    }

    fn cache() -> KeywordEmbeddingCache {
        let mut cache = KeywordEmbeddingCache::new();
        cache.insert("bathroom", "bathroom", vec![1.0, 0.0]).unwrap();
        cache.insert("weather", "rain", vec![0.0, 1.0]).unwrap();
        cache
    }

    #[tokio::test]
    async fn test_best_match_above_threshold() {
        let embedder = TableEmbedder(vec![("where can I go to pee", vec![0.9, 0.1])]);
        let hit = match_semantic("where can I go to pee", Some(&embedder), &cache(), 0.65)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(hit.rule_id, "bathroom");
        assert_eq!(hit.keyword, "bathroom");
        assert!(hit.score > 0.9);
    }

    #[tokio::test]
    async fn test_threshold_is_strict() {
        // cos = 1.0 exactly against "bathroom"
        let embedder = TableEmbedder(vec![("edge", vec![3.0, 0.0])]);
        let cache = cache();

        assert!(match_semantic("edge", Some(&embedder), &cache, 1.0)
            .await
            .unwrap()
            .is_none());
        assert!(match_semantic("edge", Some(&embedder), &cache, 0.99)
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_no_embedder_or_failure_degrades() {
        let cache = cache();
        assert!(match_semantic("anything", None, &cache, 0.65).await.unwrap().is_none());

        let embedder = TableEmbedder(vec![]);
        assert!(match_semantic("anything", Some(&embedder), &cache, 0.65)
            .await
            .unwrap()
            .is_none());
    }

    /// Answers every call with an unparseable body.
    struct GarbledEmbedder;

    #[async_trait]
    impl Embedder for GarbledEmbedder {
        async fn embed(
            &self,
            _text: &str,
            _action: Option<EmbeddingAction>,
        ) -> ParleyResult<Vec<f32>> {
            Err(ParleyError::parse("unexpected token '<'"))
        }

        fn dimension(&self) -> usize {
            2
        }

        fn model_name(&self) -> &str {
            "garbled"
        }
    }

    #[tokio::test]
    async fn test_unusable_embedder_response_degrades() {
        let err = GarbledEmbedder.embed("anything", None).await.unwrap_err();
        assert!(!err.is_embedding_unavailable());

        assert!(match_semantic("anything", Some(&GarbledEmbedder), &cache(), 0.65)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_empty_cache_skips_embedding() {
        let embedder = TableEmbedder(vec![]);
        let empty = KeywordEmbeddingCache::new();
        assert!(match_semantic("hello", Some(&embedder), &empty, 0.0)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_dimension_mismatch_is_an_error() {
        let embedder = TableEmbedder(vec![("wide", vec![1.0, 0.0, 0.0])]);
        let err = match_semantic("wide", Some(&embedder), &cache(), 0.65)
            .await
            .unwrap_err();
        assert!(matches!(err, ParleyError::CacheCorrupted { .. }));
    }

    #[tokio::test]
    async fn test_ties_keep_earliest_keyword() {
        let embedder = TableEmbedder(vec![("between", vec![1.0, 1.0])]);
        let hit = match_semantic("between", Some(&embedder), &cache(), 0.5)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(hit.rule_id, "bathroom");
    }
}
