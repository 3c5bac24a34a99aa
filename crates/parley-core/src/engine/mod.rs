//! Resolution engine: the single entry point for turning an utterance into a
//! canned response.
//!
//! Tiers run in a fixed order and never loop back:
//!
//! 1. lexical match -> weighted pick from the rule's pool;
//! 2. semantic match -> weighted pick from the rule's pool;
//! 3. `None`, telling the caller to try external generation and then
//!    [`ResolutionEngine::fallback`].
//!
//! The active ruleset and keyword cache live in one immutable snapshot behind
//! an `Arc`. Reload builds a complete new snapshot and swaps it in, so
//! concurrent resolutions always see a consistent pair.

use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::error::ParleyResult;
use crate::lexical::LexicalMatcher;
use crate::ruleset::{load_or_empty, FileRulesetSource, RulesetSource};
use crate::selection::select;
use crate::semantic::{match_semantic, KeywordEmbeddingCache, PrecomputeStats};
use crate::traits::Embedder;
use crate::types::{MatchTier, Resolution, Ruleset};

/// Ruleset and keyword cache published together.
#[derive(Debug, Default)]
struct ActiveState {
    ruleset: Ruleset,
    cache: KeywordEmbeddingCache,
}

/// Owns the active ruleset and resolves input against it.
///
/// Share it as `Arc<ResolutionEngine>`; every method takes `&self`.
pub struct ResolutionEngine {
    config: EngineConfig,
    lexical: LexicalMatcher,
    embedder: Option<Arc<dyn Embedder>>,
    active: RwLock<Arc<ActiveState>>,
    reload_lock: Mutex<()>,
}

impl ResolutionEngine {
    /// Create an engine with an empty ruleset.
    ///
    /// Without an embedder the semantic tier is skipped on every call.
    pub fn new(config: EngineConfig, embedder: Option<Arc<dyn Embedder>>) -> ParleyResult<Self> {
        config.validate()?;
        let lexical = LexicalMatcher::new(config.lexical.clone());

        Ok(Self {
            config,
            lexical,
            embedder,
            active: RwLock::new(Arc::new(ActiveState::default())),
            reload_lock: Mutex::new(()),
        })
    }

    /// Create an engine and publish `ruleset`.
    pub async fn with_ruleset(
        config: EngineConfig,
        embedder: Option<Arc<dyn Embedder>>,
        ruleset: Ruleset,
    ) -> ParleyResult<Self> {
        let engine = Self::new(config, embedder)?;
        engine.load(ruleset).await;
        Ok(engine)
    }

    /// Create an engine from a ruleset source.
    ///
    /// A source that fails to load leaves the engine with an empty ruleset.
    pub async fn from_source(
        config: EngineConfig,
        embedder: Option<Arc<dyn Embedder>>,
        source: &dyn RulesetSource,
    ) -> ParleyResult<Self> {
        let ruleset = load_or_empty(source);
        Self::with_ruleset(config, embedder, ruleset).await
    }

    /// Create an engine from the ruleset file named in `config.ruleset_path`.
    pub async fn from_config(
        config: EngineConfig,
        embedder: Option<Arc<dyn Embedder>>,
    ) -> ParleyResult<Self> {
        let source = FileRulesetSource::new(config.ruleset_path.clone());
        Self::from_source(config, embedder, &source).await
    }

    /// Publish the initial ruleset. Same as [`Self::reload`].
    pub async fn load(&self, ruleset: Ruleset) -> PrecomputeStats {
        self.reload(ruleset).await
    }

    /// Replace the active ruleset.
    ///
    /// Malformed rules are logged and dropped, keyword embeddings are
    /// computed into a copy of the current cache, and only then is the new
    /// snapshot published. Keywords already cached are not re-embedded and,
    /// unless `semantic.evict_stale_keywords` is set, entries whose rule was
    /// removed are kept.
    pub async fn reload(&self, ruleset: Ruleset) -> PrecomputeStats {
        let _writer = self.reload_lock.lock().await;

        let (ruleset, issues) = ruleset.sanitize();
        for issue in &issues {
            warn!(
                rule_id = issue.rule_id().unwrap_or_default(),
                dropped = issue.is_dropped(),
                "Malformed rule: {}",
                issue
            );
        }

        let mut cache = self.snapshot().await.cache.clone();
        if self.config.semantic.evict_stale_keywords {
            let evicted = cache.retain_rules(&ruleset);
            debug!(evicted, "Evicted keyword embeddings of removed rules");
        }

        let stats = match (&self.embedder, self.config.semantic.enabled) {
            (Some(embedder), true) => cache.precompute(&ruleset, embedder.as_ref()).await,
            _ => PrecomputeStats::default(),
        };

        let next = Arc::new(ActiveState { ruleset, cache });
        info!(
            rules = next.ruleset.rules.len(),
            general_responses = next.ruleset.general_responses.len(),
            cached_keywords = next.cache.len(),
            embedded = stats.embedded,
            failed = stats.failed,
            "Ruleset published"
        );
        *self.active.write().await = next;

        stats
    }

    /// Reload from a source. On failure the active ruleset is kept and the
    /// error is returned.
    pub async fn reload_from(&self, source: &dyn RulesetSource) -> ParleyResult<PrecomputeStats> {
        let ruleset = source.load()?;
        Ok(self.reload(ruleset).await)
    }

    /// Resolve `input` to a canned response.
    ///
    /// `Ok(None)` means neither tier matched and the caller should fall back
    /// to generation and then [`Self::fallback`]. Errors are reserved for
    /// infrastructure faults such as a corrupted embedding cache.
    pub async fn resolve(&self, input: &str) -> ParleyResult<Option<String>> {
        Ok(self.resolve_detailed(input).await?.map(|r| r.response))
    }

    /// Like [`Self::resolve`], also reporting the rule, tier and keyword.
    pub async fn resolve_detailed(&self, input: &str) -> ParleyResult<Option<Resolution>> {
        let state = self.snapshot().await;

        if let Some(hit) = self.lexical.match_rules(input, &state.ruleset.rules) {
            debug!(
                rule_id = %hit.rule.id,
                keyword = hit.keyword,
                kind = ?hit.kind,
                "Lexical match"
            );
            return Ok(Some(Resolution {
                rule_id: hit.rule.id.clone(),
                tier: MatchTier::Lexical,
                keyword: hit.keyword.to_string(),
                score: hit.kind.similarity().map(|s| s as f32),
                response: select(&hit.rule.response_pool),
            }));
        }

        if !self.config.semantic.enabled {
            debug!("Semantic tier disabled, input unresolved");
            return Ok(None);
        }

        let hit = match_semantic(
            input,
            self.embedder.as_deref(),
            &state.cache,
            self.config.semantic.similarity_threshold,
        )
        .await?;

        if let Some(hit) = hit {
            match state.ruleset.rule(&hit.rule_id) {
                Some(rule) => {
                    return Ok(Some(Resolution {
                        rule_id: rule.id.clone(),
                        tier: MatchTier::Semantic,
                        keyword: hit.keyword,
                        score: Some(hit.score),
                        response: select(&rule.response_pool),
                    }));
                }
                None => {
                    warn!(
                        rule_id = %hit.rule_id,
                        keyword = %hit.keyword,
                        score = hit.score,
                        "Semantic match points at a rule that is no longer active"
                    );
                }
            }
        }

        debug!("Input unresolved by lexical and semantic tiers");
        Ok(None)
    }

    /// A general response, independent of input.
    pub async fn fallback(&self) -> String {
        select(&self.snapshot().await.ruleset.general_responses)
    }

    /// Number of active rules.
    pub async fn rule_count(&self) -> usize {
        self.snapshot().await.ruleset.rules.len()
    }

    /// Number of cached keyword embeddings, including stale ones.
    pub async fn cached_keyword_count(&self) -> usize {
        self.snapshot().await.cache.len()
    }

    /// Whether an embedder was supplied.
    pub fn has_embedder(&self) -> bool {
        self.embedder.is_some()
    }

    /// The engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    async fn snapshot(&self) -> Arc<ActiveState> {
        self.active.read().await.clone()
    }
}
