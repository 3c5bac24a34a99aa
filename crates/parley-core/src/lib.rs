//! parley-core - Response resolution for scripted characters.
//!
//! Given a line of user text, the engine decides whether an authored rule
//! applies and, if so, returns one of that rule's canned responses picked by
//! weight. Matching runs in two tiers: a lexical tier (stems, phrases and
//! fuzzy single words, with stop words ignored) and a semantic tier
//! (cosine similarity against cached keyword embeddings). When neither tier
//! matches, the caller is told so and decides what to do next.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use parley_core::{EngineConfig, ResolutionEngine, Rule, Ruleset};
//!
//! let ruleset = Ruleset::default()
//!     .with_rule(
//!         Rule::new("greeting")
//!             .with_keyword("hello")
//!             .with_response(0.4, "Hail, traveler.")
//!             .with_response(0.6, "Well met."),
//!     )
//!     .with_general_response(1.0, "The stars are quiet tonight.");
//!
//! let engine = ResolutionEngine::with_ruleset(EngineConfig::default(), Some(embedder), ruleset).await?;
//!
//! match engine.resolve("hello there").await? {
//!     Some(reply) => println!("{reply}"),
//!     None => println!("{}", engine.fallback().await),
//! }
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod lexical;
pub mod ruleset;
pub mod selection;
pub mod semantic;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use config::{EngineConfig, EngineConfigBuilder, LexicalConfig, SemanticConfig};
pub use engine::ResolutionEngine;
pub use error::{ErrorCode, ParleyError, ParleyResult};
pub use lexical::{match_lexical, LexicalMatcher};
pub use ruleset::{load_or_empty, FileRulesetSource, RulesetSource, StaticRulesetSource};
pub use selection::{select, select_with_rng, EMPTY_POOL_RESPONSE};
pub use semantic::{match_semantic, KeywordEmbeddingCache, PrecomputeStats, SemanticMatch};
pub use traits::{Embedder, EmbedderConfig, EmbedderProvider, EmbeddingAction};
pub use types::{MatchTier, Resolution, ResponseOption, Rule, RuleIssue, Ruleset};
