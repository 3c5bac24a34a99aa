//! Semantic tier: cached keyword embeddings and cosine nearest-neighbour search.
//!
//! Keyword vectors are computed once per reload ([`KeywordEmbeddingCache::precompute`]),
//! never on the request path. Each query costs one embedding call plus a
//! linear scan of the cache.

mod cache;
mod matcher;
mod vector;

pub use cache::{CachedKeyword, KeywordEmbeddingCache, PrecomputeStats};
pub use matcher::{match_semantic, SemanticMatch, DEFAULT_SIMILARITY_THRESHOLD};
pub use vector::{dot, normalize};
