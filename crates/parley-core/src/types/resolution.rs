//! Resolution outcome types.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Which tier produced a resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MatchTier {
    /// Phrase, stem or fuzzy keyword match.
    Lexical,
    /// Embedding similarity against cached keywords.
    Semantic,
}

/// A resolved response together with how it was found.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    /// Id of the rule that matched.
    pub rule_id: String,
    /// Tier that matched.
    pub tier: MatchTier,
    /// Keyword that triggered the match.
    pub keyword: String,
    /// Similarity score, for fuzzy and semantic matches.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
    /// Response chosen from the rule's pool.
    pub response: String,
}
