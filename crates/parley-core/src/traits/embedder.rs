//! Embedder trait and related types.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::ParleyResult;

/// Why text is being embedded (some models embed queries and documents differently).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmbeddingAction {
    /// Embedding a rule keyword for the cache.
    #[default]
    Index,
    /// Embedding a user utterance to search the cache.
    Query,
}

/// Embedding collaborator used by the semantic tier.
///
/// Implementations return unit-normalized vectors of a fixed dimension. The
/// cache re-normalizes on insert, so a provider that cannot guarantee this is
/// still usable, but the dimension must stay stable for the lifetime of a
/// cache.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Generate embedding for a single text.
    async fn embed(&self, text: &str, action: Option<EmbeddingAction>) -> ParleyResult<Vec<f32>>;

    /// Generate embeddings for multiple texts (batch).
    async fn embed_batch(
        &self,
        texts: &[String],
        action: Option<EmbeddingAction>,
    ) -> ParleyResult<Vec<Vec<f32>>> {
        // Default implementation: sequential embedding
        let mut embeddings = Vec::with_capacity(texts.len());
        for text in texts {
            embeddings.push(self.embed(text, action).await?);
        }
        Ok(embeddings)
    }

    /// Get the dimension of the embeddings.
    fn dimension(&self) -> usize;

    /// Get the model name.
    fn model_name(&self) -> &str;
}

/// Embedder configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbedderConfig {
    /// Model name/identifier.
    pub model: String,
    /// Embedding dimensions.
    #[serde(default = "default_embedding_dims")]
    pub embedding_dims: usize,
    /// API key (if not using environment variable).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Base URL for API.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

fn default_embedding_dims() -> usize {
    1536
}

impl Default for EmbedderConfig {
    fn default() -> Self {
        Self {
            model: "text-embedding-3-small".to_string(),
            embedding_dims: default_embedding_dims(),
            api_key: None,
            base_url: None,
        }
    }
}

/// Embedder provider type.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum EmbedderProvider {
    #[default]
    OpenAI,
    Ollama,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_provider_parsing() {
        assert_eq!(
            EmbedderProvider::from_str("Ollama").unwrap(),
            EmbedderProvider::Ollama
        );
        assert_eq!(EmbedderProvider::OpenAI.to_string(), "openai");
        assert!(EmbedderProvider::from_str("word2vec").is_err());
    }

    #[test]
    fn test_config_defaults_from_partial_json() {
        let config: EmbedderConfig =
            serde_json::from_str(r#"{"model": "nomic-embed-text"}"#).unwrap();
        assert_eq!(config.model, "nomic-embed-text");
        assert_eq!(config.embedding_dims, 1536);
        assert!(config.api_key.is_none());
    }
}
