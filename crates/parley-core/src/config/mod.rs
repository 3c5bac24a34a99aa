//! Configuration system for parley.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::{ParleyError, ParleyResult};
use crate::traits::{EmbedderConfig, EmbedderProvider};

/// Lexical tier tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LexicalConfig {
    /// Keywords and tokens shorter than this (in chars) never fuzzy-match.
    /// Default: 4
    pub min_fuzzy_length: usize,
    /// Minimum Jaro-Winkler similarity for a fuzzy match.
    /// Range: 0.0-1.0. Default: 0.88
    pub fuzzy_threshold: f64,
}

impl Default for LexicalConfig {
    fn default() -> Self {
        Self {
            min_fuzzy_length: 4,
            fuzzy_threshold: 0.88,
        }
    }
}

/// Semantic tier tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SemanticConfig {
    /// Whether the semantic tier runs at all.
    pub enabled: bool,
    /// The best cosine score must be strictly greater than this to match.
    /// Range: 0.0-1.0. Default: 0.65
    pub similarity_threshold: f32,
    /// Drop cached keyword vectors whose rule is gone after a reload.
    /// Default: false (the cache only grows).
    pub evict_stale_keywords: bool,
}

impl Default for SemanticConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            similarity_threshold: 0.65,
            evict_stale_keywords: false,
        }
    }
}

/// Embedder provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbedderProviderConfig {
    /// Provider type.
    pub provider: EmbedderProvider,
    /// Provider-specific configuration.
    #[serde(flatten)]
    pub config: EmbedderConfig,
}

impl Default for EmbedderProviderConfig {
    fn default() -> Self {
        Self {
            provider: EmbedderProvider::OpenAI,
            config: EmbedderConfig::default(),
        }
    }
}

/// Main engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Lexical matcher configuration.
    pub lexical: LexicalConfig,
    /// Semantic matcher configuration.
    pub semantic: SemanticConfig,
    /// Embedder configuration.
    pub embedder: EmbedderProviderConfig,
    /// Path to the ruleset file.
    pub ruleset_path: PathBuf,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let parley_dir = dirs::home_dir()
            .map(|h| h.join(".parley"))
            .unwrap_or_else(|| PathBuf::from(".parley"));

        Self {
            lexical: LexicalConfig::default(),
            semantic: SemanticConfig::default(),
            embedder: EmbedderProviderConfig::default(),
            ruleset_path: parley_dir.join("rules.json"),
        }
    }
}

impl EngineConfig {
    /// Load configuration from a file (TOML, JSON, or YAML).
    pub fn from_file(path: impl AsRef<std::path::Path>) -> ParleyResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let ext = path.as_ref().extension().and_then(|e| e.to_str());

        let config: Self = match ext {
            Some("toml") => {
                toml::from_str(&content).map_err(|e| ParleyError::Configuration(e.to_string()))?
            }
            Some("json") => serde_json::from_str(&content)
                .map_err(|e| ParleyError::Configuration(e.to_string()))?,
            Some("yaml" | "yml") => serde_yaml::from_str(&content)
                .map_err(|e| ParleyError::Configuration(e.to_string()))?,
            _ => {
                return Err(ParleyError::Configuration(
                    "Unsupported config file format. Use .toml, .json, or .yaml".to_string(),
                ))
            }
        };

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from environment variables.
    ///
    /// Unparseable values are ignored and the default is kept.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(path) = std::env::var("PARLEY_RULESET_PATH") {
            config.ruleset_path = PathBuf::from(path);
        }

        // Semantic tier
        if let Some(threshold) = env_parse::<f32>("PARLEY_SEMANTIC_THRESHOLD") {
            config.semantic.similarity_threshold = threshold;
        }
        if let Some(enabled) = env_parse::<bool>("PARLEY_SEMANTIC_ENABLED") {
            config.semantic.enabled = enabled;
        }

        // Lexical tier
        if let Some(threshold) = env_parse::<f64>("PARLEY_FUZZY_THRESHOLD") {
            config.lexical.fuzzy_threshold = threshold;
        }
        if let Some(len) = env_parse::<usize>("PARLEY_MIN_FUZZY_LENGTH") {
            config.lexical.min_fuzzy_length = len;
        }

        // Embedder
        if let Some(provider) = env_parse::<EmbedderProvider>("PARLEY_EMBEDDER_PROVIDER") {
            config.embedder.provider = provider;
        }
        if let Ok(model) = std::env::var("PARLEY_EMBEDDER_MODEL") {
            config.embedder.config.model = model;
        }
        if let Ok(api_key) = std::env::var("OPENAI_API_KEY") {
            config.embedder.config.api_key = Some(api_key);
        }

        config
    }

    /// Build configuration using builder pattern.
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder::default()
    }

    /// Validate configuration values are in valid ranges.
    pub fn validate(&self) -> ParleyResult<()> {
        if !(0.0..=1.0).contains(&self.lexical.fuzzy_threshold) {
            return Err(ParleyError::Configuration(
                "lexical.fuzzy_threshold must be between 0.0 and 1.0".to_string(),
            ));
        }
        if self.lexical.min_fuzzy_length == 0 {
            return Err(ParleyError::Configuration(
                "lexical.min_fuzzy_length must be at least 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.semantic.similarity_threshold) {
            return Err(ParleyError::Configuration(
                "semantic.similarity_threshold must be between 0.0 and 1.0".to_string(),
            ));
        }
        Ok(())
    }
}

fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

/// Builder for EngineConfig.
#[derive(Default)]
pub struct EngineConfigBuilder {
    config: EngineConfig,
}

impl EngineConfigBuilder {
    /// Set lexical configuration.
    pub fn lexical(mut self, config: LexicalConfig) -> Self {
        self.config.lexical = config;
        self
    }

    /// Set semantic configuration.
    pub fn semantic(mut self, config: SemanticConfig) -> Self {
        self.config.semantic = config;
        self
    }

    /// Set the semantic similarity threshold.
    pub fn similarity_threshold(mut self, threshold: f32) -> Self {
        self.config.semantic.similarity_threshold = threshold;
        self
    }

    /// Turn eviction of stale keyword vectors on reload on or off.
    pub fn evict_stale_keywords(mut self, evict: bool) -> Self {
        self.config.semantic.evict_stale_keywords = evict;
        self
    }

    /// Set embedder configuration.
    pub fn embedder(mut self, config: EmbedderProviderConfig) -> Self {
        self.config.embedder = config;
        self
    }

    /// Set ruleset path.
    pub fn ruleset_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.ruleset_path = path.into();
        self
    }

    /// Build the configuration.
    pub fn build(self) -> EngineConfig {
        self.config
    }
}
