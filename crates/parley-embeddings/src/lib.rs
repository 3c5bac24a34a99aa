//! parley-embeddings - Embedding provider implementations for parley.
//!
//! These back the semantic tier of [`parley_core::ResolutionEngine`]. Every
//! provider returns unit-normalized vectors.
//!
//! # Supported Providers
//!
//! - **OpenAI** (feature: `openai`) - text-embedding-3-small, text-embedding-3-large, etc.
//! - **Ollama** - Local embedding models via the Ollama `/api/embed` endpoint
//!
//! # Example
//!
//! ```ignore
//! use parley_embeddings::EmbedderFactory;
//!
//! // Create an OpenAI embedder
//! let embedder = EmbedderFactory::openai()?;
//!
//! // Or from the engine configuration
//! let config = parley_core::EngineConfig::from_env();
//! let embedder = EmbedderFactory::from_config(&config.embedder)?;
//!
//! // Create an Ollama embedder
//! let embedder = EmbedderFactory::ollama_with_model("nomic-embed-text", 768)?;
//! ```

mod factory;
mod ollama;
mod openai;

pub use factory::EmbedderFactory;
pub use ollama::OllamaEmbedder;
pub use openai::OpenAIEmbedder;

// Re-export core types for convenience
pub use parley_core::traits::{Embedder, EmbedderConfig, EmbedderProvider, EmbeddingAction};
