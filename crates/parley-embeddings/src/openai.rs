//! OpenAI embedding provider implementation.

use async_trait::async_trait;

use parley_core::error::{ParleyError, ParleyResult};
use parley_core::traits::{Embedder, EmbedderConfig, EmbeddingAction};

#[cfg(feature = "openai")]
use parley_core::semantic::normalize;
#[cfg(feature = "openai")]
use tracing::debug;

#[cfg(feature = "openai")]
use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::{CreateEmbeddingRequest, EmbeddingInput},
    Client,
};

/// OpenAI embedding provider.
pub struct OpenAIEmbedder {
    #[cfg(feature = "openai")]
    client: Client<OpenAIConfig>,
    config: EmbedderConfig,
}

impl OpenAIEmbedder {
    /// Create a new OpenAI embedder.
    pub fn new(config: EmbedderConfig) -> ParleyResult<Self> {
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .ok_or_else(|| {
                ParleyError::Configuration(
                    "OpenAI API key not found. Set OPENAI_API_KEY environment variable \
                     or provide api_key in config."
                        .to_string(),
                )
            })?;

        #[cfg(feature = "openai")]
        let openai_config = if let Some(ref base_url) = config.base_url {
            OpenAIConfig::new()
                .with_api_key(api_key)
                .with_api_base(base_url)
        } else {
            OpenAIConfig::new().with_api_key(api_key)
        };

        #[cfg(not(feature = "openai"))]
        let _ = api_key;

        #[cfg(feature = "openai")]
        let client = Client::with_config(openai_config);

        Ok(Self {
            #[cfg(feature = "openai")]
            client,
            config,
        })
    }

    #[cfg(feature = "openai")]
    async fn request(&self, input: EmbeddingInput, expected: usize) -> ParleyResult<Vec<Vec<f32>>> {
        let request = CreateEmbeddingRequest {
            model: self.config.model.clone(),
            input,
            ..Default::default()
        };

        let response = self
            .client
            .embeddings()
            .create(request)
            .await
            .map_err(map_openai_error)?;

        if response.data.len() != expected {
            return Err(ParleyError::embedding(format!(
                "OpenAI returned {} embeddings for {} inputs",
                response.data.len(),
                expected
            )));
        }

        let mut data = response.data;
        data.sort_by_key(|e| e.index);

        let vectors = data
            .into_iter()
            .map(|e| {
                normalize(e.embedding).ok_or_else(|| {
                    ParleyError::invalid_vector("OpenAI returned a zero or empty vector")
                })
            })
            .collect::<ParleyResult<Vec<_>>>()?;

        debug!(model = %self.config.model, count = vectors.len(), "OpenAI embeddings generated");
        Ok(vectors)
    }
}

#[cfg(feature = "openai")]
fn map_openai_error(e: OpenAIError) -> ParleyError {
    match e {
        OpenAIError::Reqwest(e) => ParleyError::network(format!("OpenAI request failed: {}", e)),
        OpenAIError::JSONDeserialize(e) => {
            ParleyError::parse(format!("Invalid OpenAI response: {}", e))
        }
        other => ParleyError::embedding(format!("OpenAI embedding error: {}", other)),
    }
}

#[async_trait]
impl Embedder for OpenAIEmbedder {
    #[cfg(feature = "openai")]
    async fn embed(&self, text: &str, _action: Option<EmbeddingAction>) -> ParleyResult<Vec<f32>> {
        let mut vectors = self
            .request(EmbeddingInput::String(text.to_string()), 1)
            .await?;
        vectors
            .pop()
            .ok_or_else(|| ParleyError::embedding("No embedding returned"))
    }

    #[cfg(not(feature = "openai"))]
    async fn embed(&self, _text: &str, _action: Option<EmbeddingAction>) -> ParleyResult<Vec<f32>> {
        Err(ParleyError::Configuration(
            "OpenAI feature not enabled. Enable the 'openai' feature.".to_string(),
        ))
    }

    #[cfg(feature = "openai")]
    async fn embed_batch(
        &self,
        texts: &[String],
        _action: Option<EmbeddingAction>,
    ) -> ParleyResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        self.request(EmbeddingInput::StringArray(texts.to_vec()), texts.len())
            .await
    }

    fn dimension(&self) -> usize {
        self.config.embedding_dims
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}
