//! Ollama embedding provider implementation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use parley_core::error::{ParleyError, ParleyResult};
use parley_core::semantic::normalize;
use parley_core::traits::{Embedder, EmbedderConfig, EmbeddingAction};

const DEFAULT_BASE_URL: &str = "http://localhost:11434";

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

/// Ollama embedding provider, talking to `POST {base_url}/api/embed`.
pub struct OllamaEmbedder {
    client: reqwest::Client,
    endpoint: url::Url,
    config: EmbedderConfig,
}

impl OllamaEmbedder {
    /// Create a new Ollama embedder.
    pub fn new(config: EmbedderConfig) -> ParleyResult<Self> {
        let base_url = config.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL);

        let invalid =
            |e: url::ParseError| ParleyError::Configuration(format!("Invalid Ollama URL: {}", e));

        // join() replaces the last path segment unless the base ends in '/'
        let mut base = url::Url::parse(base_url).map_err(invalid)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let endpoint = base.join("api/embed").map_err(invalid)?;

        Ok(Self {
            client: reqwest::Client::new(),
            endpoint,
            config,
        })
    }

    /// The embed endpoint requests are sent to.
    pub fn endpoint(&self) -> &url::Url {
        &self.endpoint
    }

    async fn request(&self, input: &[String]) -> ParleyResult<Vec<Vec<f32>>> {
        let body = EmbedRequest {
            model: &self.config.model,
            input,
        };

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&body)
            .send()
            .await
            .map_err(|e| ParleyError::network(format!("Ollama request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ParleyError::from_http_status(status.as_u16(), &text));
        }

        let text = response
            .text()
            .await
            .map_err(|e| ParleyError::network(format!("Ollama response unreadable: {}", e)))?;

        let vectors = parse_embeddings(&text, input.len())?;
        debug!(model = %self.config.model, count = vectors.len(), "Ollama embeddings generated");
        Ok(vectors)
    }
}

/// Parse an `/api/embed` body, checking one unit vector per input.
fn parse_embeddings(body: &str, expected: usize) -> ParleyResult<Vec<Vec<f32>>> {
    let response: EmbedResponse = serde_json::from_str(body)
        .map_err(|e| ParleyError::parse(format!("Invalid Ollama response: {}", e)))?;

    if response.embeddings.len() != expected {
        return Err(ParleyError::embedding(format!(
            "Ollama returned {} embeddings for {} inputs",
            response.embeddings.len(),
            expected
        )));
    }

    response
        .embeddings
        .into_iter()
        .map(|v| {
            normalize(v).ok_or_else(|| {
                ParleyError::invalid_vector("Ollama returned a zero or empty vector")
            })
        })
        .collect()
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    async fn embed(&self, text: &str, _action: Option<EmbeddingAction>) -> ParleyResult<Vec<f32>> {
        let mut vectors = self.request(&[text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| ParleyError::embedding("No embedding returned"))
    }

    async fn embed_batch(
        &self,
        texts: &[String],
        _action: Option<EmbeddingAction>,
    ) -> ParleyResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        self.request(texts).await
    }

    fn dimension(&self) -> usize {
        self.config.embedding_dims
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_core::error::ErrorCode;

    fn config(base_url: Option<&str>) -> EmbedderConfig {
        EmbedderConfig {
            model: "nomic-embed-text".to_string(),
            embedding_dims: 768,
            api_key: None,
            base_url: base_url.map(str::to_string),
        }
    }

    #[test]
    fn test_endpoint_from_base_url() {
        let embedder = OllamaEmbedder::new(config(None)).unwrap();
        assert_eq!(embedder.endpoint().as_str(), "http://localhost:11434/api/embed");

        let embedder = OllamaEmbedder::new(config(Some("http://gpu-box:9000"))).unwrap();
        assert_eq!(embedder.endpoint().as_str(), "http://gpu-box:9000/api/embed");
        assert_eq!(embedder.dimension(), 768);
        assert_eq!(embedder.model_name(), "nomic-embed-text");
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        for base in ["http://proxy.local/ollama", "http://proxy.local/ollama/"] {
            let embedder = OllamaEmbedder::new(config(Some(base))).unwrap();
            assert_eq!(embedder.endpoint().as_str(), "http://proxy.local/ollama/api/embed");
        }
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(
            OllamaEmbedder::new(config(Some("not a url"))),
            Err(ParleyError::Configuration(_))
        ));
    }

    #[test]
    fn test_parse_embeddings_normalizes() {
        let body = r#"{"model":"m","embeddings":[[3.0,4.0],[0.0,2.0]]}"#;
        let vectors = parse_embeddings(body, 2).unwrap();
        assert_eq!(vectors[0], vec![0.6, 0.8]);
        assert_eq!(vectors[1], vec![0.0, 1.0]);
    }

    #[test]
    fn test_parse_embeddings_rejects_bad_bodies() {
        assert_eq!(
            parse_embeddings("<html>", 1).unwrap_err().code(),
            ErrorCode::ParseInvalidJson
        );
        assert_eq!(
            parse_embeddings(r#"{"embeddings":[[0.0,0.0]]}"#, 1).unwrap_err().code(),
            ErrorCode::EmbInvalidVector
        );
        assert!(parse_embeddings(r#"{"embeddings":[]}"#, 1).is_err());
    }
}
