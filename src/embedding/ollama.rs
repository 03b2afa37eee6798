//! Ollama embedding client.
//!
//! POSTs to `{host}/api/embeddings` and caches results keyed by exact text.
//! The cache is unbounded with no eviction; concurrent identical-text
//! requests may compute redundant embeddings but writes are idempotent
//! key overwrites.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tokio::sync::Mutex;

use super::{normalize, Embedder};
use crate::config::EmbeddingConfig;
use crate::error::{Error, Result};

pub struct OllamaEmbedder {
    client: reqwest::Client,
    host: String,
    model: String,
    dimensions: usize,
    cache: Mutex<HashMap<String, Vec<f32>>>,
}

#[derive(Deserialize)]
struct EmbeddingsResponse {
    embedding: Option<Vec<f32>>,
}

impl OllamaEmbedder {
    pub fn new(config: &EmbeddingConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_default();
        Self {
            client,
            host: config.ollama_host.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            dimensions: config.dimensions,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Number of cached embeddings.
    pub async fn cache_size(&self) -> usize {
        self.cache.lock().await.len()
    }

    async fn call_ollama(&self, text: &str) -> Result<Vec<f32>> {
        let response = self
            .client
            .post(format!("{}/api/embeddings", self.host))
            .json(&json!({ "model": self.model, "prompt": text }))
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() || e.is_timeout() {
                    Error::Unavailable(format!(
                        "cannot reach embedding endpoint at {}: {e}. Is Ollama running?",
                        self.host
                    ))
                } else {
                    Error::Backend(anyhow::Error::new(e).context("embedding request failed"))
                }
            })?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(Error::NotFound(format!(
                "embedding model not found: {}. Run: ollama pull {}",
                self.model, self.model
            )));
        }
        if !response.status().is_success() {
            return Err(Error::Backend(anyhow::anyhow!(
                "embedding endpoint returned {}",
                response.status()
            )));
        }

        let body: EmbeddingsResponse = response
            .json()
            .await
            .map_err(|e| Error::Backend(anyhow::anyhow!("invalid embedding response: {e}")))?;
        body.embedding.ok_or_else(|| {
            Error::Backend(anyhow::anyhow!("embedding endpoint returned no embedding"))
        })
    }
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if let Some(cached) = self.cache.lock().await.get(text) {
            return Ok(cached.clone());
        }

        let mut embedding = self.call_ollama(text).await?;
        normalize(&mut embedding)?;

        self.cache
            .lock()
            .await
            .insert(text.to_string(), embedding.clone());
        Ok(embedding)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}
