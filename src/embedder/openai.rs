//! OpenAI-compatible embedding client.
//!
//! Wraps [`async_openai`] to provide [`EmbedderClient`], with a `moka`
//! cache so re-embedding a repeated guess costs nothing. A custom base URL
//! points the client at any OpenAI-compatible endpoint (e.g. a local
//! Ollama at `http://127.0.0.1:11434/v1`).
//!
//! The client makes exactly one attempt per call; the search loop owns the
//! retry policy.

use std::time::Duration;

use async_openai::{config::OpenAIConfig, types::CreateEmbeddingRequestArgs, Client};
use moka::future::Cache;

use crate::embedder::{Embedding, EmbedderClient};
use crate::errors::{Result, SearchError};

/// Default embedding model name.
pub const DEFAULT_MODEL: &str = "text-embedding-3-small";

/// Maximum number of inputs per embeddings API call.
const BATCH_CHUNK_SIZE: usize = 2048;

/// Return the embedding dimension for a given model name.
///
/// Falls back to 1536 (the `text-embedding-3-small` dimension) for
/// unrecognised models.
fn model_dim(model: &str) -> usize {
    match model {
        "text-embedding-3-large" => 3072,
        _ => 1536,
    }
}

/// OpenAI-compatible embedding client that implements [`EmbedderClient`].
pub struct OpenAiEmbedder {
    client: Client<OpenAIConfig>,
    model: String,
    dim: usize,
    /// Keyed by `md5(model + text)` → embedding vector.
    cache: Cache<String, Embedding>,
}

impl OpenAiEmbedder {
    /// Create a new embedder.
    ///
    /// # Arguments
    /// * `api_key` – API key (`sk-…`; any non-empty value for local backends).
    /// * `model`   – Embedding model name (e.g. [`DEFAULT_MODEL`]).
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        let config = OpenAIConfig::new().with_api_key(api_key.into());
        Self::with_config(config, model)
    }

    /// Create a new embedder pointing at a custom API base URL.
    pub fn with_api_base(
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        let config = OpenAIConfig::new()
            .with_api_key(api_key.into())
            .with_api_base(base_url.into());
        Self::with_config(config, model)
    }

    fn with_config(config: OpenAIConfig, model: impl Into<String>) -> Self {
        let model = model.into();
        let dim = model_dim(&model);
        Self {
            client: Client::with_config(config),
            model,
            dim,
            cache: Cache::builder()
                .max_capacity(10_000)
                .time_to_live(Duration::from_secs(3_600))
                .build(),
        }
    }

    /// Compute an MD5 cache key from model + text.
    fn cache_key(&self, text: &str) -> String {
        use md5::{Digest, Md5};
        let mut h = Md5::new();
        h.update(self.model.as_bytes());
        h.update(text.as_bytes());
        format!("{:x}", h.finalize())
    }

    /// Issue a single embeddings API call for up to [`BATCH_CHUNK_SIZE`] texts.
    async fn request_chunk(&self, texts: &[&str]) -> Result<Vec<Embedding>> {
        let input: Vec<String> = texts.iter().map(|s| (*s).to_owned()).collect();

        let request = CreateEmbeddingRequestArgs::default()
            .model(self.model.as_str())
            .input(input)
            .build()
            .map_err(|e| SearchError::Embedder(e.to_string()))?;

        let response = self
            .client
            .embeddings()
            .create(request)
            .await
            .map_err(|e| SearchError::Embedder(e.to_string()))?;

        let embeddings: Vec<Embedding> = response
            .data
            .into_iter()
            .map(|item| item.embedding.into_iter().map(|x| x as f32).collect())
            .collect();

        if embeddings.len() != texts.len() {
            return Err(SearchError::Embedder(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                embeddings.len()
            )));
        }

        Ok(embeddings)
    }
}

impl EmbedderClient for OpenAiEmbedder {
    /// Embed a single text string, consulting the cache first.
    async fn embed(&self, text: &str) -> Result<Embedding> {
        let key = self.cache_key(text);

        if let Some(cached) = self.cache.get(&key).await {
            return Ok(cached);
        }

        let mut embeddings = self.request_chunk(&[text]).await?;
        let embedding = embeddings
            .pop()
            .ok_or_else(|| SearchError::Embedder("empty response from embedding API".to_string()))?;

        self.cache.insert(key, embedding.clone()).await;

        Ok(embedding)
    }

    /// Embed multiple texts, splitting into chunks of at most
    /// [`BATCH_CHUNK_SIZE`] items to respect per-call limits.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>> {
        let mut result = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(BATCH_CHUNK_SIZE) {
            let chunk_embeddings = self.request_chunk(chunk).await?;
            result.extend(chunk_embeddings);
        }
        Ok(result)
    }

    fn dim(&self) -> usize {
        self.dim
    }
}
