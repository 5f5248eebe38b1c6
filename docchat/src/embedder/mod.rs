//! Embedding provider abstraction layer
//!
//! This module defines the `Embedder` trait which abstracts text vectorization
//! across providers: a remote OpenAI-compatible `/embeddings` endpoint, or the
//! built-in lexical vectorizer for offline operation.

use async_trait::async_trait;

use crate::config::EmbedderConfig;

pub mod api;
pub mod lexical;

/// Create an embedder from configuration
///
/// This is the single point where we convert config into provider instances.
/// Adding a new provider requires adding a match arm here.
pub fn create_embedder(config: &EmbedderConfig, http_client: reqwest::Client) -> Box<dyn Embedder> {
    match config {
        EmbedderConfig::Api { api_url, api_key, model } => Box::new(api::ApiEmbedder::new(
            http_client,
            api_url.clone(),
            api_key.clone(),
            model.clone(),
        )),
        EmbedderConfig::Lexical { dimensions } => Box::new(lexical::LexicalEmbedder::new(*dimensions)),
    }
}

/// Result type for embedding operations
pub type Result<T> = std::result::Result<T, EmbedError>;

/// Errors that can occur while embedding text
#[derive(Debug, thiserror::Error)]
pub enum EmbedError {
    #[error("Embedding API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Embedding request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Embedding response had {got} vectors for {expected} inputs")]
    ShapeMismatch { expected: usize, got: usize },
}

/// Turns text into fixed-dimension vectors for cosine retrieval.
///
/// Implementations must be deterministic for a given input within one process
/// lifetime, and must return exactly one vector per input, in input order.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a batch of texts. Returns one vector per input, in order.
    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Provider name for logs and the settings endpoint
    fn name(&self) -> &'static str;
}
