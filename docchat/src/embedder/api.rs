//! Remote OpenAI-compatible embeddings provider.

use async_openai::types::embeddings::CreateEmbeddingResponse;
use async_trait::async_trait;
use serde_json::json;
use url::Url;

use super::{EmbedError, Embedder, Result};

/// Embeds text by calling an OpenAI-compatible `/embeddings` endpoint.
pub struct ApiEmbedder {
    client: reqwest::Client,
    api_url: Url,
    api_key: Option<String>,
    model: String,
}

impl ApiEmbedder {
    pub fn new(client: reqwest::Client, api_url: Url, api_key: Option<String>, model: String) -> Self {
        Self {
            client,
            api_url,
            api_key,
            model,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/embeddings", self.api_url.as_str().trim_end_matches('/'))
    }
}

#[async_trait]
impl Embedder for ApiEmbedder {
    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>> {
        let payload = json!({
            "model": self.model,
            "input": inputs,
        });

        let mut request = self.client.post(self.endpoint()).json(&payload);
        if let Some(api_key) = &self.api_key {
            request = request.header("Authorization", format!("Bearer {}", api_key));
        }

        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(EmbedError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: CreateEmbeddingResponse = response.json().await?;

        if body.data.len() != inputs.len() {
            return Err(EmbedError::ShapeMismatch {
                expected: inputs.len(),
                got: body.data.len(),
            });
        }

        // Providers are allowed to return vectors out of order; the index field is authoritative
        let mut vectors: Vec<(u32, Vec<f32>)> = body.data.into_iter().map(|e| (e.index, e.embedding)).collect();
        vectors.sort_by_key(|(index, _)| *index);

        Ok(vectors.into_iter().map(|(_, embedding)| embedding).collect())
    }

    fn name(&self) -> &'static str {
        "api"
    }
}
