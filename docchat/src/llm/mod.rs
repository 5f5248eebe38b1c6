//! Chat completion client for answering questions over retrieved context.

mod prompt;

pub use prompt::build_prompt;

use async_openai::types::chat::CreateChatCompletionResponse;
use serde_json::json;

use crate::config::LlmConfig;

/// Result type for chat completion operations
pub type Result<T> = std::result::Result<T, LlmError>;

/// Errors that can occur while querying the chat completion provider
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    /// No key available from the request, the settings override, or the config file
    #[error("No LLM API key configured")]
    MissingApiKey,

    #[error("Chat completion API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Chat completion request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Chat completion response contained no answer")]
    EmptyResponse,
}

/// Client for an OpenAI-compatible `/chat/completions` endpoint.
///
/// The API key is resolved per call: an explicit key passed to [`ask`]
/// (request override or the runtime settings override) wins over the
/// configured one.
///
/// [`ask`]: ChatClient::ask
pub struct ChatClient {
    client: reqwest::Client,
    config: LlmConfig,
}

impl ChatClient {
    pub fn new(client: reqwest::Client, config: LlmConfig) -> Self {
        Self { client, config }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.api_url.as_str().trim_end_matches('/'))
    }

    /// Answer a question grounded in the given context chunks.
    pub async fn ask(&self, question: &str, context: &[String], api_key: Option<&str>) -> Result<String> {
        let api_key = api_key.or(self.config.api_key.as_deref()).ok_or(LlmError::MissingApiKey)?;

        let prompt = build_prompt(context, question);

        let payload = json!({
            "model": self.config.model,
            "messages": [
                {
                    "role": "user",
                    "content": prompt
                }
            ],
            "temperature": self.config.temperature,
            "max_tokens": self.config.max_tokens
        });

        let response = self
            .client
            .post(self.endpoint())
            .header("Authorization", format!("Bearer {}", api_key))
            .timeout(self.config.request_timeout)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: CreateChatCompletionResponse = response.json().await?;

        body.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|answer| !answer.is_empty())
            .ok_or(LlmError::EmptyResponse)
    }
}
