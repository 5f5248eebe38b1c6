use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::types::DocumentId;

/// A question about one uploaded document
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct QuestionRequest {
    pub question: String,
    #[schema(value_type = String, format = "uuid")]
    pub document_id: DocumentId,
    /// Per-request LLM API key, overriding the runtime and configured keys
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

/// The model's answer
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AnswerResponse {
    pub answer: String,
}
