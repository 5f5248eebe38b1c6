use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Runtime settings update.
///
/// `api_key` set to an empty string clears the runtime override; omitting the
/// field leaves the current override untouched.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SettingsUpdateRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

/// Acknowledgement for a settings update
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SettingsResponse {
    pub status: String,
    pub message: String,
}

/// Current (non-secret) settings state
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SettingsInfoResponse {
    /// Whether any LLM API key is available (configured or overridden); the key itself is never returned
    pub api_key_configured: bool,
    pub llm_model: String,
    pub embedder: String,
}
