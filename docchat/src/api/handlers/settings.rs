use crate::AppState;
use crate::api::models::settings::{SettingsInfoResponse, SettingsResponse, SettingsUpdateRequest};
use axum::{Json, extract::State};
use std::sync::Arc;

#[utoipa::path(
    post,
    path = "/api/settings/",
    tag = "settings",
    summary = "Update settings",
    description = "Stores a runtime LLM API key override. An empty string clears the override; \
                   an omitted field leaves it unchanged. The override lasts until the process restarts.",
    request_body = SettingsUpdateRequest,
    responses(
        (status = 200, description = "Settings updated", body = SettingsResponse)
    )
)]
pub async fn update_settings(State(state): State<AppState>, Json(request): Json<SettingsUpdateRequest>) -> Json<SettingsResponse> {
    if let Some(api_key) = request.api_key {
        if api_key.is_empty() {
            state.runtime_api_key.store(None);
            tracing::info!("Runtime LLM API key override cleared");
        } else {
            state.runtime_api_key.store(Some(Arc::new(api_key)));
            tracing::info!("Runtime LLM API key override set");
        }
    }

    Json(SettingsResponse {
        status: "success".to_string(),
        message: "Settings saved successfully".to_string(),
    })
}

#[utoipa::path(
    get,
    path = "/api/settings/",
    tag = "settings",
    summary = "Read settings",
    description = "Reports whether an LLM API key is available and which providers are active. \
                   Key material is never returned.",
    responses(
        (status = 200, description = "Current settings state", body = SettingsInfoResponse)
    )
)]
pub async fn get_settings(State(state): State<AppState>) -> Json<SettingsInfoResponse> {
    let api_key_configured = state.runtime_api_key.load().is_some() || state.config.llm.api_key.is_some();

    Json(SettingsInfoResponse {
        api_key_configured,
        llm_model: state.config.llm.model.clone(),
        embedder: state.embedder.name().to_string(),
    })
}
