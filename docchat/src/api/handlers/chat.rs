use crate::AppState;
use crate::api::models::chat::{AnswerResponse, QuestionRequest};
use crate::errors::{Error, Result};
use crate::retrieval;
use crate::types::abbrev_uuid;
use axum::{Json, extract::State};

#[utoipa::path(
    post,
    path = "/ask-question/",
    tag = "chat",
    summary = "Ask a question",
    description = "Answers a question about one uploaded document. The most relevant chunks are \
                   retrieved by cosine similarity and sent to the chat model as grounding context.",
    request_body = QuestionRequest,
    responses(
        (status = 200, description = "Grounded answer", body = AnswerResponse),
        (status = 400, description = "Invalid request"),
        (status = 404, description = "Document not found"),
        (status = 502, description = "Upstream provider failure"),
        (status = 503, description = "No LLM API key available")
    )
)]
pub async fn ask_question(State(state): State<AppState>, Json(request): Json<QuestionRequest>) -> Result<Json<AnswerResponse>> {
    let question = request.question.trim();
    if question.is_empty() {
        return Err(Error::BadRequest {
            message: "Question cannot be empty".to_string(),
        });
    }

    let document = state.store.get(&request.document_id).ok_or_else(|| Error::NotFound {
        resource: "Document".to_string(),
        id: request.document_id.to_string(),
    })?;

    // Embed the question with the same provider that indexed the chunks
    let question_embedding = state
        .embedder
        .embed(std::slice::from_ref(&request.question))
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| Error::Internal {
            operation: "embed question".to_string(),
        })?;

    let scored = retrieval::top_k(&question_embedding, &document.chunks, state.config.retrieval.top_k);
    let context: Vec<String> = scored.iter().map(|chunk| chunk.text.clone()).collect();

    tracing::debug!(
        document_id = %abbrev_uuid(&request.document_id),
        retrieved = scored.len(),
        top_score = scored.first().map(|c| c.score as f64).unwrap_or(0.0),
        "Retrieved context for question"
    );

    // Key precedence: request override, then the runtime settings override,
    // then the configured key (resolved inside the client)
    let runtime_key = state.runtime_api_key.load_full();
    let override_key = request.api_key.as_deref().filter(|k| !k.is_empty()).or(runtime_key.as_deref().map(|k| k.as_str()));

    let answer = state.chat.ask(question, &context, override_key).await?;

    Ok(Json(AnswerResponse { answer }))
}
