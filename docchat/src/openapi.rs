//! OpenAPI documentation configuration.
//!
//! The generated document is served with a Scalar UI at `/docs`.

use utoipa::OpenApi;

use crate::api::handlers;
use crate::api::models::{
    chat::{AnswerResponse, QuestionRequest},
    documents::{DocumentDeleteResponse, DocumentListResponse, DocumentResponse, UploadDocumentResponse},
    settings::{SettingsInfoResponse, SettingsResponse, SettingsUpdateRequest},
};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "docchat API",
        description = "Upload documents and ask grounded questions about them"
    ),
    paths(
        handlers::documents::upload_document,
        handlers::documents::list_documents,
        handlers::documents::get_document,
        handlers::documents::delete_document,
        handlers::chat::ask_question,
        handlers::settings::update_settings,
        handlers::settings::get_settings,
    ),
    components(schemas(
        UploadDocumentResponse,
        DocumentResponse,
        DocumentListResponse,
        DocumentDeleteResponse,
        QuestionRequest,
        AnswerResponse,
        SettingsUpdateRequest,
        SettingsResponse,
        SettingsInfoResponse,
    )),
    tags(
        (name = "documents", description = "Document upload and management"),
        (name = "chat", description = "Question answering over documents"),
        (name = "settings", description = "Runtime settings")
    )
)]
pub struct ApiDoc;
