use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::store::StoredDocument;

/// Response for a successful document upload
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UploadDocumentResponse {
    pub document_id: String,
    pub filename: String,
    /// Number of indexed chunks
    pub chunks: usize,
    pub bytes: u64,
    pub message: String,
}

/// Document metadata
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DocumentResponse {
    pub id: String,
    pub filename: String,
    pub bytes: u64,
    pub chunks: usize,
    /// Unix timestamp of the upload
    pub uploaded_at: i64,
}

impl DocumentResponse {
    pub fn from_document(document: &StoredDocument) -> Self {
        Self {
            id: document.id.to_string(),
            filename: document.filename.clone(),
            bytes: document.size_bytes,
            chunks: document.chunks.len(),
            uploaded_at: document.uploaded_at.timestamp(),
        }
    }
}

/// Response for document list
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DocumentListResponse {
    pub object: String, // Always "list"
    pub data: Vec<DocumentResponse>,
}

/// Response for document deletion
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DocumentDeleteResponse {
    pub id: String,
    pub deleted: bool,
}
