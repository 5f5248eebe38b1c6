use crate::AppState;
use crate::api::models::documents::{DocumentDeleteResponse, DocumentListResponse, DocumentResponse, UploadDocumentResponse};
use crate::errors::{Error, Result};
use crate::ingest::{self, DocumentFormat};
use crate::store::{Chunk, StoredDocument};
use crate::types::{DocumentId, abbrev_uuid};
use axum::{
    Json,
    extract::{Multipart, Path, State},
    http::StatusCode,
};
use chrono::Utc;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

/// Remove a partially-processed upload from disk. Failures are logged and
/// swallowed: the request is already failing for the real reason.
async fn discard_upload(path: &std::path::Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        tracing::debug!(path = %path.display(), error = %e, "Could not remove discarded upload");
    }
}

/// Strip any path components from a client-supplied filename.
fn sanitize_filename(raw: &str) -> String {
    std::path::Path::new(raw)
        .file_name()
        .and_then(|name| name.to_str())
        .map(|name| name.to_string())
        .unwrap_or_else(|| "document".to_string())
}

#[utoipa::path(
    post,
    path = "/upload-document/",
    tag = "documents",
    summary = "Upload document",
    description = "Upload a document (PDF, DOCX, TXT, CSV, or Markdown). The text is extracted, \
                   chunked, and embedded so questions can be asked against it.",
    request_body(
        content_type = "multipart/form-data",
        description = "Multipart form with a `document` file field"
    ),
    responses(
        (status = 201, description = "Document indexed successfully", body = UploadDocumentResponse),
        (status = 400, description = "Invalid or unprocessable document"),
        (status = 413, description = "Payload too large"),
        (status = 502, description = "Embedding provider failure"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn upload_document(State(state): State<AppState>, mut multipart: Multipart) -> Result<(StatusCode, Json<UploadDocumentResponse>)> {
    // Generate the id upfront so the on-disk name and the index entry match
    let document_id: DocumentId = Uuid::new_v4();

    let mut filename: Option<String> = None;
    let mut file_path: Option<std::path::PathBuf> = None;
    let mut total_size = 0u64;

    // We can abort the upload as soon as we exceed max file size
    let max_upload_bytes = state.config.limits.max_upload_bytes;

    while let Some(mut field) = multipart.next_field().await.map_err(|e| Error::BadRequest {
        message: format!("Failed to parse multipart data: {}", e),
    })? {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "document" => {
                let name = sanitize_filename(field.file_name().unwrap_or("document"));

                // Reject unknown formats before writing anything to disk
                if DocumentFormat::from_path(std::path::Path::new(&name)).is_none() {
                    return Err(Error::BadRequest {
                        message: format!("Unsupported file format: '{}'. Supported: .pdf, .docx, .txt, .csv, .md", name),
                    });
                }

                let path = state.config.uploads_dir.join(format!("{}_{}", document_id, name));

                tracing::info!(
                    document_id = %abbrev_uuid(&document_id),
                    filename = %name,
                    "Starting document upload stream"
                );

                let mut file = tokio::fs::File::create(&path).await.map_err(|e| Error::Internal {
                    operation: format!("create upload file: {e}"),
                })?;

                while let Some(chunk) = match field.chunk().await {
                    Ok(chunk) => chunk,
                    Err(e) => {
                        drop(file);
                        discard_upload(&path).await;
                        return Err(Error::BadRequest {
                            message: format!("Failed to read upload stream: {}", e),
                        });
                    }
                } {
                    total_size += chunk.len() as u64;

                    // Check size limit incrementally to fail fast
                    if total_size > max_upload_bytes {
                        drop(file);
                        discard_upload(&path).await;
                        return Err(Error::PayloadTooLarge {
                            message: format!(
                                "File size exceeds maximum allowed size of {} bytes ({} MB)",
                                max_upload_bytes,
                                max_upload_bytes / (1024 * 1024)
                            ),
                        });
                    }

                    if let Err(e) = file.write_all(&chunk).await {
                        drop(file);
                        discard_upload(&path).await;
                        return Err(Error::Internal {
                            operation: format!("write upload to disk: {e}"),
                        });
                    }
                }

                if let Err(e) = file.flush().await {
                    drop(file);
                    discard_upload(&path).await;
                    return Err(Error::Internal {
                        operation: format!("flush upload to disk: {e}"),
                    });
                }

                filename = Some(name);
                file_path = Some(path);
            }
            _ => {
                // Ignore unknown fields (forward compatibility)
            }
        }
    }

    let (filename, path) = match (filename, file_path) {
        (Some(filename), Some(path)) => (filename, path),
        _ => {
            return Err(Error::BadRequest {
                message: "Missing required field: 'document'".to_string(),
            });
        }
    };

    if total_size == 0 {
        discard_upload(&path).await;
        return Err(Error::BadRequest {
            message: "File cannot be empty".to_string(),
        });
    }

    // Extraction is CPU-bound (PDF/DOCX parsing); keep it off the async workers
    let extract_path = path.clone();
    let extracted = tokio::task::spawn_blocking(move || ingest::extract_text(&extract_path))
        .await
        .map_err(|e| Error::Internal {
            operation: format!("join extraction task: {e}"),
        })?;

    let text = match extracted {
        Ok(text) => text,
        Err(e) => {
            // Mirror the index: a document we cannot read should not stay on disk
            discard_upload(&path).await;
            return Err(e.into());
        }
    };

    let chunk_texts = ingest::chunk_text(&text, &state.config.retrieval);
    if chunk_texts.is_empty() {
        discard_upload(&path).await;
        return Err(Error::BadRequest {
            message: "Document contains no extractable text".to_string(),
        });
    }

    let embeddings = match state.embedder.embed(&chunk_texts).await {
        Ok(embeddings) => embeddings,
        Err(e) => {
            discard_upload(&path).await;
            return Err(e.into());
        }
    };

    let chunks: Vec<Chunk> = chunk_texts
        .into_iter()
        .zip(embeddings)
        .map(|(text, embedding)| Chunk { text, embedding })
        .collect();
    let chunk_count = chunks.len();

    let document = state.store.insert(StoredDocument {
        id: document_id,
        filename: filename.clone(),
        path,
        size_bytes: total_size,
        uploaded_at: Utc::now(),
        chunks,
    });

    tracing::info!(
        document_id = %abbrev_uuid(&document_id),
        filename = %document.filename,
        bytes = total_size,
        chunks = chunk_count,
        "Document indexed"
    );

    Ok((
        StatusCode::CREATED,
        Json(UploadDocumentResponse {
            document_id: document_id.to_string(),
            filename,
            chunks: chunk_count,
            bytes: total_size,
            message: "Document uploaded successfully".to_string(),
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/documents",
    tag = "documents",
    summary = "List documents",
    description = "Returns metadata for all indexed documents, newest first.",
    responses(
        (status = 200, description = "List of documents", body = DocumentListResponse)
    )
)]
pub async fn list_documents(State(state): State<AppState>) -> Json<DocumentListResponse> {
    let data = state.store.list().iter().map(|d| DocumentResponse::from_document(d)).collect();

    Json(DocumentListResponse {
        object: "list".to_string(),
        data,
    })
}

#[utoipa::path(
    get,
    path = "/documents/{id}",
    tag = "documents",
    summary = "Retrieve document",
    description = "Returns metadata for a single indexed document.",
    responses(
        (status = 200, description = "Document metadata", body = DocumentResponse),
        (status = 404, description = "Document not found")
    ),
    params(
        ("id" = String, Path, description = "The ID of the document to retrieve")
    )
)]
pub async fn get_document(State(state): State<AppState>, Path(id_str): Path<String>) -> Result<Json<DocumentResponse>> {
    let id = parse_document_id(&id_str)?;

    let document = state.store.get(&id).ok_or_else(|| Error::NotFound {
        resource: "Document".to_string(),
        id: id.to_string(),
    })?;

    Ok(Json(DocumentResponse::from_document(&document)))
}

#[utoipa::path(
    delete,
    path = "/documents/{id}",
    tag = "documents",
    summary = "Delete document",
    description = "Removes a document from the index and deletes its uploaded file.",
    responses(
        (status = 200, description = "Document deleted", body = DocumentDeleteResponse),
        (status = 404, description = "Document not found")
    ),
    params(
        ("id" = String, Path, description = "The ID of the document to delete")
    )
)]
pub async fn delete_document(State(state): State<AppState>, Path(id_str): Path<String>) -> Result<Json<DocumentDeleteResponse>> {
    let id = parse_document_id(&id_str)?;

    let document = state.store.remove(&id).ok_or_else(|| Error::NotFound {
        resource: "Document".to_string(),
        id: id.to_string(),
    })?;

    discard_upload(&document.path).await;

    tracing::info!(document_id = %abbrev_uuid(&id), filename = %document.filename, "Document deleted");

    Ok(Json(DocumentDeleteResponse {
        id: id.to_string(),
        deleted: true,
    }))
}

fn parse_document_id(raw: &str) -> Result<DocumentId> {
    raw.parse::<DocumentId>().map_err(|_| Error::BadRequest {
        message: "Invalid document ID format".to_string(),
    })
}
