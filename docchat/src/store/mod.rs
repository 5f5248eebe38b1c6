//! In-memory document index.
//!
//! Uploaded documents live here for the lifetime of the process: the original
//! file stays on disk under the uploads directory, while the extracted chunks
//! and their embeddings are held in memory for retrieval. There is no
//! persistence of the index across restarts.

mod retention;

pub use retention::{spawn_retention_sweeper, sweep_expired};

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;

use crate::types::DocumentId;

/// One retrieval unit of a document: a text chunk and its embedding.
#[derive(Debug, Clone)]
pub struct Chunk {
    pub text: String,
    pub embedding: Vec<f32>,
}

/// An indexed document.
#[derive(Debug)]
pub struct StoredDocument {
    pub id: DocumentId,
    /// Original filename as uploaded
    pub filename: String,
    /// Where the raw upload lives on disk
    pub path: PathBuf,
    pub size_bytes: u64,
    pub uploaded_at: DateTime<Utc>,
    pub chunks: Vec<Chunk>,
}

/// Concurrent map of indexed documents, shared across request handlers and
/// the retention sweeper.
#[derive(Default)]
pub struct DocumentStore {
    documents: DashMap<DocumentId, Arc<StoredDocument>>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, document: StoredDocument) -> Arc<StoredDocument> {
        let document = Arc::new(document);
        self.documents.insert(document.id, document.clone());
        document
    }

    pub fn get(&self, id: &DocumentId) -> Option<Arc<StoredDocument>> {
        self.documents.get(id).map(|entry| entry.value().clone())
    }

    /// Remove a document from the index, returning it so the caller can
    /// unlink its file.
    pub fn remove(&self, id: &DocumentId) -> Option<Arc<StoredDocument>> {
        self.documents.remove(id).map(|(_, document)| document)
    }

    /// All documents, newest first.
    pub fn list(&self) -> Vec<Arc<StoredDocument>> {
        let mut documents: Vec<Arc<StoredDocument>> = self.documents.iter().map(|entry| entry.value().clone()).collect();
        documents.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at));
        documents
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// IDs of documents uploaded before the cutoff.
    pub fn expired_ids(&self, cutoff: DateTime<Utc>) -> Vec<DocumentId> {
        self.documents
            .iter()
            .filter(|entry| entry.value().uploaded_at < cutoff)
            .map(|entry| *entry.key())
            .collect()
    }
}

#[cfg(test)]
pub(crate) fn test_document(id: DocumentId, filename: &str, uploaded_at: DateTime<Utc>) -> StoredDocument {
    StoredDocument {
        id,
        filename: filename.to_string(),
        path: PathBuf::from(format!("/tmp/does-not-exist/{id}_{filename}")),
        size_bytes: 42,
        uploaded_at,
        chunks: vec![Chunk {
            text: "some chunk text".to_string(),
            embedding: vec![1.0, 0.0],
        }],
    }
}
