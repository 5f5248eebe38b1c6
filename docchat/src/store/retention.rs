//! Background eviction of old documents.
//!
//! When `retention.max_age` is configured, a sweeper task periodically drops
//! documents older than the limit from the index and deletes their upload
//! files. The task runs until its cancellation token fires.

use std::sync::Arc;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::DocumentStore;
use crate::config::RetentionConfig;
use crate::types::abbrev_uuid;

/// Remove all documents older than `max_age` and delete their files.
/// Returns the number of documents evicted.
pub async fn sweep_expired(store: &DocumentStore, max_age: std::time::Duration) -> usize {
    let cutoff = Utc::now() - chrono::Duration::from_std(max_age).unwrap_or_else(|_| chrono::Duration::zero());

    let expired = store.expired_ids(cutoff);
    let mut evicted = 0;

    for id in expired {
        if let Some(document) = store.remove(&id) {
            evicted += 1;
            if let Err(e) = tokio::fs::remove_file(&document.path).await {
                // The index entry is already gone; a missing file just means less to clean up
                debug!(document_id = %abbrev_uuid(&id), error = %e, "Could not delete upload file during retention sweep");
            }
        }
    }

    evicted
}

/// Spawn the retention sweeper. Returns `None` when retention is disabled.
pub fn spawn_retention_sweeper(
    store: Arc<DocumentStore>,
    config: RetentionConfig,
    shutdown: CancellationToken,
) -> Option<tokio::task::JoinHandle<()>> {
    let max_age = config.max_age?;
    let interval = config.sweep_interval;

    info!(
        max_age = ?max_age,
        sweep_interval = ?interval,
        "Starting document retention sweeper"
    );

    Some(tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    debug!("Retention sweeper shutting down");
                    break;
                }
                _ = tokio::time::sleep(interval) => {
                    let evicted = sweep_expired(&store, max_age).await;
                    if evicted > 0 {
                        warn!(evicted, "Evicted documents past the retention limit");
                    }
                }
            }
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::test_document;
    use chrono::Duration;
    use std::time::Duration as StdDuration;
    use uuid::Uuid;

    #[tokio::test]
    async fn sweep_evicts_only_expired_documents() {
        let store = DocumentStore::new();
        let now = Utc::now();

        let stale = Uuid::new_v4();
        let fresh = Uuid::new_v4();
        store.insert(test_document(stale, "stale.txt", now - Duration::days(2)));
        store.insert(test_document(fresh, "fresh.txt", now));

        let evicted = sweep_expired(&store, StdDuration::from_secs(24 * 3600)).await;

        assert_eq!(evicted, 1);
        assert!(store.get(&stale).is_none());
        assert!(store.get(&fresh).is_some());
    }

    #[tokio::test]
    async fn sweep_deletes_upload_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = DocumentStore::new();
        let id = Uuid::new_v4();

        let mut document = test_document(id, "old.txt", Utc::now() - Duration::days(2));
        document.path = dir.path().join(format!("{id}_old.txt"));
        std::fs::write(&document.path, "contents").unwrap();
        let path = document.path.clone();
        store.insert(document);

        sweep_expired(&store, StdDuration::from_secs(3600)).await;

        assert!(!path.exists());
    }

    #[tokio::test]
    async fn sweeper_is_disabled_without_max_age() {
        let store = Arc::new(DocumentStore::new());
        let config = RetentionConfig {
            max_age: None,
            sweep_interval: StdDuration::from_secs(1),
        };

        let handle = spawn_retention_sweeper(store, config, CancellationToken::new());
        assert!(handle.is_none());
    }

    #[tokio::test]
    async fn sweeper_stops_on_cancellation() {
        let store = Arc::new(DocumentStore::new());
        let config = RetentionConfig {
            max_age: Some(StdDuration::from_secs(3600)),
            sweep_interval: StdDuration::from_secs(3600),
        };

        let shutdown = CancellationToken::new();
        let handle = spawn_retention_sweeper(store, config, shutdown.clone()).expect("sweeper should start");

        shutdown.cancel();
        tokio::time::timeout(StdDuration::from_secs(1), handle)
            .await
            .expect("sweeper should exit promptly")
            .unwrap();
    }
}
