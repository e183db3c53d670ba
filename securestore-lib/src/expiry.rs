//! Deferred deletion of expiring items.
//!
//! Expiration is a timer task on the current Tokio runtime and nothing
//! more: no deadline is persisted and reads never consult one. If the
//! process exits first, the item stays. Writing the key again does not
//! move or cancel the deadline.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::backend::{ItemOptions, SecureStoreBackend};

/// Handle to a scheduled deletion.
///
/// Dropping the handle leaves the deletion scheduled; call
/// [`cancel`](Self::cancel) to stop it.
#[derive(Debug)]
pub struct ExpiryHandle {
    key: String,
    deadline: DateTime<Utc>,
    task: JoinHandle<()>,
}

impl ExpiryHandle {
    /// The storage key (namespace included) that will be deleted.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Wall-clock time the deletion is due.
    pub fn deadline(&self) -> DateTime<Utc> {
        self.deadline
    }

    /// Whether the deletion has run (or was cancelled).
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Cancel the deletion if it has not run yet.
    pub fn cancel(self) {
        tracing::debug!(key = %self.key, "expiration cancelled");
        self.task.abort();
    }

    /// Wait for the deletion attempt.
    ///
    /// Returns false if the deletion was cancelled instead.
    pub async fn expired(self) -> bool {
        self.task.await.is_ok()
    }
}

/// Spawn a task deleting `key` from `backend` once `ttl` has elapsed.
pub(crate) fn schedule_deletion<B>(
    runtime: &Handle,
    backend: Arc<B>,
    key: String,
    options: ItemOptions,
    ttl: Duration,
) -> ExpiryHandle
where
    B: SecureStoreBackend + 'static,
{
    let deadline = chrono::Duration::from_std(ttl)
        .ok()
        .and_then(|delta| Utc::now().checked_add_signed(delta))
        .unwrap_or(DateTime::<Utc>::MAX_UTC);

    let task_key = key.clone();
    let task = runtime.spawn(async move {
        tokio::time::sleep(ttl).await;
        match backend.delete_item_async(&task_key, &options).await {
            Ok(()) => tracing::debug!(key = %task_key, "expired item deleted"),
            Err(e) => tracing::warn!(key = %task_key, error = %e, "failed to delete expired item"),
        }
    });

    tracing::debug!(key = %key, ttl_ms = ttl.as_millis() as u64, "expiration scheduled");

    ExpiryHandle {
        key,
        deadline,
        task,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::InMemoryBackend;

    fn seeded(key: &str) -> Arc<InMemoryBackend> {
        let backend = Arc::new(InMemoryBackend::new());
        backend.set_item(key, "v", &ItemOptions::default()).unwrap();
        backend
    }

    #[tokio::test]
    async fn test_deletes_after_ttl() {
        let backend = seeded("session");
        let handle = schedule_deletion(
            &Handle::current(),
            Arc::clone(&backend),
            "session".into(),
            ItemOptions::default(),
            Duration::from_millis(20),
        );

        assert_eq!(handle.key(), "session");
        assert!(handle.deadline() > Utc::now() - chrono::Duration::seconds(1));
        assert!(handle.expired().await);
        assert!(backend.is_empty());
    }

    #[tokio::test]
    async fn test_cancel_keeps_item() {
        let backend = seeded("session");
        let handle = schedule_deletion(
            &Handle::current(),
            Arc::clone(&backend),
            "session".into(),
            ItemOptions::default(),
            Duration::from_millis(20),
        );

        handle.cancel();
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(backend.raw_get("session"), Some("v".into()));
    }

    #[tokio::test]
    async fn test_dropped_handle_still_expires() {
        let backend = seeded("session");
        drop(schedule_deletion(
            &Handle::current(),
            Arc::clone(&backend),
            "session".into(),
            ItemOptions::default(),
            Duration::from_millis(10),
        ));

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(backend.is_empty());
    }

    #[tokio::test]
    async fn test_huge_ttl_saturates_deadline() {
        let backend = seeded("session");
        let handle = schedule_deletion(
            &Handle::current(),
            backend,
            "session".into(),
            ItemOptions::default(),
            Duration::MAX,
        );

        assert_eq!(handle.deadline(), DateTime::<Utc>::MAX_UTC);
        assert!(!handle.is_finished());
        handle.cancel();
    }
}
