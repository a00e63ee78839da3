use std::collections::HashSet;
use std::path::PathBuf;

use tokio::sync::Mutex;
use tracing::{info, warn};

/// File-backed set of subscriber chat ids. Mutations and snapshots serialize
/// through the store's own lock, and every mutation is flushed to disk before
/// the lock is released so a crash loses at most the latest change.
pub struct SubscriberStore {
    path: PathBuf,
    subscribers: Mutex<HashSet<i64>>,
}

impl SubscriberStore {
    /// Load subscribers from disk; missing or corrupt files yield an empty set
    pub async fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let ids: Vec<i64> = super::load_json_or_default(&path).await;
        let subscribers: HashSet<i64> = ids.into_iter().collect();

        info!("Subscriber set loaded: {} subscribers", subscribers.len());

        Self {
            path,
            subscribers: Mutex::new(subscribers),
        }
    }

    /// Add a subscriber. Returns true if it was newly added; an id already
    /// present leaves the set (and the file) untouched.
    pub async fn add(&self, id: i64) -> bool {
        let mut subscribers = self.subscribers.lock().await;

        if !subscribers.insert(id) {
            return false;
        }

        self.persist(&subscribers).await;
        true
    }

    /// Remove a subscriber. Returns true if it was present.
    pub async fn remove(&self, id: i64) -> bool {
        let mut subscribers = self.subscribers.lock().await;

        if !subscribers.remove(&id) {
            return false;
        }

        self.persist(&subscribers).await;
        true
    }

    /// Current membership as a sorted list. Broadcast batches iterate over
    /// this copy, so adds/removes during delivery do not affect the batch.
    pub async fn snapshot(&self) -> Vec<i64> {
        let subscribers = self.subscribers.lock().await;
        let mut ids: Vec<i64> = subscribers.iter().copied().collect();
        ids.sort_unstable();
        ids
    }

    async fn persist(&self, subscribers: &HashSet<i64>) {
        let mut ids: Vec<i64> = subscribers.iter().copied().collect();
        ids.sort_unstable();

        if let Err(e) = super::save_json(&self.path, &ids).await {
            warn!("Failed to persist subscriber set: {e:#}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(dir: &tempfile::TempDir) -> PathBuf {
        dir.path().join("subscribers.json")
    }

    #[tokio::test]
    async fn add_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = SubscriberStore::load(temp_path(&dir)).await;

        assert!(store.add(42).await);
        assert!(!store.add(42).await);
        assert_eq!(store.snapshot().await, vec![42]);
    }

    #[tokio::test]
    async fn remove_missing_reports_not_present() {
        let dir = tempfile::tempdir().unwrap();
        let store = SubscriberStore::load(temp_path(&dir)).await;

        store.add(1).await;
        assert!(!store.remove(2).await);
        assert!(store.remove(1).await);
        assert!(store.snapshot().await.is_empty());
    }

    #[tokio::test]
    async fn save_then_load_preserves_membership() {
        let dir = tempfile::tempdir().unwrap();
        let path = temp_path(&dir);

        let store = SubscriberStore::load(&path).await;
        store.add(7).await;
        store.add(3).await;
        store.add(11).await;
        store.remove(3).await;

        let reloaded = SubscriberStore::load(&path).await;
        assert_eq!(reloaded.snapshot().await, vec![7, 11]);
    }

    #[tokio::test]
    async fn load_corrupt_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = temp_path(&dir);
        std::fs::write(&path, "{\"oops\":true}").unwrap();

        let store = SubscriberStore::load(path).await;
        assert!(store.snapshot().await.is_empty());
    }
}
