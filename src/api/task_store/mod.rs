//! Task storage module with pluggable backends.
//!
//! Supports:
//! - `memory`: In-memory storage (non-persistent, for testing)
//! - `sqlite`: SQLite database with a unique index on the public task id

mod memory;
mod sqlite;

pub use memory::InMemoryTaskStore;
pub use sqlite::SqliteTaskStore;

use crate::task::{NewTask, Task, TaskPatch};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// Errors raised by a storage backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to open task store: {0}")]
    Open(String),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("corrupt task row: {0}")]
    Corrupt(String),

    #[error("storage worker failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Task store trait - implemented by all storage backends.
///
/// Stores trust their input: titles arrive already normalized through
/// [`NewTask`] and [`TaskPatch`].
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Short backend name reported by the health endpoint.
    fn driver(&self) -> &'static str;

    /// Whether this store persists data across restarts.
    fn is_persistent(&self) -> bool;

    /// Round-trip to the backend to prove it is reachable.
    async fn ping(&self) -> Result<(), StoreError>;

    /// List all tasks, newest-created first.
    async fn list_tasks(&self) -> Result<Vec<Task>, StoreError>;

    /// Persist a new task with a freshly generated id.
    async fn create_task(&self, new: NewTask) -> Result<Task, StoreError>;

    /// Apply a partial update. Returns `None` if no task has this id.
    async fn update_task(&self, id: &str, patch: &TaskPatch) -> Result<Option<Task>, StoreError>;

    /// Delete one task. Returns whether a task was removed.
    async fn delete_task(&self, id: &str) -> Result<bool, StoreError>;
}

pub type SharedTaskStore = Arc<dyn TaskStore>;

/// Store backend selection, parsed from a connection string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    Memory,
    /// SQLite database file (or `:memory:`).
    Sqlite(PathBuf),
}

impl StoreBackend {
    /// Parse a `DATABASE_URL` value.
    ///
    /// Accepts `memory://`, `sqlite://<path>`, `sqlite:<path>` or a bare path.
    pub fn from_url(url: &str) -> Option<Self> {
        let url = url.trim();
        if url.is_empty() {
            return None;
        }
        if url.eq_ignore_ascii_case("memory") || url.starts_with("memory://") {
            return Some(Self::Memory);
        }
        let path = url
            .strip_prefix("sqlite://")
            .or_else(|| url.strip_prefix("sqlite:"))
            .unwrap_or(url);
        if path.is_empty() {
            return None;
        }
        Some(Self::Sqlite(PathBuf::from(path)))
    }
}

/// Create a task store for the given backend.
///
/// Fails if the backend cannot be opened; callers treat that as fatal.
pub async fn create_task_store(backend: &StoreBackend) -> Result<SharedTaskStore, StoreError> {
    match backend {
        StoreBackend::Memory => Ok(Arc::new(InMemoryTaskStore::new())),
        StoreBackend::Sqlite(path) => {
            let store = SqliteTaskStore::open(path.clone()).await?;
            Ok(Arc::new(store))
        }
    }
}

/// Format a timestamp the way it is stored (sortable, millisecond precision).
pub(crate) fn timestamp_string(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub(crate) fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| StoreError::Corrupt(format!("bad timestamp {raw:?}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use tempfile::TempDir;

    #[test]
    fn backend_parses_connection_strings() {
        assert_eq!(StoreBackend::from_url("memory://"), Some(StoreBackend::Memory));
        assert_eq!(
            StoreBackend::from_url("sqlite://data/tasks.db"),
            Some(StoreBackend::Sqlite(PathBuf::from("data/tasks.db")))
        );
        assert_eq!(
            StoreBackend::from_url("sqlite::memory:"),
            Some(StoreBackend::Sqlite(PathBuf::from(":memory:")))
        );
        assert_eq!(
            StoreBackend::from_url("/var/lib/tasks.db"),
            Some(StoreBackend::Sqlite(PathBuf::from("/var/lib/tasks.db")))
        );
        assert_eq!(StoreBackend::from_url("  "), None);
        assert_eq!(StoreBackend::from_url("sqlite://"), None);
    }

    async fn stores() -> (TempDir, Vec<SharedTaskStore>) {
        let dir = TempDir::new().unwrap();
        let sqlite = create_task_store(&StoreBackend::Sqlite(dir.path().join("tasks.db")))
            .await
            .expect("open sqlite store");
        let memory = create_task_store(&StoreBackend::Memory).await.unwrap();
        (dir, vec![memory, sqlite])
    }

    fn new_task(title: &str) -> NewTask {
        NewTask::new(title, false).unwrap()
    }

    #[tokio::test]
    async fn list_is_newest_first() {
        let (_dir, stores) = stores().await;
        for store in stores {
            let a = store.create_task(new_task("A")).await.unwrap();
            let b = store.create_task(new_task("B")).await.unwrap();
            let c = store.create_task(new_task("C")).await.unwrap();

            let ids: Vec<String> = store
                .list_tasks()
                .await
                .unwrap()
                .into_iter()
                .map(|t| t.id)
                .collect();
            assert_eq!(ids, vec![c.id, b.id, a.id], "driver {}", store.driver());
        }
    }

    #[tokio::test]
    async fn ids_are_unique() {
        let (_dir, stores) = stores().await;
        for store in stores {
            let mut seen = HashSet::new();
            for i in 0..50 {
                let task = store.create_task(new_task(&format!("t{i}"))).await.unwrap();
                assert!(seen.insert(task.id));
            }
            assert_eq!(store.list_tasks().await.unwrap().len(), 50);
        }
    }

    #[tokio::test]
    async fn update_applies_partial_patch() {
        let (_dir, stores) = stores().await;
        for store in stores {
            let task = store.create_task(new_task("Write spec")).await.unwrap();
            let patch = TaskPatch::new(None, Some(true)).unwrap();
            let updated = store
                .update_task(&task.id, &patch)
                .await
                .unwrap()
                .expect("task exists");
            assert!(updated.done);
            assert_eq!(updated.title, "Write spec");
            assert_eq!(updated.id, task.id);
            assert_eq!(updated.created_at, task.created_at);

            assert_eq!(store.list_tasks().await.unwrap(), vec![updated]);

            let retitle = TaskPatch::new(Some(" Rewrite spec "), None).unwrap();
            let renamed = store.update_task(&task.id, &retitle).await.unwrap().unwrap();
            assert_eq!(renamed.title, "Rewrite spec");
            assert!(renamed.done);
        }
    }

    #[tokio::test]
    async fn update_unknown_id_touches_nothing() {
        let (_dir, stores) = stores().await;
        for store in stores {
            let task = store.create_task(new_task("keep")).await.unwrap();
            let patch = TaskPatch::new(Some("changed"), Some(true)).unwrap();
            assert!(store.update_task("missing", &patch).await.unwrap().is_none());
            let all = store.list_tasks().await.unwrap();
            assert_eq!(all, vec![task]);
        }
    }

    #[tokio::test]
    async fn delete_removes_exactly_once() {
        let (_dir, stores) = stores().await;
        for store in stores {
            let a = store.create_task(new_task("A")).await.unwrap();
            let b = store.create_task(new_task("B")).await.unwrap();
            assert!(store.delete_task(&a.id).await.unwrap());
            assert!(!store.delete_task(&a.id).await.unwrap());
            assert_eq!(store.list_tasks().await.unwrap(), vec![b]);
        }
    }

    #[tokio::test]
    async fn ping_succeeds_on_open_store() {
        let (_dir, stores) = stores().await;
        for store in stores {
            store.ping().await.unwrap();
        }
    }

    #[tokio::test]
    async fn sqlite_store_persists_across_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tasks.db");
        let created = {
            let store = SqliteTaskStore::open(path.clone()).await.unwrap();
            assert!(store.is_persistent());
            store.create_task(new_task("durable")).await.unwrap()
        };
        let store = SqliteTaskStore::open(path).await.unwrap();
        assert_eq!(store.list_tasks().await.unwrap(), vec![created]);
    }

    #[tokio::test]
    async fn updated_at_moves_only_on_real_changes() {
        let (_dir, stores) = stores().await;
        for store in stores {
            let task = store.create_task(new_task("Stamp")).await.unwrap();
            assert_eq!(task.updated_at, task.created_at);

            let same = TaskPatch::new(Some("Stamp"), Some(false)).unwrap();
            let unchanged = store.update_task(&task.id, &same).await.unwrap().unwrap();
            assert_eq!(unchanged, task, "driver {}", store.driver());
            let empty = TaskPatch::new(None, None).unwrap();
            let unchanged = store.update_task(&task.id, &empty).await.unwrap().unwrap();
            assert_eq!(unchanged.updated_at, task.updated_at);

            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
            let patch = TaskPatch::new(None, Some(true)).unwrap();
            let changed = store.update_task(&task.id, &patch).await.unwrap().unwrap();
            assert!(changed.updated_at > changed.created_at, "driver {}", store.driver());
            assert_eq!(changed.created_at, task.created_at);

            let stored = store.list_tasks().await.unwrap();
            assert_eq!(stored[0].updated_at, changed.updated_at);
            assert!(stored[0].done);
        }
    }

    #[test]
    fn timestamps_round_trip_through_storage_format() {
        let now = crate::task::task::now();
        assert_eq!(parse_timestamp(&timestamp_string(&now)).unwrap(), now);
    }
}
