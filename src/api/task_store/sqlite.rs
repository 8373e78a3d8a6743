//! SQLite-based task store.

use super::{parse_timestamp, timestamp_string, StoreError, TaskStore};
use crate::task::{NewTask, Task, TaskPatch};
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

const SCHEMA: &str = r#"
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS tasks (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    id TEXT NOT NULL UNIQUE,
    title TEXT NOT NULL,
    done INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_tasks_created_at ON tasks(created_at DESC, seq DESC);
"#;

const SELECT_COLUMNS: &str = "SELECT id, title, done, created_at, updated_at FROM tasks";

pub struct SqliteTaskStore {
    conn: Arc<Mutex<Connection>>,
}

/// Raw column values before timestamp parsing.
struct TaskRow {
    id: String,
    title: String,
    done: bool,
    created_at: String,
    updated_at: String,
}

impl TaskRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            title: row.get(1)?,
            done: row.get::<_, i64>(2)? != 0,
            created_at: row.get(3)?,
            updated_at: row.get(4)?,
        })
    }

    fn into_task(self) -> Result<Task, StoreError> {
        Ok(Task {
            id: self.id,
            title: self.title,
            done: self.done,
            created_at: parse_timestamp(&self.created_at)?,
            updated_at: parse_timestamp(&self.updated_at)?,
        })
    }
}

impl SqliteTaskStore {
    /// Open (or create) the database at `db_path` and apply the schema.
    pub async fn open(db_path: PathBuf) -> Result<Self, StoreError> {
        if let Some(parent) = db_dir(&db_path) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                StoreError::Open(format!("failed to create {}: {}", parent.display(), e))
            })?;
        }

        let conn = tokio::task::spawn_blocking(move || {
            let conn = Connection::open(&db_path).map_err(|e| {
                StoreError::Open(format!("failed to open {}: {}", db_path.display(), e))
            })?;
            conn.execute_batch(SCHEMA)?;
            tracing::debug!("Task database ready at {}", db_path.display());
            Ok::<_, StoreError>(conn)
        })
        .await??;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn fetch(conn: &Connection, id: &str) -> Result<Option<Task>, StoreError> {
        let row = conn
            .query_row(
                &format!("{SELECT_COLUMNS} WHERE id = ?1"),
                params![id],
                TaskRow::from_row,
            )
            .optional()?;
        row.map(TaskRow::into_task).transpose()
    }
}

/// Parent directory that must exist before opening, if any.
fn db_dir(db_path: &Path) -> Option<&Path> {
    if db_path.as_os_str() == ":memory:" {
        return None;
    }
    db_path.parent().filter(|p| !p.as_os_str().is_empty())
}

#[async_trait]
impl TaskStore for SqliteTaskStore {
    fn driver(&self) -> &'static str {
        "sqlite"
    }

    fn is_persistent(&self) -> bool {
        true
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let conn = conn.blocking_lock();
            conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
            Ok::<_, StoreError>(())
        })
        .await?
    }

    async fn list_tasks(&self) -> Result<Vec<Task>, StoreError> {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let conn = conn.blocking_lock();
            let mut stmt =
                conn.prepare(&format!("{SELECT_COLUMNS} ORDER BY created_at DESC, seq DESC"))?;
            let rows = stmt
                .query_map([], TaskRow::from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            rows.into_iter()
                .map(TaskRow::into_task)
                .collect::<Result<Vec<_>, StoreError>>()
        })
        .await?
    }

    async fn create_task(&self, new: NewTask) -> Result<Task, StoreError> {
        let conn = self.conn.clone();
        let task = Task::create(new);
        tokio::task::spawn_blocking(move || {
            let conn = conn.blocking_lock();
            conn.execute(
                "INSERT INTO tasks (id, title, done, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    &task.id,
                    &task.title,
                    task.done as i64,
                    timestamp_string(&task.created_at),
                    timestamp_string(&task.updated_at),
                ],
            )?;
            Ok::<_, StoreError>(task)
        })
        .await?
    }

    async fn update_task(&self, id: &str, patch: &TaskPatch) -> Result<Option<Task>, StoreError> {
        let conn = self.conn.clone();
        let id = id.to_string();
        let patch = patch.clone();
        tokio::task::spawn_blocking(move || {
            let conn = conn.blocking_lock();
            let Some(mut task) = Self::fetch(&conn, &id)? else {
                return Ok::<_, StoreError>(None);
            };
            if task.apply(&patch) {
                conn.execute(
                    "UPDATE tasks SET title = ?1, done = ?2, updated_at = ?3 WHERE id = ?4",
                    params![
                        &task.title,
                        task.done as i64,
                        timestamp_string(&task.updated_at),
                        &task.id,
                    ],
                )?;
            }
            Ok(Some(task))
        })
        .await?
    }

    async fn delete_task(&self, id: &str) -> Result<bool, StoreError> {
        let conn = self.conn.clone();
        let id = id.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = conn.blocking_lock();
            let rows = conn.execute("DELETE FROM tasks WHERE id = ?1", params![id])?;
            Ok::<_, StoreError>(rows == 1)
        })
        .await?
    }
}
