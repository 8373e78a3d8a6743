//! Core Task record and write-boundary validation.
//!
//! # Invariants
//! - `id` is assigned once at creation and never reassigned
//! - `title` is never empty or whitespace-only once persisted

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// A persisted to-do item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Public identifier (v4 UUID), independent of any storage row id
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub done: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Build a brand new task from validated input, stamping both timestamps.
    pub fn create(new: NewTask) -> Self {
        let now = now();
        Self {
            id: Uuid::new_v4().to_string(),
            title: new.title,
            done: new.done,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a partial update in place.
    ///
    /// Returns `true` if any field changed; `updated_at` is only bumped in that case.
    pub fn apply(&mut self, patch: &TaskPatch) -> bool {
        let mut changed = false;
        if let Some(title) = &patch.title {
            if *title != self.title {
                self.title = title.clone();
                changed = true;
            }
        }
        if let Some(done) = patch.done {
            if done != self.done {
                self.done = done;
                changed = true;
            }
        }
        if changed {
            self.updated_at = now();
        }
        changed
    }
}

/// Validated input for creating a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub title: String,
    pub done: bool,
}

impl NewTask {
    pub fn new(title: &str, done: bool) -> Result<Self, TaskError> {
        Ok(Self {
            title: normalize_title(title)?,
            done,
        })
    }
}

/// Validated partial update. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub done: Option<bool>,
}

impl TaskPatch {
    pub fn new(title: Option<&str>, done: Option<bool>) -> Result<Self, TaskError> {
        let title = title.map(normalize_title).transpose()?;
        Ok(Self { title, done })
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.done.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaskError {
    #[error("title required")]
    TitleRequired,
}

/// Trim a title and reject it if nothing is left.
pub fn normalize_title(raw: &str) -> Result<String, TaskError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(TaskError::TitleRequired);
    }
    Ok(trimmed.to_string())
}

/// Current time truncated to millisecond precision (the stored precision).
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

/// A JSON value coerced to a boolean with loose truthiness.
///
/// `null`, `false`, `0`, `NaN` and `""` are false; every other value is true.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Truthy(pub bool);

impl Truthy {
    pub fn from_value(value: &serde_json::Value) -> Self {
        use serde_json::Value;
        let flag = match value {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(true),
            Value::String(s) => !s.is_empty(),
            Value::Array(_) | Value::Object(_) => true,
        };
        Self(flag)
    }
}

impl<'de> Deserialize<'de> for Truthy {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = serde_json::Value::deserialize(deserializer)?;
        Ok(Self::from_value(&value))
    }
}

impl From<Truthy> for bool {
    fn from(t: Truthy) -> Self {
        t.0
    }
}
