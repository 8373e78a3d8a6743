//! Task module - the single persisted entity and its validation rules.
//!
//! Stores never validate; callers build a `NewTask` or `TaskPatch` first.

pub mod task;

pub use task::{normalize_title, NewTask, Task, TaskError, TaskPatch, Truthy};
