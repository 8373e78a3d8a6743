//! Client board state machine.
//!
//! Pure state with no I/O. Every mutation goes through the same cycle:
//!
//! ```text
//!   Idle ──begin_*──► Submitting ──mutation_succeeded / mutation_failed──► settle() ──► Idle
//! ```
//!
//! `begin_*` refuses (without changing anything) when a mutation is already in
//! flight or the operation's preconditions do not hold. The list itself is only
//! ever replaced wholesale by [`BoardState::loaded`].

use thiserror::Error;

use super::api::TaskUpdate;
use crate::task::Task;

/// Whether a mutating request is outstanding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    Idle,
    Submitting,
}

/// A task title being edited in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditSession {
    pub task_id: String,
    pub draft: String,
}

/// A request the board has committed to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    Create { title: String },
    Update { id: String, update: TaskUpdate },
    Delete { id: String },
}

impl Mutation {
    fn toggle(id: &str, done: bool) -> Self {
        Mutation::Update {
            id: id.to_string(),
            update: TaskUpdate {
                title: None,
                done: Some(done),
            },
        }
    }

    fn rename(id: &str, title: String) -> Self {
        Mutation::Update {
            id: id.to_string(),
            update: TaskUpdate {
                title: Some(title),
                done: None,
            },
        }
    }
}

/// Why an operation was not started.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Refusal {
    #[error("another request is still running")]
    Busy,

    #[error("finish editing first")]
    EditInProgress,

    #[error("not editing a task")]
    NotEditing,

    #[error("title required")]
    BlankTitle,

    #[error("no task with id {0}")]
    UnknownTask(String),
}

#[derive(Debug, Clone, Default)]
pub struct BoardState {
    tasks: Vec<Task>,
    draft: String,
    editing: Option<EditSession>,
    phase: Phase,
    error: Option<String>,
}

impl BoardState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn editing(&self) -> Option<&EditSession> {
        self.editing.as_ref()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_busy(&self) -> bool {
        self.phase == Phase::Submitting
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Whether the composer would accept a submit right now.
    pub fn can_create(&self) -> bool {
        !self.is_busy() && !self.draft.trim().is_empty()
    }

    pub fn set_draft(&mut self, draft: impl Into<String>) {
        self.draft = draft.into();
    }

    // ── Loading ──────────────────────────────────────────────────────────

    pub fn load_started(&mut self) {
        self.error = None;
    }

    /// Replace the list with the server's view. An edit session whose task
    /// is gone is dropped with it.
    pub fn loaded(&mut self, tasks: Vec<Task>) {
        self.tasks = tasks;
        let orphaned = self
            .editing
            .as_ref()
            .is_some_and(|session| self.task(&session.task_id).is_none());
        if orphaned {
            self.editing = None;
        }
    }

    /// Keep the previous list and surface the error.
    pub fn load_failed(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
    }

    // ── Mutations ────────────────────────────────────────────────────────

    fn ensure_idle(&self) -> Result<(), Refusal> {
        if self.is_busy() {
            return Err(Refusal::Busy);
        }
        Ok(())
    }

    fn submit(&mut self, mutation: Mutation) -> Mutation {
        self.phase = Phase::Submitting;
        self.error = None;
        mutation
    }

    pub fn begin_create(&mut self) -> Result<Mutation, Refusal> {
        self.ensure_idle()?;
        let title = self.draft.trim();
        if title.is_empty() {
            return Err(Refusal::BlankTitle);
        }
        let title = title.to_string();
        Ok(self.submit(Mutation::Create { title }))
    }

    /// Flip `done`. Refused while any row is being edited.
    pub fn begin_toggle(&mut self, id: &str) -> Result<Mutation, Refusal> {
        if self.editing.is_some() {
            return Err(Refusal::EditInProgress);
        }
        self.ensure_idle()?;
        let task = self
            .task(id)
            .ok_or_else(|| Refusal::UnknownTask(id.to_string()))?;
        let mutation = Mutation::toggle(&task.id, !task.done);
        Ok(self.submit(mutation))
    }

    /// Confirmation is the caller's job and must happen before this.
    pub fn begin_delete(&mut self, id: &str) -> Result<Mutation, Refusal> {
        self.ensure_idle()?;
        let task = self
            .task(id)
            .ok_or_else(|| Refusal::UnknownTask(id.to_string()))?;
        let mutation = Mutation::Delete {
            id: task.id.clone(),
        };
        Ok(self.submit(mutation))
    }

    pub fn begin_save_edit(&mut self) -> Result<Mutation, Refusal> {
        self.ensure_idle()?;
        let session = self.editing.as_ref().ok_or(Refusal::NotEditing)?;
        let title = session.draft.trim();
        if title.is_empty() {
            return Err(Refusal::BlankTitle);
        }
        let mutation = Mutation::rename(&session.task_id, title.to_string());
        Ok(self.submit(mutation))
    }

    /// Record a successful response. The caller reloads the list next.
    pub fn mutation_succeeded(&mut self, mutation: &Mutation) {
        match mutation {
            Mutation::Create { .. } => self.draft.clear(),
            Mutation::Update {
                update: TaskUpdate { title: Some(_), .. },
                ..
            } => self.editing = None,
            Mutation::Update { .. } | Mutation::Delete { .. } => {}
        }
    }

    /// Drafts and edit sessions are left intact so the user can retry.
    pub fn mutation_failed(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
    }

    /// Final step of every mutation, success or not.
    pub fn settle(&mut self) {
        self.phase = Phase::Idle;
    }

    // ── Edit lifecycle ───────────────────────────────────────────────────

    /// Snapshot the task's title into an edit draft.
    pub fn start_edit(&mut self, id: &str) -> Result<(), Refusal> {
        self.ensure_idle()?;
        let task = self
            .task(id)
            .ok_or_else(|| Refusal::UnknownTask(id.to_string()))?;
        self.editing = Some(EditSession {
            task_id: task.id.clone(),
            draft: task.title.clone(),
        });
        Ok(())
    }

    pub fn set_edit_draft(&mut self, draft: impl Into<String>) -> Result<(), Refusal> {
        let session = self.editing.as_mut().ok_or(Refusal::NotEditing)?;
        session.draft = draft.into();
        Ok(())
    }

    /// Drop the edit draft. No request is involved.
    pub fn cancel_edit(&mut self) -> Result<(), Refusal> {
        self.ensure_idle()?;
        self.editing = None;
        Ok(())
    }
}
