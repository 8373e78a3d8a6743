//! Drives [`BoardState`] against a [`TaskApi`].
//!
//! Every successful mutation is followed by a full reload; responses from the
//! mutation itself are never merged into the list.

use async_trait::async_trait;

use super::api::{ClientError, TaskApi};
use super::state::{BoardState, Mutation, Refusal};

/// User interaction the board needs beyond rendering.
#[async_trait]
pub trait Prompt: Send {
    /// Ask a yes/no question.
    async fn confirm(&mut self, question: &str) -> bool;

    /// Show a message and wait until the user has seen it.
    async fn acknowledge(&mut self, message: &str);
}

pub struct Board<A> {
    api: A,
    state: BoardState,
}

impl<A: TaskApi> Board<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            state: BoardState::new(),
        }
    }

    pub fn state(&self) -> &BoardState {
        &self.state
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn set_draft(&mut self, draft: impl Into<String>) {
        self.state.set_draft(draft);
    }

    /// Fetch the full list. Failures are recorded in the state, not returned.
    pub async fn load(&mut self) {
        self.state.load_started();
        match self.api.list_tasks().await {
            Ok(tasks) => self.state.loaded(tasks),
            Err(e) => {
                tracing::debug!("Loading tasks failed: {}", e);
                self.state.load_failed(e.to_string());
            }
        }
    }

    pub async fn create(&mut self) -> Result<(), Refusal> {
        let mutation = self.state.begin_create()?;
        self.run(mutation).await;
        Ok(())
    }

    pub async fn toggle(&mut self, id: &str) -> Result<(), Refusal> {
        let mutation = self.state.begin_toggle(id)?;
        self.run(mutation).await;
        Ok(())
    }

    /// Delete after confirmation. Returns `false` if the user declined.
    pub async fn delete(&mut self, id: &str, prompt: &mut dyn Prompt) -> Result<bool, Refusal> {
        if self.state.is_busy() {
            return Err(Refusal::Busy);
        }
        let title = self
            .state
            .task(id)
            .map(|t| t.title.clone())
            .ok_or_else(|| Refusal::UnknownTask(id.to_string()))?;
        if !prompt.confirm(&format!("Delete \"{}\"?", title)).await {
            return Ok(false);
        }
        let mutation = self.state.begin_delete(id)?;
        self.run(mutation).await;
        Ok(true)
    }

    pub fn start_edit(&mut self, id: &str) -> Result<(), Refusal> {
        self.state.start_edit(id)
    }

    pub fn set_edit_draft(&mut self, draft: impl Into<String>) -> Result<(), Refusal> {
        self.state.set_edit_draft(draft)
    }

    pub fn cancel_edit(&mut self) -> Result<(), Refusal> {
        self.state.cancel_edit()
    }

    pub async fn save_edit(&mut self) -> Result<(), Refusal> {
        let mutation = self.state.begin_save_edit()?;
        self.run(mutation).await;
        Ok(())
    }

    /// Probe `/api/health` and show the result through `prompt`.
    pub async fn health(&self, prompt: &mut dyn Prompt) {
        let message = match self.api.health().await {
            Ok(h) => format!(
                "API OK\nDriver: {}\nUptime: {}s",
                h.driver,
                h.uptime.round() as u64
            ),
            Err(e) => e.to_string(),
        };
        prompt.acknowledge(&message).await;
    }

    async fn send(&self, mutation: &Mutation) -> Result<(), ClientError> {
        match mutation {
            Mutation::Create { title } => self.api.create_task(title).await.map(|_| ()),
            Mutation::Update { id, update } => self.api.update_task(id, update).await.map(|_| ()),
            Mutation::Delete { id } => self.api.delete_task(id).await,
        }
    }

    /// Send, reload on success, and always settle back to idle.
    async fn run(&mut self, mutation: Mutation) {
        match self.send(&mutation).await {
            Ok(()) => {
                self.state.mutation_succeeded(&mutation);
                self.load().await;
            }
            Err(e) => {
                tracing::debug!("Mutation {:?} failed: {}", mutation, e);
                self.state.mutation_failed(e.to_string());
            }
        }
        self.state.settle();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::HealthResponse;
    use crate::client::api::TaskUpdate;
    use crate::task::{NewTask, Task, TaskPatch};
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// In-process fake of the API with a call log.
    #[derive(Default)]
    struct FakeApi {
        tasks: Mutex<Vec<Task>>,
        calls: Mutex<Vec<String>>,
        fail_next: Mutex<Option<ClientError>>,
    }

    impl FakeApi {
        fn with(titles: &[&str]) -> Self {
            let api = Self::default();
            for title in titles {
                api.tasks
                    .lock()
                    .unwrap()
                    .insert(0, Task::create(NewTask::new(title, false).unwrap()));
            }
            api
        }

        fn fail_next(&self, status: u16, message: &str) {
            *self.fail_next.lock().unwrap() = Some(ClientError::Status {
                status,
                message: message.to_string(),
            });
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, call: &str) -> Result<(), ClientError> {
            self.calls.lock().unwrap().push(call.to_string());
            match self.fail_next.lock().unwrap().take() {
                Some(err) => Err(err),
                None => Ok(()),
            }
        }

        fn not_found() -> ClientError {
            ClientError::Status {
                status: 404,
                message: "not found".into(),
            }
        }
    }

    #[async_trait]
    impl TaskApi for FakeApi {
        async fn list_tasks(&self) -> Result<Vec<Task>, ClientError> {
            self.record("list")?;
            Ok(self.tasks.lock().unwrap().clone())
        }

        async fn create_task(&self, title: &str) -> Result<Task, ClientError> {
            self.record("create")?;
            let task = Task::create(NewTask::new(title, false).unwrap());
            self.tasks.lock().unwrap().insert(0, task.clone());
            Ok(task)
        }

        async fn update_task(&self, id: &str, update: &TaskUpdate) -> Result<Task, ClientError> {
            self.record("update")?;
            let patch = TaskPatch::new(update.title.as_deref(), update.done).unwrap();
            let mut tasks = self.tasks.lock().unwrap();
            let task = tasks
                .iter_mut()
                .find(|t| t.id == id)
                .ok_or_else(Self::not_found)?;
            task.apply(&patch);
            Ok(task.clone())
        }

        async fn delete_task(&self, id: &str) -> Result<(), ClientError> {
            self.record("delete")?;
            let mut tasks = self.tasks.lock().unwrap();
            let before = tasks.len();
            tasks.retain(|t| t.id != id);
            if tasks.len() == before {
                return Err(Self::not_found());
            }
            Ok(())
        }

        async fn health(&self) -> Result<HealthResponse, ClientError> {
            self.record("health")?;
            Ok(HealthResponse {
                ok: true,
                driver: "memory".into(),
                uptime: 41.6,
            })
        }
    }

    #[derive(Default)]
    struct ScriptedPrompt {
        answers: VecDeque<bool>,
        questions: Vec<String>,
        messages: Vec<String>,
    }

    #[async_trait]
    impl Prompt for ScriptedPrompt {
        async fn confirm(&mut self, question: &str) -> bool {
            self.questions.push(question.to_string());
            self.answers.pop_front().unwrap_or(false)
        }

        async fn acknowledge(&mut self, message: &str) {
            self.messages.push(message.to_string());
        }
    }

    #[tokio::test]
    async fn create_clears_draft_and_reloads() {
        let mut board = Board::new(FakeApi::default());
        board.set_draft("  Buy milk  ");
        board.create().await.unwrap();

        assert_eq!(board.api().calls(), vec!["create", "list"]);
        assert_eq!(board.state().draft(), "");
        assert_eq!(board.state().tasks().len(), 1);
        assert_eq!(board.state().tasks()[0].title, "Buy milk");
        assert!(!board.state().is_busy());
    }

    #[tokio::test]
    async fn failed_create_keeps_draft_and_skips_reload() {
        let mut board = Board::new(FakeApi::default());
        board.api().fail_next(400, "title required");
        board.set_draft("Buy milk");
        board.create().await.unwrap();

        assert_eq!(board.api().calls(), vec!["create"]);
        assert_eq!(board.state().draft(), "Buy milk");
        assert_eq!(board.state().error(), Some("title required"));
        assert!(!board.state().is_busy());
    }

    #[tokio::test]
    async fn blank_draft_sends_nothing() {
        let mut board = Board::new(FakeApi::default());
        board.set_draft("   ");
        assert_eq!(board.create().await, Err(Refusal::BlankTitle));
        assert!(board.api().calls().is_empty());
    }

    #[tokio::test]
    async fn toggle_round_trips_through_reload() {
        let mut board = Board::new(FakeApi::with(&["A"]));
        board.load().await;
        let id = board.state().tasks()[0].id.clone();

        board.toggle(&id).await.unwrap();
        assert!(board.state().tasks()[0].done);
        board.toggle(&id).await.unwrap();
        assert!(!board.state().tasks()[0].done);
        assert_eq!(
            board.api().calls(),
            vec!["list", "update", "list", "update", "list"]
        );
    }

    #[tokio::test]
    async fn delete_asks_first_and_respects_decline() {
        let mut board = Board::new(FakeApi::with(&["Walk dog"]));
        board.load().await;
        let id = board.state().tasks()[0].id.clone();

        let mut prompt = ScriptedPrompt {
            answers: VecDeque::from([false, true]),
            ..Default::default()
        };
        assert!(!board.delete(&id, &mut prompt).await.unwrap());
        assert_eq!(board.state().tasks().len(), 1);

        assert!(board.delete(&id, &mut prompt).await.unwrap());
        assert!(board.state().tasks().is_empty());
        assert_eq!(prompt.questions, vec!["Delete \"Walk dog\"?"; 2]);
        assert_eq!(board.api().calls(), vec!["list", "delete", "list"]);
    }

    #[tokio::test]
    async fn delete_of_vanished_task_surfaces_not_found() {
        let mut board = Board::new(FakeApi::with(&["A"]));
        board.load().await;
        let id = board.state().tasks()[0].id.clone();
        board.api().tasks.lock().unwrap().clear();

        let mut prompt = ScriptedPrompt {
            answers: VecDeque::from([true]),
            ..Default::default()
        };
        board.delete(&id, &mut prompt).await.unwrap();
        assert_eq!(board.state().error(), Some("not found"));
        // No reload after a failure, so the stale row is still shown.
        assert_eq!(board.state().tasks().len(), 1);
    }

    #[tokio::test]
    async fn edit_save_sends_title_only_and_exits_edit_mode() {
        let mut board = Board::new(FakeApi::with(&["Old"]));
        board.load().await;
        let id = board.state().tasks()[0].id.clone();

        board.start_edit(&id).unwrap();
        board.set_edit_draft("  New  ").unwrap();
        board.save_edit().await.unwrap();

        assert!(board.state().editing().is_none());
        assert_eq!(board.state().tasks()[0].title, "New");
        assert!(!board.state().tasks()[0].done);
    }

    #[tokio::test]
    async fn cancel_edit_makes_no_request() {
        let mut board = Board::new(FakeApi::with(&["A"]));
        board.load().await;
        let id = board.state().tasks()[0].id.clone();

        board.start_edit(&id).unwrap();
        board.set_edit_draft("changed").unwrap();
        board.cancel_edit().unwrap();
        assert_eq!(board.api().calls(), vec!["list"]);
        assert_eq!(board.state().tasks()[0].title, "A");
    }

    #[tokio::test]
    async fn load_failure_keeps_list() {
        let mut board = Board::new(FakeApi::with(&["A"]));
        board.load().await;
        board.api().fail_next(503, "HTTP 503");
        board.load().await;
        assert_eq!(board.state().tasks().len(), 1);
        assert_eq!(board.state().error(), Some("HTTP 503"));
    }

    #[tokio::test]
    async fn health_reports_driver_and_rounded_uptime() {
        let board = Board::new(FakeApi::default());
        let mut prompt = ScriptedPrompt::default();
        board.health(&mut prompt).await;
        assert_eq!(prompt.messages, vec!["API OK\nDriver: memory\nUptime: 42s"]);

        board.api().fail_next(500, "HTTP 500");
        board.health(&mut prompt).await;
        assert_eq!(prompt.messages[1], "HTTP 500");
    }
}
