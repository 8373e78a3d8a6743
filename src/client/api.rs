//! HTTP client for the task API.
//!
//! Any non-2xx response becomes [`ClientError::Status`] carrying the server's
//! `error` (or `message`) field, falling back to `HTTP <status>`.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use crate::api::types::HealthResponse;
use crate::task::Task;

pub const DEFAULT_API_BASE: &str = "http://127.0.0.1:5000";

#[derive(Debug, Error)]
pub enum ClientError {
    /// The server answered with a non-success status.
    #[error("{message}")]
    Status { status: u16, message: String },

    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("empty response body")]
    EmptyBody,
}

/// Fields for a partial update. `None` fields are not sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TaskUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub done: Option<bool>,
}

#[derive(Debug, Serialize)]
struct CreateBody<'a> {
    title: &'a str,
    done: bool,
}

/// Operations the client needs from the task API.
#[async_trait]
pub trait TaskApi: Send + Sync {
    async fn list_tasks(&self) -> Result<Vec<Task>, ClientError>;
    async fn create_task(&self, title: &str) -> Result<Task, ClientError>;
    async fn update_task(&self, id: &str, update: &TaskUpdate) -> Result<Task, ClientError>;
    async fn delete_task(&self, id: &str) -> Result<(), ClientError>;
    async fn health(&self) -> Result<HealthResponse, ClientError>;
}

/// [`TaskApi`] over HTTP with reqwest.
#[derive(Clone)]
pub struct HttpTaskApi {
    api_root: String,
    client: reqwest::Client,
}

impl HttpTaskApi {
    /// `base_url` is the server origin; an empty value means [`DEFAULT_API_BASE`].
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        if base_url.trim().is_empty() {
            base_url = DEFAULT_API_BASE.to_string();
        }
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            api_root: format!("{}/api", base_url),
            client: reqwest::Client::new(),
        }
    }

    /// The `/api` root all requests are sent under.
    pub fn api_root(&self) -> &str {
        &self.api_root
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_root, path)
    }

    /// Send a request and turn the response into `T`, or `None` for 204.
    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<Option<T>, ClientError> {
        let resp = request.send().await?;
        let status = resp.status();
        let text = resp.text().await?;

        if !status.is_success() {
            return Err(ClientError::Status {
                status: status.as_u16(),
                message: error_message(status, &text),
            });
        }
        if status == StatusCode::NO_CONTENT {
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(&text)?))
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, ClientError> {
        self.send(request).await?.ok_or(ClientError::EmptyBody)
    }
}

/// Pick `error`, then `message`, from a JSON error body.
fn error_message(status: StatusCode, body: &str) -> String {
    let fallback = format!("HTTP {}", status.as_u16());
    let Ok(value) = serde_json::from_str::<serde_json::Value>(body) else {
        return fallback;
    };
    ["error", "message"]
        .iter()
        .filter_map(|key| value.get(*key).and_then(|v| v.as_str()))
        .find(|msg| !msg.is_empty())
        .map(str::to_string)
        .unwrap_or(fallback)
}

#[async_trait]
impl TaskApi for HttpTaskApi {
    async fn list_tasks(&self) -> Result<Vec<Task>, ClientError> {
        self.send_json(self.client.get(self.url("/tasks"))).await
    }

    async fn create_task(&self, title: &str) -> Result<Task, ClientError> {
        let body = CreateBody { title, done: false };
        self.send_json(self.client.post(self.url("/tasks")).json(&body))
            .await
    }

    async fn update_task(&self, id: &str, update: &TaskUpdate) -> Result<Task, ClientError> {
        let url = self.url(&format!("/tasks/{}", urlencoding::encode(id)));
        self.send_json(self.client.put(url).json(update)).await
    }

    async fn delete_task(&self, id: &str) -> Result<(), ClientError> {
        let url = self.url(&format!("/tasks/{}", urlencoding::encode(id)));
        self.send::<serde_json::Value>(self.client.delete(url))
            .await?;
        Ok(())
    }

    async fn health(&self) -> Result<HealthResponse, ClientError> {
        self.send_json(self.client.get(self.url("/health"))).await
    }
}
