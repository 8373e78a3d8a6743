//! HTTP API for the task server.
//!
//! ## Endpoints
//!
//! - `GET /api/health` - Store ping, driver name and uptime
//! - `GET /api/debug` - Echo caller IP and forwarding headers
//! - `GET /api/tasks` - List tasks, newest first
//! - `POST /api/tasks` - Create a task
//! - `PUT /api/tasks/{id}` - Partially update a task
//! - `DELETE /api/tasks/{id}` - Delete a task

mod error;
mod routes;
pub mod task_store;
mod tasks;
pub mod types;

pub use error::ApiError;
pub use routes::{process_started, router, serve, AppState};
pub use types::*;
