//! Task client: HTTP access, the board state machine, and text rendering.
//!
//! The board holds the task list, the composer draft, an optional edit
//! session, a busy phase and the last error. It never patches the list from
//! mutation responses; it reloads instead.

pub mod api;
pub mod board;
pub mod render;
pub mod state;

pub use api::{ClientError, HttpTaskApi, TaskApi, TaskUpdate, DEFAULT_API_BASE};
pub use board::{Board, Prompt};
pub use render::render;
pub use state::{BoardState, EditSession, Mutation, Phase, Refusal};
