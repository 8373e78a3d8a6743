//! # taskboard
//!
//! Minimal task tracker.
//!
//! This library provides:
//! - An HTTP API for creating, listing, updating and deleting tasks
//! - Memory and SQLite task stores behind one trait
//! - A client board (state machine + HTTP access) used by the terminal front-end
//!
//! ## Architecture
//!
//! ```text
//!   taskboard-cli ──HTTP──► api (axum) ──► TaskStore ──► SQLite / memory
//!        ▲                                                    │
//!        └──────────── reload after every change ◄────────────┘
//! ```
//!
//! ## Modules
//! - `api`: router, handlers and task stores
//! - `client`: board state machine, HTTP client, rendering
//! - `task`: the `Task` record and its validation rules
//! - `config`: environment configuration for the server

pub mod api;
pub mod client;
pub mod config;
pub mod task;

pub use config::Config;
pub use task::Task;
