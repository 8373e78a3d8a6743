//! API request and response types.

use serde::{Deserialize, Deserializer, Serialize};

use crate::task::Truthy;

/// Request to create a new task.
///
/// `title` is kept loose so a non-string title is reported as a validation
/// error rather than a body rejection.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateTaskRequest {
    #[serde(default, deserialize_with = "present")]
    pub title: Option<serde_json::Value>,

    #[serde(default, deserialize_with = "present")]
    pub done: Option<Truthy>,
}

/// Partial update; absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateTaskRequest {
    #[serde(default, deserialize_with = "present")]
    pub title: Option<serde_json::Value>,

    #[serde(default, deserialize_with = "present")]
    pub done: Option<Truthy>,
}

/// Treat an explicit `null` as present (`Some`), unlike the default `Option` handling.
fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// Error body for 4xx/5xx responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Whether the store answered the ping
    pub ok: bool,

    /// Store backend name ("sqlite" or "memory")
    pub driver: String,

    /// Process uptime in seconds
    pub uptime: f64,
}

/// Diagnostic echo of the caller's address and proxy headers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebugResponse {
    pub ip: String,
    pub headers: ForwardingHeaders,
}

/// Forwarding-related request headers. Absent headers are omitted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ForwardingHeaders {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,

    #[serde(rename = "x-real-ip", skip_serializing_if = "Option::is_none")]
    pub x_real_ip: Option<String>,

    #[serde(rename = "x-forwarded-for", skip_serializing_if = "Option::is_none")]
    pub x_forwarded_for: Option<String>,

    #[serde(rename = "x-forwarded-proto", skip_serializing_if = "Option::is_none")]
    pub x_forwarded_proto: Option<String>,
}
