//! Error types for the API client layer.
//!
//! # Design
//! A single enum covers every failure the layer can report. Configuration
//! and callback errors are returned synchronously when a client is built or
//! a non-blocking call is enqueued; everything that happens on the wire is
//! returned as a value from the dispatchers and never panics.
//!
//! Variants carry owned strings rather than the underlying library errors so
//! that an error can be logged, stored in a `ClientLog` and handed to an
//! error handler on a worker thread without lifetime or `Send` concerns.

use std::error::Error as StdError;
use std::fmt;

use thiserror::Error;

use crate::codes::ClientCode;

/// Which of the two non-blocking handlers failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackRole {
    Success,
    Error,
}

impl fmt::Display for CallbackRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallbackRole::Success => write!(f, "success"),
            CallbackRole::Error => write!(f, "error"),
        }
    }
}

/// Errors returned by clients, the registry and the worker.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The configuration cannot be used to build a client.
    #[error("invalid client configuration: {0}")]
    Configuration(String),

    /// The policy store reports the client as disabled.
    #[error("client {code} is disabled and cannot make requests")]
    Disabled { code: ClientCode },

    /// The request could not be built from the endpoint and options.
    #[error("request could not be built: {0}")]
    RequestBuild(String),

    /// Connection, timeout, DNS or body read failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// The response body was present but was not valid JSON.
    #[error("response body is not valid JSON: {0}")]
    JsonDecode(String),

    /// A non-blocking handler is anonymous or not registered for its role.
    #[error("invalid {role} handler: {reason}")]
    InvalidCallback { role: CallbackRole, reason: String },

    /// Non-blocking requests cannot carry file uploads.
    #[error("file uploads are not supported by non-blocking requests")]
    FilesNotSupported,

    /// A name crossing the worker boundary has no registry entry.
    #[error("no {kind} registered under `{name}`")]
    Unresolved { kind: &'static str, name: String },

    /// A task payload could not be encoded or decoded.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// The task queue refused the task.
    #[error("task queue error: {0}")]
    Queue(String),
}

impl ClientError {
    /// True for failures that happened while building or sending a request.
    pub fn is_transport(&self) -> bool {
        matches!(self, ClientError::Transport(_) | ClientError::RequestBuild(_))
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::Serialization(err.to_string())
    }
}

/// Render an error together with its whole `source()` chain.
///
/// This is what lands in `ClientLog::error`, the closest thing to a stack
/// trace a Rust error offers.
pub fn error_report(err: &(dyn StdError + 'static)) -> String {
    let mut report = err.to_string();
    let mut source = err.source();
    if source.is_some() {
        report.push_str("\n\nCaused by:");
    }
    let mut depth = 0;
    while let Some(cause) = source {
        report.push_str(&format!("\n    {depth}: {cause}"));
        depth += 1;
        source = cause.source();
    }
    report
}
