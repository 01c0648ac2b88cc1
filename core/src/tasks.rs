//! Worker-side task bodies.
//!
//! # Design
//! A `Worker` owns a `ClientContext` and turns `QueuedTask`s back into
//! calls. `api_client.run_nonblocking_request` rebuilds the client from its
//! serialized configuration and fires exactly one handler; the client's own
//! log entry is written by the blocking dispatch it performs.
//!
//! Errors returned from `Worker::handle` mean the task could not be routed:
//! unknown task name, malformed payload, or a name missing from the
//! registry. Anything that goes wrong after both handlers are resolved is
//! delivered to the error handler instead.

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::{Configuration, SerializedConfiguration};
use crate::context::ClientContext;
use crate::error::ClientError;
use crate::http::HttpMethod;
use crate::log::LogStore;
use crate::options::RequestOptions;
use crate::queue::{InMemoryQueue, QueuedTask};
use crate::registry::ErrorHandler;
use crate::settings::Settings;

pub const RUN_NONBLOCKING_REQUEST: &str = "api_client.run_nonblocking_request";
pub const CLIENT_LOG_CLEANUP: &str = "api_client.client_log_cleanup";

/// Payload of `RUN_NONBLOCKING_REQUEST`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestTask {
    pub client_class: String,
    pub client_configuration: SerializedConfiguration,
    pub method: HttpMethod,
    pub endpoint: String,
    pub on_success: String,
    pub on_error: String,
    #[serde(flatten)]
    pub options: RequestOptions,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    SuccessHandled,
    ErrorHandled,
    LogsPurged(usize),
}

pub struct Worker {
    context: ClientContext,
}

impl Worker {
    pub fn new(context: ClientContext) -> Self {
        Self { context }
    }

    pub fn context(&self) -> &ClientContext {
        &self.context
    }

    pub fn handle(&self, task: &QueuedTask) -> Result<TaskOutcome, ClientError> {
        match task.name.as_str() {
            RUN_NONBLOCKING_REQUEST => {
                let request: RequestTask = serde_json::from_str(&task.payload)?;
                self.run_nonblocking_request(request)
            }
            CLIENT_LOG_CLEANUP => Ok(TaskOutcome::LogsPurged(cleanup_old_logs(
                self.context.logs.as_ref(),
                &self.context.settings,
            ))),
            other => Err(ClientError::Unresolved {
                kind: "task",
                name: other.to_string(),
            }),
        }
    }

    pub fn run_nonblocking_request(&self, task: RequestTask) -> Result<TaskOutcome, ClientError> {
        let registry = &self.context.registry;
        let build = registry.client(&task.client_class)?;
        let on_success = registry.success_handler(&task.on_success)?;
        let on_error = registry.error_handler(&task.on_error)?;

        let configuration = match Configuration::from_serialized(task.client_configuration, registry) {
            Ok(configuration) => configuration,
            Err(err) => return Ok(fail(on_error, &err)),
        };
        let client = match build(configuration, &self.context) {
            Ok(client) => client,
            Err(err) => return Ok(fail(on_error, &err)),
        };

        debug!(client = %task.client_class, method = %task.method, endpoint = %task.endpoint, "running queued request");
        match client.request(task.method, &task.endpoint, &task.options) {
            Ok(response) => {
                on_success(&response);
                Ok(TaskOutcome::SuccessHandled)
            }
            Err(err) => Ok(fail(on_error, &err)),
        }
    }

    /// Handle every task currently in `queue`, in order. Tasks that cannot be
    /// routed are logged and skipped.
    pub fn drain(&self, queue: &InMemoryQueue) -> Vec<Result<TaskOutcome, ClientError>> {
        let mut outcomes = Vec::new();
        while let Some(task) = queue.pop() {
            let outcome = self.handle(&task);
            if let Err(err) = &outcome {
                tracing::error!(task = %task.name, error = %err, "task failed");
            }
            outcomes.push(outcome);
        }
        outcomes
    }
}

fn fail(on_error: ErrorHandler, err: &ClientError) -> TaskOutcome {
    on_error(err);
    TaskOutcome::ErrorHandled
}

/// Delete log entries older than `settings.log_max_age_days`.
pub fn cleanup_old_logs(store: &dyn LogStore, settings: &Settings) -> usize {
    let cutoff = Utc::now() - Duration::days(settings.log_max_age_days);
    let deleted = store.delete_created_before(cutoff);
    info!(deleted, %cutoff, "purged old client logs");
    deleted
}
