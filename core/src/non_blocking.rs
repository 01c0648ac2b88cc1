//! Fire-and-forget dispatch through the task queue.
//!
//! # Design
//! Nothing here touches the network. A call is checked (handler names,
//! no file uploads), flattened into a `RequestTask` and enqueued under
//! `api_client.run_nonblocking_request`. The worker side lives in `tasks`.

use std::sync::Arc;

use tracing::debug;

use crate::config::Configuration;
use crate::error::ClientError;
use crate::http::HttpMethod;
use crate::options::RequestOptions;
use crate::queue::{QueuedTask, TaskQueue};
use crate::registry::Registry;
use crate::tasks::{RequestTask, RUN_NONBLOCKING_REQUEST};

pub struct NonBlockingClient {
    configuration: Configuration,
    client_class: &'static str,
    queue: Arc<dyn TaskQueue>,
    registry: Arc<Registry>,
}

impl NonBlockingClient {
    /// `client_class` is the registry key the worker rebuilds the client with.
    pub fn new(
        configuration: Configuration,
        client_class: &'static str,
        queue: Arc<dyn TaskQueue>,
        registry: Arc<Registry>,
    ) -> Self {
        Self {
            configuration,
            client_class,
            queue,
            registry,
        }
    }

    pub fn client_class(&self) -> &'static str {
        self.client_class
    }

    /// Validate and enqueue one request; `on_success` and `on_error` are
    /// registered handler names.
    pub fn request(
        &self,
        method: HttpMethod,
        endpoint: &str,
        options: &RequestOptions,
        on_success: &str,
        on_error: &str,
    ) -> Result<(), ClientError> {
        self.registry.validate_handlers(on_success, on_error)?;
        if !options.files.is_empty() {
            return Err(ClientError::FilesNotSupported);
        }
        let task = RequestTask {
            client_class: self.client_class.to_string(),
            client_configuration: self.configuration.serialize(),
            method,
            endpoint: endpoint.to_string(),
            on_success: on_success.to_string(),
            on_error: on_error.to_string(),
            options: options.clone(),
        };
        self.queue.enqueue(QueuedTask::json(RUN_NONBLOCKING_REQUEST, &task)?)?;
        debug!(client = self.client_class, %method, endpoint, "request enqueued");
        Ok(())
    }

    pub fn get(&self, endpoint: &str, options: &RequestOptions, on_success: &str, on_error: &str) -> Result<(), ClientError> {
        self.request(HttpMethod::Get, endpoint, options, on_success, on_error)
    }

    pub fn post(&self, endpoint: &str, options: &RequestOptions, on_success: &str, on_error: &str) -> Result<(), ClientError> {
        self.request(HttpMethod::Post, endpoint, options, on_success, on_error)
    }

    pub fn put(&self, endpoint: &str, options: &RequestOptions, on_success: &str, on_error: &str) -> Result<(), ClientError> {
        self.request(HttpMethod::Put, endpoint, options, on_success, on_error)
    }

    pub fn patch(&self, endpoint: &str, options: &RequestOptions, on_success: &str, on_error: &str) -> Result<(), ClientError> {
        self.request(HttpMethod::Patch, endpoint, options, on_success, on_error)
    }

    pub fn delete(&self, endpoint: &str, options: &RequestOptions, on_success: &str, on_error: &str) -> Result<(), ClientError> {
        self.request(HttpMethod::Delete, endpoint, options, on_success, on_error)
    }
}
