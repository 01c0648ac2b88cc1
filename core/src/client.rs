//! The composed API client.
//!
//! # Design
//! `ApiClient` is built once from a validated `Configuration` and exposes
//! two verb sets over it: `*_blocking` verbs that dispatch on the calling
//! thread, and plain verbs that enqueue the call for a worker. Both halves
//! are separate values held side by side.

use tracing::debug;

use crate::blocking::{BlockingClient, BlockingDispatch};
use crate::config::Configuration;
use crate::context::ClientContext;
use crate::error::ClientError;
use crate::http::{HttpMethod, HttpResponse};
use crate::non_blocking::NonBlockingClient;
use crate::options::RequestOptions;

pub struct ApiClient {
    blocking: BlockingClient,
    non_blocking: NonBlockingClient,
}

impl ApiClient {
    /// Registry key of the plain client kind.
    pub const CLIENT_CLASS: &'static str = "api_client::ApiClient";

    /// Validate `configuration` and wire both dispatchers to `context`.
    pub fn new(configuration: Configuration, context: &ClientContext) -> Result<Self, ClientError> {
        Ok(Self::with_blocking(
            BlockingClient::new(configuration, context)?,
            Self::CLIENT_CLASS,
            context,
        ))
    }

    /// Pair an already configured blocking client with a non-blocking one
    /// that the worker will rebuild under `client_class`.
    pub(crate) fn with_blocking(
        blocking: BlockingClient,
        client_class: &'static str,
        context: &ClientContext,
    ) -> Self {
        let non_blocking = NonBlockingClient::new(
            blocking.configuration().clone(),
            client_class,
            context.queue.clone(),
            context.registry.clone(),
        );
        debug!(client = %blocking.code(), client_class, "client ready");
        Self { blocking, non_blocking }
    }

    pub fn configuration(&self) -> &Configuration {
        self.blocking.configuration()
    }

    pub fn blocking(&self) -> &BlockingClient {
        &self.blocking
    }

    pub fn non_blocking(&self) -> &NonBlockingClient {
        &self.non_blocking
    }

    pub fn request_blocking(&self, method: HttpMethod, endpoint: &str, options: &RequestOptions) -> Result<HttpResponse, ClientError> {
        self.blocking.request(method, endpoint, options)
    }

    pub fn get_blocking(&self, endpoint: &str, options: &RequestOptions) -> Result<HttpResponse, ClientError> {
        self.blocking.get(endpoint, options)
    }

    pub fn post_blocking(&self, endpoint: &str, options: &RequestOptions) -> Result<HttpResponse, ClientError> {
        self.blocking.post(endpoint, options)
    }

    pub fn put_blocking(&self, endpoint: &str, options: &RequestOptions) -> Result<HttpResponse, ClientError> {
        self.blocking.put(endpoint, options)
    }

    pub fn patch_blocking(&self, endpoint: &str, options: &RequestOptions) -> Result<HttpResponse, ClientError> {
        self.blocking.patch(endpoint, options)
    }

    pub fn delete_blocking(&self, endpoint: &str, options: &RequestOptions) -> Result<HttpResponse, ClientError> {
        self.blocking.delete(endpoint, options)
    }

    pub fn request(
        &self,
        method: HttpMethod,
        endpoint: &str,
        options: &RequestOptions,
        on_success: &str,
        on_error: &str,
    ) -> Result<(), ClientError> {
        self.non_blocking.request(method, endpoint, options, on_success, on_error)
    }

    pub fn get(&self, endpoint: &str, options: &RequestOptions, on_success: &str, on_error: &str) -> Result<(), ClientError> {
        self.non_blocking.get(endpoint, options, on_success, on_error)
    }

    pub fn post(&self, endpoint: &str, options: &RequestOptions, on_success: &str, on_error: &str) -> Result<(), ClientError> {
        self.non_blocking.post(endpoint, options, on_success, on_error)
    }

    pub fn put(&self, endpoint: &str, options: &RequestOptions, on_success: &str, on_error: &str) -> Result<(), ClientError> {
        self.non_blocking.put(endpoint, options, on_success, on_error)
    }

    pub fn patch(&self, endpoint: &str, options: &RequestOptions, on_success: &str, on_error: &str) -> Result<(), ClientError> {
        self.non_blocking.patch(endpoint, options, on_success, on_error)
    }

    pub fn delete(&self, endpoint: &str, options: &RequestOptions, on_success: &str, on_error: &str) -> Result<(), ClientError> {
        self.non_blocking.delete(endpoint, options, on_success, on_error)
    }
}

/// Worker-side factory registered under `ApiClient::CLIENT_CLASS`.
pub(crate) fn build_dispatcher(
    configuration: Configuration,
    context: &ClientContext,
) -> Result<Box<dyn BlockingDispatch>, ClientError> {
    Ok(Box::new(BlockingClient::new(configuration, context)?))
}
