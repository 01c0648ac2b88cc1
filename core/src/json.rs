//! JSON flavour of the composed client.
//!
//! # Design
//! `JsonApiClient` is an `ApiClient` whose blocking client sends
//! `Accept: application/json` unless the caller sets its own, and whose
//! blocking verbs decode the body. The non-blocking verbs are registered
//! under their own client class so the worker rebuilds the JSON flavour;
//! handlers still receive the raw `HttpResponse`.
//!
//! A decode failure happens after the dispatch, so the log entry for the
//! call is already complete when `ClientError::JsonDecode` is returned.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::blocking::{BlockingClient, BlockingDispatch};
use crate::client::ApiClient;
use crate::config::Configuration;
use crate::context::ClientContext;
use crate::error::ClientError;
use crate::http::{HttpMethod, HttpResponse};
use crate::options::RequestOptions;

/// A response whose body has been parsed as JSON.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    /// `None` when the body was empty.
    pub payload: Option<Value>,
}

impl JsonResponse {
    /// Deserialize the payload into `T`. An empty body reads as JSON `null`.
    pub fn parse<T: DeserializeOwned>(&self) -> Result<T, ClientError> {
        serde_json::from_value(self.payload.clone().unwrap_or(Value::Null))
            .map_err(|e| ClientError::JsonDecode(e.to_string()))
    }
}

/// Parse `response.body`; whitespace-only bodies give `payload: None`.
pub fn parse_json(response: HttpResponse) -> Result<JsonResponse, ClientError> {
    let payload = if response.body.iter().all(u8::is_ascii_whitespace) {
        None
    } else {
        Some(serde_json::from_slice(&response.body).map_err(|e| ClientError::JsonDecode(e.to_string()))?)
    };
    Ok(JsonResponse {
        status: response.status,
        headers: response.headers,
        payload,
    })
}

pub struct JsonApiClient {
    inner: ApiClient,
}

impl JsonApiClient {
    /// Registry key of the JSON client kind.
    pub const CLIENT_CLASS: &'static str = "api_client::JsonApiClient";

    pub fn new(configuration: Configuration, context: &ClientContext) -> Result<Self, ClientError> {
        let blocking = json_blocking_client(configuration, context)?;
        Ok(Self {
            inner: ApiClient::with_blocking(blocking, Self::CLIENT_CLASS, context),
        })
    }

    pub fn configuration(&self) -> &Configuration {
        self.inner.configuration()
    }

    pub fn request_blocking(&self, method: HttpMethod, endpoint: &str, options: &RequestOptions) -> Result<JsonResponse, ClientError> {
        parse_json(self.inner.request_blocking(method, endpoint, options)?)
    }

    pub fn get_blocking(&self, endpoint: &str, options: &RequestOptions) -> Result<JsonResponse, ClientError> {
        self.request_blocking(HttpMethod::Get, endpoint, options)
    }

    pub fn post_blocking(&self, endpoint: &str, options: &RequestOptions) -> Result<JsonResponse, ClientError> {
        self.request_blocking(HttpMethod::Post, endpoint, options)
    }

    pub fn put_blocking(&self, endpoint: &str, options: &RequestOptions) -> Result<JsonResponse, ClientError> {
        self.request_blocking(HttpMethod::Put, endpoint, options)
    }

    pub fn patch_blocking(&self, endpoint: &str, options: &RequestOptions) -> Result<JsonResponse, ClientError> {
        self.request_blocking(HttpMethod::Patch, endpoint, options)
    }

    pub fn delete_blocking(&self, endpoint: &str, options: &RequestOptions) -> Result<JsonResponse, ClientError> {
        self.request_blocking(HttpMethod::Delete, endpoint, options)
    }

    pub fn get(&self, endpoint: &str, options: &RequestOptions, on_success: &str, on_error: &str) -> Result<(), ClientError> {
        self.inner.get(endpoint, options, on_success, on_error)
    }

    pub fn post(&self, endpoint: &str, options: &RequestOptions, on_success: &str, on_error: &str) -> Result<(), ClientError> {
        self.inner.post(endpoint, options, on_success, on_error)
    }

    pub fn put(&self, endpoint: &str, options: &RequestOptions, on_success: &str, on_error: &str) -> Result<(), ClientError> {
        self.inner.put(endpoint, options, on_success, on_error)
    }

    pub fn patch(&self, endpoint: &str, options: &RequestOptions, on_success: &str, on_error: &str) -> Result<(), ClientError> {
        self.inner.patch(endpoint, options, on_success, on_error)
    }

    pub fn delete(&self, endpoint: &str, options: &RequestOptions, on_success: &str, on_error: &str) -> Result<(), ClientError> {
        self.inner.delete(endpoint, options, on_success, on_error)
    }
}

fn json_blocking_client(configuration: Configuration, context: &ClientContext) -> Result<BlockingClient, ClientError> {
    Ok(BlockingClient::new(configuration, context)?.with_default_header("Accept", "application/json"))
}

/// Worker-side factory registered under `JsonApiClient::CLIENT_CLASS`.
pub(crate) fn build_dispatcher(
    configuration: Configuration,
    context: &ClientContext,
) -> Result<Box<dyn BlockingDispatch>, ClientError> {
    Ok(Box::new(json_blocking_client(configuration, context)?))
}
