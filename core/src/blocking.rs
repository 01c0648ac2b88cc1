//! Synchronous dispatch on the caller's thread.
//!
//! # Design
//! `BlockingClient::request` never fails with a panic and never lets a
//! transport error escape as anything but a returned `ClientError`. Each
//! call consults the policy store, opens a fresh `ClientLog`, builds the
//! request, sends it through the transport and records the outcome. A
//! disabled client short-circuits before the log entry exists.
//!
//! Configuration problems surface earlier, from `BlockingClient::new`.

use tracing::{debug, error, instrument, warn};

use crate::body;
use crate::codes::ClientCode;
use crate::config::Configuration;
use crate::context::ClientContext;
use crate::endpoint;
use crate::error::{error_report, ClientError};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::log::ClientLog;
use crate::options::{PathParam, RequestOptions};
use crate::transport::SendOptions;

use std::collections::BTreeMap;

/// The blocking verb surface, as seen by the worker.
pub trait BlockingDispatch: Send + Sync {
    fn configuration(&self) -> &Configuration;

    fn request(&self, method: HttpMethod, endpoint: &str, options: &RequestOptions) -> Result<HttpResponse, ClientError>;
}

pub struct BlockingClient {
    configuration: Configuration,
    code: ClientCode,
    context: ClientContext,
    default_headers: Vec<(String, String)>,
}

impl BlockingClient {
    /// Validate `configuration` and bind it to `context`.
    pub fn new(configuration: Configuration, context: &ClientContext) -> Result<Self, ClientError> {
        let code = configuration.validate(&context.settings)?;
        Ok(Self {
            configuration,
            code,
            context: context.clone(),
            default_headers: Vec::new(),
        })
    }

    /// Header sent unless the caller provides its own value.
    pub fn with_default_header(mut self, name: &str, value: &str) -> Self {
        self.default_headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn code(&self) -> ClientCode {
        self.code
    }

    pub fn get(&self, endpoint: &str, options: &RequestOptions) -> Result<HttpResponse, ClientError> {
        self.request(HttpMethod::Get, endpoint, options)
    }

    pub fn post(&self, endpoint: &str, options: &RequestOptions) -> Result<HttpResponse, ClientError> {
        self.request(HttpMethod::Post, endpoint, options)
    }

    pub fn put(&self, endpoint: &str, options: &RequestOptions) -> Result<HttpResponse, ClientError> {
        self.request(HttpMethod::Put, endpoint, options)
    }

    pub fn patch(&self, endpoint: &str, options: &RequestOptions) -> Result<HttpResponse, ClientError> {
        self.request(HttpMethod::Patch, endpoint, options)
    }

    pub fn delete(&self, endpoint: &str, options: &RequestOptions) -> Result<HttpResponse, ClientError> {
        self.request(HttpMethod::Delete, endpoint, options)
    }

    /// Absolute URL for `endpoint` with `path_params` substituted.
    pub fn get_url(&self, endpoint: &str, path_params: &BTreeMap<String, Option<PathParam>>) -> Result<String, ClientError> {
        Ok(self.configuration.url_for(&endpoint::resolve(endpoint, path_params)?))
    }

    /// Build the outgoing request, authenticator applied last.
    pub fn build_request(&self, method: HttpMethod, endpoint: &str, options: &RequestOptions) -> Result<HttpRequest, ClientError> {
        let url = endpoint::with_query(self.get_url(endpoint, &options.path_params)?, &options.query_params);
        let mut request = HttpRequest::new(method, url);
        for (name, value) in &options.headers {
            request.set_header(name, value.as_str());
        }
        for (name, value) in &self.default_headers {
            request.set_default_header(name, value.as_str());
        }
        if let Some(encoded) = body::encode(options)? {
            request.set_default_header("Content-Type", encoded.content_type);
            request.body = Some(encoded.bytes);
        }
        if let Some(auth) = &self.configuration.auth {
            auth.apply(&mut request);
        }
        Ok(request)
    }

    fn log_exception(&self, log: &ClientLog, err: &ClientError) {
        error!(
            client_code = %self.code,
            method = log.method.map(|m| m.as_str()).unwrap_or_default(),
            url = %log.url,
            request_time = ?log.request_time,
            response_status_code = ?log.response_status_code,
            timeout = self.configuration.timeout,
            error = %err,
            "client integration error"
        );
    }
}

impl BlockingDispatch for BlockingClient {
    fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    #[instrument(skip_all, fields(client = %self.code, method = %method, endpoint = endpoint))]
    fn request(&self, method: HttpMethod, endpoint: &str, options: &RequestOptions) -> Result<HttpResponse, ClientError> {
        if self.context.policies.is_disabled(self.code) {
            warn!("client is disabled, request not sent");
            return Err(ClientError::Disabled { code: self.code });
        }

        let logs = &self.context.logs;
        let mut log = logs.create();
        let sent = self.build_request(method, endpoint, options).and_then(|request| {
            let send_options = SendOptions {
                timeout: self.configuration.timeout_duration(),
                retries: self.context.policies.total_retries(self.code),
            };
            log.update_from_request(&request, self.code);
            logs.save(&mut log);
            debug!(url = %request.url, retries = send_options.retries, "sending request");
            self.context.transport.send(&request, &send_options)
        });

        match sent {
            Ok(response) => {
                log.update_from_response(&response);
                logs.save(&mut log);
                debug!(status = response.status, "response received");
                Ok(response)
            }
            Err(err) => {
                log.record_error(error_report(&err));
                logs.save(&mut log);
                self.log_exception(&log, &err);
                Err(err)
            }
        }
    }
}
