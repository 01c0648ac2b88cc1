//! The network round-trip, behind a trait.
//!
//! # Design
//! Clients never touch sockets themselves: they build an `HttpRequest` and
//! ask a `Transport` to execute it. `UreqTransport` is the production
//! implementation. It creates one agent per call, so the connection pool
//! lives exactly as long as one dispatch and is dropped on every exit path.
//!
//! Retries are the transport's business. With `retries > 0`, idempotent
//! methods are resent after connection-level failures (refused, reset,
//! DNS, timeout). HTTP error statuses are returned as data and never retried.

use std::time::Duration;

use tracing::warn;

use crate::error::{error_report, ClientError};
use crate::http::{HttpRequest, HttpResponse};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SendOptions {
    pub timeout: Duration,
    pub retries: u32,
}

/// Executes an `HttpRequest` and returns the response as data.
pub trait Transport: Send + Sync {
    fn send(&self, request: &HttpRequest, options: &SendOptions) -> Result<HttpResponse, ClientError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct UreqTransport;

impl UreqTransport {
    pub fn new() -> Self {
        Self
    }
}

impl Transport for UreqTransport {
    fn send(&self, request: &HttpRequest, options: &SendOptions) -> Result<HttpResponse, ClientError> {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(options.timeout))
            .build()
            .new_agent();

        let attempts = if request.method.is_idempotent() {
            options.retries.saturating_add(1)
        } else {
            1
        };
        let mut attempt = 1;
        loop {
            match execute(&agent, request)? {
                Ok(response) => return Ok(response),
                Err(err) if attempt < attempts && is_connection_error(&err) => {
                    warn!(
                        method = %request.method,
                        url = %request.url,
                        attempt,
                        error = %err,
                        "retrying request after connection failure"
                    );
                    attempt += 1;
                }
                Err(err) => return Err(ClientError::Transport(error_report(&err))),
            }
        }
    }
}

/// The outer `Result` is a build failure, the inner one a network failure.
fn execute(agent: &ureq::Agent, request: &HttpRequest) -> Result<Result<HttpResponse, ureq::Error>, ClientError> {
    let mut builder = ureq::http::Request::builder()
        .method(request.method.as_str())
        .uri(request.url.as_str());
    for (name, value) in &request.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    let build_error = |e: ureq::http::Error| ClientError::RequestBuild(e.to_string());

    let sent = match &request.body {
        Some(body) => agent.run(builder.body(body.clone()).map_err(build_error)?),
        None => agent.run(builder.body(()).map_err(build_error)?),
    };
    Ok(sent.and_then(|mut response| {
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        let body = response.body_mut().read_to_vec()?;
        Ok(HttpResponse { status, headers, body })
    }))
}

/// Failures where no complete response arrived. A body over the read limit
/// is not one of them.
fn is_connection_error(err: &ureq::Error) -> bool {
    matches!(
        err,
        ureq::Error::Io(_) | ureq::Error::ConnectionFailed | ureq::Error::HostNotFound | ureq::Error::Timeout(_)
    )
}
