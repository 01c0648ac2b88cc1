//! Stable names for everything that crosses the worker boundary.
//!
//! # Design
//! A non-blocking request reaches its worker as plain data, so the client
//! kind, the authenticator type and both handlers travel as strings. The
//! `Registry` maps those strings back to function pointers. It is filled at
//! startup, wrapped in an `Arc` and shared by callers and workers alike.
//!
//! Handlers are plain `fn` pointers: they cannot capture state, and the only
//! way to hand one to a non-blocking call is by the name it was registered
//! under.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::auth::{AuthFromArgs, BasicAuth, BearerAuth, InitArgs, SerializableAuth};
use crate::blocking::BlockingDispatch;
use crate::client::{self, ApiClient};
use crate::config::Configuration;
use crate::context::ClientContext;
use crate::error::{CallbackRole, ClientError};
use crate::http::HttpResponse;
use crate::json::{self, JsonApiClient};

pub type ClientFactory = fn(Configuration, &ClientContext) -> Result<Box<dyn BlockingDispatch>, ClientError>;
pub type AuthFactory = fn(InitArgs) -> Result<Arc<dyn SerializableAuth>, ClientError>;
pub type SuccessHandler = fn(&HttpResponse);
pub type ErrorHandler = fn(&ClientError);

#[derive(Clone, Default)]
pub struct Registry {
    clients: HashMap<String, ClientFactory>,
    auths: HashMap<String, AuthFactory>,
    success_handlers: HashMap<String, SuccessHandler>,
    error_handlers: HashMap<String, ErrorHandler>,
}

impl Registry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in client kinds and authenticators, plus the
    /// no-op success handler.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register_client(ApiClient::CLIENT_CLASS, client::build_dispatcher);
        registry.register_client(JsonApiClient::CLIENT_CLASS, json::build_dispatcher);
        registry.register_auth::<BasicAuth>();
        registry.register_auth::<BearerAuth>();
        registry.register_success_handler(DEFAULT_SUCCESS_HANDLER, default_success_handler);
        registry
    }

    pub fn register_client(&mut self, name: &str, factory: ClientFactory) -> &mut Self {
        self.clients.insert(name.to_string(), factory);
        self
    }

    pub fn register_auth<A: AuthFromArgs>(&mut self) -> &mut Self {
        self.auths.insert(A::AUTH_CLASS.to_string(), build_auth::<A>);
        self
    }

    pub fn register_success_handler(&mut self, name: &str, handler: SuccessHandler) -> &mut Self {
        self.success_handlers.insert(name.to_string(), handler);
        self
    }

    pub fn register_error_handler(&mut self, name: &str, handler: ErrorHandler) -> &mut Self {
        self.error_handlers.insert(name.to_string(), handler);
        self
    }

    pub fn client(&self, name: &str) -> Result<ClientFactory, ClientError> {
        lookup(&self.clients, "client class", name)
    }

    pub fn auth(&self, name: &str) -> Result<AuthFactory, ClientError> {
        lookup(&self.auths, "authenticator", name)
    }

    pub fn success_handler(&self, name: &str) -> Result<SuccessHandler, ClientError> {
        lookup(&self.success_handlers, "success handler", name)
    }

    pub fn error_handler(&self, name: &str) -> Result<ErrorHandler, ClientError> {
        lookup(&self.error_handlers, "error handler", name)
    }

    /// Check that both handler names are usable by a worker.
    pub fn validate_handlers(&self, on_success: &str, on_error: &str) -> Result<(), ClientError> {
        validate_handler(CallbackRole::Success, on_success, self.success_handlers.contains_key(on_success))?;
        validate_handler(CallbackRole::Error, on_error, self.error_handlers.contains_key(on_error))
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("clients", &self.clients.keys().collect::<Vec<_>>())
            .field("auths", &self.auths.keys().collect::<Vec<_>>())
            .field("success_handlers", &self.success_handlers.keys().collect::<Vec<_>>())
            .field("error_handlers", &self.error_handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Registered by `Registry::with_defaults`; does nothing.
pub const DEFAULT_SUCCESS_HANDLER: &str = "api_client::default_success_handler";

pub fn default_success_handler(_response: &HttpResponse) {}

fn build_auth<A: AuthFromArgs>(args: InitArgs) -> Result<Arc<dyn SerializableAuth>, ClientError> {
    Ok(Arc::new(A::from_serialized_args(args)?))
}

fn lookup<T: Copy>(table: &HashMap<String, T>, kind: &'static str, name: &str) -> Result<T, ClientError> {
    table.get(name).copied().ok_or_else(|| ClientError::Unresolved {
        kind,
        name: name.to_string(),
    })
}

fn validate_handler(role: CallbackRole, name: &str, registered: bool) -> Result<(), ClientError> {
    let reason = if name.trim().is_empty() {
        "anonymous handlers cannot be serialized; register the handler under a name".to_string()
    } else if !registered {
        format!("`{name}` is not a registered {role} handler")
    } else {
        return Ok(());
    };
    Err(ClientError::InvalidCallback { role, reason })
}
