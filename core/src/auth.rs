//! Authenticators that survive the trip to a worker.
//!
//! # Design
//! A non-blocking request is executed by a worker that only receives plain
//! data, so an authenticator must be able to describe itself as a JSON
//! mapping (`export_init_args`) and be rebuilt from it. The rebuild goes
//! through the `Registry`, keyed by `auth_class`.
//!
//! `SerializableAuth` is the object-safe half used at request time;
//! `AuthFromArgs` adds the constructor and is what gets registered.

use std::fmt;

use base64::prelude::*;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ClientError;
use crate::http::HttpRequest;

/// Constructor arguments of an authenticator, as plain JSON.
pub type InitArgs = Map<String, Value>;

/// Decorates outgoing requests with credentials.
pub trait SerializableAuth: fmt::Debug + Send + Sync {
    /// Registry key for this authenticator type.
    fn auth_class(&self) -> &'static str;

    /// Attach credentials to `request`.
    fn apply(&self, request: &mut HttpRequest);

    /// Arguments sufficient to build an equal instance on a worker.
    fn export_init_args(&self) -> InitArgs;
}

/// Construction side of an authenticator.
pub trait AuthFromArgs: SerializableAuth + Sized + 'static {
    const AUTH_CLASS: &'static str;

    fn from_serialized_args(args: InitArgs) -> Result<Self, ClientError>;
}

/// Default `from_serialized_args` for authenticators whose arguments are
/// their serde representation.
pub fn deserialize_args<T: DeserializeOwned>(args: InitArgs) -> Result<T, ClientError> {
    serde_json::from_value(Value::Object(args))
        .map_err(|e| ClientError::Configuration(format!("invalid authenticator arguments: {e}")))
}

fn export<T: Serialize>(value: &T) -> InitArgs {
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) => map,
        _ => InitArgs::new(),
    }
}

impl PartialEq for dyn SerializableAuth {
    fn eq(&self, other: &Self) -> bool {
        self.auth_class() == other.auth_class() && self.export_init_args() == other.export_init_args()
    }
}

/// Username and password sent as `Authorization: Basic ...`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasicAuth {
    pub username: String,
    pub password: String,
}

impl BasicAuth {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for BasicAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicAuth")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl SerializableAuth for BasicAuth {
    fn auth_class(&self) -> &'static str {
        Self::AUTH_CLASS
    }

    fn apply(&self, request: &mut HttpRequest) {
        let credentials = BASE64_STANDARD.encode(format!("{}:{}", self.username, self.password));
        request.set_header("Authorization", format!("Basic {credentials}"));
    }

    fn export_init_args(&self) -> InitArgs {
        export(self)
    }
}

impl AuthFromArgs for BasicAuth {
    const AUTH_CLASS: &'static str = "api_client::auth::BasicAuth";

    fn from_serialized_args(args: InitArgs) -> Result<Self, ClientError> {
        deserialize_args(args)
    }
}

/// Token sent as `{auth_header}: {auth_type} {token}`.
///
/// With `auth_type` unset only the token is sent.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BearerAuth {
    pub auth_header: String,
    pub token: String,
    pub auth_type: Option<String>,
}

impl BearerAuth {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            auth_header: "Authorization".to_string(),
            token: token.into(),
            auth_type: Some("Bearer".to_string()),
        }
    }

    pub fn with_auth_type(mut self, auth_type: Option<&str>) -> Self {
        self.auth_type = auth_type.map(str::to_string);
        self
    }

    pub fn with_header(mut self, auth_header: impl Into<String>) -> Self {
        self.auth_header = auth_header.into();
        self
    }
}

impl fmt::Debug for BearerAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BearerAuth")
            .field("auth_header", &self.auth_header)
            .field("token", &"<redacted>")
            .field("auth_type", &self.auth_type)
            .finish()
    }
}

impl SerializableAuth for BearerAuth {
    fn auth_class(&self) -> &'static str {
        Self::AUTH_CLASS
    }

    fn apply(&self, request: &mut HttpRequest) {
        let value = match self.auth_type.as_deref() {
            Some(auth_type) if !auth_type.is_empty() => format!("{auth_type} {}", self.token),
            _ => self.token.clone(),
        };
        request.set_header(&self.auth_header, value);
    }

    fn export_init_args(&self) -> InitArgs {
        export(self)
    }
}

impl AuthFromArgs for BearerAuth {
    const AUTH_CLASS: &'static str = "api_client::auth::BearerAuth";

    fn from_serialized_args(args: InitArgs) -> Result<Self, ClientError> {
        #[derive(Deserialize)]
        struct Args {
            token: String,
            #[serde(default = "default_auth_type")]
            auth_type: Option<String>,
            #[serde(default = "default_auth_header")]
            auth_header: String,
        }

        let args: Args = deserialize_args(args)?;
        Ok(Self {
            auth_header: args.auth_header,
            token: args.token,
            auth_type: args.auth_type,
        })
    }
}

fn default_auth_type() -> Option<String> {
    Some("Bearer".to_string())
}

fn default_auth_header() -> String {
    "Authorization".to_string()
}
