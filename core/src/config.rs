//! Target service configuration and its wire form.
//!
//! # Design
//! `Configuration` is an immutable value: the `with_*` builders consume and
//! return it. It is validated when a client is built from it rather than on
//! construction, because a worker rebuilds it from strings first and only
//! then hands it to a client.
//!
//! `SerializedConfiguration` is the flat mapping that crosses the worker
//! boundary: `host`, `code`, `scheme`, `timeout` and, for authenticated
//! clients, `auth_class` and `auth_class_config`.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::auth::{InitArgs, SerializableAuth};
use crate::codes::ClientCode;
use crate::endpoint;
use crate::error::ClientError;
use crate::registry::Registry;
use crate::settings::Settings;

pub const DEFAULT_TIMEOUT: u64 = 10;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    Http,
    #[default]
    Https,
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scheme::Http => f.write_str("http"),
            Scheme::Https => f.write_str("https"),
        }
    }
}

/// Describes one external service integration.
#[derive(Debug, Clone)]
pub struct Configuration {
    /// Hostname, optionally followed by an API prefix (`localhost:8000/api/v1`).
    pub host: String,
    /// Must name a `ClientCode`; checked when a client is built.
    pub code: String,
    pub scheme: Scheme,
    /// Request timeout in seconds.
    pub timeout: u64,
    pub auth: Option<Arc<dyn SerializableAuth>>,
}

impl Configuration {
    pub fn new(host: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            code: code.into(),
            scheme: Scheme::default(),
            timeout: DEFAULT_TIMEOUT,
            auth: None,
        }
    }

    pub fn with_scheme(mut self, scheme: Scheme) -> Self {
        self.scheme = scheme;
        self
    }

    pub fn with_timeout(mut self, timeout: u64) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_auth(mut self, auth: impl SerializableAuth + 'static) -> Self {
        self.auth = Some(Arc::new(auth));
        self
    }

    /// `scheme://host` without surrounding slashes on the host.
    pub fn base_url(&self) -> String {
        format!("{}://{}", self.scheme, self.host.trim_matches('/'))
    }

    /// Absolute URL for an already-resolved endpoint.
    pub fn url_for(&self, resolved_endpoint: &str) -> String {
        endpoint::join(&self.base_url(), resolved_endpoint)
    }

    pub fn timeout_duration(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    /// Check the client code and timeout against `settings`.
    pub fn validate(&self, settings: &Settings) -> Result<ClientCode, ClientError> {
        let code = self.code.parse::<ClientCode>()?;
        if self.timeout == 0 {
            return Err(ClientError::Configuration("timeout must be at least 1 second".to_string()));
        }
        if self.timeout > settings.max_timeout {
            return Err(ClientError::Configuration(format!(
                "timeout of {}s exceeds the maximum of {}s",
                self.timeout, settings.max_timeout
            )));
        }
        Ok(code)
    }

    /// Flatten into the wire form, replacing the authenticator with its
    /// registry key and constructor arguments.
    pub fn serialize(&self) -> SerializedConfiguration {
        SerializedConfiguration {
            host: self.host.clone(),
            code: self.code.clone(),
            scheme: self.scheme,
            timeout: self.timeout,
            auth_class: self.auth.as_ref().map(|auth| auth.auth_class().to_string()),
            auth_class_config: self.auth.as_ref().map(|auth| auth.export_init_args()),
        }
    }

    /// Rebuild from the wire form, resolving the authenticator by name.
    pub fn from_serialized(serialized: SerializedConfiguration, registry: &Registry) -> Result<Self, ClientError> {
        let auth = match serialized.auth_class {
            Some(auth_class) => {
                let build = registry
                    .auth(&auth_class)
                    .map_err(|e| ClientError::Configuration(e.to_string()))?;
                Some(build(serialized.auth_class_config.unwrap_or_default())?)
            }
            None => None,
        };
        Ok(Self {
            host: serialized.host,
            code: serialized.code,
            scheme: serialized.scheme,
            timeout: serialized.timeout,
            auth,
        })
    }
}

impl PartialEq for Configuration {
    fn eq(&self, other: &Self) -> bool {
        let same_auth = match (&self.auth, &other.auth) {
            (Some(a), Some(b)) => **a == **b,
            (None, None) => true,
            _ => false,
        };
        self.host == other.host
            && self.code == other.code
            && self.scheme == other.scheme
            && self.timeout == other.timeout
            && same_auth
    }
}

/// Flat wire form of a `Configuration`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedConfiguration {
    pub host: String,
    pub code: String,
    #[serde(default)]
    pub scheme: Scheme,
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_class: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_class_config: Option<InitArgs>,
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT
}
