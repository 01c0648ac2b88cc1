//! Typed client for the dummy integration served by `mock-server`.
//!
//! # Design
//! `DummyService` is what a concrete integration looks like on top of the
//! generic layer: a `Configuration` for its client code, a `JsonApiClient`,
//! and one method per remote operation that checks the expected status and
//! decodes the payload. The token-protected variant uses `SimpleTokenAuth`,
//! an authenticator defined here and registered through
//! `DummyService::register`.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::auth::{deserialize_args, AuthFromArgs, InitArgs, SerializableAuth};
use crate::codes::ClientCode;
use crate::config::{Configuration, Scheme};
use crate::context::ClientContext;
use crate::error::ClientError;
use crate::http::HttpRequest;
use crate::json::{JsonApiClient, JsonResponse};
use crate::options::RequestOptions;
use crate::registry::Registry;

/// Sends `Authorization: DummyToken {token}`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimpleTokenAuth {
    pub token: String,
}

impl SimpleTokenAuth {
    pub fn new(token: impl Into<String>) -> Self {
        Self { token: token.into() }
    }
}

impl fmt::Debug for SimpleTokenAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimpleTokenAuth").field("token", &"<redacted>").finish()
    }
}

impl SerializableAuth for SimpleTokenAuth {
    fn auth_class(&self) -> &'static str {
        Self::AUTH_CLASS
    }

    fn apply(&self, request: &mut HttpRequest) {
        request.set_header("Authorization", format!("DummyToken {}", self.token));
    }

    fn export_init_args(&self) -> InitArgs {
        let mut args = InitArgs::new();
        args.insert("token".to_string(), self.token.clone().into());
        args
    }
}

impl AuthFromArgs for SimpleTokenAuth {
    const AUTH_CLASS: &'static str = "api_client::dummy::SimpleTokenAuth";

    fn from_serialized_args(args: InitArgs) -> Result<Self, ClientError> {
        deserialize_args(args)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dummy {
    pub pk: i64,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateDummy {
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateDummy {
    pub name: String,
}

#[derive(Debug, Error)]
pub enum DummyError {
    #[error("dummy not found")]
    NotFound,

    #[error("unexpected status {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    #[error(transparent)]
    Client(#[from] ClientError),
}

pub struct DummyService {
    client: JsonApiClient,
    collection: &'static str,
}

impl DummyService {
    /// Configuration of the dummy integration at `host`, e.g.
    /// `localhost:3000/api/v1`.
    pub fn configuration(host: &str) -> Configuration {
        Configuration::new(host, ClientCode::DummyIntegration).with_scheme(Scheme::Http)
    }

    /// Add the dummy authenticator to `registry`.
    pub fn register(registry: &mut Registry) -> &mut Registry {
        registry.register_auth::<SimpleTokenAuth>()
    }

    /// Service for the public `/dummy/` routes.
    pub fn new(host: &str, context: &ClientContext) -> Result<Self, DummyError> {
        Ok(Self {
            client: JsonApiClient::new(Self::configuration(host), context)?,
            collection: "dummy/",
        })
    }

    /// Service for the token-protected `/auth/dummy/` routes.
    pub fn authenticated(host: &str, token: &str, context: &ClientContext) -> Result<Self, DummyError> {
        let configuration = Self::configuration(host).with_auth(SimpleTokenAuth::new(token));
        Ok(Self {
            client: JsonApiClient::new(configuration, context)?,
            collection: "auth/dummy/",
        })
    }

    pub fn client(&self) -> &JsonApiClient {
        &self.client
    }

    pub fn list(&self) -> Result<Vec<Dummy>, DummyError> {
        let response = self.client.get_blocking(self.collection, &RequestOptions::new())?;
        check_status(&response, 200)?;
        Ok(response.parse()?)
    }

    pub fn get(&self, pk: i64) -> Result<Dummy, DummyError> {
        let response = self.client.get_blocking(&self.item(), &by_pk(pk))?;
        check_status(&response, 200)?;
        Ok(response.parse()?)
    }

    pub fn create(&self, input: &CreateDummy) -> Result<Dummy, DummyError> {
        let options = RequestOptions::new().json(serde_json::to_value(input).map_err(ClientError::from)?);
        let response = self.client.post_blocking(self.collection, &options)?;
        check_status(&response, 201)?;
        Ok(response.parse()?)
    }

    pub fn update(&self, pk: i64, input: &UpdateDummy) -> Result<Dummy, DummyError> {
        let options = by_pk(pk).json(serde_json::to_value(input).map_err(ClientError::from)?);
        let response = self.client.put_blocking(&self.item(), &options)?;
        check_status(&response, 200)?;
        Ok(response.parse()?)
    }

    pub fn delete(&self, pk: i64) -> Result<(), DummyError> {
        let response = self.client.delete_blocking(&self.item(), &by_pk(pk))?;
        check_status(&response, 204)
    }

    fn item(&self) -> String {
        format!("{}{{pk}}/", self.collection)
    }
}

fn by_pk(pk: i64) -> RequestOptions {
    RequestOptions::new().path_param("pk", pk)
}

/// Map an unexpected status to the matching `DummyError`.
fn check_status(response: &JsonResponse, expected: u16) -> Result<(), DummyError> {
    if response.status == expected {
        return Ok(());
    }
    if response.status == 404 {
        return Err(DummyError::NotFound);
    }
    Err(DummyError::UnexpectedStatus {
        status: response.status,
        body: response.payload.as_ref().map(|p| p.to_string()).unwrap_or_default(),
    })
}
