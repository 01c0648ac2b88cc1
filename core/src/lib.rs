//! Client layer for external HTTP service integrations.
//!
//! # Overview
//! Each integration is described by an immutable `Configuration` (host,
//! client code, scheme, timeout, optional authenticator). A client built
//! from it dispatches requests either on the caller's thread
//! (`*_blocking` verbs, returning `Result<HttpResponse, ClientError>`) or
//! through a task queue (plain verbs, returning once the call is enqueued).
//! Every dispatch consults a per-client enablement/retry policy and leaves a
//! `ClientLog` entry behind.
//!
//! # Design
//! - Storage, policies, the queue and the network sit behind traits
//!   (`LogStore`, `EnablementRegistry`, `TaskQueue`, `Transport`) bundled in
//!   a `ClientContext`. In-memory and ureq-backed defaults ship here.
//! - Anything that crosses the worker boundary is named: client kinds,
//!   authenticators and handlers are looked up in a `Registry`.
//! - `ApiClient` composes a `BlockingClient` and a `NonBlockingClient`;
//!   `JsonApiClient` adds JSON decoding on top.
//! - `DummyService` is a worked integration against `mock-server`.

pub mod auth;
pub mod blocking;
mod body;
pub mod client;
pub mod codes;
pub mod config;
pub mod context;
pub mod dummy;
pub mod endpoint;
pub mod error;
pub mod http;
pub mod json;
pub mod log;
pub mod non_blocking;
pub mod options;
pub mod policy;
pub mod queue;
pub mod registry;
pub mod settings;
pub mod tasks;
pub mod transport;

pub use auth::{AuthFromArgs, BasicAuth, BearerAuth, InitArgs, SerializableAuth};
pub use blocking::{BlockingClient, BlockingDispatch};
pub use client::ApiClient;
pub use codes::ClientCode;
pub use config::{Configuration, Scheme, SerializedConfiguration};
pub use context::ClientContext;
pub use error::{error_report, CallbackRole, ClientError};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use json::{parse_json, JsonApiClient, JsonResponse};
pub use log::{ClientLog, InMemoryLogStore, LogStore};
pub use non_blocking::NonBlockingClient;
pub use options::{PathParam, RequestOptions, UploadFile};
pub use policy::{ClientPolicy, EnablementRegistry, InMemoryPolicies};
pub use queue::{InMemoryQueue, QueuedTask, TaskQueue, ThreadedQueue};
pub use registry::{Registry, DEFAULT_SUCCESS_HANDLER};
pub use settings::Settings;
pub use tasks::{cleanup_old_logs, RequestTask, TaskOutcome, Worker};
pub use transport::{SendOptions, Transport, UreqTransport};
