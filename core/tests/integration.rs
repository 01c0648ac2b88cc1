//! End-to-end tests against the live mock server.
//!
//! # Design
//! Each test starts its own mock server on a random port in a background
//! tokio runtime, so the seeded data is fresh per test. The clients under
//! test use the real ureq transport.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use api_client::dummy::{CreateDummy, DummyError, DummyService, UpdateDummy};
use api_client::{
    ApiClient, BearerAuth, CallbackRole, ClientCode, ClientContext, ClientError, Configuration, HttpResponse, InMemoryLogStore,
    InMemoryPolicies, InMemoryQueue, JsonApiClient, LogStore, Registry, RequestOptions, Scheme, TaskOutcome,
    ThreadedQueue, UploadFile, Worker, DEFAULT_SUCCESS_HANDLER,
};
use serde_json::{json, Value};

fn start_server() -> SocketAddr {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener).await
        })
        .unwrap();
    });
    addr
}

fn host(addr: SocketAddr) -> String {
    format!("{addr}/api/v1")
}

fn closed_port_host() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    host(addr)
}

struct Harness {
    policies: Arc<InMemoryPolicies>,
    logs: Arc<InMemoryLogStore>,
    queue: Arc<InMemoryQueue>,
    context: ClientContext,
}

fn harness(registry: Registry) -> Harness {
    let policies = Arc::new(InMemoryPolicies::new());
    let logs = Arc::new(InMemoryLogStore::new());
    let queue = Arc::new(InMemoryQueue::new());
    let context = ClientContext::new(policies.clone(), logs.clone(), queue.clone(), Arc::new(registry));
    Harness {
        policies,
        logs,
        queue,
        context,
    }
}

fn default_harness() -> Harness {
    let mut registry = Registry::with_defaults();
    DummyService::register(&mut registry);
    harness(registry)
}

fn configuration(addr: SocketAddr) -> Configuration {
    Configuration::new(host(addr), ClientCode::DummyIntegration).with_scheme(Scheme::Http)
}

// --- blocking dispatch ---

#[test]
fn dummy_crud_lifecycle() {
    let addr = start_server();
    let h = default_harness();
    let service = DummyService::new(&host(addr), &h.context).unwrap();

    let dummies = service.list().unwrap();
    assert_eq!(dummies.len(), 2);
    assert_eq!(service.get(1).unwrap().name, "Dummy 1");

    let created = service.create(&CreateDummy { name: "Third".to_string() }).unwrap();
    assert_eq!(created.pk, 3);

    let updated = service
        .update(created.pk, &UpdateDummy { name: "Renamed".to_string() })
        .unwrap();
    assert_eq!(updated.name, "Renamed");

    service.delete(created.pk).unwrap();
    assert!(matches!(service.get(created.pk), Err(DummyError::NotFound)));
    assert!(matches!(service.delete(created.pk), Err(DummyError::NotFound)));

    let logs = h.logs.list();
    assert_eq!(logs.len(), 7);
    assert!(logs.iter().all(|log| !log.has_error()));
    assert!(logs.iter().all(|log| log.client_code == Some(ClientCode::DummyIntegration)));
}

#[test]
fn authenticated_service_sends_its_token() {
    let addr = start_server();
    let h = default_harness();

    let service = DummyService::authenticated(&host(addr), mock_server::DUMMY_TOKEN, &h.context).unwrap();
    assert_eq!(service.get(2).unwrap().name, "Dummy 2");

    let intruder = DummyService::authenticated(&host(addr), "wrong", &h.context).unwrap();
    assert!(matches!(
        intruder.list(),
        Err(DummyError::UnexpectedStatus { status: 401, .. })
    ));
}

#[test]
fn post_creates_and_logs_once() {
    let addr = start_server();
    let h = default_harness();
    let client = ApiClient::new(configuration(addr), &h.context).unwrap();

    let response = client
        .post_blocking("/dummy/", &RequestOptions::new().json(json!({"name": "x"})))
        .unwrap();
    assert_eq!(response.status, 201);
    let body: Value = serde_json::from_slice(&response.body).unwrap();
    assert_eq!(body["name"], "x");
    assert!(body["pk"].is_i64());

    let logs = h.logs.list();
    assert_eq!(logs.len(), 1);
    let log = &logs[0];
    assert_eq!(log.url, format!("http://{addr}/api/v1/dummy/"));
    assert_eq!(log.endpoint, "/api/v1/dummy/");
    assert_eq!(log.client_url, "http://127.0.0.1");
    assert_eq!(log.request_content, r#"{"name":"x"}"#);
    assert_eq!(log.response_status_code, Some(201));
    assert!(log.response_time.is_some());
    assert!(log.response_content.contains("\"x\""));
    assert!(!log.has_error());
}

#[test]
fn disabled_client_is_refused_without_log() {
    let addr = start_server();
    let h = default_harness();
    h.policies.set_enabled(ClientCode::DummyIntegration, false);
    let client = ApiClient::new(configuration(addr), &h.context).unwrap();

    let err = client
        .get_blocking("/dummy/{pk}/", &RequestOptions::new().path_param("pk", 5))
        .unwrap_err();
    assert!(matches!(err, ClientError::Disabled { code: ClientCode::DummyIntegration }));
    assert!(h.logs.is_empty());
}

#[test]
fn connection_failure_is_returned_and_logged() {
    let h = default_harness();
    h.policies.set_retries(ClientCode::DummyIntegration, 1);
    let configuration = Configuration::new(closed_port_host(), ClientCode::DummyIntegration)
        .with_scheme(Scheme::Http)
        .with_timeout(2);
    let client = ApiClient::new(configuration, &h.context).unwrap();

    let err = client.get_blocking("/dummy/", &RequestOptions::new()).unwrap_err();
    assert!(err.is_transport());

    let logs = h.logs.list();
    assert_eq!(logs.len(), 1);
    assert!(logs[0].has_error());
    assert!(logs[0].request_time.is_some());
    assert_eq!(logs[0].response_status_code, None);
    assert!(logs[0].response_headers.is_empty());
}

#[test]
fn query_headers_and_auth_reach_the_server() {
    let addr = start_server();
    let h = default_harness();
    let client = JsonApiClient::new(configuration(addr).with_auth(BearerAuth::new("abc")), &h.context).unwrap();

    let options = RequestOptions::new()
        .query("search", "a b")
        .query("page", 2)
        .header("X-Trace", "t-1");
    let echo = client.get_blocking("echo/", &options).unwrap().payload.unwrap();
    assert_eq!(echo["method"], "GET");
    assert_eq!(echo["path"], "/api/v1/echo/");
    assert_eq!(echo["query"], "search=a+b&page=2");
    assert_eq!(echo["headers"]["authorization"], "Bearer abc");
    assert_eq!(echo["headers"]["accept"], "application/json");
    assert_eq!(echo["headers"]["x-trace"], "t-1");
}

#[test]
fn form_and_multipart_bodies() {
    let addr = start_server();
    let h = default_harness();
    let client = JsonApiClient::new(configuration(addr), &h.context).unwrap();

    let form = client
        .post_blocking("echo/", &RequestOptions::new().form("a", "1").form("b", "x y"))
        .unwrap()
        .payload
        .unwrap();
    assert_eq!(form["headers"]["content-type"], "application/x-www-form-urlencoded");
    assert_eq!(form["body"], "a=1&b=x+y");

    let upload = RequestOptions::new()
        .form("title", "report")
        .file(UploadFile::new("doc", "notes.txt", "hello").with_content_type("text/plain"));
    let multipart = client.post_blocking("echo/", &upload).unwrap().payload.unwrap();
    let content_type = multipart["headers"]["content-type"].as_str().unwrap();
    assert!(content_type.starts_with("multipart/form-data; boundary="));
    let body = multipart["body"].as_str().unwrap();
    assert!(body.contains("filename=\"notes.txt\""));
    assert!(body.contains("hello"));
    assert!(body.contains("report"));
}

#[test]
fn json_client_handles_empty_and_non_json_bodies() {
    let addr = start_server();
    let h = default_harness();
    let client = JsonApiClient::new(configuration(addr), &h.context).unwrap();

    let empty = client.delete_blocking("empty/", &RequestOptions::new()).unwrap();
    assert_eq!(empty.status, 204);
    assert!(empty.payload.is_none());

    let err = client.get_blocking("text/", &RequestOptions::new()).unwrap_err();
    assert!(matches!(err, ClientError::JsonDecode(_)));

    let logs = h.logs.list();
    assert_eq!(logs.len(), 2);
    let text_log = logs.iter().find(|log| log.endpoint == "/api/v1/text/").unwrap();
    assert_eq!(text_log.response_status_code, Some(200));
    assert_eq!(text_log.response_content, "this is not json");
}

#[test]
fn binary_body_is_kept_as_bytes() {
    let addr = start_server();
    let h = default_harness();
    h.policies.set_retries(ClientCode::DummyIntegration, 2);
    let client = ApiClient::new(configuration(addr), &h.context).unwrap();

    let response = client.get_blocking("binary/", &RequestOptions::new()).unwrap();
    assert_eq!(response.status, 200);
    assert_eq!(response.body, mock_server::BINARY_BODY);
    assert_eq!(response.header("content-type"), Some("application/octet-stream"));

    let logs = h.logs.list();
    assert_eq!(logs.len(), 1);
    assert!(!logs[0].has_error());
    assert_eq!(logs[0].response_status_code, Some(200));
    assert_eq!(logs[0].response_content, String::from_utf8_lossy(&mock_server::BINARY_BODY));
}

// --- non-blocking dispatch ---

static DRAINED_STATUSES: Mutex<Vec<u16>> = Mutex::new(Vec::new());

fn record_drained(response: &HttpResponse) {
    DRAINED_STATUSES.lock().unwrap().push(response.status);
}

static DRAIN_ERRORS: Mutex<Vec<String>> = Mutex::new(Vec::new());

fn record_drain_error(error: &ClientError) {
    DRAIN_ERRORS.lock().unwrap().push(error.to_string());
}

#[test]
fn queued_requests_run_on_the_worker() {
    let addr = start_server();
    let mut registry = Registry::with_defaults();
    registry
        .register_success_handler("it::record_drained", record_drained)
        .register_error_handler("it::record_drain_error", record_drain_error);
    let h = harness(registry);
    let client = JsonApiClient::new(configuration(addr), &h.context).unwrap();

    client
        .post(
            "/dummy/",
            &RequestOptions::new().json(json!({"name": "queued"})),
            "it::record_drained",
            "it::record_drain_error",
        )
        .unwrap();
    client
        .get("empty/", &RequestOptions::new(), "it::record_drained", "it::record_drain_error")
        .unwrap();
    assert_eq!(h.queue.len(), 2);
    assert!(h.logs.is_empty());

    let worker = Worker::new(h.context.clone());
    let outcomes = worker.drain(&h.queue);
    assert!(outcomes
        .iter()
        .all(|outcome| matches!(outcome, Ok(TaskOutcome::SuccessHandled))));
    assert_eq!(*DRAINED_STATUSES.lock().unwrap(), vec![201, 204]);
    assert!(DRAIN_ERRORS.lock().unwrap().is_empty());

    let logs = h.logs.list();
    assert_eq!(logs.len(), 2);
    assert!(logs
        .iter()
        .all(|log| log.request_headers.iter().any(|(name, value)| name == "Accept" && value == "application/json")));
}

static THREADED_ERRORS: Mutex<Vec<String>> = Mutex::new(Vec::new());

fn record_threaded_error(error: &ClientError) {
    THREADED_ERRORS.lock().unwrap().push(error.to_string());
}

#[test]
fn threaded_queue_routes_failures_to_the_error_handler() {
    let mut registry = Registry::with_defaults();
    registry.register_error_handler("it::record_threaded_error", record_threaded_error);
    let h = harness(registry);

    let queue = Arc::new(ThreadedQueue::spawn(Worker::new(h.context.clone())).unwrap());
    let context = h.context.clone().with_queue(queue.clone());
    let configuration = Configuration::new(closed_port_host(), ClientCode::DummyIntegration)
        .with_scheme(Scheme::Http)
        .with_timeout(2);
    let client = ApiClient::new(configuration, &context).unwrap();

    client
        .get(
            "/dummy/",
            &RequestOptions::new(),
            DEFAULT_SUCCESS_HANDLER,
            "it::record_threaded_error",
        )
        .unwrap();
    assert_eq!(queue.shutdown(), 1);

    let errors = THREADED_ERRORS.lock().unwrap();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].starts_with("transport error"));
    assert_eq!(h.logs.len(), 1);
}

fn ignore_error(_error: &ClientError) {}

#[test]
fn worker_rebuilds_authenticated_clients() {
    let addr = start_server();
    let registry = || {
        let mut registry = Registry::with_defaults();
        DummyService::register(&mut registry);
        registry.register_error_handler("it::ignore_error", ignore_error);
        registry
    };
    let producer = harness(registry());
    let consumer = harness(registry());
    let service = DummyService::authenticated(&host(addr), mock_server::DUMMY_TOKEN, &producer.context).unwrap();
    let create = RequestOptions::new().json(json!({"name": "from worker"}));

    let anonymous = service
        .client()
        .post("auth/dummy/", &create, DEFAULT_SUCCESS_HANDLER, "")
        .unwrap_err();
    assert!(matches!(anonymous, ClientError::InvalidCallback { role: CallbackRole::Error, .. }));
    let wrong_role = service
        .client()
        .post("auth/dummy/", &create, DEFAULT_SUCCESS_HANDLER, DEFAULT_SUCCESS_HANDLER)
        .unwrap_err();
    assert!(matches!(wrong_role, ClientError::InvalidCallback { role: CallbackRole::Error, .. }));
    assert!(producer.queue.is_empty());

    service
        .client()
        .post("auth/dummy/", &create, DEFAULT_SUCCESS_HANDLER, "it::ignore_error")
        .unwrap();
    let worker = Worker::new(consumer.context.clone());
    let outcomes = worker.drain(&producer.queue);
    assert!(matches!(outcomes[..], [Ok(TaskOutcome::SuccessHandled)]));
    assert_eq!(consumer.logs.list()[0].response_status_code, Some(201));
    assert!(producer.logs.is_empty());

    let names: Vec<String> = service.list().unwrap().into_iter().map(|d| d.name).collect();
    assert_eq!(names.last().map(String::as_str), Some("from worker"));
}
