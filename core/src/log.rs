//! Persisted record of every dispatch attempt.
//!
//! # Design
//! A `ClientLog` is created empty before the request is built, then updated
//! twice: once from the outgoing request and once from either the response
//! or the error. Each update is saved, so a crash mid-request still leaves a
//! row behind. The dispatcher never deletes entries; `cleanup_old_logs` in
//! the tasks module purges them by age.

use std::collections::HashMap;
use std::fmt;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

use crate::codes::ClientCode;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientLog {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub client_code: Option<ClientCode>,
    pub method: Option<HttpMethod>,
    pub url: String,
    /// Path component of `url`.
    pub endpoint: String,
    /// `scheme://hostname` of `url`.
    pub client_url: String,
    pub request_time: Option<DateTime<Utc>>,
    pub request_headers: Vec<(String, String)>,
    pub request_content: String,
    pub response_time: Option<DateTime<Utc>>,
    pub response_headers: Vec<(String, String)>,
    pub response_content: String,
    pub response_status_code: Option<u16>,
    pub error: String,
}

impl ClientLog {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            updated_at: None,
            client_code: None,
            method: None,
            url: String::new(),
            endpoint: String::new(),
            client_url: String::new(),
            request_time: None,
            request_headers: Vec::new(),
            request_content: String::new(),
            response_time: None,
            response_headers: Vec::new(),
            response_content: String::new(),
            response_status_code: None,
            error: String::new(),
        }
    }

    pub fn update_from_request(&mut self, request: &HttpRequest, client_code: ClientCode) {
        self.method = Some(request.method);
        self.url = request.url.clone();
        if let Ok(parsed) = Url::parse(&request.url) {
            self.endpoint = parsed.path().to_string();
            self.client_url = format!("{}://{}", parsed.scheme(), parsed.host_str().unwrap_or_default());
        }
        self.client_code = Some(client_code);
        self.request_time = Some(Utc::now());
        self.request_headers = request.headers.clone();
        self.request_content = request.body_text();
    }

    pub fn update_from_response(&mut self, response: &HttpResponse) {
        self.response_time = Some(Utc::now());
        self.response_headers = response.headers.clone();
        self.response_content = response.text();
        self.response_status_code = Some(response.status);
    }

    pub fn record_error(&mut self, report: String) {
        self.error = report;
    }

    pub fn has_error(&self) -> bool {
        !self.error.is_empty()
    }
}

impl Default for ClientLog {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ClientLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = self.client_code.map(|code| code.as_str()).unwrap_or_default();
        let method = self.method.map(|method| method.as_str()).unwrap_or_default();
        write!(f, "{code}: {method} {}", self.url)
    }
}

/// Storage for `ClientLog` rows.
pub trait LogStore: Send + Sync {
    /// Create and persist an empty entry.
    fn create(&self) -> ClientLog;

    /// Persist the current state of `log`, stamping `updated_at`.
    fn save(&self, log: &mut ClientLog);

    /// All entries, oldest first.
    fn list(&self) -> Vec<ClientLog>;

    /// Delete entries created before `cutoff`, returning how many went.
    fn delete_created_before(&self, cutoff: DateTime<Utc>) -> usize;
}

#[derive(Debug, Default)]
pub struct InMemoryLogStore {
    rows: RwLock<HashMap<Uuid, ClientLog>>,
}

impl InMemoryLogStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.read().map(|rows| rows.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Insert a row as-is, keeping its timestamps.
    pub fn insert(&self, log: ClientLog) {
        if let Ok(mut rows) = self.rows.write() {
            rows.insert(log.id, log);
        }
    }
}

impl LogStore for InMemoryLogStore {
    fn create(&self) -> ClientLog {
        let log = ClientLog::new();
        self.insert(log.clone());
        log
    }

    fn save(&self, log: &mut ClientLog) {
        log.updated_at = Some(Utc::now());
        self.insert(log.clone());
    }

    fn list(&self) -> Vec<ClientLog> {
        let mut logs: Vec<ClientLog> = self
            .rows
            .read()
            .map(|rows| rows.values().cloned().collect())
            .unwrap_or_default();
        logs.sort_by_key(|log| log.created_at);
        logs
    }

    fn delete_created_before(&self, cutoff: DateTime<Utc>) -> usize {
        let Ok(mut rows) = self.rows.write() else {
            return 0;
        };
        let before = rows.len();
        rows.retain(|_, log| log.created_at >= cutoff);
        before - rows.len()
    }
}
