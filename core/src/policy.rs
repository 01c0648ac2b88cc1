//! Per-client enable/disable flag and retry count.
//!
//! Dispatchers only read from the store. A code without a record behaves as
//! enabled with no retries.

use std::collections::HashMap;
use std::fmt;
use std::sync::RwLock;

use crate::codes::ClientCode;

/// Source of the enablement policy consulted before every dispatch.
pub trait EnablementRegistry: Send + Sync {
    fn is_disabled(&self, code: ClientCode) -> bool;

    fn total_retries(&self, code: ClientCode) -> u32;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientPolicy {
    pub client_code: ClientCode,
    pub enabled: bool,
    pub retries: u32,
}

impl ClientPolicy {
    pub fn new(client_code: ClientCode) -> Self {
        Self {
            client_code,
            enabled: true,
            retries: 0,
        }
    }
}

impl fmt::Display for ClientPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - (enabled: {}, retries: {})",
            self.client_code, self.enabled, self.retries
        )
    }
}

/// Policy records kept in memory.
#[derive(Debug, Default)]
pub struct InMemoryPolicies {
    records: RwLock<HashMap<ClientCode, ClientPolicy>>,
}

impl InMemoryPolicies {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current record for `code`, or the default one.
    pub fn policy(&self, code: ClientCode) -> ClientPolicy {
        self.records
            .read()
            .ok()
            .and_then(|records| records.get(&code).cloned())
            .unwrap_or_else(|| ClientPolicy::new(code))
    }

    pub fn set_enabled(&self, code: ClientCode, enabled: bool) {
        self.update(code, |policy| policy.enabled = enabled);
    }

    pub fn set_retries(&self, code: ClientCode, retries: u32) {
        self.update(code, |policy| policy.retries = retries);
    }

    fn update(&self, code: ClientCode, apply: impl FnOnce(&mut ClientPolicy)) {
        if let Ok(mut records) = self.records.write() {
            apply(records.entry(code).or_insert_with(|| ClientPolicy::new(code)));
        }
    }
}

impl EnablementRegistry for InMemoryPolicies {
    fn is_disabled(&self, code: ClientCode) -> bool {
        !self.policy(code).enabled
    }

    fn total_retries(&self, code: ClientCode) -> u32 {
        self.policy(code).retries
    }
}
