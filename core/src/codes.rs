//! The closed set of external integrations a client may talk to.
//!
//! Every client is tagged with a `ClientCode`, which keys its enablement
//! policy and its log entries. New integrations add a variant here.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ClientError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClientCode {
    DummyIntegration,
}

impl ClientCode {
    pub const ALL: &'static [ClientCode] = &[ClientCode::DummyIntegration];

    pub fn as_str(&self) -> &'static str {
        match self {
            ClientCode::DummyIntegration => "DUMMY_INTEGRATION",
        }
    }
}

impl fmt::Display for ClientCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClientCode {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ClientCode::ALL
            .iter()
            .copied()
            .find(|code| code.as_str() == s)
            .ok_or_else(|| ClientError::Configuration(format!("invalid client code: {s}")))
    }
}

impl From<ClientCode> for String {
    fn from(code: ClientCode) -> Self {
        code.as_str().to_string()
    }
}
