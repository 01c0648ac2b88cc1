//! Per-request arguments shared by the blocking and non-blocking verbs.
//!
//! `RequestOptions` is serializable (minus file uploads) because the
//! non-blocking dispatcher ships it to a worker inside the task payload.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A value substituted into an endpoint template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathParam {
    Int(i64),
    Text(String),
}

impl fmt::Display for PathParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathParam::Int(value) => write!(f, "{value}"),
            PathParam::Text(value) => f.write_str(value),
        }
    }
}

impl From<&str> for PathParam {
    fn from(value: &str) -> Self {
        PathParam::Text(value.to_string())
    }
}

impl From<String> for PathParam {
    fn from(value: String) -> Self {
        PathParam::Text(value)
    }
}

macro_rules! int_path_param {
    ($($ty:ty),*) => {
        $(impl From<$ty> for PathParam {
            fn from(value: $ty) -> Self {
                PathParam::Int(i64::from(value))
            }
        })*
    };
}

int_path_param!(i8, i16, i32, i64, u8, u16, u32);

impl From<u64> for PathParam {
    fn from(value: u64) -> Self {
        match i64::try_from(value) {
            Ok(value) => PathParam::Int(value),
            Err(_) => PathParam::Text(value.to_string()),
        }
    }
}

/// A file sent as one part of a multipart body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub field: String,
    pub filename: String,
    pub content_type: Option<String>,
    pub content: Vec<u8>,
}

impl UploadFile {
    pub fn new(field: impl Into<String>, filename: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            field: field.into(),
            filename: filename.into(),
            content_type: None,
            content: content.into(),
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

/// Path parameters, query string, headers and body of one request.
///
/// `None`-valued path parameters are kept so the template substitution can
/// drop them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestOptions {
    #[serde(default)]
    pub path_params: BTreeMap<String, Option<PathParam>>,
    #[serde(default)]
    pub query_params: Vec<(String, String)>,
    #[serde(default)]
    pub headers: Vec<(String, String)>,
    /// Form fields, urlencoded unless files are attached.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<(String, String)>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub json: Option<Value>,
    #[serde(skip)]
    pub files: Vec<UploadFile>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn path_param(mut self, name: &str, value: impl Into<PathParam>) -> Self {
        self.path_params.insert(name.to_string(), Some(value.into()));
        self
    }

    pub fn path_param_opt<V: Into<PathParam>>(mut self, name: &str, value: Option<V>) -> Self {
        self.path_params.insert(name.to_string(), value.map(Into::into));
        self
    }

    pub fn query(mut self, name: &str, value: impl ToString) -> Self {
        self.query_params.push((name.to_string(), value.to_string()));
        self
    }

    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((name.to_string(), value.into()));
        self
    }

    pub fn form(mut self, name: &str, value: impl Into<String>) -> Self {
        self.data
            .get_or_insert_with(Vec::new)
            .push((name.to_string(), value.into()));
        self
    }

    pub fn json(mut self, value: Value) -> Self {
        self.json = Some(value);
        self
    }

    pub fn file(mut self, file: UploadFile) -> Self {
        self.files.push(file);
        self
    }
}
