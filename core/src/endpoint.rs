//! Endpoint template resolution and URL joining.
//!
//! Endpoints are relative templates such as `dummy/{pk}/`. Resolution strips
//! leading slashes, substitutes `{name}` placeholders with form-escaped
//! values and joins the result to the client's base URL with exactly one
//! slash. A trailing slash on the template survives.

use std::collections::BTreeMap;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use url::form_urlencoded;

use crate::error::ClientError;
use crate::options::PathParam;

/// Join a resolved endpoint to a base URL that has no trailing slash.
pub fn join(base_url: &str, endpoint: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), endpoint.trim_start_matches('/'))
}

/// Resolve `endpoint` against `path_params`.
///
/// Parameters whose value is `None` are dropped. When no parameter is left
/// the template is returned verbatim (minus leading slashes), braces and all.
pub fn resolve(endpoint: &str, path_params: &BTreeMap<String, Option<PathParam>>) -> Result<String, ClientError> {
    let endpoint = endpoint.trim_start_matches('/');
    let params: BTreeMap<&str, String> = path_params
        .iter()
        .filter_map(|(name, value)| {
            value
                .as_ref()
                .map(|value| (name.as_str(), encode_path_param(&value.to_string())))
        })
        .collect();
    if params.is_empty() {
        return Ok(endpoint.to_string());
    }
    substitute(endpoint, &params)
}

/// Everything except the RFC 3986 unreserved characters.
const PATH_PARAM: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'.').remove(b'_').remove(b'~');

/// Form-escape one path segment value: space becomes `+`, everything outside
/// the unreserved set is percent-encoded.
pub fn encode_path_param(value: &str) -> String {
    utf8_percent_encode(value, PATH_PARAM).to_string().replace("%20", "+")
}

/// Append `query` to `url` as an urlencoded query string.
pub fn with_query(url: String, query: &[(String, String)]) -> String {
    if query.is_empty() {
        return url;
    }
    let encoded = form_urlencoded::Serializer::new(String::new())
        .extend_pairs(query.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .finish();
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{url}{separator}{encoded}")
}

fn substitute(template: &str, params: &BTreeMap<&str, String>) -> Result<String, ClientError> {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                out.push('{');
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                out.push('}');
            }
            '{' => {
                let mut name = String::new();
                loop {
                    match chars.next() {
                        Some('}') => break,
                        Some(ch) => name.push(ch),
                        None => {
                            return Err(ClientError::RequestBuild(format!(
                                "unterminated placeholder in endpoint `{template}`"
                            )))
                        }
                    }
                }
                let value = params.get(name.as_str()).ok_or_else(|| {
                    ClientError::RequestBuild(format!("missing path parameter `{name}` for endpoint `{template}`"))
                })?;
                out.push_str(value);
            }
            '}' => {
                return Err(ClientError::RequestBuild(format!(
                    "single '}}' encountered in endpoint `{template}`"
                )))
            }
            other => out.push(other),
        }
    }
    Ok(out)
}
