//! Request body encoding.
//!
//! Precedence: files (multipart, form fields included as parts), then form
//! data (urlencoded), then JSON. Returns the bytes with their content type.

use url::form_urlencoded;
use uuid::Uuid;

use crate::error::ClientError;
use crate::options::{RequestOptions, UploadFile};

pub struct EncodedBody {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

pub fn encode(options: &RequestOptions) -> Result<Option<EncodedBody>, ClientError> {
    if !options.files.is_empty() {
        let boundary = format!("----api-client-{}", Uuid::new_v4().simple());
        let fields = options.data.as_deref().unwrap_or_default();
        return Ok(Some(EncodedBody {
            content_type: format!("multipart/form-data; boundary={boundary}"),
            bytes: multipart(&boundary, fields, &options.files),
        }));
    }
    if let Some(data) = &options.data {
        let encoded = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(data.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .finish();
        return Ok(Some(EncodedBody {
            content_type: "application/x-www-form-urlencoded".to_string(),
            bytes: encoded.into_bytes(),
        }));
    }
    if let Some(json) = &options.json {
        let bytes = serde_json::to_vec(json).map_err(|e| ClientError::RequestBuild(e.to_string()))?;
        return Ok(Some(EncodedBody {
            content_type: "application/json".to_string(),
            bytes,
        }));
    }
    Ok(None)
}

fn multipart(boundary: &str, fields: &[(String, String)], files: &[UploadFile]) -> Vec<u8> {
    let mut out = Vec::new();
    for (name, value) in fields {
        out.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
        out.extend_from_slice(format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", quote(name)).as_bytes());
        out.extend_from_slice(value.as_bytes());
        out.extend_from_slice(b"\r\n");
    }
    for file in files {
        let content_type = file.content_type.as_deref().unwrap_or("application/octet-stream");
        out.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
        out.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {content_type}\r\n\r\n",
                quote(&file.field),
                quote(&file.filename)
            )
            .as_bytes(),
        );
        out.extend_from_slice(&file.content);
        out.extend_from_slice(b"\r\n");
    }
    out.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());
    out
}

fn quote(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn no_body() {
        assert!(encode(&RequestOptions::new()).unwrap().is_none());
    }

    #[test]
    fn json_body() {
        let body = encode(&RequestOptions::new().json(json!({"name": "x"}))).unwrap().unwrap();
        assert_eq!(body.content_type, "application/json");
        assert_eq!(body.bytes, br#"{"name":"x"}"#);
    }

    #[test]
    fn form_wins_over_json() {
        let options = RequestOptions::new().form("a", "1 2").json(json!({"ignored": true}));
        let body = encode(&options).unwrap().unwrap();
        assert_eq!(body.content_type, "application/x-www-form-urlencoded");
        assert_eq!(body.bytes, b"a=1+2");
    }

    #[test]
    fn multipart_carries_fields_and_files() {
        let options = RequestOptions::new()
            .form("title", "report")
            .file(UploadFile::new("doc", "a.txt", "hello").with_content_type("text/plain"));
        let body = encode(&options).unwrap().unwrap();
        let boundary = body
            .content_type
            .strip_prefix("multipart/form-data; boundary=")
            .unwrap()
            .to_string();
        let text = String::from_utf8(body.bytes).unwrap();
        assert!(text.starts_with(&format!("--{boundary}\r\n")));
        assert!(text.contains("name=\"title\"\r\n\r\nreport\r\n"));
        assert!(text.contains("name=\"doc\"; filename=\"a.txt\"\r\nContent-Type: text/plain\r\n\r\nhello\r\n"));
        assert!(text.ends_with(&format!("--{boundary}--\r\n")));
    }
}
