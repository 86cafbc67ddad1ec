//! Response rendering.
//!
//! Turns a selected body value and the declared header specs into the status,
//! header list and body bytes written to the client.

use super::negotiate::is_json;
use super::select::ExampleSelector;
use super::types::ValueSpec;
use bytes::Bytes;
use serde_json::Value;

/// A fully rendered mock response, independent of the HTTP library.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

impl RenderedResponse {
    /// An empty response with only a status.
    pub fn empty(status: u16) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: Bytes::new(),
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Render a response.
///
/// Headers are resolved one by one through `selector`; absent ones are left
/// out. A present body gets `Content-Type: <media_type>` unless a declared
/// header already set it. An absent body is empty and sets no content type.
pub fn render(
    status: u16,
    media_type: Option<&str>,
    body: Option<&Value>,
    headers: &[(String, ValueSpec)],
    selector: &ExampleSelector<'_>,
) -> RenderedResponse {
    let mut rendered_headers: Vec<(String, String)> = headers
        .iter()
        .filter_map(|(name, spec)| {
            selector
                .select(spec)
                .map(|value| (name.clone(), header_value(&value)))
        })
        .collect();

    let body = match body {
        Some(value) => {
            if let Some(media_type) = media_type {
                let declared = rendered_headers
                    .iter()
                    .any(|(k, _)| k.eq_ignore_ascii_case("content-type"));
                if !declared {
                    rendered_headers.push(("Content-Type".to_string(), media_type.to_string()));
                }
            }
            encode_body(media_type, value)
        }
        None => Bytes::new(),
    };

    RenderedResponse {
        status,
        headers: rendered_headers,
        body,
    }
}

/// Wire encoding of a body value.
///
/// Strings are written verbatim (text bodies, or JSON/XML documents given as
/// text), except that a string which is not JSON text is quoted for a JSON
/// media type. Every other value uses its JSON literal form, so `true` stays
/// `true` and objects become JSON objects.
///
/// A string that parses as JSON passes through unquoted under a JSON media
/// type, so a `type: string` example of `"42"` is sent as the number `42`.
pub fn encode_body(media_type: Option<&str>, value: &Value) -> Bytes {
    match value {
        Value::String(text) => {
            let quote = media_type.is_some_and(is_json)
                && serde_json::from_str::<Value>(text).is_err();
            if quote {
                Bytes::from(value.to_string())
            } else {
                Bytes::from(text.clone())
            }
        }
        other => Bytes::from(other.to_string()),
    }
}

/// Header text for a selected value.
pub fn header_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
