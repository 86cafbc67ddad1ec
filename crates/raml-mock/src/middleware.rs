//! CORS and response compression.

use crate::mock::{Method, RenderedResponse};
use bytes::Bytes;
use flate2::write::GzEncoder;
use flate2::Compression;
use http_body_util::Full;
use hyper::header::{self, HeaderMap, HeaderValue};
use hyper::{Response, StatusCode};
use std::io::Write;
use tracing::warn;

/// Bodies smaller than this are sent uncompressed.
pub const MIN_COMPRESS_SIZE: usize = 1024;

/// Headers allowed on preflight when the request does not list any.
const DEFAULT_ALLOW_HEADERS: &str = "Accept, Authorization, Content-Type";

/// Preflight cache lifetime in seconds.
const MAX_AGE_SECS: &str = "86400";

// ============================================================================
// CORS
// ============================================================================

/// Whether a request is a CORS preflight.
pub fn is_preflight(method: &hyper::Method, headers: &HeaderMap) -> bool {
    method == hyper::Method::OPTIONS && headers.contains_key(header::ACCESS_CONTROL_REQUEST_METHOD)
}

/// 204 answer to a preflight request, CORS headers included.
pub fn preflight_response(request_headers: &HeaderMap) -> Response<Full<Bytes>> {
    let allow_methods = Method::ALL
        .iter()
        .map(Method::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    let allow_headers = request_headers
        .get(header::ACCESS_CONTROL_REQUEST_HEADERS)
        .cloned()
        .unwrap_or_else(|| HeaderValue::from_static(DEFAULT_ALLOW_HEADERS));

    let mut response = Response::new(Full::new(Bytes::new()));
    *response.status_mut() = StatusCode::NO_CONTENT;
    let headers = response.headers_mut();
    if let Ok(value) = HeaderValue::from_str(&allow_methods) {
        headers.insert(header::ACCESS_CONTROL_ALLOW_METHODS, value);
    }
    headers.insert(header::ACCESS_CONTROL_ALLOW_HEADERS, allow_headers);
    headers.insert(
        header::ACCESS_CONTROL_MAX_AGE,
        HeaderValue::from_static(MAX_AGE_SECS),
    );

    apply_cors(&mut response, request_headers);
    response
}

/// Add CORS headers to any response.
///
/// The request `Origin` is echoed back (with credentials allowed) when
/// present, otherwise every origin is allowed.
pub fn apply_cors(response: &mut Response<Full<Bytes>>, request_headers: &HeaderMap) {
    let headers = response.headers_mut();
    match request_headers.get(header::ORIGIN) {
        Some(origin) => {
            headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin.clone());
            headers.insert(
                header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
                HeaderValue::from_static("true"),
            );
            headers.append(header::VARY, HeaderValue::from_static("Origin"));
        }
        None => {
            headers.insert(
                header::ACCESS_CONTROL_ALLOW_ORIGIN,
                HeaderValue::from_static("*"),
            );
        }
    }
}

// ============================================================================
// Compression
// ============================================================================

/// Whether an `Accept-Encoding` header allows gzip.
pub fn accepts_gzip(accept_encoding: Option<&str>) -> bool {
    let Some(accept_encoding) = accept_encoding else {
        return false;
    };

    let mut wildcard = false;
    for entry in accept_encoding.split(',') {
        let mut parts = entry.split(';');
        let coding = parts.next().unwrap_or_default().trim().to_ascii_lowercase();
        let quality = parts
            .filter_map(|p| p.trim().strip_prefix("q="))
            .find_map(|q| q.trim().parse::<f32>().ok())
            .unwrap_or(1.0);

        match coding.as_str() {
            "gzip" | "x-gzip" => return quality > 0.0,
            "*" => wildcard = quality > 0.0,
            _ => {}
        }
    }
    wildcard
}

/// Gzip a rendered body in place when it is large enough and the client
/// accepts it. Returns whether the body was compressed.
pub fn compress(rendered: &mut RenderedResponse, accept_encoding: Option<&str>) -> bool {
    if rendered.body.len() < MIN_COMPRESS_SIZE || rendered.header("content-encoding").is_some() {
        return false;
    }
    rendered
        .headers
        .push(("Vary".to_string(), "Accept-Encoding".to_string()));

    if !accepts_gzip(accept_encoding) {
        return false;
    }

    match gzip(&rendered.body) {
        Ok(compressed) => {
            rendered.body = Bytes::from(compressed);
            rendered
                .headers
                .push(("Content-Encoding".to_string(), "gzip".to_string()));
            true
        }
        Err(e) => {
            warn!("Failed to gzip response body, sending it uncompressed: {}", e);
            false
        }
    }
}

fn gzip(data: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    encoder.finish()
}
