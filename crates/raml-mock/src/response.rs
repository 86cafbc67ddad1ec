//! HTTP response construction.

use crate::mock::RenderedResponse;
use bytes::Bytes;
use http_body_util::Full;
use hyper::header::{HeaderName, HeaderValue};
use hyper::{Response, StatusCode};
use tracing::warn;

/// A bare 500, used when a response cannot be built.
pub fn internal_error() -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::new()));
    *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    response
}

/// An empty response with the given status.
pub fn empty_response(status: StatusCode) -> Response<Full<Bytes>> {
    Response::builder()
        .status(status)
        .body(Full::new(Bytes::new()))
        .unwrap_or_else(|_| internal_error())
}

/// Build an HTTP response with headers.
///
/// Headers whose name or value is not valid HTTP are skipped with a warning
/// instead of failing the whole response.
pub fn build_response_with_headers(
    status: u16,
    headers: impl IntoIterator<Item = (impl AsRef<str>, impl AsRef<str>)>,
    body: impl Into<Bytes>,
) -> Response<Full<Bytes>> {
    let Ok(status) = StatusCode::from_u16(status) else {
        warn!("Invalid status code {}, answering 500", status);
        return internal_error();
    };

    let mut builder = Response::builder().status(status);
    for (name, value) in headers {
        let (name, value) = (name.as_ref(), value.as_ref());
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => builder = builder.header(name, value),
            _ => warn!("Skipping invalid response header '{}: {}'", name, value),
        }
    }
    builder
        .body(Full::new(body.into()))
        .unwrap_or_else(|_| internal_error())
}

/// Convert a rendered mock response into a hyper response.
pub fn into_http_response(rendered: RenderedResponse) -> Response<Full<Bytes>> {
    build_response_with_headers(rendered.status, rendered.headers, rendered.body)
}
