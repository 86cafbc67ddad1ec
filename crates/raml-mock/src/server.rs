//! HTTP server for the mock service.
//!
//! One tokio task per connection, each serving HTTP/1.1 with hyper. Requests
//! are answered synchronously by [`MockService::respond`]; the only awaits
//! are in the transport.

use crate::config::MockConfig;
use crate::middleware::{apply_cors, compress, is_preflight, preflight_response};
use crate::mock::{Method, MockDocument, MockError, MockRequest, RouteTable};
use crate::response::{empty_response, internal_error, into_http_response};
use bytes::Bytes;
use http_body_util::Full;
use hyper::header::{HeaderMap, ACCEPT, ACCEPT_ENCODING};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::future::Future;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

/// Routes plus the response options applied around them.
#[derive(Debug)]
pub struct MockService {
    routes: RouteTable,
    cors: bool,
    compression: bool,
}

impl MockService {
    pub fn new(routes: RouteTable, config: &MockConfig) -> Self {
        Self {
            routes,
            cors: config.cors,
            compression: config.compression,
        }
    }

    /// Build the route table for `document` and wrap it.
    pub fn from_document(document: &MockDocument, config: &MockConfig) -> Result<Self, MockError> {
        let routes = RouteTable::build(document, config.selection.policy())?;
        Ok(Self::new(routes, config))
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// Answer one request.
    pub fn respond(
        &self,
        method: &hyper::Method,
        path: &str,
        headers: &HeaderMap,
    ) -> Response<Full<Bytes>> {
        let mut response = self.dispatch(method, path, headers);
        if self.cors {
            apply_cors(&mut response, headers);
        }
        response
    }

    fn dispatch(
        &self,
        method: &hyper::Method,
        path: &str,
        headers: &HeaderMap,
    ) -> Response<Full<Bytes>> {
        let Ok(mock_method) = Method::from_str(method.as_str()) else {
            debug!("Unsupported method {} {}", method, path);
            return empty_response(StatusCode::NOT_FOUND);
        };

        if self.cors
            && is_preflight(method, headers)
            && self.routes.lookup(Method::Options, path).is_err()
        {
            return preflight_response(headers);
        }

        let head = mock_method == Method::Head;
        let handler = match self.routes.lookup(mock_method, path) {
            Ok(handler) => handler,
            Err(_) if head => match self.routes.lookup(Method::Get, path) {
                Ok(handler) => handler,
                Err(e) => {
                    debug!("{}", e);
                    return empty_response(StatusCode::NOT_FOUND);
                }
            },
            Err(e) => {
                debug!("{}", e);
                return empty_response(StatusCode::NOT_FOUND);
            }
        };

        let request = MockRequest {
            path,
            accept: header_str(headers, ACCEPT),
        };
        let mut rendered = match handler.handle(&request) {
            Ok(rendered) => rendered,
            Err(MockError::NotAcceptable { available }) => {
                warn!(
                    "Not acceptable: {} {} (available: {})",
                    method,
                    path,
                    available.join(", ")
                );
                return empty_response(StatusCode::NOT_ACCEPTABLE);
            }
            Err(e) => {
                error!("Failed to answer {} {}: {}", method, path, e);
                return internal_error();
            }
        };

        if head {
            rendered.body = Bytes::new();
        } else if self.compression {
            compress(&mut rendered, header_str(headers, ACCEPT_ENCODING));
        }

        into_http_response(rendered)
    }
}

fn header_str(headers: &HeaderMap, name: hyper::header::HeaderName) -> Option<&str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Handle a request to the mock service
pub async fn handle_request<B>(
    req: Request<B>,
    service: Arc<MockService>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let start = Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let response = service.respond(&method, &path, req.headers());

    info!(
        "{} {} {} {:.2}ms",
        method,
        path,
        response.status().as_u16(),
        start.elapsed().as_secs_f64() * 1000.0
    );
    Ok(response)
}

/// Mock HTTP server
pub struct MockServer {
    service: Arc<MockService>,
}

impl MockServer {
    pub fn new(service: MockService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }

    /// Bind a listener for `config`.
    pub async fn bind(config: &MockConfig) -> Result<TcpListener, anyhow::Error> {
        let addr = config.socket_addr()?;
        TcpListener::bind(addr)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind {}: {}", addr, e))
    }

    /// Serve until the process exits.
    pub async fn serve(self, listener: TcpListener) -> Result<(), anyhow::Error> {
        self.serve_with_shutdown(listener, std::future::pending()).await
    }

    /// Serve until `shutdown` completes. In-flight connections finish on their own tasks.
    pub async fn serve_with_shutdown<F>(
        self,
        listener: TcpListener,
        shutdown: F,
    ) -> Result<(), anyhow::Error>
    where
        F: Future<Output = ()>,
    {
        let port = listener.local_addr()?.port();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                result = listener.accept() => {
                    match result {
                        Ok((stream, _)) => {
                            let mock = Arc::clone(&self.service);
                            tokio::spawn(async move {
                                let io = TokioIo::new(stream);
                                let service = service_fn(move |req| {
                                    let mock = Arc::clone(&mock);
                                    async move { handle_request(req, mock).await }
                                });
                                if let Err(e) = http1::Builder::new()
                                    .serve_connection(io, service)
                                    .await
                                {
                                    debug!("Connection error on port {}: {}", port, e);
                                }
                            });
                        }
                        Err(e) => {
                            error!("Accept error on port {}: {}", port, e);
                        }
                    }
                }
                _ = &mut shutdown => {
                    info!("Mock service on port {} shutting down", port);
                    break;
                }
            }
        }

        Ok(())
    }
}
