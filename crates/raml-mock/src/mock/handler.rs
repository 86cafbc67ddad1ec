//! Per-route request handlers.
//!
//! A [`RouteHandler`] is built once per declared (path, method) and owns the
//! response it answers with. Handling a request is a straight pipeline:
//! negotiate the media type, select the body and header values, render.

use super::negotiate::negotiate;
use super::render::{render, RenderedResponse};
use super::select::{ExampleSelector, SelectionPolicy};
use super::types::{Method, MockError, ResponseSpec, RouteDefinition, TypeRegistry};
use std::sync::Arc;
use tracing::debug;

/// Document-wide state shared by every handler.
#[derive(Debug)]
pub struct MockContext {
    pub types: TypeRegistry,
    pub default_media_type: Option<String>,
    pub policy: Arc<dyn SelectionPolicy>,
}

impl MockContext {
    pub fn new(
        types: TypeRegistry,
        default_media_type: Option<String>,
        policy: Arc<dyn SelectionPolicy>,
    ) -> Self {
        Self {
            types,
            default_media_type,
            policy,
        }
    }
}

/// The parts of an incoming request the pipeline looks at.
#[derive(Debug, Clone, Copy, Default)]
pub struct MockRequest<'a> {
    /// Raw request path, extension included.
    pub path: &'a str,
    pub accept: Option<&'a str>,
}

/// Handler for one declared (path, method).
#[derive(Debug, Clone)]
pub struct RouteHandler {
    method: Method,
    template: String,
    status: u16,
    response: Option<ResponseSpec>,
    context: Arc<MockContext>,
}

impl RouteHandler {
    /// Bind a route to its success response.
    pub fn from_route(route: &RouteDefinition, context: Arc<MockContext>) -> Self {
        let (status, response) = route.success_response();
        Self {
            method: route.method,
            template: route.path.clone(),
            status,
            response: response.cloned(),
            context,
        }
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    /// Answer a request.
    ///
    /// Fails only with [`MockError::NotAcceptable`] when the route declares
    /// bodies and none fits the request.
    pub fn handle(&self, request: &MockRequest<'_>) -> Result<RenderedResponse, MockError> {
        let Some(response) = &self.response else {
            return Ok(RenderedResponse::empty(self.status));
        };

        let selector = ExampleSelector::new(&self.context.types, self.context.policy.as_ref());

        if !response.has_bodies() {
            return Ok(render(self.status, None, None, &response.headers, &selector));
        }

        let media_type = negotiate(
            request.path,
            request.accept,
            response,
            self.context.default_media_type.as_deref(),
        )?;
        let body = response
            .body(media_type)
            .and_then(|spec| selector.select(spec));

        debug!(
            "{} {} -> {} as {} (example: {})",
            self.method,
            self.template,
            self.status,
            media_type,
            body.is_some()
        );

        Ok(render(
            self.status,
            Some(media_type),
            body.as_ref(),
            &response.headers,
            &selector,
        ))
    }
}
