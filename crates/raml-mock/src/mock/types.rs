//! Type definitions for the mock response model.
//!
//! This module contains the read-only tree produced by the RAML loader and
//! consumed by the route handlers: routes, per-status responses, the
//! example/default resolution unit shared by headers and bodies, and the
//! named type registry used for property-example composition.

use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// ============================================================================
// HTTP Methods
// ============================================================================

/// HTTP methods a RAML resource can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
}

impl Method {
    pub const ALL: [Method; 7] = [
        Method::Get,
        Method::Post,
        Method::Put,
        Method::Patch,
        Method::Delete,
        Method::Head,
        Method::Options,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
            Method::Head => "HEAD",
            Method::Options => "OPTIONS",
        }
    }

    /// Method for a lowercase RAML resource key (`get`, `post`, ...).
    pub fn from_raml_key(key: &str) -> Option<Self> {
        match key {
            "get" => Some(Method::Get),
            "post" => Some(Method::Post),
            "put" => Some(Method::Put),
            "patch" => Some(Method::Patch),
            "delete" => Some(Method::Delete),
            "head" => Some(Method::Head),
            "options" => Some(Method::Options),
            _ => None,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = MockError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| MockError::UnsupportedMethod(s.to_string()))
    }
}

// ============================================================================
// Example / Default Resolution Unit
// ============================================================================

/// Reference from a value node to the type whose properties carry examples.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeRef {
    /// A type declared at document level, looked up in the [`TypeRegistry`].
    Named(String),
    /// A type declared in place (e.g. a body with its own `properties`).
    Inline(Box<TypeDefinition>),
}

/// Default/example facets of a header, body or property.
///
/// All fields empty means the node resolves to no value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValueSpec {
    pub default_value: Option<Value>,
    pub example: Option<Value>,
    /// Named examples in document order.
    pub examples: Option<Vec<(String, Value)>>,
    pub type_example_source: Option<TypeRef>,
}

impl ValueSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default(mut self, value: Value) -> Self {
        self.default_value = Some(value);
        self
    }

    pub fn with_example(mut self, value: Value) -> Self {
        self.example = Some(value);
        self
    }

    /// Set the named examples. An empty list clears the field.
    pub fn with_examples<I, K>(mut self, examples: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let examples: Vec<(String, Value)> =
            examples.into_iter().map(|(k, v)| (k.into(), v)).collect();
        self.examples = if examples.is_empty() {
            None
        } else {
            Some(examples)
        };
        self
    }

    pub fn with_type_source(mut self, source: TypeRef) -> Self {
        self.type_example_source = Some(source);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.default_value.is_none()
            && self.example.is_none()
            && self.examples.as_ref().map_or(true, Vec::is_empty)
            && self.type_example_source.is_none()
    }
}

/// A type whose properties carry their own examples.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TypeDefinition {
    /// Property specs in declaration order.
    pub properties: Vec<(String, ValueSpec)>,
}

impl TypeDefinition {
    pub fn with_property(mut self, name: impl Into<String>, spec: ValueSpec) -> Self {
        let name = name.into();
        match self.properties.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = spec,
            None => self.properties.push((name, spec)),
        }
        self
    }
}

/// Named type definitions referenced by [`TypeRef::Named`].
pub type TypeRegistry = HashMap<String, TypeDefinition>;

// ============================================================================
// Responses and Routes
// ============================================================================

/// One declared response (headers and per-media-type bodies).
///
/// Media type keys are stored lowercase; lookups are case-insensitive.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResponseSpec {
    pub headers: Vec<(String, ValueSpec)>,
    bodies: Vec<(String, ValueSpec)>,
}

impl ResponseSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_header(mut self, name: impl Into<String>, spec: ValueSpec) -> Self {
        self.headers.push((name.into(), spec));
        self
    }

    pub fn with_body(mut self, media_type: &str, spec: ValueSpec) -> Self {
        self.insert_body(media_type, spec);
        self
    }

    /// Insert or replace the body declared for `media_type`.
    pub fn insert_body(&mut self, media_type: &str, spec: ValueSpec) {
        let key = media_type.trim().to_ascii_lowercase();
        match self.bodies.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = spec,
            None => self.bodies.push((key, spec)),
        }
    }

    pub fn body(&self, media_type: &str) -> Option<&ValueSpec> {
        self.body_entry(media_type).map(|(_, spec)| spec)
    }

    /// The stored media type key and its body spec.
    pub fn body_entry(&self, media_type: &str) -> Option<(&str, &ValueSpec)> {
        let wanted = media_type.trim();
        self.bodies
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(wanted))
            .map(|(k, spec)| (k.as_str(), spec))
    }

    pub fn bodies(&self) -> impl Iterator<Item = (&str, &ValueSpec)> {
        self.bodies.iter().map(|(k, spec)| (k.as_str(), spec))
    }

    pub fn media_types(&self) -> impl Iterator<Item = &str> {
        self.bodies.iter().map(|(k, _)| k.as_str())
    }

    pub fn has_bodies(&self) -> bool {
        !self.bodies.is_empty()
    }
}

/// A declared (path, method) pair.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteDefinition {
    /// Path template with `{param}` segments, always starting with `/`.
    pub path: String,
    pub method: Method,
    pub responses: BTreeMap<u16, ResponseSpec>,
}

/// Status answered when a route declares no responses.
pub const DEFAULT_STATUS: u16 = 200;

impl RouteDefinition {
    pub fn new(path: impl Into<String>, method: Method) -> Self {
        Self {
            path: path.into(),
            method,
            responses: BTreeMap::new(),
        }
    }

    pub fn with_response(mut self, status: u16, response: ResponseSpec) -> Self {
        self.responses.insert(status, response);
        self
    }

    /// Status and response this route answers with: the lowest declared 2xx,
    /// else the lowest declared status, else `200` with no response.
    pub fn success_response(&self) -> (u16, Option<&ResponseSpec>) {
        self.responses
            .iter()
            .find(|(status, _)| (200..300).contains(*status))
            .or_else(|| self.responses.iter().next())
            .map(|(status, response)| (*status, Some(response)))
            .unwrap_or((DEFAULT_STATUS, None))
    }
}

/// The whole loaded API description.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MockDocument {
    pub title: Option<String>,
    /// Document-level media types; the first one is the default.
    pub media_types: Vec<String>,
    pub routes: Vec<RouteDefinition>,
    pub types: TypeRegistry,
}

impl MockDocument {
    pub fn default_media_type(&self) -> Option<&str> {
        self.media_types.first().map(String::as_str)
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Errors raised while building routes or answering a request.
#[derive(Debug, Error)]
pub enum MockError {
    #[error("none of the available media types is acceptable: {}", available.join(", "))]
    NotAcceptable { available: Vec<String> },
    #[error("no route for {method} {path}")]
    RouteNotFound { method: String, path: String },
    #[error("unsupported HTTP method: {0}")]
    UnsupportedMethod(String),
    #[error("invalid route template '{path}': {reason}")]
    InvalidRoute { path: String, reason: String },
}
