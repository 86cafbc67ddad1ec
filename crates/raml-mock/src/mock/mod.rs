//! Mock response synthesis.
//!
//! This module provides:
//! - `ExampleSelector`: resolves defaults and examples to one value
//! - `negotiate`: picks the media type a response is rendered in
//! - `render`: turns the selected values into status, headers and body
//! - `RouteHandler` / `RouteTable`: one handler per declared (path, method)
//!
//! ## Module Structure
//!
//! - `types`: the read-only route/response/value model and `MockError`
//! - `select`: example selection and selection policies
//! - `negotiate`: content negotiation
//! - `render`: response rendering
//! - `handler`: per-route handlers
//! - `router`: the route table used for dispatch

mod handler;
mod negotiate;
mod render;
mod router;
mod select;
mod types;


pub use types::{
    Method, MockDocument, MockError, ResponseSpec, RouteDefinition, TypeDefinition, TypeRef,
    TypeRegistry, ValueSpec, DEFAULT_STATUS,
};

pub use handler::{MockContext, MockRequest, RouteHandler};
pub use router::RouteTable;
pub use select::{select, ExampleSelector, FirstSelection, RandomSelection, SelectionPolicy};

pub use negotiate::{essence, extension_media_type, is_json, negotiate, parse_accept, MediaRange};
pub use render::{encode_body, header_value, render, RenderedResponse};
