//! Resource tree walking.
//!
//! Flattens the nested resources of a RAML document into one
//! [`RouteDefinition`] per (path, method).

use super::convert::key_to_string;
use super::error::DocumentLoadError;
use super::types::TypeResolver;
use crate::mock::{Method, MockDocument, ResponseSpec, RouteDefinition};
use serde_yaml::{Mapping, Value as YamlValue};
use tracing::debug;

/// Media type of bodies declared without one when the document has no `mediaType`.
pub const FALLBACK_MEDIA_TYPE: &str = "application/json";

/// Resource path suffix that enables extension-based media types.
const MEDIA_TYPE_EXTENSION: &str = "{mediaTypeExtension}";

/// Build the mock model from a document root with includes already resolved.
pub fn build(root: &Mapping) -> Result<MockDocument, DocumentLoadError> {
    let title = root.get("title").and_then(YamlValue::as_str).map(str::to_string);
    let media_types = media_types(root)?;
    let prefix = base_path(root);

    let mut resolver = TypeResolver::new(root);
    let types = resolver.registry()?;

    let body_media_types = if media_types.is_empty() {
        vec![FALLBACK_MEDIA_TYPE.to_string()]
    } else {
        media_types.clone()
    };

    let mut walker = ResourceWalker {
        resolver: &mut resolver,
        body_media_types: &body_media_types,
        routes: Vec::new(),
    };
    walker.walk(&prefix, root)?;
    let routes = walker.routes;

    debug!(
        "Loaded {} routes and {} types (base path '{}')",
        routes.len(),
        types.len(),
        prefix
    );

    Ok(MockDocument {
        title,
        media_types,
        routes,
        types,
    })
}

fn media_types(root: &Mapping) -> Result<Vec<String>, DocumentLoadError> {
    match root.get("mediaType") {
        None | Some(YamlValue::Null) => Ok(Vec::new()),
        Some(YamlValue::String(media_type)) => Ok(vec![media_type.trim().to_string()]),
        Some(YamlValue::Sequence(items)) => items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(|s| s.trim().to_string())
                    .ok_or_else(|| {
                        DocumentLoadError::invalid("mediaType", "list entries must be strings")
                    })
            })
            .collect(),
        Some(_) => Err(DocumentLoadError::invalid(
            "mediaType",
            "expected a string or a list of strings",
        )),
    }
}

/// Path component of `baseUri` with `{version}` substituted, without a trailing `/`.
fn base_path(root: &Mapping) -> String {
    let Some(base_uri) = root.get("baseUri").and_then(YamlValue::as_str) else {
        return String::new();
    };
    let base_uri = match root.get("version") {
        Some(version) if !version.is_null() => {
            base_uri.replace("{version}", &key_to_string(version))
        }
        _ => base_uri.to_string(),
    };

    let path = match base_uri.split_once("://") {
        Some((_, rest)) => rest.find('/').map_or("", |index| &rest[index..]),
        None if base_uri.starts_with('/') => base_uri.as_str(),
        None => base_uri.find('/').map_or("", |index| &base_uri[index..]),
    };
    path.trim_end_matches('/').to_string()
}

/// Route template for a resource key nested under `prefix`.
fn join_path(prefix: &str, key: &str) -> String {
    let key = key.strip_suffix(MEDIA_TYPE_EXTENSION).unwrap_or(key);
    let path = format!("{prefix}{key}");
    if path.is_empty() {
        "/".to_string()
    } else {
        path
    }
}

fn parse_status(key: &YamlValue) -> Option<u16> {
    key_to_string(key)
        .trim()
        .parse::<u16>()
        .ok()
        .filter(|status| (100..=599).contains(status))
}

struct ResourceWalker<'r, 'a> {
    resolver: &'r mut TypeResolver<'a>,
    body_media_types: &'r [String],
    routes: Vec<RouteDefinition>,
}

impl ResourceWalker<'_, '_> {
    fn walk(&mut self, prefix: &str, resource: &Mapping) -> Result<(), DocumentLoadError> {
        for (key, value) in resource {
            let Some(key) = key.as_str().filter(|k| k.starts_with('/')) else {
                continue;
            };
            let path = join_path(prefix, key);
            let empty = Mapping::new();
            let nested = value.as_mapping().unwrap_or(&empty);

            for (method_key, method) in nested {
                if let Some(method_type) = method_key.as_str().and_then(Method::from_raml_key) {
                    let route = self.route(&path, method_type, method)?;
                    self.routes.push(route);
                }
            }

            self.walk(&path, nested)?;
        }
        Ok(())
    }

    fn route(
        &mut self,
        path: &str,
        method: Method,
        decl: &YamlValue,
    ) -> Result<RouteDefinition, DocumentLoadError> {
        let mut route = RouteDefinition::new(path, method);

        if let Some(responses) = decl.get("responses").and_then(YamlValue::as_mapping) {
            for (code, response) in responses {
                let status = parse_status(code).ok_or_else(|| {
                    DocumentLoadError::invalid(
                        format!("response of {method} {path}"),
                        format!("'{}' is not an HTTP status code", key_to_string(code)),
                    )
                })?;
                let response = self.response(response)?;
                route.responses.insert(status, response);
            }
        }

        Ok(route)
    }

    fn response(&mut self, decl: &YamlValue) -> Result<ResponseSpec, DocumentLoadError> {
        let mut response = ResponseSpec::new();

        if let Some(headers) = decl.get("headers").and_then(YamlValue::as_mapping) {
            for (name, header) in headers {
                let spec = self.resolver.value_spec(header)?;
                response = response.with_header(key_to_string(name), spec);
            }
        }

        match decl.get("body") {
            None | Some(YamlValue::Null) => {}
            Some(YamlValue::Mapping(bodies)) if has_media_type_keys(bodies) => {
                for (media_type, body) in bodies {
                    let media_type = key_to_string(media_type);
                    if media_type.contains('/') {
                        let spec = self.resolver.value_spec(body)?;
                        response.insert_body(&media_type, spec);
                    }
                }
            }
            Some(body) => {
                let spec = self.resolver.value_spec(body)?;
                for media_type in self.body_media_types {
                    response.insert_body(media_type, spec.clone());
                }
            }
        }

        Ok(response)
    }
}

fn has_media_type_keys(bodies: &Mapping) -> bool {
    bodies
        .keys()
        .any(|key| key.as_str().is_some_and(|k| k.contains('/')))
}
