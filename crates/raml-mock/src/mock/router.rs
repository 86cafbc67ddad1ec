//! Route table backed by a radix trie (`matchit`).
//!
//! Built once from a [`MockDocument`]: every route template is inserted into
//! the trie, each trie entry holds the handlers of the methods declared on
//! that template. Lookups normalize a trailing slash and fall back to the
//! path without its extension (`/users.json` → `/users`).

use super::handler::{MockContext, RouteHandler};
use super::negotiate::path_extension;
use super::select::SelectionPolicy;
use super::types::{Method, MockDocument, MockError};
use matchit::Router;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Handlers declared on one path template.
#[derive(Debug)]
struct RouteEntry {
    template: String,
    handlers: HashMap<Method, RouteHandler>,
}

/// Immutable lookup table from (method, path) to handler.
#[derive(Debug)]
pub struct RouteTable {
    router: Router<usize>,
    entries: Vec<RouteEntry>,
}

impl RouteTable {
    /// Build the table, one handler per declared (path, method).
    pub fn build(
        document: &MockDocument,
        policy: Arc<dyn SelectionPolicy>,
    ) -> Result<Self, MockError> {
        let context = Arc::new(MockContext::new(
            document.types.clone(),
            document.default_media_type().map(str::to_string),
            policy,
        ));

        let mut router = Router::new();
        let mut entries: Vec<RouteEntry> = Vec::new();
        let mut by_template: HashMap<String, usize> = HashMap::new();

        for route in &document.routes {
            let template = normalize_path(&route.path).to_string();
            let index = match by_template.get(&template) {
                Some(index) => *index,
                None => {
                    let index = entries.len();
                    router
                        .insert(template.clone(), index)
                        .map_err(|e| MockError::InvalidRoute {
                            path: template.clone(),
                            reason: e.to_string(),
                        })?;
                    entries.push(RouteEntry {
                        template: template.clone(),
                        handlers: HashMap::new(),
                    });
                    by_template.insert(template.clone(), index);
                    index
                }
            };

            let handler = RouteHandler::from_route(route, Arc::clone(&context));
            debug!(
                "Registered {} {} (status {})",
                route.method,
                template,
                handler.status()
            );
            entries[index].handlers.insert(route.method, handler);
        }

        Ok(Self { router, entries })
    }

    /// Find the handler for a request.
    pub fn lookup(&self, method: Method, path: &str) -> Result<&RouteHandler, MockError> {
        let path = normalize_path(path);
        if let Some(handler) = self.find(method, path) {
            return Ok(handler);
        }

        if let Some(extension) = path_extension(path) {
            let stem = &path[..path.len() - extension.len() - 1];
            if let Some(handler) = self.find(method, stem) {
                return Ok(handler);
            }
        }

        Err(MockError::RouteNotFound {
            method: method.to_string(),
            path: path.to_string(),
        })
    }

    /// Number of declared (path, method) pairs.
    pub fn len(&self) -> usize {
        self.entries.iter().map(|e| e.handlers.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Declared routes as (method, template), sorted by template.
    pub fn routes(&self) -> Vec<(Method, &str)> {
        let mut routes: Vec<(Method, &str)> = self
            .entries
            .iter()
            .flat_map(|entry| {
                entry
                    .handlers
                    .keys()
                    .map(move |method| (*method, entry.template.as_str()))
            })
            .collect();
        routes.sort_by(|a, b| a.1.cmp(b.1).then(a.0.cmp(&b.0)));
        routes
    }

    fn find(&self, method: Method, path: &str) -> Option<&RouteHandler> {
        let matched = self.router.at(path).ok()?;
        self.entries.get(*matched.value)?.handlers.get(&method)
    }
}

/// Strip a trailing slash, keeping the root path intact.
fn normalize_path(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/"
    } else {
        trimmed
    }
}
