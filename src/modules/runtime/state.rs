//! Per-route state shared with the HTTP handlers

use async_graphql::dynamic::Schema;
use std::sync::Arc;

/// State attached to the router of a single route
#[derive(Clone)]
pub struct RouteState {
    /// Full HTTP path of the route, namespace included
    pub path: Arc<str>,
    /// Compiled schema answering requests on this path
    pub schema: Schema,
}

impl RouteState {
    pub fn new(path: impl Into<Arc<str>>, schema: Schema) -> Self {
        Self {
            path: path.into(),
            schema,
        }
    }
}
