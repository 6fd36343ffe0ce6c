//! GraphQL endpoint handler

use async_graphql::http::{parse_query_string, GraphiQLSource};
use axum::{
    extract::{RawQuery, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Json,
};
use tracing::debug;

use crate::state::RouteState;

/// Handler for the GraphQL endpoint of a route
pub struct GraphqlHandler;

impl GraphqlHandler {
    /// Handle POST {route}
    pub async fn post(
        State(state): State<RouteState>,
        Json(request): Json<async_graphql::Request>,
    ) -> Json<async_graphql::Response> {
        debug!("POST {}", state.path);
        Json(state.schema.execute(request).await)
    }

    /// Handle GET {route}
    ///
    /// Executes the request carried in the query string, or serves GraphiQL
    /// when there is none.
    pub async fn get(State(state): State<RouteState>, RawQuery(query): RawQuery) -> Response {
        let query = match query {
            Some(query) if has_query_param(&query) => query,
            _ => return Html(GraphiQLSource::build().endpoint(&state.path).finish()).into_response(),
        };

        debug!("GET {}", state.path);
        match parse_query_string(&query) {
            Ok(request) => Json(state.schema.execute(request).await).into_response(),
            Err(e) => (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
        }
    }
}

fn has_query_param(query: &str) -> bool {
    query
        .split('&')
        .any(|pair| pair.split('=').next() == Some("query"))
}
