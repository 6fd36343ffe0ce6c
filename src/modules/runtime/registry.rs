//! Route registration
//!
//! Every discovered route is loaded on its own task. A route whose files are
//! missing or broken is logged and skipped; it never keeps the others from
//! being served.

use async_graphql::dynamic::Schema;
use axum::{routing::get, Router};
use mock_api_core::{MockApiError, RouteDescriptor, RouteTable, ServerConfig};
use mock_api_parser::{load_data_file, parse_schema_file, SchemaValidator};
use std::path::Path;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, error, warn};

use crate::executor::SchemaBuilder;
use crate::handlers::GraphqlHandler;
use crate::state::RouteState;

/// A route that compiled and is ready to serve
#[derive(Clone)]
pub struct RegisteredRoute {
    pub descriptor: RouteDescriptor,
    /// HTTP path, namespace included
    pub path: String,
    pub schema: Schema,
}

/// Outcome of registering a whole route table
#[derive(Default)]
pub struct RegistrationReport {
    pub registered: Vec<RegisteredRoute>,
    pub failed: Vec<(RouteDescriptor, MockApiError)>,
}

impl RegistrationReport {
    pub fn paths(&self) -> Vec<&str> {
        self.registered.iter().map(|r| r.path.as_str()).collect()
    }
}

/// Loads routes and builds the router serving them
pub struct RouteRegistry;

impl RouteRegistry {
    /// Register every route of `table`, concurrently
    pub async fn register_all(config: &ServerConfig, table: RouteTable) -> RegistrationReport {
        let mut tasks = JoinSet::new();

        for descriptor in table {
            let root = config.data_dir.clone();
            let path = config.route_path(&descriptor);
            tasks.spawn(async move {
                let result = match check_path(&path) {
                    Ok(()) => load_route(&root, &descriptor).await,
                    Err(e) => Err(e),
                };
                (descriptor, path, result)
            });
        }

        let mut report = RegistrationReport::default();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((descriptor, path, Ok(schema))) => {
                    debug!("Registered route '{}' at {}", descriptor.name, path);
                    report.registered.push(RegisteredRoute {
                        descriptor,
                        path,
                        schema,
                    });
                }
                Ok((descriptor, path, Err(e))) => {
                    error!(
                        "Failed to register route '{}' at {}: {}",
                        descriptor.name, path, e
                    );
                    report.failed.push((descriptor, e));
                }
                Err(e) => error!("Route registration task failed: {}", e),
            }
        }

        report.registered.sort_by(|a, b| a.path.cmp(&b.path));
        report
    }

    /// Merge the registered routes into one router
    pub fn router(routes: &[RegisteredRoute]) -> Router {
        routes.iter().fold(Router::new(), |router, route| {
            let state = RouteState::new(route.path.as_str(), route.schema.clone());
            router.merge(
                Router::new()
                    .route(
                        &route.path,
                        get(GraphqlHandler::get).post(GraphqlHandler::post),
                    )
                    .with_state(state),
            )
        })
    }
}

/// Reject paths the router would treat as parameters or wildcards
fn check_path(path: &str) -> Result<(), MockApiError> {
    let reserved = path
        .split('/')
        .find_map(|segment| segment.chars().find(|c| matches!(c, ':' | '*')));

    match reserved {
        Some(c) => Err(MockApiError::InvalidEndpoint {
            endpoint: path.to_string(),
            reason: format!("'{}' is reserved in route paths", c),
        }),
        None => Ok(()),
    }
}

/// Load, check and compile a single route
async fn load_route(root: &Path, descriptor: &RouteDescriptor) -> Result<Schema, MockApiError> {
    let schema_path = descriptor.schema_path(root);
    let data_path = descriptor.data_path(root);
    ensure_exists(&schema_path).await?;
    ensure_exists(&data_path).await?;

    let (document, module) = tokio::task::spawn_blocking(move || {
        Ok::<_, MockApiError>((parse_schema_file(&schema_path)?, load_data_file(&data_path)?))
    })
    .await
    .map_err(|e| MockApiError::Internal(format!("Route loader stopped: {}", e)))??;

    for warning in SchemaValidator::new().validate(&document, &module) {
        warn!("{}: {}", descriptor.display_path(), warning);
    }

    SchemaBuilder::new(&document, Arc::new(module)).build()
}

async fn ensure_exists(path: &Path) -> Result<(), MockApiError> {
    match tokio::fs::try_exists(path).await {
        Ok(true) => Ok(()),
        _ => Err(MockApiError::MissingFile(path.to_path_buf())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use std::fs;
    use tower::ServiceExt;

    const DIE_SCHEMA: &str = "type Query { getDie(numSides: Int = 6): Int }";
    const DIE_DATA: &str = r#"{"getDie": "{{ args.numSides }}"}"#;

    fn write(root: &Path, relative: &str, content: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn table(routes: &[(&str, &str)]) -> RouteTable {
        RouteTable::new(
            routes
                .iter()
                .map(|(file, dir)| RouteDescriptor::new(*file, *dir))
                .collect(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_register_valid_routes() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "die.graphql", DIE_SCHEMA);
        write(dir.path(), "die.json", DIE_DATA);
        write(dir.path(), "games/coin.graphql", "type Query { flip: String }");
        write(dir.path(), "games/coin.yaml", "flip: HEADS\n");

        let config = ServerConfig::new(dir.path()).with_namespace("mock");
        let report =
            RouteRegistry::register_all(&config, table(&[("die.json", ""), ("coin.yaml", "/games")]))
                .await;

        assert!(report.failed.is_empty());
        assert_eq!(report.paths(), vec!["/mock/die", "/mock/games/coin"]);
    }

    #[tokio::test]
    async fn test_failures_are_isolated() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "die.graphql", DIE_SCHEMA);
        write(dir.path(), "die.json", DIE_DATA);
        write(dir.path(), "lonely.json", "{}");
        write(dir.path(), "broken.graphql", "type Query {");
        write(dir.path(), "broken.json", "{}");
        write(dir.path(), "bad.graphql", DIE_SCHEMA);
        write(dir.path(), "bad.json", "[1, 2]");

        let config = ServerConfig::new(dir.path());
        let report = RouteRegistry::register_all(
            &config,
            table(&[
                ("die.json", ""),
                ("lonely.json", ""),
                ("broken.json", ""),
                ("bad.json", ""),
            ]),
        )
        .await;

        assert_eq!(report.paths(), vec!["/die"]);
        assert_eq!(report.failed.len(), 3);

        let lonely = report
            .failed
            .iter()
            .find(|(d, _)| d.name == "lonely")
            .unwrap();
        assert!(matches!(lonely.1, MockApiError::MissingFile(_)));
        assert!(report.failed.iter().all(|(_, e)| e.is_route_error()));
    }

    #[tokio::test]
    async fn test_reserved_characters_fail_only_their_route() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["die", "a*b", ":a", ":b"] {
            write(dir.path(), &format!("{}.graphql", name), DIE_SCHEMA);
            write(dir.path(), &format!("{}.json", name), DIE_DATA);
        }

        let config = ServerConfig::new(dir.path());
        let report = RouteRegistry::register_all(
            &config,
            table(&[("die.json", ""), ("a*b.json", ""), (":a.json", ""), (":b.json", "")]),
        )
        .await;

        assert_eq!(report.paths(), vec!["/die"]);
        assert_eq!(report.failed.len(), 3);
        assert!(report
            .failed
            .iter()
            .all(|(_, e)| matches!(e, MockApiError::InvalidEndpoint { .. }) && e.is_route_error()));

        let router = RouteRegistry::router(&report.registered);
        let request = Request::builder().uri("/die").body(Body::empty()).unwrap();
        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn test_check_path() {
        assert!(check_path("/games/die").is_ok());
        assert!(check_path("/mock/My-Roll").is_ok());
        assert!(check_path("/games/:id").is_err());
        assert!(check_path("/a*b").is_err());
    }

    #[tokio::test]
    async fn test_unreadable_content_is_a_route_error() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "die.graphql", DIE_SCHEMA);
        fs::write(dir.path().join("die.json"), [0xff, 0xfe, 0x00]).unwrap();

        let config = ServerConfig::new(dir.path());
        let report = RouteRegistry::register_all(&config, table(&[("die.json", "")])).await;

        assert!(report.registered.is_empty());
        let (_, err) = &report.failed[0];
        assert!(matches!(err, MockApiError::DataModule(_)));
        assert!(err.is_route_error());
    }

    #[tokio::test]
    async fn test_router_serves_queries() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "die.graphql", DIE_SCHEMA);
        write(dir.path(), "die.json", DIE_DATA);

        let config = ServerConfig::new(dir.path());
        let report = RouteRegistry::register_all(&config, table(&[("die.json", "")])).await;
        let router = RouteRegistry::router(&report.registered);

        let request = Request::builder()
            .method("POST")
            .uri("/die")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"query": "{ getDie(numSides: 20) }"}"#))
            .unwrap();
        let response = router.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body, json!({"data": {"getDie": 20}}));

        let request = Request::builder()
            .uri("/die?query=%7B%20getDie%20%7D")
            .body(Body::empty())
            .unwrap();
        let response = router.clone().oneshot(request).await.unwrap();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body, json!({"data": {"getDie": 6}}));
    }

    #[tokio::test]
    async fn test_get_without_query_serves_graphiql() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "die.graphql", DIE_SCHEMA);
        write(dir.path(), "die.json", DIE_DATA);

        let config = ServerConfig::new(dir.path());
        let report = RouteRegistry::register_all(&config, table(&[("die.json", "")])).await;
        let router = RouteRegistry::router(&report.registered);

        let request = Request::builder().uri("/die").body(Body::empty()).unwrap();
        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let html = String::from_utf8(body.to_vec()).unwrap();
        assert!(html.contains("graphiql"));
    }

    #[tokio::test]
    async fn test_unknown_path_is_not_found() {
        let router = RouteRegistry::router(&[]);
        let request = Request::builder().uri("/die").body(Body::empty()).unwrap();
        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
