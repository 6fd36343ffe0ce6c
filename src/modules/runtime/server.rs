//! HTTP server for Mock API

use axum::Router;
use mock_api_core::{MockApiError, ServerConfig};
use std::future::Future;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::oneshot;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

use crate::discovery::discover;
use crate::registry::{RegisteredRoute, RegistrationReport, RouteRegistry};

/// One generation of the mock server: the routes found at startup
pub struct Runtime {
    config: ServerConfig,
    report: RegistrationReport,
}

impl Runtime {
    /// Discover and register every route under the configured data root
    ///
    /// Discovery errors are fatal; route errors are logged and the route is
    /// left out.
    pub async fn new(config: ServerConfig) -> Result<Self, MockApiError> {
        let table = discover(&config.data_dir)?;
        let report = RouteRegistry::register_all(&config, table).await;

        if !report.failed.is_empty() {
            warn!(
                "{} route(s) failed to register and will not be served",
                report.failed.len()
            );
        }

        Ok(Self { config, report })
    }

    /// Build the Axum router
    pub fn build_router(&self) -> Router {
        // CORS configuration
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        // Request timeout
        let timeout = TimeoutLayer::new(Duration::from_secs(30));

        RouteRegistry::router(&self.report.registered)
            .layer(cors)
            .layer(timeout)
            .layer(TraceLayer::new_for_http())
    }

    /// Bind the configured address and serve until `shutdown` resolves
    pub async fn run<F>(&self, shutdown: F) -> Result<(), MockApiError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(self.config.address())
            .await
            .map_err(|e| {
                MockApiError::Server(format!("Failed to bind {}: {}", self.config.address(), e))
            })?;

        self.serve(listener, shutdown).await
    }

    /// Serve on an already bound listener until `shutdown` resolves
    pub async fn serve<F>(&self, listener: TcpListener, shutdown: F) -> Result<(), MockApiError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let app = self.build_router();
        let base_url = match listener.local_addr() {
            Ok(addr) => format!("http://{}", addr),
            Err(_) => self.config.base_url(),
        };

        info!(
            "> Mock API server {} on ... {}",
            self.config.launch_word(),
            base_url
        );
        for route in &self.report.registered {
            info!("  {}{}", base_url, route.path);
        }

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| MockApiError::Server(format!("Server error: {}", e)))?;

        debug!("Server stopped");
        Ok(())
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Routes that are being served
    pub fn routes(&self) -> &[RegisteredRoute] {
        &self.report.registered
    }

    pub fn report(&self) -> &RegistrationReport {
        &self.report
    }
}

/// Wait for Ctrl-C or SIGTERM
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install CTRL+C signal handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            debug!("Received CTRL+C, shutting down...");
        }
        _ = terminate => {
            debug!("Received SIGTERM, shutting down...");
        }
    }
}

/// Resolve once stdin reaches end of file
///
/// The supervisor closes a worker's stdin to ask it to stop.
pub async fn stdin_closed() {
    let (tx, rx) = oneshot::channel();

    // Reads block until EOF, so stay off the runtime threads
    std::thread::spawn(move || {
        let mut stdin = std::io::stdin().lock();
        let _ = std::io::copy(&mut stdin, &mut std::io::sink());
        let _ = tx.send(());
    });

    let _ = rx.await;
    debug!("Stdin closed, shutting down...");
}
