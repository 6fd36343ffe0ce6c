//! Runtime for Mock API
//!
//! This crate discovers schema/data pairs, compiles them into GraphQL
//! endpoints, serves them over HTTP, watches the data directory for changes
//! and supervises the worker process in development mode.

pub mod discovery;
pub mod executor;
pub mod handlers;
pub mod registry;
pub mod server;
pub mod state;
pub mod supervisor;
pub mod watch;

pub use discovery::discover;
pub use executor::SchemaBuilder;
pub use handlers::GraphqlHandler;
pub use registry::{RegisteredRoute, RegistrationReport, RouteRegistry};
pub use server::{shutdown_signal, stdin_closed, Runtime};
pub use state::RouteState;
pub use supervisor::{RestartPolicy, Supervisor, WorkerExit, WorkerLauncher, INITIAL_ENV};
pub use watch::{spawn_watcher, ChangeSignal, ChangeWatch};
