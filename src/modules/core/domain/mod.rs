//! Domain models for Mock API

mod config;
mod route;

pub use config::{normalize_namespace, ServerConfig, DEFAULT_HOST, DEFAULT_PORT};
pub use route::{slugify, RouteDescriptor, RouteTable, IGNORED_NAMES, SCHEMA_EXTENSION};
