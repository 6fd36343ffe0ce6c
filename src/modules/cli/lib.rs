//! Mock API CLI
//!
//! This crate provides the command-line interface for Mock API including:
//! - run: Serve the mock API
//! - dev: Serve with restarts on data changes
//! - routes: List discovered routes
//! - init: Scaffold an example data directory

pub mod commands;

pub use commands::{Cli, Commands};
