//! Core domain logic for Mock API
//!
//! This crate contains the route model, server configuration and error types
//! shared by the parser, runtime and CLI crates.

pub mod domain;
pub mod error;

pub use domain::*;
pub use error::{MockApiError, Result};
