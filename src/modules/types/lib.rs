//! Type definitions for Mock API
//!
//! This crate contains shared type definitions used across the Mock API codebase,
//! including the supervisor/worker control protocol and content fingerprints.

pub mod control;
pub mod fingerprint;

pub use control::{ControlMessage, StreamLine, RESTART_KEY};
pub use fingerprint::Fingerprint;
