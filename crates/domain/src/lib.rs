//! `n8n-mcp-domain` — shared data model and cross-cutting types for the
//! n8n-mcp-gateway workspace.
//!
//! This crate has no I/O dependencies of its own (no reqwest, no axum): it
//! defines the workflow document shape, the validation/diff vocabulary, the
//! error taxonomy, configuration structs, and the error-message sanitizer
//! that every other crate in the workspace builds on.

pub mod auth;
pub mod config;
pub mod diffop;
pub mod error;
pub mod instance;
pub mod sanitize;
pub mod validation;
pub mod workflow;

pub use error::{Error, ErrorCode, Result};
