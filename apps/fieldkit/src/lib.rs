//! # fieldkit
//!
//! Server and CLI for the fieldkit inspection engine.
//!
//! The binary in `main.rs` only sets up logging and dispatches to [`cli`];
//! the modules are exposed as a library so integration tests can build the
//! router directly.

pub mod api;
pub mod cli;
pub mod config;
