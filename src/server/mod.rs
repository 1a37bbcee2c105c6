//! Server core functionality
//!
//! Contains the server implementation: shared state, listener setup,
//! and the HTTP route layer.

pub mod core;
pub mod routes;

pub use core::{AppState, Server};
