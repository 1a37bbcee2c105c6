//! Error handling
//!
//! Defines error types and HTTP classification for the file server.

pub mod handlers;
pub mod types;

pub use types::*;
