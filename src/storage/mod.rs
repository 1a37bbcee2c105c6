//! Sandboxed storage
//!
//! Path confinement, directory listing, file operations, and content
//! preview for the storage root.

pub mod catalog;
pub mod content;
pub mod operations;
pub mod resolver;

// Re-export the types the rest of the crate works with
pub use catalog::{Entry, EntryKind, Listing};
pub use resolver::PathResolver;
