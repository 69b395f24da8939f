//! Snippetbox Core - Domain entities, request context, and traits.
//!
//! This crate is database-agnostic. It defines the snippet model and the
//! repository trait implemented by the `storage-sqlite` crate.

pub mod context;
pub mod errors;
pub mod snippets;

pub use context::RequestContext;

// Re-export error types
pub use errors::Error;
pub use errors::Result;
