//! SQLite storage implementation for Snippetbox.
//!
//! This crate provides all database-related functionality using Diesel with SQLite.
//! It implements the repository trait defined in `snippetbox-core` and contains:
//! - Database initialisation and connection pooling
//! - Embedded Diesel migrations
//! - The single-writer actor that serialises writes
//! - The snippet repository and its Diesel model
//!
//! ```text
//! snippetbox-core (domain, traits)
//!          │
//!          ▼
//! storage-sqlite (this crate)
//!          │
//!          ▼
//!      SQLite DB
//! ```

pub mod config;
pub mod db;
pub mod errors;
pub mod schema;

pub mod snippets;

// Re-export database utilities
pub use db::{
    create_pool, get_connection, get_db_path, init, run_migrations, spawn_writer, DbConnection,
    DbPool, WriteHandle,
};

pub use config::StorageConfig;

// Re-export storage errors and conversion helpers
pub use errors::{IntoCore, StorageError};

pub use snippets::SnippetRepository;

// Re-export from snippetbox-core for convenience
pub use snippetbox_core::errors::{DatabaseError, Error, Result};
