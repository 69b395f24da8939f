//! SQLite storage implementation for snippets.

mod model;
mod repository;

pub use model::SnippetDB;
pub use repository::SnippetRepository;
