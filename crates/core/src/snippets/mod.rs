//! Snippets module - domain models and repository trait.

mod snippets_model;
mod snippets_traits;

pub use snippets_model::{NewSnippet, Snippet, LATEST_LIMIT, MAX_EXPIRES_IN_DAYS};
pub use snippets_traits::SnippetRepositoryTrait;
