use crate::context::RequestContext;
use crate::errors::Result;
use crate::snippets::snippets_model::{NewSnippet, Snippet};
use async_trait::async_trait;

/// Trait for snippet repository operations
///
/// Liveness is judged against the backend's clock, never the caller's.
#[async_trait]
pub trait SnippetRepositoryTrait: Send + Sync {
    /// Stores a snippet expiring `expires_in_days` days from now and returns its id.
    async fn insert(&self, ctx: &RequestContext, new_snippet: NewSnippet) -> Result<i64>;

    /// Fetches a live snippet; unknown and expired ids both yield `DatabaseError::NotFound`.
    async fn get(&self, ctx: &RequestContext, snippet_id: i64) -> Result<Snippet>;

    /// Up to [`LATEST_LIMIT`](crate::snippets::LATEST_LIMIT) live snippets, highest id first.
    async fn latest(&self, ctx: &RequestContext) -> Result<Vec<Snippet>>;
}
