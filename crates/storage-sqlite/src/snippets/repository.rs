use async_trait::async_trait;
use diesel::prelude::*;
use diesel::sql_query;
use diesel::sql_types::{BigInt, Text};
use diesel::SqliteConnection;
use log::{debug, warn};
use std::sync::Arc;

use snippetbox_core::errors::{DatabaseError, Error};
use snippetbox_core::snippets::{NewSnippet, Snippet, SnippetRepositoryTrait, LATEST_LIMIT};
use snippetbox_core::{RequestContext, Result};

use super::model::SnippetDB;
use crate::db::{get_connection, run_blocking, DbPool, WriteHandle};
use crate::errors::IntoCore;

// All timestamps come from SQLite's clock. 'now' is fixed for the duration of
// a statement, so `created` and `expires` share one instant.
const INSERT_SNIPPET_SQL: &str = "
    INSERT INTO snippets (title, content, created, expires)
    VALUES (
        ?,
        ?,
        strftime('%Y-%m-%d %H:%M:%f', 'now'),
        strftime('%Y-%m-%d %H:%M:%f', 'now', '+' || ? || ' days')
    )
    RETURNING id";

const GET_LIVE_SNIPPET_SQL: &str = "
    SELECT id, title, content, created, expires
    FROM snippets
    WHERE expires > strftime('%Y-%m-%d %H:%M:%f', 'now') AND id = ?";

const LATEST_LIVE_SNIPPETS_SQL: &str = "
    SELECT id, title, content, created, expires
    FROM snippets
    WHERE expires > strftime('%Y-%m-%d %H:%M:%f', 'now')
    ORDER BY id DESC
    LIMIT ?";

#[derive(QueryableByName)]
struct InsertedId {
    #[diesel(sql_type = BigInt)]
    id: i64,
}

pub struct SnippetRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl SnippetRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        SnippetRepository { pool, writer }
    }
}

fn insert_snippet(conn: &mut SqliteConnection, new_snippet: &NewSnippet) -> Result<i64> {
    let inserted = sql_query(INSERT_SNIPPET_SQL)
        .bind::<Text, _>(&new_snippet.title)
        .bind::<Text, _>(&new_snippet.content)
        .bind::<BigInt, _>(i64::from(new_snippet.expires_in_days))
        .get_result::<InsertedId>(conn)
        .into_core()?;
    Ok(inserted.id)
}

fn load_live_snippet(conn: &mut SqliteConnection, snippet_id: i64) -> Result<Snippet> {
    sql_query(GET_LIVE_SNIPPET_SQL)
        .bind::<BigInt, _>(snippet_id)
        .get_result::<SnippetDB>(conn)
        .optional()
        .into_core()?
        .map(Snippet::from)
        .ok_or_else(|| {
            Error::Database(DatabaseError::NotFound(format!("snippet {snippet_id}")))
        })
}

fn load_latest_snippets(conn: &mut SqliteConnection) -> Result<Vec<Snippet>> {
    let snippets_db = sql_query(LATEST_LIVE_SNIPPETS_SQL)
        .bind::<BigInt, _>(LATEST_LIMIT)
        .load::<SnippetDB>(conn)
        .into_core()?;
    Ok(snippets_db.into_iter().map(Snippet::from).collect())
}

fn log_failure(op: &str, err: &Error) {
    if err.is_cancelled() {
        warn!("{} abandoned: {}", op, err);
    } else if !err.is_not_found() {
        warn!("{} failed: {}", op, err);
    }
}

#[async_trait]
impl SnippetRepositoryTrait for SnippetRepository {
    async fn insert(&self, ctx: &RequestContext, new_snippet: NewSnippet) -> Result<i64> {
        let job_ctx = ctx.clone();
        let write = self
            .writer
            .exec(move |conn: &mut SqliteConnection| -> Result<i64> {
                job_ctx.check()?;
                let new_id = insert_snippet(conn, &new_snippet)?;
                // Rolls the row back if the caller gave up while it was written.
                job_ctx.check()?;
                Ok(new_id)
            });

        let new_id = ctx
            .run(write)
            .await
            .inspect_err(|e| log_failure("insert snippet", e))?;
        debug!("Inserted snippet {}", new_id);
        Ok(new_id)
    }

    async fn get(&self, ctx: &RequestContext, snippet_id: i64) -> Result<Snippet> {
        let pool = Arc::clone(&self.pool);
        ctx.run(run_blocking(move || {
            let mut conn = get_connection(&pool)?;
            load_live_snippet(&mut conn, snippet_id)
        }))
        .await
        .inspect_err(|e| log_failure("get snippet", e))
    }

    async fn latest(&self, ctx: &RequestContext) -> Result<Vec<Snippet>> {
        let pool = Arc::clone(&self.pool);
        let snippets = ctx
            .run(run_blocking(move || {
                let mut conn = get_connection(&pool)?;
                load_latest_snippets(&mut conn)
            }))
            .await
            .inspect_err(|e| log_failure("latest snippets", e))?;
        debug!("Loaded {} live snippets", snippets.len());
        Ok(snippets)
    }
}
