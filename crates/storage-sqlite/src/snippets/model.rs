//! Database models for snippets.

use chrono::{DateTime, NaiveDateTime, Utc};
use diesel::prelude::*;

/// Database model for snippets
///
/// Timestamps are UTC, written by SQLite as `YYYY-MM-DD HH:MM:SS.SSS`.
#[derive(QueryableByName, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::snippets)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct SnippetDB {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub created: NaiveDateTime,
    pub expires: NaiveDateTime,
}

// Conversion to domain model
impl From<SnippetDB> for snippetbox_core::snippets::Snippet {
    fn from(db: SnippetDB) -> Self {
        Self {
            id: db.id,
            title: db.title,
            content: db.content,
            created: DateTime::<Utc>::from_naive_utc_and_offset(db.created, Utc),
            expires: DateTime::<Utc>::from_naive_utc_and_offset(db.expires, Utc),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use snippetbox_core::snippets::Snippet;

    #[test]
    fn test_conversion_keeps_utc_wall_clock() {
        let created = NaiveDate::from_ymd_opt(2026, 10, 16)
            .unwrap()
            .and_hms_milli_opt(9, 30, 0, 125)
            .unwrap();
        let expires = created + chrono::Duration::days(7);
        let db = SnippetDB {
            id: 3,
            title: "Over the wintry forest".to_string(),
            content: "Winds howl in rage with no leaves to blow.".to_string(),
            created,
            expires,
        };

        let snippet = Snippet::from(db.clone());

        assert_eq!(snippet.id, 3);
        assert_eq!(snippet.title, db.title);
        assert_eq!(snippet.created.naive_utc(), created);
        assert_eq!(snippet.expires - snippet.created, chrono::Duration::days(7));
    }
}
