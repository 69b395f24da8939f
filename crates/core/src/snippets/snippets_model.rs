//! Snippet domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum number of snippets returned by a "latest" query.
pub const LATEST_LIMIT: i64 = 10;

/// Domain model representing a stored snippet.
///
/// `created` and `expires` are stamped by the store's clock at insert time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Snippet {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub created: DateTime<Utc>,
    pub expires: DateTime<Utc>,
}

/// Largest `NewSnippet::expires_in_days` whose `expires` stays inside SQLite's
/// calendar (years 0000-9999) for inserts made before 2059.
pub const MAX_EXPIRES_IN_DAYS: u32 = 2_900_000;

/// Input model for creating a new snippet
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NewSnippet {
    pub title: String,
    pub content: String,
    /// Days until expiry. Zero stores a snippet that is never live; values
    /// above [`MAX_EXPIRES_IN_DAYS`] overflow the backend's calendar and the
    /// insert fails with a database error.
    pub expires_in_days: u32,
}

impl NewSnippet {
    pub fn new(title: impl Into<String>, content: impl Into<String>, expires_in_days: u32) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            expires_in_days,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_snippet_serializes_timestamps_as_rfc3339() {
        let created = Utc::now();
        let snippet = Snippet {
            id: 1,
            title: "An old silent pond".to_string(),
            content: "A frog jumps into the pond".to_string(),
            created,
            expires: created + Duration::days(1),
        };
        let json = serde_json::to_value(&snippet).unwrap();
        assert_eq!(json["id"], 1);
        assert_eq!(json["created"], serde_json::to_value(created).unwrap());
        let back: Snippet = serde_json::from_value(json).unwrap();
        assert_eq!(back, snippet);
    }

    #[test]
    fn test_serializes_camel_case() {
        let new_snippet = NewSnippet::new("Title", "Body", 7);
        let json = serde_json::to_value(&new_snippet).unwrap();
        assert_eq!(json["expiresInDays"], 7);
        assert_eq!(json["title"], "Title");
    }
}
