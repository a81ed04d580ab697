//! Favorite rows linking users to snippets.

use rusqlite::params;
use serde::{Deserialize, Serialize};

/// Database model for a favorite. Unique per (user, snippet).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FavoriteRecord {
    pub id: i64,
    pub user_id: i64,
    pub snippet_id: i64,
    pub created_at: String,
}

/// Database operations for favorites.
pub struct FavoriteStore<'a> {
    conn: &'a rusqlite::Connection,
}

impl<'a> FavoriteStore<'a> {
    pub fn new(conn: &'a rusqlite::Connection) -> Self {
        Self { conn }
    }

    /// Add a favorite. Returns false when the pair already existed, so
    /// callers can skip the counter bump.
    pub fn insert(&self, user_id: i64, snippet_id: i64, created_at: &str) -> crate::Result<bool> {
        let affected = self.conn.execute(
            r#"
            INSERT OR IGNORE INTO favorites (user_id, snippet_id, created_at)
            VALUES (?, ?, ?)
            "#,
            params![user_id, snippet_id, created_at],
        )?;
        Ok(affected == 1)
    }

    /// Remove a favorite. Returns false when no pair existed.
    pub fn delete(&self, user_id: i64, snippet_id: i64) -> crate::Result<bool> {
        let affected = self.conn.execute(
            r#"
            DELETE FROM favorites WHERE user_id = ? AND snippet_id = ?
            "#,
            params![user_id, snippet_id],
        )?;
        Ok(affected == 1)
    }

    pub fn exists(&self, user_id: i64, snippet_id: i64) -> crate::Result<bool> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT COUNT(*) FROM favorites WHERE user_id = ? AND snippet_id = ?
            "#,
        )?;
        let count: i64 = stmt.query_row(params![user_id, snippet_id], |row| row.get(0))?;
        Ok(count > 0)
    }

    /// Snippet ids a user has favorited, newest first.
    pub fn snippet_ids_for_user(&self, user_id: i64) -> crate::Result<Vec<i64>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT snippet_id FROM favorites WHERE user_id = ?
            ORDER BY created_at DESC, id DESC
            "#,
        )?;

        let ids = stmt.query_map(params![user_id], |row| row.get(0))?;

        let mut snippet_ids = Vec::new();
        for id in ids {
            snippet_ids.push(id?);
        }
        Ok(snippet_ids)
    }
}
