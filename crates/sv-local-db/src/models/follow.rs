//! Follow edges between users.

use rusqlite::params;
use serde::{Deserialize, Serialize};

/// Database model for a follow edge. Unique per (follower, followed).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FollowRecord {
    pub id: i64,
    pub follower_id: i64,
    pub followed_id: i64,
    pub created_at: String,
}

/// Database operations for follows.
pub struct FollowStore<'a> {
    conn: &'a rusqlite::Connection,
}

impl<'a> FollowStore<'a> {
    pub fn new(conn: &'a rusqlite::Connection) -> Self {
        Self { conn }
    }

    /// Add a follow edge. Returns false when it already existed.
    pub fn insert(
        &self,
        follower_id: i64,
        followed_id: i64,
        created_at: &str,
    ) -> crate::Result<bool> {
        let affected = self.conn.execute(
            r#"
            INSERT OR IGNORE INTO follows (follower_id, followed_id, created_at)
            VALUES (?, ?, ?)
            "#,
            params![follower_id, followed_id, created_at],
        )?;
        Ok(affected == 1)
    }

    /// Remove a follow edge. Returns false when none existed.
    pub fn delete(&self, follower_id: i64, followed_id: i64) -> crate::Result<bool> {
        let affected = self.conn.execute(
            r#"
            DELETE FROM follows WHERE follower_id = ? AND followed_id = ?
            "#,
            params![follower_id, followed_id],
        )?;
        Ok(affected == 1)
    }

    pub fn exists(&self, follower_id: i64, followed_id: i64) -> crate::Result<bool> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT COUNT(*) FROM follows WHERE follower_id = ? AND followed_id = ?
            "#,
        )?;
        let count: i64 = stmt.query_row(params![follower_id, followed_id], |row| row.get(0))?;
        Ok(count > 0)
    }

    /// Users following the given user.
    pub fn follower_ids(&self, followed_id: i64) -> crate::Result<Vec<i64>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT follower_id FROM follows WHERE followed_id = ?
            ORDER BY created_at DESC, id DESC
            "#,
        )?;

        let ids = stmt.query_map(params![followed_id], |row| row.get(0))?;

        let mut follower_ids = Vec::new();
        for id in ids {
            follower_ids.push(id?);
        }
        Ok(follower_ids)
    }

    /// Users the given user follows.
    pub fn followed_ids(&self, follower_id: i64) -> crate::Result<Vec<i64>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT followed_id FROM follows WHERE follower_id = ?
            ORDER BY created_at DESC, id DESC
            "#,
        )?;

        let ids = stmt.query_map(params![follower_id], |row| row.get(0))?;

        let mut followed_ids = Vec::new();
        for id in ids {
            followed_ids.push(id?);
        }
        Ok(followed_ids)
    }
}
