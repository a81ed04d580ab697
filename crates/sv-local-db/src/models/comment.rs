//! Comments on snippets.

use rusqlite::params;
use serde::{Deserialize, Serialize};

/// Database model for a comment. `parent_id` threads replies; deletion is
/// a tombstone so replies keep their anchor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentRecord {
    pub id: i64,
    pub snippet_id: i64,
    pub author_id: i64,
    pub body: String,
    pub parent_id: Option<i64>,
    pub created_at: String,
    pub updated_at: String,
    pub deleted_at: Option<String>,
}

/// Database operations for comments.
pub struct CommentStore<'a> {
    conn: &'a rusqlite::Connection,
}

impl<'a> CommentStore<'a> {
    pub fn new(conn: &'a rusqlite::Connection) -> Self {
        Self { conn }
    }

    pub fn insert(&self, record: &CommentRecord) -> crate::Result<i64> {
        self.conn.execute(
            r#"
            INSERT INTO comments (snippet_id, author_id, body, parent_id,
                                  created_at, updated_at, deleted_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                record.snippet_id,
                record.author_id,
                record.body,
                record.parent_id,
                record.created_at,
                record.updated_at,
                record.deleted_at
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn get(&self, id: i64) -> crate::Result<Option<CommentRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, snippet_id, author_id, body, parent_id,
                   created_at, updated_at, deleted_at
            FROM comments WHERE id = ?
            "#,
        )?;

        let mut rows = stmt.query_map(params![id], Self::map_row)?;

        match rows.next() {
            Some(Ok(record)) => Ok(Some(record)),
            Some(Err(e)) => Err(e.into()),
            None => Ok(None),
        }
    }

    /// Non-deleted comments on a snippet, oldest first.
    pub fn list_for_snippet(&self, snippet_id: i64) -> crate::Result<Vec<CommentRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, snippet_id, author_id, body, parent_id,
                   created_at, updated_at, deleted_at
            FROM comments WHERE snippet_id = ? AND deleted_at IS NULL
            ORDER BY created_at ASC, id ASC
            "#,
        )?;

        let records = stmt.query_map(params![snippet_id], Self::map_row)?;

        let mut comments = Vec::new();
        for record in records {
            comments.push(record?);
        }
        Ok(comments)
    }

    /// Tombstone a comment. Returns false if it does not exist or was
    /// already deleted.
    pub fn soft_delete(&self, id: i64, deleted_at: &str) -> crate::Result<bool> {
        let affected = self.conn.execute(
            r#"
            UPDATE comments SET deleted_at = ? WHERE id = ? AND deleted_at IS NULL
            "#,
            params![deleted_at, id],
        )?;
        Ok(affected == 1)
    }

    fn map_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<CommentRecord> {
        Ok(CommentRecord {
            id: row.get(0)?,
            snippet_id: row.get(1)?,
            author_id: row.get(2)?,
            body: row.get(3)?,
            parent_id: row.get(4)?,
            created_at: row.get(5)?,
            updated_at: row.get(6)?,
            deleted_at: row.get(7)?,
        })
    }
}
