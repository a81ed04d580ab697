//! Tags, the snippet-tag join table, and the usage ledger counter.

use rusqlite::params;
use serde::{Deserialize, Serialize};

/// Database model for tags.
///
/// Tag names are unique under SQLite's default BINARY collation, so
/// `Python` and `python` are distinct tags. `usage_count` tracks how many
/// snippets currently carry the tag; rows are kept at zero rather than
/// deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagRecord {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub usage_count: i64,
    pub created_at: String,
}

/// Database operations for tags and snippet-tag attachments.
pub struct TagStore<'a> {
    conn: &'a rusqlite::Connection,
}

impl<'a> TagStore<'a> {
    pub fn new(conn: &'a rusqlite::Connection) -> Self {
        Self { conn }
    }

    pub fn insert(&self, record: &TagRecord) -> crate::Result<i64> {
        self.conn.execute(
            r#"
            INSERT INTO tags (name, slug, usage_count, created_at)
            VALUES (?, ?, ?, ?)
            "#,
            params![record.name, record.slug, record.usage_count, record.created_at],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn get(&self, id: i64) -> crate::Result<Option<TagRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, name, slug, usage_count, created_at FROM tags WHERE id = ?
            "#,
        )?;

        let mut rows = stmt.query_map(params![id], Self::map_row)?;

        match rows.next() {
            Some(Ok(record)) => Ok(Some(record)),
            Some(Err(e)) => Err(e.into()),
            None => Ok(None),
        }
    }

    /// Exact-match lookup; tag names are case sensitive.
    pub fn get_by_name(&self, name: &str) -> crate::Result<Option<TagRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, name, slug, usage_count, created_at FROM tags WHERE name = ?
            "#,
        )?;

        let mut rows = stmt.query_map(params![name], Self::map_row)?;

        match rows.next() {
            Some(Ok(record)) => Ok(Some(record)),
            Some(Err(e)) => Err(e.into()),
            None => Ok(None),
        }
    }

    pub fn increment_usage(&self, id: i64) -> crate::Result<()> {
        self.conn.execute(
            r#"
            UPDATE tags SET usage_count = usage_count + 1 WHERE id = ?
            "#,
            params![id],
        )?;
        Ok(())
    }

    /// Decrement a tag's usage count, clamped at zero.
    pub fn decrement_usage(&self, id: i64) -> crate::Result<()> {
        let changed = self.conn.execute(
            r#"
            UPDATE tags SET usage_count = usage_count - 1 WHERE id = ? AND usage_count > 0
            "#,
            params![id],
        )?;
        if changed == 0 {
            tracing::warn!(tag_id = id, "usage decrement clamped at zero");
        }
        Ok(())
    }

    /// Attach a tag to a snippet. Returns false when the pair already
    /// existed, so callers can skip the usage bump.
    pub fn attach(&self, snippet_id: i64, tag_id: i64) -> crate::Result<bool> {
        let affected = self.conn.execute(
            r#"
            INSERT OR IGNORE INTO snippet_tags (snippet_id, tag_id) VALUES (?, ?)
            "#,
            params![snippet_id, tag_id],
        )?;
        Ok(affected == 1)
    }

    /// Detach a tag from a snippet. Returns false when no pair existed.
    pub fn detach(&self, snippet_id: i64, tag_id: i64) -> crate::Result<bool> {
        let affected = self.conn.execute(
            r#"
            DELETE FROM snippet_tags WHERE snippet_id = ? AND tag_id = ?
            "#,
            params![snippet_id, tag_id],
        )?;
        Ok(affected == 1)
    }

    /// Tags currently attached to a snippet, by name.
    pub fn tags_for_snippet(&self, snippet_id: i64) -> crate::Result<Vec<TagRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT t.id, t.name, t.slug, t.usage_count, t.created_at
            FROM tags t
            JOIN snippet_tags st ON st.tag_id = t.id
            WHERE st.snippet_id = ?
            ORDER BY t.name ASC
            "#,
        )?;

        let records = stmt.query_map(params![snippet_id], Self::map_row)?;

        let mut tags = Vec::new();
        for record in records {
            tags.push(record?);
        }
        Ok(tags)
    }

    /// Most-used tags first, then by name for a stable order.
    pub fn list_top(&self, limit: i64) -> crate::Result<Vec<TagRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, name, slug, usage_count, created_at FROM tags
            ORDER BY usage_count DESC, name ASC
            LIMIT ?
            "#,
        )?;

        let records = stmt.query_map(params![limit], Self::map_row)?;

        let mut tags = Vec::new();
        for record in records {
            tags.push(record?);
        }
        Ok(tags)
    }

    fn map_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<TagRecord> {
        Ok(TagRecord {
            id: row.get(0)?,
            name: row.get(1)?,
            slug: row.get(2)?,
            usage_count: row.get(3)?,
            created_at: row.get(4)?,
        })
    }
}
