//! Append-only snippet version history.

use rusqlite::params;
use serde::{Deserialize, Serialize};

/// Database model for one immutable version of a snippet's code.
///
/// Rows are never updated after insert. `lines_added` and `lines_removed`
/// describe the change against the previous version; version 1 counts the
/// whole body as added.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnippetVersionRecord {
    pub id: i64,
    pub snippet_id: i64,
    pub version_number: i64,
    pub code: String,
    pub change_type: String,
    pub lines_added: i64,
    pub lines_removed: i64,
    pub summary: Option<String>,
    pub author_id: Option<i64>,
    pub created_at: String,
}

/// Database operations for snippet versions.
pub struct SnippetVersionStore<'a> {
    conn: &'a rusqlite::Connection,
}

impl<'a> SnippetVersionStore<'a> {
    pub fn new(conn: &'a rusqlite::Connection) -> Self {
        Self { conn }
    }

    pub fn insert(&self, record: &SnippetVersionRecord) -> crate::Result<i64> {
        self.conn.execute(
            r#"
            INSERT INTO snippet_versions (snippet_id, version_number, code, change_type,
                                          lines_added, lines_removed, summary, author_id,
                                          created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                record.snippet_id,
                record.version_number,
                record.code,
                record.change_type,
                record.lines_added,
                record.lines_removed,
                record.summary,
                record.author_id,
                record.created_at
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn get(
        &self,
        snippet_id: i64,
        version_number: i64,
    ) -> crate::Result<Option<SnippetVersionRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, snippet_id, version_number, code, change_type,
                   lines_added, lines_removed, summary, author_id, created_at
            FROM snippet_versions WHERE snippet_id = ? AND version_number = ?
            "#,
        )?;

        let mut rows = stmt.query_map(params![snippet_id, version_number], Self::map_row)?;

        match rows.next() {
            Some(Ok(record)) => Ok(Some(record)),
            Some(Err(e)) => Err(e.into()),
            None => Ok(None),
        }
    }

    /// List a snippet's full history, oldest first.
    pub fn list_for(&self, snippet_id: i64) -> crate::Result<Vec<SnippetVersionRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, snippet_id, version_number, code, change_type,
                   lines_added, lines_removed, summary, author_id, created_at
            FROM snippet_versions WHERE snippet_id = ?
            ORDER BY version_number ASC
            "#,
        )?;

        let records = stmt.query_map(params![snippet_id], Self::map_row)?;

        let mut versions = Vec::new();
        for record in records {
            versions.push(record?);
        }
        Ok(versions)
    }

    fn map_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<SnippetVersionRecord> {
        Ok(SnippetVersionRecord {
            id: row.get(0)?,
            snippet_id: row.get(1)?,
            version_number: row.get(2)?,
            code: row.get(3)?,
            change_type: row.get(4)?,
            lines_added: row.get(5)?,
            lines_removed: row.get(6)?,
            summary: row.get(7)?,
            author_id: row.get(8)?,
            created_at: row.get(9)?,
        })
    }
}
