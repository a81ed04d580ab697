//! Snippet records and persistence.

use rusqlite::params;
use serde::{Deserialize, Serialize};

/// Database model for snippets.
///
/// `version_number` always matches the highest row in snippet_versions for
/// this snippet. `parent_id` records fork lineage. Counters are denormalized
/// and adjusted alongside the writes that change them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnippetRecord {
    pub id: i64,
    pub owner_id: i64,
    pub team_id: Option<i64>,
    pub title: String,
    pub description: Option<String>,
    pub language: String,
    pub code: String,
    pub privacy: String,
    pub version_number: i64,
    pub parent_id: Option<i64>,
    pub view_count: i64,
    pub unique_view_count: i64,
    pub fork_count: i64,
    pub favorite_count: i64,
    pub comment_count: i64,
    pub share_count: i64,
    pub created_at: String,
    pub updated_at: String,
    pub deleted_at: Option<String>,
}

impl SnippetRecord {
    /// Whether the snippet is tombstoned.
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

const SNIPPET_COLUMNS: &str = r#"id, owner_id, team_id, title, description, language, code,
                   privacy, version_number, parent_id, view_count, unique_view_count,
                   fork_count, favorite_count, comment_count, share_count,
                   created_at, updated_at, deleted_at"#;

/// Database operations for snippets.
pub struct SnippetStore<'a> {
    conn: &'a rusqlite::Connection,
}

impl<'a> SnippetStore<'a> {
    pub fn new(conn: &'a rusqlite::Connection) -> Self {
        Self { conn }
    }

    pub fn insert(&self, record: &SnippetRecord) -> crate::Result<i64> {
        self.conn.execute(
            r#"
            INSERT INTO snippets (owner_id, team_id, title, description, language, code,
                                  privacy, version_number, parent_id, view_count,
                                  unique_view_count, fork_count, favorite_count,
                                  comment_count, share_count, created_at, updated_at,
                                  deleted_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                record.owner_id,
                record.team_id,
                record.title,
                record.description,
                record.language,
                record.code,
                record.privacy,
                record.version_number,
                record.parent_id,
                record.view_count,
                record.unique_view_count,
                record.fork_count,
                record.favorite_count,
                record.comment_count,
                record.share_count,
                record.created_at,
                record.updated_at,
                record.deleted_at
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn get(&self, id: i64) -> crate::Result<Option<SnippetRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {SNIPPET_COLUMNS} FROM snippets WHERE id = ?"
        ))?;

        let mut rows = stmt.query_map(params![id], Self::map_row)?;

        match rows.next() {
            Some(Ok(record)) => Ok(Some(record)),
            Some(Err(e)) => Err(e.into()),
            None => Ok(None),
        }
    }

    /// Advance the head code and version number, guarded by the version the
    /// caller read. Returns false when the guard missed, which means a
    /// concurrent writer got there first.
    pub fn update_head(
        &self,
        id: i64,
        code: &str,
        expected_version: i64,
        updated_at: &str,
    ) -> crate::Result<bool> {
        let affected = self.conn.execute(
            r#"
            UPDATE snippets
            SET code = ?, version_number = version_number + 1, updated_at = ?
            WHERE id = ? AND version_number = ? AND deleted_at IS NULL
            "#,
            params![code, updated_at, id, expected_version],
        )?;
        Ok(affected == 1)
    }

    /// Update descriptive fields and privacy without touching the code or
    /// version number.
    pub fn update_meta(
        &self,
        id: i64,
        title: &str,
        description: Option<&str>,
        language: &str,
        privacy: &str,
        team_id: Option<i64>,
        updated_at: &str,
    ) -> crate::Result<bool> {
        let affected = self.conn.execute(
            r#"
            UPDATE snippets
            SET title = ?, description = ?, language = ?, privacy = ?, team_id = ?,
                updated_at = ?
            WHERE id = ? AND deleted_at IS NULL
            "#,
            params![title, description, language, privacy, team_id, updated_at, id],
        )?;
        Ok(affected == 1)
    }

    /// Tombstone a snippet. Returns false if it does not exist or was
    /// already deleted.
    pub fn soft_delete(&self, id: i64, deleted_at: &str) -> crate::Result<bool> {
        let affected = self.conn.execute(
            r#"
            UPDATE snippets SET deleted_at = ? WHERE id = ? AND deleted_at IS NULL
            "#,
            params![deleted_at, id],
        )?;
        Ok(affected == 1)
    }

    /// Clear a tombstone. Returns false if the snippet is not deleted.
    pub fn restore(&self, id: i64, updated_at: &str) -> crate::Result<bool> {
        let affected = self.conn.execute(
            r#"
            UPDATE snippets SET deleted_at = NULL, updated_at = ?
            WHERE id = ? AND deleted_at IS NOT NULL
            "#,
            params![updated_at, id],
        )?;
        Ok(affected == 1)
    }

    /// Bump view_count, and unique_view_count too when the viewer
    /// fingerprint was seen for the first time.
    pub fn increment_view_counts(&self, id: i64, first_visit: bool) -> crate::Result<()> {
        if first_visit {
            self.conn.execute(
                r#"
                UPDATE snippets
                SET view_count = view_count + 1, unique_view_count = unique_view_count + 1
                WHERE id = ?
                "#,
                params![id],
            )?;
        } else {
            self.conn.execute(
                r#"
                UPDATE snippets SET view_count = view_count + 1 WHERE id = ?
                "#,
                params![id],
            )?;
        }
        Ok(())
    }

    /// Adjust favorite_count atomically; decrements never go below zero.
    pub fn adjust_favorite_count(&self, id: i64, delta: i64) -> crate::Result<()> {
        self.conn.execute(
            r#"
            UPDATE snippets SET favorite_count = MAX(0, favorite_count + ?) WHERE id = ?
            "#,
            params![delta, id],
        )?;
        Ok(())
    }

    /// Adjust comment_count atomically; decrements never go below zero.
    pub fn adjust_comment_count(&self, id: i64, delta: i64) -> crate::Result<()> {
        self.conn.execute(
            r#"
            UPDATE snippets SET comment_count = MAX(0, comment_count + ?) WHERE id = ?
            "#,
            params![delta, id],
        )?;
        Ok(())
    }

    pub fn increment_fork_count(&self, id: i64) -> crate::Result<()> {
        self.conn.execute(
            r#"
            UPDATE snippets SET fork_count = fork_count + 1 WHERE id = ?
            "#,
            params![id],
        )?;
        Ok(())
    }

    pub fn increment_share_count(&self, id: i64) -> crate::Result<()> {
        self.conn.execute(
            r#"
            UPDATE snippets SET share_count = share_count + 1 WHERE id = ?
            "#,
            params![id],
        )?;
        Ok(())
    }

    /// List non-deleted snippets owned by a user, newest first.
    pub fn list_by_owner(&self, owner_id: i64) -> crate::Result<Vec<SnippetRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            r#"
            SELECT {SNIPPET_COLUMNS} FROM snippets
            WHERE owner_id = ? AND deleted_at IS NULL
            ORDER BY created_at DESC, id DESC
            "#
        ))?;

        let records = stmt.query_map(params![owner_id], Self::map_row)?;

        let mut snippets = Vec::new();
        for record in records {
            snippets.push(record?);
        }
        Ok(snippets)
    }

    /// List non-deleted public snippets, newest first.
    pub fn list_public(&self, limit: i64) -> crate::Result<Vec<SnippetRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            r#"
            SELECT {SNIPPET_COLUMNS} FROM snippets
            WHERE privacy = 'public' AND deleted_at IS NULL
            ORDER BY created_at DESC, id DESC
            LIMIT ?
            "#
        ))?;

        let records = stmt.query_map(params![limit], Self::map_row)?;

        let mut snippets = Vec::new();
        for record in records {
            snippets.push(record?);
        }
        Ok(snippets)
    }

    /// List non-deleted snippets assigned to a team, newest first.
    pub fn list_for_team(&self, team_id: i64) -> crate::Result<Vec<SnippetRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            r#"
            SELECT {SNIPPET_COLUMNS} FROM snippets
            WHERE team_id = ? AND deleted_at IS NULL
            ORDER BY created_at DESC, id DESC
            "#
        ))?;

        let records = stmt.query_map(params![team_id], Self::map_row)?;

        let mut snippets = Vec::new();
        for record in records {
            snippets.push(record?);
        }
        Ok(snippets)
    }

    fn map_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<SnippetRecord> {
        Ok(SnippetRecord {
            id: row.get(0)?,
            owner_id: row.get(1)?,
            team_id: row.get(2)?,
            title: row.get(3)?,
            description: row.get(4)?,
            language: row.get(5)?,
            code: row.get(6)?,
            privacy: row.get(7)?,
            version_number: row.get(8)?,
            parent_id: row.get(9)?,
            view_count: row.get(10)?,
            unique_view_count: row.get(11)?,
            fork_count: row.get(12)?,
            favorite_count: row.get(13)?,
            comment_count: row.get(14)?,
            share_count: row.get(15)?,
            created_at: row.get(16)?,
            updated_at: row.get(17)?,
            deleted_at: row.get(18)?,
        })
    }
}
