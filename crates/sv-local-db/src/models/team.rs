//! Team records and persistence.

use rusqlite::params;
use serde::{Deserialize, Serialize};

/// Database model for teams.
///
/// `member_count` counts the implicit owner plus stored membership rows;
/// `snippet_count` counts non-deleted snippets assigned to the team. Both
/// are maintained by the adjustment methods below, never recomputed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamRecord {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub owner_id: i64,
    pub privacy: String,
    pub description: Option<String>,
    pub member_count: i64,
    pub snippet_count: i64,
    pub created_at: String,
    pub updated_at: String,
    pub deleted_at: Option<String>,
}

impl TeamRecord {
    /// Whether the team is tombstoned.
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// Database operations for teams.
pub struct TeamStore<'a> {
    conn: &'a rusqlite::Connection,
}

impl<'a> TeamStore<'a> {
    pub fn new(conn: &'a rusqlite::Connection) -> Self {
        Self { conn }
    }

    pub fn insert(&self, record: &TeamRecord) -> crate::Result<i64> {
        self.conn.execute(
            r#"
            INSERT INTO teams (name, slug, owner_id, privacy, description,
                               member_count, snippet_count, created_at, updated_at, deleted_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                record.name,
                record.slug,
                record.owner_id,
                record.privacy,
                record.description,
                record.member_count,
                record.snippet_count,
                record.created_at,
                record.updated_at,
                record.deleted_at
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn get(&self, id: i64) -> crate::Result<Option<TeamRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, name, slug, owner_id, privacy, description,
                   member_count, snippet_count, created_at, updated_at, deleted_at
            FROM teams WHERE id = ?
            "#,
        )?;

        let mut rows = stmt.query_map(params![id], Self::map_row)?;

        match rows.next() {
            Some(Ok(record)) => Ok(Some(record)),
            Some(Err(e)) => Err(e.into()),
            None => Ok(None),
        }
    }

    pub fn get_by_slug(&self, slug: &str) -> crate::Result<Option<TeamRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, name, slug, owner_id, privacy, description,
                   member_count, snippet_count, created_at, updated_at, deleted_at
            FROM teams WHERE slug = ?
            "#,
        )?;

        let mut rows = stmt.query_map(params![slug], Self::map_row)?;

        match rows.next() {
            Some(Ok(record)) => Ok(Some(record)),
            Some(Err(e)) => Err(e.into()),
            None => Ok(None),
        }
    }

    /// List non-deleted teams owned by the given user.
    pub fn list_for_owner(&self, owner_id: i64) -> crate::Result<Vec<TeamRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, name, slug, owner_id, privacy, description,
                   member_count, snippet_count, created_at, updated_at, deleted_at
            FROM teams WHERE owner_id = ? AND deleted_at IS NULL
            ORDER BY created_at DESC
            "#,
        )?;

        let records = stmt.query_map(params![owner_id], Self::map_row)?;

        let mut teams = Vec::new();
        for record in records {
            teams.push(record?);
        }
        Ok(teams)
    }

    /// Tombstone a team. Returns false if the team does not exist or was
    /// already deleted.
    pub fn soft_delete(&self, id: i64, deleted_at: &str) -> crate::Result<bool> {
        let affected = self.conn.execute(
            r#"
            UPDATE teams SET deleted_at = ? WHERE id = ? AND deleted_at IS NULL
            "#,
            params![deleted_at, id],
        )?;
        Ok(affected == 1)
    }

    /// Adjust member_count atomically; decrements never go below zero.
    pub fn adjust_member_count(&self, id: i64, delta: i64) -> crate::Result<()> {
        self.conn.execute(
            r#"
            UPDATE teams SET member_count = MAX(0, member_count + ?) WHERE id = ?
            "#,
            params![delta, id],
        )?;
        Ok(())
    }

    /// Adjust snippet_count atomically; decrements never go below zero.
    pub fn adjust_snippet_count(&self, id: i64, delta: i64) -> crate::Result<()> {
        self.conn.execute(
            r#"
            UPDATE teams SET snippet_count = MAX(0, snippet_count + ?) WHERE id = ?
            "#,
            params![delta, id],
        )?;
        Ok(())
    }

    fn map_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<TeamRecord> {
        Ok(TeamRecord {
            id: row.get(0)?,
            name: row.get(1)?,
            slug: row.get(2)?,
            owner_id: row.get(3)?,
            privacy: row.get(4)?,
            description: row.get(5)?,
            member_count: row.get(6)?,
            snippet_count: row.get(7)?,
            created_at: row.get(8)?,
            updated_at: row.get(9)?,
            deleted_at: row.get(10)?,
        })
    }
}
