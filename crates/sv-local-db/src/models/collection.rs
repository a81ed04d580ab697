//! Collections: named, ordered lists of snippets.

use rusqlite::params;
use serde::{Deserialize, Serialize};

/// Database model for a collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionRecord {
    pub id: i64,
    pub owner_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub is_public: i64,
    pub created_at: String,
    pub updated_at: String,
}

/// Database model for a collection membership row. Carries ordering, so it
/// is a first-class record rather than a bare join pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionSnippetRecord {
    pub id: i64,
    pub collection_id: i64,
    pub snippet_id: i64,
    pub position: i64,
    pub added_at: String,
}

/// Database operations for collections and their membership rows.
pub struct CollectionStore<'a> {
    conn: &'a rusqlite::Connection,
}

impl<'a> CollectionStore<'a> {
    pub fn new(conn: &'a rusqlite::Connection) -> Self {
        Self { conn }
    }

    pub fn insert(&self, record: &CollectionRecord) -> crate::Result<i64> {
        self.conn.execute(
            r#"
            INSERT INTO collections (owner_id, name, description, is_public,
                                     created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
            params![
                record.owner_id,
                record.name,
                record.description,
                record.is_public,
                record.created_at,
                record.updated_at
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn get(&self, id: i64) -> crate::Result<Option<CollectionRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, owner_id, name, description, is_public, created_at, updated_at
            FROM collections WHERE id = ?
            "#,
        )?;

        let mut rows = stmt.query_map(params![id], Self::map_row)?;

        match rows.next() {
            Some(Ok(record)) => Ok(Some(record)),
            Some(Err(e)) => Err(e.into()),
            None => Ok(None),
        }
    }

    pub fn list_for_owner(&self, owner_id: i64) -> crate::Result<Vec<CollectionRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, owner_id, name, description, is_public, created_at, updated_at
            FROM collections WHERE owner_id = ?
            ORDER BY created_at DESC, id DESC
            "#,
        )?;

        let records = stmt.query_map(params![owner_id], Self::map_row)?;

        let mut collections = Vec::new();
        for record in records {
            collections.push(record?);
        }
        Ok(collections)
    }

    /// Append a snippet at the given position. Returns false when the
    /// snippet is already in the collection.
    pub fn add_snippet(
        &self,
        collection_id: i64,
        snippet_id: i64,
        position: i64,
        added_at: &str,
    ) -> crate::Result<bool> {
        let affected = self.conn.execute(
            r#"
            INSERT OR IGNORE INTO collection_snippets (collection_id, snippet_id,
                                                       position, added_at)
            VALUES (?, ?, ?, ?)
            "#,
            params![collection_id, snippet_id, position, added_at],
        )?;
        Ok(affected == 1)
    }

    /// Remove a snippet from a collection. Returns false when it was not
    /// a member.
    pub fn remove_snippet(&self, collection_id: i64, snippet_id: i64) -> crate::Result<bool> {
        let affected = self.conn.execute(
            r#"
            DELETE FROM collection_snippets WHERE collection_id = ? AND snippet_id = ?
            "#,
            params![collection_id, snippet_id],
        )?;
        Ok(affected == 1)
    }

    /// Membership rows for a collection in display order.
    pub fn snippets_in(&self, collection_id: i64) -> crate::Result<Vec<CollectionSnippetRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, collection_id, snippet_id, position, added_at
            FROM collection_snippets WHERE collection_id = ?
            ORDER BY position ASC, id ASC
            "#,
        )?;

        let records = stmt.query_map(params![collection_id], |row| {
            Ok(CollectionSnippetRecord {
                id: row.get(0)?,
                collection_id: row.get(1)?,
                snippet_id: row.get(2)?,
                position: row.get(3)?,
                added_at: row.get(4)?,
            })
        })?;

        let mut members = Vec::new();
        for record in records {
            members.push(record?);
        }
        Ok(members)
    }

    /// Next free position at the end of a collection.
    pub fn next_position(&self, collection_id: i64) -> crate::Result<i64> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT COALESCE(MAX(position) + 1, 0) FROM collection_snippets
            WHERE collection_id = ?
            "#,
        )?;
        let position = stmt.query_row(params![collection_id], |row| row.get(0))?;
        Ok(position)
    }

    fn map_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<CollectionRecord> {
        Ok(CollectionRecord {
            id: row.get(0)?,
            owner_id: row.get(1)?,
            name: row.get(2)?,
            description: row.get(3)?,
            is_public: row.get(4)?,
            created_at: row.get(5)?,
            updated_at: row.get(6)?,
        })
    }
}
