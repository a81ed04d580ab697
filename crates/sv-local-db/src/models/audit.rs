//! Append-only audit trail.

use rusqlite::params;
use serde::{Deserialize, Serialize};

/// Database model for one audit log entry. Rows are never updated or
/// deleted. `actor_id` is null for system-initiated writes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLogRecord {
    pub id: i64,
    pub actor_id: Option<i64>,
    pub action: String,
    pub entity_kind: String,
    pub entity_id: i64,
    pub detail: Option<String>,
    pub created_at: String,
}

/// Database operations for the audit trail.
pub struct AuditLogStore<'a> {
    conn: &'a rusqlite::Connection,
}

impl<'a> AuditLogStore<'a> {
    pub fn new(conn: &'a rusqlite::Connection) -> Self {
        Self { conn }
    }

    pub fn insert(&self, record: &AuditLogRecord) -> crate::Result<i64> {
        self.conn.execute(
            r#"
            INSERT INTO audit_logs (actor_id, action, entity_kind, entity_id, detail,
                                    created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
            params![
                record.actor_id,
                record.action,
                record.entity_kind,
                record.entity_id,
                record.detail,
                record.created_at
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Latest entries across all entities.
    pub fn list_recent(&self, limit: i64) -> crate::Result<Vec<AuditLogRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, actor_id, action, entity_kind, entity_id, detail, created_at
            FROM audit_logs
            ORDER BY created_at DESC, id DESC
            LIMIT ?
            "#,
        )?;

        let records = stmt.query_map(params![limit], Self::map_row)?;

        let mut entries = Vec::new();
        for record in records {
            entries.push(record?);
        }
        Ok(entries)
    }

    /// History for one entity, newest first.
    pub fn list_for_entity(
        &self,
        entity_kind: &str,
        entity_id: i64,
    ) -> crate::Result<Vec<AuditLogRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, actor_id, action, entity_kind, entity_id, detail, created_at
            FROM audit_logs WHERE entity_kind = ? AND entity_id = ?
            ORDER BY created_at DESC, id DESC
            "#,
        )?;

        let records = stmt.query_map(params![entity_kind, entity_id], Self::map_row)?;

        let mut entries = Vec::new();
        for record in records {
            entries.push(record?);
        }
        Ok(entries)
    }

    fn map_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<AuditLogRecord> {
        Ok(AuditLogRecord {
            id: row.get(0)?,
            actor_id: row.get(1)?,
            action: row.get(2)?,
            entity_kind: row.get(3)?,
            entity_id: row.get(4)?,
            detail: row.get(5)?,
            created_at: row.get(6)?,
        })
    }
}
