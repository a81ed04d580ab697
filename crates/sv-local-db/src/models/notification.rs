//! In-store notification records.

use rusqlite::params;
use serde::{Deserialize, Serialize};

/// Database model for a notification. `data` holds optional JSON payload
/// serialized by the caller; delivery channels live outside this store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationRecord {
    pub id: i64,
    pub user_id: i64,
    pub kind: String,
    pub subject: String,
    pub data: Option<String>,
    pub read_at: Option<String>,
    pub created_at: String,
}

/// Database operations for notifications.
pub struct NotificationStore<'a> {
    conn: &'a rusqlite::Connection,
}

impl<'a> NotificationStore<'a> {
    pub fn new(conn: &'a rusqlite::Connection) -> Self {
        Self { conn }
    }

    pub fn insert(&self, record: &NotificationRecord) -> crate::Result<i64> {
        self.conn.execute(
            r#"
            INSERT INTO notifications (user_id, kind, subject, data, read_at, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
            params![
                record.user_id,
                record.kind,
                record.subject,
                record.data,
                record.read_at,
                record.created_at
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Notifications for a user, newest first.
    pub fn list_for_user(&self, user_id: i64, limit: i64) -> crate::Result<Vec<NotificationRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, user_id, kind, subject, data, read_at, created_at
            FROM notifications WHERE user_id = ?
            ORDER BY created_at DESC, id DESC
            LIMIT ?
            "#,
        )?;

        let records = stmt.query_map(params![user_id, limit], Self::map_row)?;

        let mut notifications = Vec::new();
        for record in records {
            notifications.push(record?);
        }
        Ok(notifications)
    }

    /// Mark one of a user's notifications read. Returns false when it does
    /// not exist, belongs to someone else, or was already read.
    pub fn mark_read(&self, id: i64, user_id: i64, read_at: &str) -> crate::Result<bool> {
        let affected = self.conn.execute(
            r#"
            UPDATE notifications SET read_at = ?
            WHERE id = ? AND user_id = ? AND read_at IS NULL
            "#,
            params![read_at, id, user_id],
        )?;
        Ok(affected == 1)
    }

    /// Mark everything unread for a user as read; returns how many rows
    /// were touched.
    pub fn mark_all_read(&self, user_id: i64, read_at: &str) -> crate::Result<usize> {
        let affected = self.conn.execute(
            r#"
            UPDATE notifications SET read_at = ? WHERE user_id = ? AND read_at IS NULL
            "#,
            params![read_at, user_id],
        )?;
        Ok(affected)
    }

    pub fn unread_count(&self, user_id: i64) -> crate::Result<i64> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT COUNT(*) FROM notifications WHERE user_id = ? AND read_at IS NULL
            "#,
        )?;
        let count = stmt.query_row(params![user_id], |row| row.get(0))?;
        Ok(count)
    }

    fn map_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<NotificationRecord> {
        Ok(NotificationRecord {
            id: row.get(0)?,
            user_id: row.get(1)?,
            kind: row.get(2)?,
            subject: row.get(3)?,
            data: row.get(4)?,
            read_at: row.get(5)?,
            created_at: row.get(6)?,
        })
    }
}
