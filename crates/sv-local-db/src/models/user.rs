//! User records and persistence.

use rusqlite::params;
use serde::{Deserialize, Serialize};

/// Database model for user accounts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub display_name: Option<String>,
    pub created_at: String,
}

/// Database operations for users.
pub struct UserStore<'a> {
    conn: &'a rusqlite::Connection,
}

impl<'a> UserStore<'a> {
    pub fn new(conn: &'a rusqlite::Connection) -> Self {
        Self { conn }
    }

    pub fn insert(&self, record: &UserRecord) -> crate::Result<i64> {
        self.conn.execute(
            r#"
            INSERT INTO users (username, email, display_name, created_at)
            VALUES (?, ?, ?, ?)
            "#,
            params![record.username, record.email, record.display_name, record.created_at],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn get(&self, id: i64) -> crate::Result<Option<UserRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, username, email, display_name, created_at
            FROM users WHERE id = ?
            "#,
        )?;

        let mut rows = stmt.query_map(params![id], Self::map_row)?;

        match rows.next() {
            Some(Ok(record)) => Ok(Some(record)),
            Some(Err(e)) => Err(e.into()),
            None => Ok(None),
        }
    }

    pub fn get_by_username(&self, username: &str) -> crate::Result<Option<UserRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, username, email, display_name, created_at
            FROM users WHERE username = ?
            "#,
        )?;

        let mut rows = stmt.query_map(params![username], Self::map_row)?;

        match rows.next() {
            Some(Ok(record)) => Ok(Some(record)),
            Some(Err(e)) => Err(e.into()),
            None => Ok(None),
        }
    }

    pub fn get_by_email(&self, email: &str) -> crate::Result<Option<UserRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, username, email, display_name, created_at
            FROM users WHERE email = ?
            "#,
        )?;

        let mut rows = stmt.query_map(params![email], Self::map_row)?;

        match rows.next() {
            Some(Ok(record)) => Ok(Some(record)),
            Some(Err(e)) => Err(e.into()),
            None => Ok(None),
        }
    }

    fn map_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserRecord> {
        Ok(UserRecord {
            id: row.get(0)?,
            username: row.get(1)?,
            email: row.get(2)?,
            display_name: row.get(3)?,
            created_at: row.get(4)?,
        })
    }
}
