//! Share grants on snippets.

use rusqlite::params;
use serde::{Deserialize, Serialize};

/// Database model for a share grant.
///
/// Exactly one grantee field is set depending on `share_type`: a link share
/// carries a token and no grantee, user/team/email shares name the grantee
/// and carry no token. Expiry is evaluated lazily against `expires_at`;
/// nothing flips rows in the background.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShareRecord {
    pub id: i64,
    pub snippet_id: i64,
    pub granter_id: i64,
    pub share_type: String,
    pub grantee_user_id: Option<i64>,
    pub grantee_team_id: Option<i64>,
    pub grantee_email: Option<String>,
    pub permission: String,
    pub token: Option<String>,
    pub expires_at: Option<String>,
    pub access_count: i64,
    pub last_accessed_at: Option<String>,
    pub is_active: i64,
    pub created_at: String,
}

const SHARE_COLUMNS: &str = r#"id, snippet_id, granter_id, share_type, grantee_user_id,
                   grantee_team_id, grantee_email, permission, token, expires_at,
                   access_count, last_accessed_at, is_active, created_at"#;

/// Database operations for share grants.
pub struct ShareStore<'a> {
    conn: &'a rusqlite::Connection,
}

impl<'a> ShareStore<'a> {
    pub fn new(conn: &'a rusqlite::Connection) -> Self {
        Self { conn }
    }

    pub fn insert(&self, record: &ShareRecord) -> crate::Result<i64> {
        self.conn.execute(
            r#"
            INSERT INTO shares (snippet_id, granter_id, share_type, grantee_user_id,
                                grantee_team_id, grantee_email, permission, token,
                                expires_at, access_count, last_accessed_at, is_active,
                                created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                record.snippet_id,
                record.granter_id,
                record.share_type,
                record.grantee_user_id,
                record.grantee_team_id,
                record.grantee_email,
                record.permission,
                record.token,
                record.expires_at,
                record.access_count,
                record.last_accessed_at,
                record.is_active,
                record.created_at
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn get(&self, id: i64) -> crate::Result<Option<ShareRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {SHARE_COLUMNS} FROM shares WHERE id = ?"))?;

        let mut rows = stmt.query_map(params![id], Self::map_row)?;

        match rows.next() {
            Some(Ok(record)) => Ok(Some(record)),
            Some(Err(e)) => Err(e.into()),
            None => Ok(None),
        }
    }

    pub fn get_by_token(&self, token: &str) -> crate::Result<Option<ShareRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {SHARE_COLUMNS} FROM shares WHERE token = ?"))?;

        let mut rows = stmt.query_map(params![token], Self::map_row)?;

        match rows.next() {
            Some(Ok(record)) => Ok(Some(record)),
            Some(Err(e)) => Err(e.into()),
            None => Ok(None),
        }
    }

    pub fn list_for_snippet(&self, snippet_id: i64) -> crate::Result<Vec<ShareRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            r#"
            SELECT {SHARE_COLUMNS} FROM shares WHERE snippet_id = ?
            ORDER BY created_at DESC, id DESC
            "#
        ))?;

        let records = stmt.query_map(params![snippet_id], Self::map_row)?;

        let mut shares = Vec::new();
        for record in records {
            shares.push(record?);
        }
        Ok(shares)
    }

    /// Bump access bookkeeping. The caller validates the share first.
    pub fn record_access(&self, id: i64, accessed_at: &str) -> crate::Result<()> {
        self.conn.execute(
            r#"
            UPDATE shares SET access_count = access_count + 1, last_accessed_at = ?
            WHERE id = ?
            "#,
            params![accessed_at, id],
        )?;
        Ok(())
    }

    /// Flip the active flag. Returns false when the share does not exist.
    pub fn set_active(&self, id: i64, active: bool) -> crate::Result<bool> {
        let affected = self.conn.execute(
            r#"
            UPDATE shares SET is_active = ? WHERE id = ?
            "#,
            params![active as i64, id],
        )?;
        Ok(affected == 1)
    }

    fn map_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ShareRecord> {
        Ok(ShareRecord {
            id: row.get(0)?,
            snippet_id: row.get(1)?,
            granter_id: row.get(2)?,
            share_type: row.get(3)?,
            grantee_user_id: row.get(4)?,
            grantee_team_id: row.get(5)?,
            grantee_email: row.get(6)?,
            permission: row.get(7)?,
            token: row.get(8)?,
            expires_at: row.get(9)?,
            access_count: row.get(10)?,
            last_accessed_at: row.get(11)?,
            is_active: row.get(12)?,
            created_at: row.get(13)?,
        })
    }
}
