//! Team invitation records and persistence.

use rusqlite::params;
use serde::{Deserialize, Serialize};

/// Database model for team invitations.
///
/// Status is one of `pending`, `accepted`, `declined`, `expired`. Status
/// moves forward only; a pending invitation past its `expires_at` is
/// flipped to `expired` the first time anything observes it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamInvitationRecord {
    pub id: i64,
    pub team_id: i64,
    pub email: String,
    pub inviter_id: i64,
    pub role: String,
    pub token: String,
    pub status: String,
    pub expires_at: String,
    pub accepted_at: Option<String>,
    pub created_at: String,
}

/// Database operations for team invitations.
pub struct TeamInvitationStore<'a> {
    conn: &'a rusqlite::Connection,
}

impl<'a> TeamInvitationStore<'a> {
    pub fn new(conn: &'a rusqlite::Connection) -> Self {
        Self { conn }
    }

    pub fn insert(&self, record: &TeamInvitationRecord) -> crate::Result<i64> {
        self.conn.execute(
            r#"
            INSERT INTO team_invitations (team_id, email, inviter_id, role, token,
                                          status, expires_at, accepted_at, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                record.team_id,
                record.email,
                record.inviter_id,
                record.role,
                record.token,
                record.status,
                record.expires_at,
                record.accepted_at,
                record.created_at
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn get(&self, id: i64) -> crate::Result<Option<TeamInvitationRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, team_id, email, inviter_id, role, token, status,
                   expires_at, accepted_at, created_at
            FROM team_invitations WHERE id = ?
            "#,
        )?;

        let mut rows = stmt.query_map(params![id], Self::map_row)?;

        match rows.next() {
            Some(Ok(record)) => Ok(Some(record)),
            Some(Err(e)) => Err(e.into()),
            None => Ok(None),
        }
    }

    pub fn get_by_token(&self, token: &str) -> crate::Result<Option<TeamInvitationRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, team_id, email, inviter_id, role, token, status,
                   expires_at, accepted_at, created_at
            FROM team_invitations WHERE token = ?
            "#,
        )?;

        let mut rows = stmt.query_map(params![token], Self::map_row)?;

        match rows.next() {
            Some(Ok(record)) => Ok(Some(record)),
            Some(Err(e)) => Err(e.into()),
            None => Ok(None),
        }
    }

    /// Look up a pending invitation for an email address on a team.
    pub fn pending_for(
        &self,
        team_id: i64,
        email: &str,
    ) -> crate::Result<Option<TeamInvitationRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, team_id, email, inviter_id, role, token, status,
                   expires_at, accepted_at, created_at
            FROM team_invitations
            WHERE team_id = ? AND email = ? AND status = 'pending'
            ORDER BY created_at DESC
            "#,
        )?;

        let mut rows = stmt.query_map(params![team_id, email], Self::map_row)?;

        match rows.next() {
            Some(Ok(record)) => Ok(Some(record)),
            Some(Err(e)) => Err(e.into()),
            None => Ok(None),
        }
    }

    pub fn list_for_team(&self, team_id: i64) -> crate::Result<Vec<TeamInvitationRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, team_id, email, inviter_id, role, token, status,
                   expires_at, accepted_at, created_at
            FROM team_invitations WHERE team_id = ?
            ORDER BY created_at DESC
            "#,
        )?;

        let records = stmt.query_map(params![team_id], Self::map_row)?;

        let mut invitations = Vec::new();
        for record in records {
            invitations.push(record?);
        }
        Ok(invitations)
    }

    /// Move an invitation to a new status, recording `accepted_at` when the
    /// transition is an acceptance.
    pub fn update_status(
        &self,
        id: i64,
        status: &str,
        accepted_at: Option<&str>,
    ) -> crate::Result<bool> {
        let affected = self.conn.execute(
            r#"
            UPDATE team_invitations SET status = ?, accepted_at = ? WHERE id = ?
            "#,
            params![status, accepted_at, id],
        )?;
        Ok(affected == 1)
    }

    fn map_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<TeamInvitationRecord> {
        Ok(TeamInvitationRecord {
            id: row.get(0)?,
            team_id: row.get(1)?,
            email: row.get(2)?,
            inviter_id: row.get(3)?,
            role: row.get(4)?,
            token: row.get(5)?,
            status: row.get(6)?,
            expires_at: row.get(7)?,
            accepted_at: row.get(8)?,
            created_at: row.get(9)?,
        })
    }
}
