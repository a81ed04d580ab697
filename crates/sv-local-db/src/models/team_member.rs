//! Team membership rows with per-member capability flags.

use rusqlite::params;
use serde::{Deserialize, Serialize};

/// Database model for a stored team membership.
///
/// The team owner has no row here; ownership is implied by `teams.owner_id`.
/// Capability flags are SQLite integers (0/1) seeded from the member's role
/// at insert time and individually overridable afterwards. The stored flags
/// are authoritative, not the role.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamMemberRecord {
    pub id: i64,
    pub team_id: i64,
    pub user_id: i64,
    pub role: String,
    pub can_create_snippets: i64,
    pub can_edit_snippets: i64,
    pub can_delete_snippets: i64,
    pub can_manage_members: i64,
    pub can_invite_members: i64,
    pub joined_at: String,
}

/// Database operations for team memberships.
pub struct TeamMemberStore<'a> {
    conn: &'a rusqlite::Connection,
}

impl<'a> TeamMemberStore<'a> {
    pub fn new(conn: &'a rusqlite::Connection) -> Self {
        Self { conn }
    }

    pub fn insert(&self, record: &TeamMemberRecord) -> crate::Result<i64> {
        self.conn.execute(
            r#"
            INSERT INTO team_members (team_id, user_id, role,
                                      can_create_snippets, can_edit_snippets,
                                      can_delete_snippets, can_manage_members,
                                      can_invite_members, joined_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                record.team_id,
                record.user_id,
                record.role,
                record.can_create_snippets,
                record.can_edit_snippets,
                record.can_delete_snippets,
                record.can_manage_members,
                record.can_invite_members,
                record.joined_at
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn get(&self, team_id: i64, user_id: i64) -> crate::Result<Option<TeamMemberRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, team_id, user_id, role,
                   can_create_snippets, can_edit_snippets, can_delete_snippets,
                   can_manage_members, can_invite_members, joined_at
            FROM team_members WHERE team_id = ? AND user_id = ?
            "#,
        )?;

        let mut rows = stmt.query_map(params![team_id, user_id], Self::map_row)?;

        match rows.next() {
            Some(Ok(record)) => Ok(Some(record)),
            Some(Err(e)) => Err(e.into()),
            None => Ok(None),
        }
    }

    pub fn list_for_team(&self, team_id: i64) -> crate::Result<Vec<TeamMemberRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, team_id, user_id, role,
                   can_create_snippets, can_edit_snippets, can_delete_snippets,
                   can_manage_members, can_invite_members, joined_at
            FROM team_members WHERE team_id = ?
            ORDER BY joined_at ASC, id ASC
            "#,
        )?;

        let records = stmt.query_map(params![team_id], Self::map_row)?;

        let mut members = Vec::new();
        for record in records {
            members.push(record?);
        }
        Ok(members)
    }

    /// List the team ids a user belongs to through stored rows.
    pub fn team_ids_for_user(&self, user_id: i64) -> crate::Result<Vec<i64>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT team_id FROM team_members WHERE user_id = ? ORDER BY team_id ASC
            "#,
        )?;

        let ids = stmt.query_map(params![user_id], |row| row.get(0))?;

        let mut team_ids = Vec::new();
        for id in ids {
            team_ids.push(id?);
        }
        Ok(team_ids)
    }

    /// Replace a member's role and capability flags in one update.
    ///
    /// Flags arrive in column order: create, edit, delete snippets, manage
    /// members, invite members.
    pub fn update_role_and_caps(
        &self,
        team_id: i64,
        user_id: i64,
        role: &str,
        caps: [i64; 5],
    ) -> crate::Result<bool> {
        let affected = self.conn.execute(
            r#"
            UPDATE team_members
            SET role = ?, can_create_snippets = ?, can_edit_snippets = ?,
                can_delete_snippets = ?, can_manage_members = ?, can_invite_members = ?
            WHERE team_id = ? AND user_id = ?
            "#,
            params![role, caps[0], caps[1], caps[2], caps[3], caps[4], team_id, user_id],
        )?;
        Ok(affected == 1)
    }

    /// Remove a membership row. Returns false when no row matched.
    pub fn delete(&self, team_id: i64, user_id: i64) -> crate::Result<bool> {
        let affected = self.conn.execute(
            r#"
            DELETE FROM team_members WHERE team_id = ? AND user_id = ?
            "#,
            params![team_id, user_id],
        )?;
        Ok(affected == 1)
    }

    fn map_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<TeamMemberRecord> {
        Ok(TeamMemberRecord {
            id: row.get(0)?,
            team_id: row.get(1)?,
            user_id: row.get(2)?,
            role: row.get(3)?,
            can_create_snippets: row.get(4)?,
            can_edit_snippets: row.get(5)?,
            can_delete_snippets: row.get(6)?,
            can_manage_members: row.get(7)?,
            can_invite_members: row.get(8)?,
            joined_at: row.get(9)?,
        })
    }
}
