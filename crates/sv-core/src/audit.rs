//! Append-only audit trail over mutating operations.
//!
//! Services write entries inside the same transaction as the change they
//! describe, so an aborted write never leaves a stray audit row.

use rusqlite::Connection;
use sv_local_db::{AuditLogRecord, AuditLogStore, Database};

/// Audit action names, `entity.verb`.
pub mod actions {
    pub const SNIPPET_CREATE: &str = "snippet.create";
    pub const SNIPPET_FORK: &str = "snippet.fork";
    pub const SNIPPET_DELETE: &str = "snippet.delete";
    pub const SNIPPET_RESTORE: &str = "snippet.restore";
    pub const SNIPPET_SET_PRIVACY: &str = "snippet.set_privacy";
    pub const TEAM_CREATE: &str = "team.create";
    pub const TEAM_DELETE: &str = "team.delete";
    pub const TEAM_MEMBER_ADD: &str = "team.member_add";
    pub const TEAM_MEMBER_REMOVE: &str = "team.member_remove";
    pub const TEAM_MEMBER_UPDATE: &str = "team.member_update";
    pub const INVITATION_CREATE: &str = "invitation.create";
    pub const INVITATION_ACCEPT: &str = "invitation.accept";
    pub const INVITATION_DECLINE: &str = "invitation.decline";
    pub const SHARE_CREATE: &str = "share.create";
    pub const SHARE_REVOKE: &str = "share.revoke";
    pub const SHARE_REACTIVATE: &str = "share.reactivate";
}

/// Entity kind names used in audit rows.
pub mod entities {
    pub const SNIPPET: &str = "snippet";
    pub const TEAM: &str = "team";
    pub const INVITATION: &str = "invitation";
    pub const SHARE: &str = "share";
}

/// Write one audit entry inside the caller's transaction.
pub(crate) fn log(
    conn: &Connection,
    now: &str,
    actor_id: Option<i64>,
    action: &str,
    entity_kind: &str,
    entity_id: i64,
    detail: Option<String>,
) -> crate::Result<()> {
    let record = AuditLogRecord {
        id: 0, // Will be set by autoincrement
        actor_id,
        action: action.to_string(),
        entity_kind: entity_kind.to_string(),
        entity_id,
        detail,
        created_at: now.to_string(),
    };
    AuditLogStore::new(conn).insert(&record)?;
    Ok(())
}

/// Read access to the audit trail.
pub struct AuditTrail {
    db: Database,
}

impl AuditTrail {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Latest entries across all entities.
    pub fn recent(&self, limit: i64) -> crate::Result<Vec<AuditLogRecord>> {
        crate::db::read(&self.db, |conn| {
            Ok(AuditLogStore::new(conn).list_recent(limit)?)
        })
    }

    /// History for one entity, newest first.
    pub fn for_entity(
        &self,
        entity_kind: &str,
        entity_id: i64,
    ) -> crate::Result<Vec<AuditLogRecord>> {
        crate::db::read(&self.db, |conn| {
            Ok(AuditLogStore::new(conn).list_for_entity(entity_kind, entity_id)?)
        })
    }
}
