//! Snippet visibility and edit-permission resolution.
//!
//! Checks are pure reads. A tombstoned snippet or team is treated as
//! absent, so everything here fails closed.

use rusqlite::Connection;
use sv_local_db::{Database, SnippetRecord, TeamMemberStore, TeamStore};

use crate::entities::{CapabilitySet, Privacy};

/// Resolves who may see and who may edit a snippet.
pub struct VisibilityResolver {
    db: Database,
}

impl VisibilityResolver {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Whether `acting_user` (or an anonymous visitor) may read the snippet.
    ///
    /// Public and unlisted snippets are readable by anyone. Private
    /// snippets are readable only by their owner. Team snippets are
    /// readable by the team owner and stored members.
    pub fn can_view(
        &self,
        snippet: &SnippetRecord,
        acting_user: Option<i64>,
    ) -> crate::Result<bool> {
        crate::db::read(&self.db, |conn| can_view_on(conn, snippet, acting_user))
    }

    /// Whether `acting_user` may change the snippet's code or metadata.
    ///
    /// Only the owner may edit, plus team members whose stored flags grant
    /// edit-snippets when the snippet is team-scoped.
    pub fn can_edit(
        &self,
        snippet: &SnippetRecord,
        acting_user: Option<i64>,
    ) -> crate::Result<bool> {
        crate::db::read(&self.db, |conn| can_edit_on(conn, snippet, acting_user))
    }
}

pub(crate) fn can_view_on(
    conn: &Connection,
    snippet: &SnippetRecord,
    acting_user: Option<i64>,
) -> crate::Result<bool> {
    if snippet.is_deleted() {
        return Ok(false);
    }

    let privacy: Privacy = snippet.privacy.parse()?;
    match privacy {
        Privacy::Public | Privacy::Unlisted => Ok(true),
        Privacy::Private => Ok(acting_user == Some(snippet.owner_id)),
        Privacy::Team => {
            let Some(user_id) = acting_user else {
                return Ok(false);
            };
            if user_id == snippet.owner_id {
                return Ok(true);
            }
            Ok(team_capabilities_on(conn, snippet, user_id)?.is_some())
        }
    }
}

pub(crate) fn can_edit_on(
    conn: &Connection,
    snippet: &SnippetRecord,
    acting_user: Option<i64>,
) -> crate::Result<bool> {
    if snippet.is_deleted() {
        return Ok(false);
    }

    let Some(user_id) = acting_user else {
        return Ok(false);
    };
    if user_id == snippet.owner_id {
        return Ok(true);
    }

    let privacy: Privacy = snippet.privacy.parse()?;
    if privacy != Privacy::Team {
        return Ok(false);
    }

    match team_capabilities_on(conn, snippet, user_id)? {
        Some(caps) => Ok(caps.edit_snippets),
        None => Ok(false),
    }
}

/// Capabilities the user holds on the snippet's team, or None when the
/// snippet has no live team or the user is not a participant. The team
/// owner always gets the full set.
fn team_capabilities_on(
    conn: &Connection,
    snippet: &SnippetRecord,
    user_id: i64,
) -> crate::Result<Option<CapabilitySet>> {
    let Some(team_id) = snippet.team_id else {
        return Ok(None);
    };

    let teams = TeamStore::new(conn);
    let team = match teams.get(team_id)? {
        Some(team) if !team.is_deleted() => team,
        _ => {
            tracing::warn!(
                snippet_id = snippet.id,
                team_id,
                "team missing or deleted, denying team access"
            );
            return Ok(None);
        }
    };
    if team.owner_id == user_id {
        return Ok(Some(CapabilitySet::full()));
    }

    let members = TeamMemberStore::new(conn);
    match members.get(team_id, user_id)? {
        Some(row) => Ok(Some(CapabilitySet::from_record(&row))),
        None => Ok(None),
    }
}
