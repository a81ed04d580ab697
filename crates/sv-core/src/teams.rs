//! Team membership and the role model.
//!
//! The owner is implicit: `teams.owner_id` never appears in the membership
//! table, and both inserting an owner row and removing the owner are
//! rejected. Everyone else's permissions come from the stored capability
//! flags on their membership row; the role name only seeds those flags.

use std::sync::Arc;

use rusqlite::Connection;
use sv_local_db::{
    Database, TeamMemberRecord, TeamMemberStore, TeamRecord, TeamStore, UserStore,
};

use crate::audit;
use crate::clock::{format_ts, Clock};
use crate::entities::{CapabilitySet, Privacy, TeamRole};
use crate::notifications::{self, NotificationKind};
use crate::tags::slugify;

/// Parameters for creating a team.
#[derive(Debug, Clone)]
pub struct NewTeam {
    pub name: String,
    /// Derived from the name when absent.
    pub slug: Option<String>,
    pub privacy: Privacy,
    pub description: Option<String>,
}

/// Manages teams, their membership rows, and role resolution.
pub struct TeamManager {
    db: Database,
    clock: Arc<dyn Clock>,
}

impl TeamManager {
    pub fn new(db: Database, clock: Arc<dyn Clock>) -> Self {
        Self { db, clock }
    }

    /// Create a team owned by `owner_id`. The owner starts counted in
    /// member_count without a membership row.
    pub fn create_team(&self, owner_id: i64, draft: NewTeam) -> crate::Result<TeamRecord> {
        let name = draft.name.trim();
        if name.is_empty() {
            return Err(crate::Error::invalid_state("team name must not be empty"));
        }
        if !matches!(draft.privacy, Privacy::Public | Privacy::Private) {
            return Err(crate::Error::invalid_state(
                "team privacy is public or private",
            ));
        }
        let slug = match draft.slug {
            Some(slug) => slug,
            None => slugify(name),
        };
        if slug.is_empty() {
            return Err(crate::Error::invalid_state(
                "team slug must contain at least one letter or digit",
            ));
        }

        let now = format_ts(self.clock.now());
        crate::db::transact(&self.db, |conn| {
            if UserStore::new(conn).get(owner_id)?.is_none() {
                return Err(crate::Error::not_found("user", owner_id));
            }

            let teams = TeamStore::new(conn);
            let record = TeamRecord {
                id: 0, // Will be set by autoincrement
                name: name.to_string(),
                slug: slug.clone(),
                owner_id,
                privacy: draft.privacy.as_str().to_string(),
                description: draft.description.clone(),
                member_count: 1,
                snippet_count: 0,
                created_at: now.clone(),
                updated_at: now.clone(),
                deleted_at: None,
            };
            let id = match teams.insert(&record) {
                Ok(id) => id,
                Err(e) if e.is_unique_violation() => {
                    return Err(crate::Error::conflict(format!(
                        "team slug {} is already taken",
                        slug
                    )));
                }
                Err(e) => return Err(e.into()),
            };

            audit::log(
                conn,
                &now,
                Some(owner_id),
                audit::actions::TEAM_CREATE,
                audit::entities::TEAM,
                id,
                None,
            )?;
            tracing::info!(team_id = id, slug = %slug, "created team");
            Ok(TeamRecord { id, ..record })
        })
    }

    /// Fetch a live team; a tombstoned team reads as absent.
    pub fn get(&self, team_id: i64) -> crate::Result<TeamRecord> {
        crate::db::read(&self.db, |conn| live_team(conn, team_id))
    }

    pub fn get_by_slug(&self, slug: &str) -> crate::Result<TeamRecord> {
        crate::db::read(&self.db, |conn| {
            let team = TeamStore::new(conn)
                .get_by_slug(slug)?
                .ok_or_else(|| crate::Error::not_found("team", slug))?;
            if team.is_deleted() {
                return Err(crate::Error::not_found("team", slug));
            }
            Ok(team)
        })
    }

    /// Whether the user is the team's owner.
    pub fn is_owner(&self, team_id: i64, user_id: i64) -> crate::Result<bool> {
        crate::db::read(&self.db, |conn| {
            Ok(live_team(conn, team_id)?.owner_id == user_id)
        })
    }

    /// Stored role of a user within a team. The owner holds no membership
    /// row, so this returns None for both the owner and strangers; use
    /// [`Self::is_owner`] to tell them apart.
    pub fn role_of(&self, team_id: i64, user_id: i64) -> crate::Result<Option<TeamRole>> {
        crate::db::read(&self.db, |conn| {
            live_team(conn, team_id)?;
            match TeamMemberStore::new(conn).get(team_id, user_id)? {
                Some(row) => Ok(Some(row.role.parse()?)),
                None => Ok(None),
            }
        })
    }

    /// Effective capabilities of a user within a team: everything for the
    /// owner, the stored flags for a member, nothing for anyone else.
    pub fn capabilities(&self, team_id: i64, user_id: i64) -> crate::Result<CapabilitySet> {
        crate::db::read(&self.db, |conn| capabilities_on(conn, team_id, user_id))
    }

    /// Add a member with the default flags for their role. The actor needs
    /// member-management rights on the team.
    pub fn add_member(
        &self,
        team_id: i64,
        user_id: i64,
        role: TeamRole,
        actor_id: i64,
    ) -> crate::Result<TeamMemberRecord> {
        let now = format_ts(self.clock.now());
        crate::db::transact(&self.db, |conn| {
            let caps = capabilities_on(conn, team_id, actor_id)?;
            if !caps.manage_members {
                return Err(crate::Error::forbidden(
                    "no member management rights on this team",
                ));
            }
            add_member_on(conn, team_id, user_id, role, Some(actor_id), &now)
        })
    }

    /// Remove a member. The owner may remove anyone; everyone else may
    /// remove only themselves. Removing the owner is rejected; the owner
    /// cannot stop being a member of their own team.
    pub fn remove_member(
        &self,
        team_id: i64,
        user_id: i64,
        actor_id: i64,
    ) -> crate::Result<()> {
        let now = format_ts(self.clock.now());
        crate::db::transact(&self.db, |conn| {
            let team = live_team(conn, team_id)?;
            if user_id == team.owner_id {
                return Err(crate::Error::invalid_state(
                    "the owner cannot be removed from their team",
                ));
            }
            if actor_id != team.owner_id && actor_id != user_id {
                return Err(crate::Error::forbidden(
                    "only the owner may remove another member",
                ));
            }

            let members = TeamMemberStore::new(conn);
            if !members.delete(team_id, user_id)? {
                return Err(crate::Error::not_found(
                    "membership",
                    format!("of user {} in team {}", user_id, team_id),
                ));
            }
            TeamStore::new(conn).adjust_member_count(team_id, -1)?;

            audit::log(
                conn,
                &now,
                Some(actor_id),
                audit::actions::TEAM_MEMBER_REMOVE,
                audit::entities::TEAM,
                team_id,
                Some(format!("user {}", user_id)),
            )?;
            Ok(())
        })
    }

    /// A member leaves on their own initiative.
    pub fn leave(&self, team_id: i64, user_id: i64) -> crate::Result<()> {
        self.remove_member(team_id, user_id, user_id)
    }

    /// Change a member's role, reseeding the capability flags from the new
    /// role's defaults. Owner-only.
    pub fn change_role(
        &self,
        team_id: i64,
        user_id: i64,
        role: TeamRole,
        actor_id: i64,
    ) -> crate::Result<TeamMemberRecord> {
        let caps = CapabilitySet::defaults_for(role);
        self.update_member(team_id, user_id, role, caps, actor_id)
    }

    /// Override a member's capability flags, keeping their role name.
    /// Owner-only.
    pub fn set_capabilities(
        &self,
        team_id: i64,
        user_id: i64,
        caps: CapabilitySet,
        actor_id: i64,
    ) -> crate::Result<TeamMemberRecord> {
        let now = format_ts(self.clock.now());
        crate::db::transact(&self.db, |conn| {
            let team = live_team(conn, team_id)?;
            if team.owner_id != actor_id {
                return Err(crate::Error::forbidden(
                    "only the owner may change member capabilities",
                ));
            }
            let members = TeamMemberStore::new(conn);
            let row = members
                .get(team_id, user_id)?
                .ok_or_else(|| {
                    crate::Error::not_found(
                        "membership",
                        format!("of user {} in team {}", user_id, team_id),
                    )
                })?;
            let role: TeamRole = row.role.parse()?;
            update_member_on(conn, team_id, user_id, role, caps, actor_id, &now)
        })
    }

    fn update_member(
        &self,
        team_id: i64,
        user_id: i64,
        role: TeamRole,
        caps: CapabilitySet,
        actor_id: i64,
    ) -> crate::Result<TeamMemberRecord> {
        let now = format_ts(self.clock.now());
        crate::db::transact(&self.db, |conn| {
            let team = live_team(conn, team_id)?;
            if team.owner_id != actor_id {
                return Err(crate::Error::forbidden(
                    "only the owner may change member roles",
                ));
            }
            update_member_on(conn, team_id, user_id, role, caps, actor_id, &now)
        })
    }

    /// Stored membership rows. The owner is not among them.
    pub fn members(&self, team_id: i64) -> crate::Result<Vec<TeamMemberRecord>> {
        crate::db::read(&self.db, |conn| {
            live_team(conn, team_id)?;
            Ok(TeamMemberStore::new(conn).list_for_team(team_id)?)
        })
    }

    /// Teams the user owns or belongs to.
    pub fn teams_for_user(&self, user_id: i64) -> crate::Result<Vec<TeamRecord>> {
        crate::db::read(&self.db, |conn| {
            let teams = TeamStore::new(conn);
            let mut result = teams.list_for_owner(user_id)?;
            for team_id in TeamMemberStore::new(conn).team_ids_for_user(user_id)? {
                if let Some(team) = teams.get(team_id)? {
                    if !team.is_deleted() {
                        result.push(team);
                    }
                }
            }
            Ok(result)
        })
    }

    /// Tombstone a team. Owner-only.
    pub fn delete_team(&self, team_id: i64, actor_id: i64) -> crate::Result<()> {
        let now = format_ts(self.clock.now());
        crate::db::transact(&self.db, |conn| {
            let team = live_team(conn, team_id)?;
            if team.owner_id != actor_id {
                return Err(crate::Error::forbidden("only the owner may delete a team"));
            }
            TeamStore::new(conn).soft_delete(team_id, &now)?;

            audit::log(
                conn,
                &now,
                Some(actor_id),
                audit::actions::TEAM_DELETE,
                audit::entities::TEAM,
                team_id,
                None,
            )?;
            tracing::info!(team_id, "deleted team");
            Ok(())
        })
    }
}

/// Fetch a team that exists and is not tombstoned.
pub(crate) fn live_team(conn: &Connection, team_id: i64) -> crate::Result<TeamRecord> {
    let team = TeamStore::new(conn)
        .get(team_id)?
        .ok_or_else(|| crate::Error::not_found("team", team_id))?;
    if team.is_deleted() {
        return Err(crate::Error::not_found("team", team_id));
    }
    Ok(team)
}

/// Effective capability resolution inside an open transaction.
pub(crate) fn capabilities_on(
    conn: &Connection,
    team_id: i64,
    user_id: i64,
) -> crate::Result<CapabilitySet> {
    let team = live_team(conn, team_id)?;
    if team.owner_id == user_id {
        return Ok(CapabilitySet::full());
    }
    match TeamMemberStore::new(conn).get(team_id, user_id)? {
        Some(row) => Ok(CapabilitySet::from_record(&row)),
        None => Ok(CapabilitySet::empty()),
    }
}

/// Insert a membership row inside an open transaction. Used directly by
/// invitation acceptance so the row lands in the same transaction as the
/// status flip.
pub(crate) fn add_member_on(
    conn: &Connection,
    team_id: i64,
    user_id: i64,
    role: TeamRole,
    actor_id: Option<i64>,
    now: &str,
) -> crate::Result<TeamMemberRecord> {
    let team = live_team(conn, team_id)?;
    if user_id == team.owner_id {
        return Err(crate::Error::invalid_state(
            "the owner is an implicit member and never gets a membership row",
        ));
    }
    if UserStore::new(conn).get(user_id)?.is_none() {
        return Err(crate::Error::not_found("user", user_id));
    }

    let caps = CapabilitySet::defaults_for(role);
    let flags = caps.to_flags();
    let record = TeamMemberRecord {
        id: 0, // Will be set by autoincrement
        team_id,
        user_id,
        role: role.as_str().to_string(),
        can_create_snippets: flags[0],
        can_edit_snippets: flags[1],
        can_delete_snippets: flags[2],
        can_manage_members: flags[3],
        can_invite_members: flags[4],
        joined_at: now.to_string(),
    };

    let members = TeamMemberStore::new(conn);
    let id = match members.insert(&record) {
        Ok(id) => id,
        Err(e) if e.is_unique_violation() => {
            return Err(crate::Error::conflict(format!(
                "user {} is already a member of team {}",
                user_id, team_id
            )));
        }
        Err(e) => return Err(e.into()),
    };
    TeamStore::new(conn).adjust_member_count(team_id, 1)?;

    if actor_id != Some(team.owner_id) {
        notifications::push(
            conn,
            now,
            team.owner_id,
            NotificationKind::MemberJoined,
            &format!("{} gained a member", team.name),
            Some(serde_json::json!({ "team_id": team_id, "user_id": user_id })),
        )?;
    }

    audit::log(
        conn,
        now,
        actor_id,
        audit::actions::TEAM_MEMBER_ADD,
        audit::entities::TEAM,
        team_id,
        Some(format!("user {} as {}", user_id, role)),
    )?;
    Ok(TeamMemberRecord { id, ..record })
}

fn update_member_on(
    conn: &Connection,
    team_id: i64,
    user_id: i64,
    role: TeamRole,
    caps: CapabilitySet,
    actor_id: i64,
    now: &str,
) -> crate::Result<TeamMemberRecord> {
    let members = TeamMemberStore::new(conn);
    if !members.update_role_and_caps(team_id, user_id, role.as_str(), caps.to_flags())? {
        return Err(crate::Error::not_found(
            "membership",
            format!("of user {} in team {}", user_id, team_id),
        ));
    }

    audit::log(
        conn,
        now,
        Some(actor_id),
        audit::actions::TEAM_MEMBER_UPDATE,
        audit::entities::TEAM,
        team_id,
        Some(format!("user {} now {}", user_id, role)),
    )?;

    members.get(team_id, user_id)?.ok_or_else(|| {
        crate::Error::not_found(
            "membership",
            format!("of user {} in team {}", user_id, team_id),
        )
    })
}
