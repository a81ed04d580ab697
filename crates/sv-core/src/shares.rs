//! Share grants: reusable access to a snippet outside its privacy scope.
//!
//! A share is valid while it is active and, when it carries a deadline,
//! the deadline has not passed. Active and inactive toggle freely; expiry
//! is a property of the clock, not a stored state, and is never swept in
//! the background.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use sv_local_db::{
    Database, ShareRecord, ShareStore, SnippetRecord, SnippetStore, TeamMemberStore, TeamStore,
    UserStore,
};

use crate::audit;
use crate::clock::{format_ts, parse_ts, Clock};
use crate::entities::{SharePermission, ShareType};
use crate::notifications::{self, NotificationKind};
use crate::token::TokenGenerator;
use crate::visibility;

/// Who a new share grants access to.
#[derive(Debug, Clone)]
pub enum ShareGrant {
    /// Anyone holding the generated token.
    Link,
    User(i64),
    Team(i64),
    Email(String),
}

impl ShareGrant {
    fn share_type(&self) -> ShareType {
        match self {
            Self::Link => ShareType::Link,
            Self::User(_) => ShareType::User,
            Self::Team(_) => ShareType::Team,
            Self::Email(_) => ShareType::Email,
        }
    }
}

/// Parameters for creating a share.
#[derive(Debug, Clone)]
pub struct NewShare {
    pub snippet_id: i64,
    pub grant: ShareGrant,
    pub permission: SharePermission,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Manages share grants and their bookkeeping.
pub struct ShareManager {
    db: Database,
    clock: Arc<dyn Clock>,
    tokens: Arc<dyn TokenGenerator>,
}

impl ShareManager {
    pub fn new(db: Database, clock: Arc<dyn Clock>, tokens: Arc<dyn TokenGenerator>) -> Self {
        Self { db, clock, tokens }
    }

    /// Create a share. The granter must hold edit rights on the snippet.
    /// A link share gets its token minted here, exactly once; other kinds
    /// never carry one.
    pub fn create(&self, granter_id: i64, draft: NewShare) -> crate::Result<ShareRecord> {
        let now = self.clock.now();
        if let Some(expires_at) = draft.expires_at {
            if expires_at <= now {
                return Err(crate::Error::invalid_state(
                    "share deadline must be in the future",
                ));
            }
        }
        let now_str = format_ts(now);

        crate::db::transact(&self.db, |conn| {
            let snippet = crate::snippets::live_snippet_on(conn, draft.snippet_id)?;
            if !visibility::can_edit_on(conn, &snippet, Some(granter_id))? {
                return Err(crate::Error::forbidden(
                    "only users with edit rights may share a snippet",
                ));
            }

            let mut grantee_user_id = None;
            let mut grantee_team_id = None;
            let mut grantee_email = None;
            match &draft.grant {
                ShareGrant::Link => {}
                ShareGrant::User(user_id) => {
                    if UserStore::new(conn).get(*user_id)?.is_none() {
                        return Err(crate::Error::not_found("user", user_id));
                    }
                    grantee_user_id = Some(*user_id);
                }
                ShareGrant::Team(team_id) => {
                    crate::teams::live_team(conn, *team_id)?;
                    grantee_team_id = Some(*team_id);
                }
                ShareGrant::Email(email) => {
                    let email = email.trim();
                    if email.is_empty() || !email.contains('@') {
                        return Err(crate::Error::invalid_state(format!(
                            "not an email address: {:?}",
                            email
                        )));
                    }
                    grantee_email = Some(email.to_string());
                }
            }

            let token = match draft.grant {
                ShareGrant::Link => Some(self.tokens.generate()),
                _ => None,
            };

            let record = ShareRecord {
                id: 0, // Will be set by autoincrement
                snippet_id: draft.snippet_id,
                granter_id,
                share_type: draft.grant.share_type().as_str().to_string(),
                grantee_user_id,
                grantee_team_id,
                grantee_email,
                permission: draft.permission.as_str().to_string(),
                token,
                expires_at: draft.expires_at.map(format_ts),
                access_count: 0,
                last_accessed_at: None,
                is_active: 1,
                created_at: now_str.clone(),
            };
            let shares = ShareStore::new(conn);
            let id = match shares.insert(&record) {
                Ok(id) => id,
                Err(e) if e.is_unique_violation() => {
                    return Err(crate::Error::conflict("share token collision"));
                }
                Err(e) => return Err(e.into()),
            };

            SnippetStore::new(conn).increment_share_count(draft.snippet_id)?;

            if let Some(user_id) = grantee_user_id {
                notifications::push(
                    conn,
                    &now_str,
                    user_id,
                    NotificationKind::ShareReceived,
                    &format!("snippet \"{}\" was shared with you", snippet.title),
                    Some(serde_json::json!({ "snippet_id": snippet.id, "share_id": id })),
                )?;
            }
            audit::log(
                conn,
                &now_str,
                Some(granter_id),
                audit::actions::SHARE_CREATE,
                audit::entities::SHARE,
                id,
                Some(format!("snippet {}", draft.snippet_id)),
            )?;
            tracing::info!(share_id = id, snippet_id = draft.snippet_id, "created share");
            Ok(ShareRecord { id, ..record })
        })
    }

    /// Whether the share's deadline, if any, has passed.
    pub fn is_expired(&self, share: &ShareRecord) -> crate::Result<bool> {
        is_expired_at(share, self.clock.now())
    }

    /// Valid means active and not expired.
    pub fn is_valid(&self, share: &ShareRecord) -> crate::Result<bool> {
        Ok(share.is_active != 0 && !self.is_expired(share)?)
    }

    /// Resolve a link-share token to the share and its snippet, rejecting
    /// revoked and expired shares, and record the access.
    pub fn resolve_token(&self, token: &str) -> crate::Result<(ShareRecord, SnippetRecord)> {
        let now = self.clock.now();
        let now_str = format_ts(now);

        crate::db::transact(&self.db, |conn| {
            let shares = ShareStore::new(conn);
            let share = shares
                .get_by_token(token)?
                .ok_or_else(|| crate::Error::not_found("share", token))?;

            if share.is_active == 0 {
                return Err(crate::Error::invalid_state("share has been revoked"));
            }
            if is_expired_at(&share, now)? {
                return Err(crate::Error::expired(format!(
                    "share lapsed at {}",
                    share.expires_at.as_deref().unwrap_or("?")
                )));
            }

            let snippet = crate::snippets::live_snippet_on(conn, share.snippet_id)?;

            shares.record_access(share.id, &now_str)?;
            let share = ShareRecord {
                access_count: share.access_count + 1,
                last_accessed_at: Some(now_str.clone()),
                ..share
            };
            Ok((share, snippet))
        })
    }

    /// Bookkeep one access on an already-validated share.
    pub fn record_access(&self, share_id: i64) -> crate::Result<()> {
        let now_str = format_ts(self.clock.now());
        crate::db::transact(&self.db, |conn| {
            let shares = ShareStore::new(conn);
            if shares.get(share_id)?.is_none() {
                return Err(crate::Error::not_found("share", share_id));
            }
            shares.record_access(share_id, &now_str)?;
            Ok(())
        })
    }

    /// Deactivate a share. Only the granter or the snippet owner may.
    pub fn revoke(&self, share_id: i64, actor_id: i64) -> crate::Result<()> {
        self.set_active(share_id, actor_id, false, audit::actions::SHARE_REVOKE)
    }

    /// Reactivate a share. Expiry still applies on top.
    pub fn reactivate(&self, share_id: i64, actor_id: i64) -> crate::Result<()> {
        self.set_active(share_id, actor_id, true, audit::actions::SHARE_REACTIVATE)
    }

    fn set_active(
        &self,
        share_id: i64,
        actor_id: i64,
        active: bool,
        action: &str,
    ) -> crate::Result<()> {
        let now_str = format_ts(self.clock.now());
        crate::db::transact(&self.db, |conn| {
            let shares = ShareStore::new(conn);
            let share = shares
                .get(share_id)?
                .ok_or_else(|| crate::Error::not_found("share", share_id))?;

            let snippet = SnippetStore::new(conn)
                .get(share.snippet_id)?
                .ok_or_else(|| crate::Error::not_found("snippet", share.snippet_id))?;
            if actor_id != share.granter_id && actor_id != snippet.owner_id {
                return Err(crate::Error::forbidden(
                    "only the granter or the snippet owner may change a share",
                ));
            }

            shares.set_active(share_id, active)?;
            audit::log(
                conn,
                &now_str,
                Some(actor_id),
                action,
                audit::entities::SHARE,
                share_id,
                None,
            )?;
            Ok(())
        })
    }

    /// Shares on a snippet, visible to its owner and editors.
    pub fn list_for_snippet(
        &self,
        snippet_id: i64,
        actor_id: i64,
    ) -> crate::Result<Vec<ShareRecord>> {
        crate::db::read(&self.db, |conn| {
            let snippet = crate::snippets::live_snippet_on(conn, snippet_id)?;
            if !visibility::can_edit_on(conn, &snippet, Some(actor_id))? {
                return Err(crate::Error::forbidden(
                    "only users with edit rights may list a snippet's shares",
                ));
            }
            Ok(ShareStore::new(conn).list_for_snippet(snippet_id)?)
        })
    }

    /// Best permission any valid share grants this user on the snippet:
    /// direct user grants, team grants for teams they participate in, and
    /// email grants matching their address.
    pub fn permission_for(
        &self,
        snippet_id: i64,
        user_id: i64,
    ) -> crate::Result<Option<SharePermission>> {
        let now = self.clock.now();
        crate::db::read(&self.db, |conn| {
            let user = UserStore::new(conn)
                .get(user_id)?
                .ok_or_else(|| crate::Error::not_found("user", user_id))?;

            let mut best: Option<SharePermission> = None;
            for share in ShareStore::new(conn).list_for_snippet(snippet_id)? {
                if share.is_active == 0 || is_expired_at(&share, now)? {
                    continue;
                }
                let applies = match share.share_type.parse::<ShareType>()? {
                    ShareType::Link => false,
                    ShareType::User => share.grantee_user_id == Some(user_id),
                    ShareType::Team => match share.grantee_team_id {
                        Some(team_id) => participates_on(conn, team_id, user_id)?,
                        None => false,
                    },
                    ShareType::Email => share.grantee_email.as_deref() == Some(user.email.as_str()),
                };
                if !applies {
                    continue;
                }
                let permission: SharePermission = share.permission.parse()?;
                if permission == SharePermission::Edit {
                    return Ok(Some(SharePermission::Edit));
                }
                best = Some(permission);
            }
            Ok(best)
        })
    }
}

fn is_expired_at(share: &ShareRecord, now: DateTime<Utc>) -> crate::Result<bool> {
    match share.expires_at.as_deref() {
        Some(expires_at) => Ok(parse_ts(expires_at)? <= now),
        None => Ok(false),
    }
}

/// Whether the user owns or belongs to the team. Tombstoned teams read
/// as absent.
fn participates_on(conn: &Connection, team_id: i64, user_id: i64) -> crate::Result<bool> {
    let Some(team) = TeamStore::new(conn).get(team_id)? else {
        return Ok(false);
    };
    if team.is_deleted() {
        return Ok(false);
    }
    if team.owner_id == user_id {
        return Ok(true);
    }
    Ok(TeamMemberStore::new(conn).get(team_id, user_id)?.is_some())
}
