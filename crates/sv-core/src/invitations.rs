//! Team invitation lifecycle.
//!
//! Invitations move `pending -> {accepted, declined, expired}` and never
//! back. Expiry is lazy: nothing sweeps the table, but any operation that
//! observes a pending invitation past its deadline flips it to expired
//! before answering. A stale invitation reads as expired no matter what
//! its stored status still says.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use sv_local_db::{Database, TeamInvitationRecord, TeamInvitationStore, TeamMemberRecord, UserStore};

use crate::audit;
use crate::clock::{format_ts, parse_ts, Clock};
use crate::entities::{InvitationStatus, TeamRole};
use crate::notifications::{self, NotificationKind};
use crate::teams;
use crate::token::TokenGenerator;

/// Manages the invitation state machine.
pub struct InvitationManager {
    db: Database,
    clock: Arc<dyn Clock>,
    tokens: Arc<dyn TokenGenerator>,
}

impl InvitationManager {
    pub fn new(db: Database, clock: Arc<dyn Clock>, tokens: Arc<dyn TokenGenerator>) -> Self {
        Self { db, clock, tokens }
    }

    /// Issue an invitation. The inviter needs invite rights on the team
    /// and the deadline must lie in the future.
    ///
    /// An existing pending invitation for the same address is not checked
    /// here; callers that want to avoid duplicates ask [`Self::pending_for`]
    /// first.
    pub fn invite(
        &self,
        team_id: i64,
        inviter_id: i64,
        email: &str,
        role: TeamRole,
        expires_at: DateTime<Utc>,
    ) -> crate::Result<TeamInvitationRecord> {
        let now = self.clock.now();
        if expires_at <= now {
            return Err(crate::Error::invalid_state(
                "invitation deadline must be in the future",
            ));
        }
        let email = email.trim();
        if email.is_empty() || !email.contains('@') {
            return Err(crate::Error::invalid_state(format!(
                "not an email address: {:?}",
                email
            )));
        }

        let now = format_ts(now);
        let token = self.tokens.generate();
        crate::db::transact(&self.db, |conn| {
            let caps = teams::capabilities_on(conn, team_id, inviter_id)?;
            if !caps.invite_members {
                return Err(crate::Error::forbidden(
                    "inviter may not invite members to this team",
                ));
            }

            let record = TeamInvitationRecord {
                id: 0, // Will be set by autoincrement
                team_id,
                email: email.to_string(),
                inviter_id,
                role: role.as_str().to_string(),
                token: token.clone(),
                status: InvitationStatus::Pending.as_str().to_string(),
                expires_at: format_ts(expires_at),
                accepted_at: None,
                created_at: now.clone(),
            };
            let invitations = TeamInvitationStore::new(conn);
            let id = match invitations.insert(&record) {
                Ok(id) => id,
                Err(e) if e.is_unique_violation() => {
                    return Err(crate::Error::conflict("invitation token collision"));
                }
                Err(e) => return Err(e.into()),
            };

            audit::log(
                conn,
                &now,
                Some(inviter_id),
                audit::actions::INVITATION_CREATE,
                audit::entities::INVITATION,
                id,
                Some(format!("team {} -> {}", team_id, email)),
            )?;
            tracing::info!(invitation_id = id, team_id, "issued invitation");
            Ok(TeamInvitationRecord { id, ..record })
        })
    }

    /// Look up an invitation by token, flipping it to expired when its
    /// deadline has passed.
    pub fn get_by_token(&self, token: &str) -> crate::Result<TeamInvitationRecord> {
        let now = self.clock.now();
        crate::db::transact(&self.db, |conn| {
            let invitation = load_by_token(conn, token)?;
            observe_expiry(conn, invitation, now)
        })
    }

    /// Accept an invitation on behalf of `user_id`.
    ///
    /// A past deadline always reads as expired, whatever the stored status.
    /// Then the acceptor's email must match the invitation, the invitation
    /// must still be pending, and the membership row is inserted in the
    /// same transaction as the status flip.
    pub fn accept(&self, token: &str, user_id: i64) -> crate::Result<TeamMemberRecord> {
        let now = self.clock.now();
        let now_str = format_ts(now);

        crate::db::transact(&self.db, |conn| {
            let invitation = load_by_token(conn, token)?;

            if is_past(&invitation.expires_at, now)? {
                flip_expired_if_pending(conn, &invitation)?;
                return Err(crate::Error::expired(format!(
                    "invitation for {} expired at {}",
                    invitation.email, invitation.expires_at
                )));
            }

            let user = UserStore::new(conn)
                .get(user_id)?
                .ok_or_else(|| crate::Error::not_found("user", user_id))?;
            if user.email != invitation.email {
                return Err(crate::Error::forbidden(
                    "invitation was issued to a different email address",
                ));
            }

            let status: InvitationStatus = invitation.status.parse()?;
            if status.is_terminal() {
                return Err(crate::Error::conflict(format!(
                    "invitation already {}",
                    status
                )));
            }

            let role: TeamRole = invitation.role.parse()?;
            let member =
                teams::add_member_on(conn, invitation.team_id, user_id, role, Some(user_id), &now_str)?;

            TeamInvitationStore::new(conn).update_status(
                invitation.id,
                InvitationStatus::Accepted.as_str(),
                Some(&now_str),
            )?;

            notifications::push(
                conn,
                &now_str,
                invitation.inviter_id,
                NotificationKind::InvitationAccepted,
                &format!("{} accepted your invitation", user.username),
                Some(serde_json::json!({
                    "team_id": invitation.team_id,
                    "user_id": user_id,
                })),
            )?;
            audit::log(
                conn,
                &now_str,
                Some(user_id),
                audit::actions::INVITATION_ACCEPT,
                audit::entities::INVITATION,
                invitation.id,
                None,
            )?;
            tracing::info!(
                invitation_id = invitation.id,
                team_id = invitation.team_id,
                user_id,
                "invitation accepted"
            );
            Ok(member)
        })
    }

    /// Decline an invitation. Same identity and freshness rules as accept.
    pub fn decline(&self, token: &str, user_id: i64) -> crate::Result<()> {
        let now = self.clock.now();
        let now_str = format_ts(now);

        crate::db::transact(&self.db, |conn| {
            let invitation = load_by_token(conn, token)?;

            if is_past(&invitation.expires_at, now)? {
                flip_expired_if_pending(conn, &invitation)?;
                return Err(crate::Error::expired(format!(
                    "invitation for {} expired at {}",
                    invitation.email, invitation.expires_at
                )));
            }

            let user = UserStore::new(conn)
                .get(user_id)?
                .ok_or_else(|| crate::Error::not_found("user", user_id))?;
            if user.email != invitation.email {
                return Err(crate::Error::forbidden(
                    "invitation was issued to a different email address",
                ));
            }

            let status: InvitationStatus = invitation.status.parse()?;
            if status.is_terminal() {
                return Err(crate::Error::conflict(format!(
                    "invitation already {}",
                    status
                )));
            }

            TeamInvitationStore::new(conn).update_status(
                invitation.id,
                InvitationStatus::Declined.as_str(),
                None,
            )?;

            notifications::push(
                conn,
                &now_str,
                invitation.inviter_id,
                NotificationKind::InvitationDeclined,
                &format!("{} declined your invitation", user.username),
                None,
            )?;
            audit::log(
                conn,
                &now_str,
                Some(user_id),
                audit::actions::INVITATION_DECLINE,
                audit::entities::INVITATION,
                invitation.id,
                None,
            )?;
            Ok(())
        })
    }

    /// The newest pending invitation for an address on a team, if any.
    /// Callers use this to refuse duplicate invitations before issuing.
    pub fn pending_for(
        &self,
        team_id: i64,
        email: &str,
    ) -> crate::Result<Option<TeamInvitationRecord>> {
        let now = self.clock.now();
        crate::db::transact(&self.db, |conn| {
            match TeamInvitationStore::new(conn).pending_for(team_id, email)? {
                Some(invitation) => {
                    let observed = observe_expiry(conn, invitation, now)?;
                    let status: InvitationStatus = observed.status.parse()?;
                    if status == InvitationStatus::Pending {
                        Ok(Some(observed))
                    } else {
                        Ok(None)
                    }
                }
                None => Ok(None),
            }
        })
    }

    /// All invitations for a team, flipping any that lapsed.
    pub fn list_for_team(&self, team_id: i64) -> crate::Result<Vec<TeamInvitationRecord>> {
        let now = self.clock.now();
        crate::db::transact(&self.db, |conn| {
            teams::live_team(conn, team_id)?;
            let invitations = TeamInvitationStore::new(conn).list_for_team(team_id)?;
            let mut observed = Vec::with_capacity(invitations.len());
            for invitation in invitations {
                observed.push(observe_expiry(conn, invitation, now)?);
            }
            Ok(observed)
        })
    }
}

fn load_by_token(conn: &Connection, token: &str) -> crate::Result<TeamInvitationRecord> {
    TeamInvitationStore::new(conn)
        .get_by_token(token)?
        .ok_or_else(|| crate::Error::not_found("invitation", token))
}

fn is_past(expires_at: &str, now: DateTime<Utc>) -> crate::Result<bool> {
    Ok(parse_ts(expires_at)? <= now)
}

/// Flip a pending invitation whose deadline has passed and return the row
/// as it now stands.
fn observe_expiry(
    conn: &Connection,
    invitation: TeamInvitationRecord,
    now: DateTime<Utc>,
) -> crate::Result<TeamInvitationRecord> {
    let status: InvitationStatus = invitation.status.parse()?;
    if status == InvitationStatus::Pending && is_past(&invitation.expires_at, now)? {
        flip_expired_if_pending(conn, &invitation)?;
        return Ok(TeamInvitationRecord {
            status: InvitationStatus::Expired.as_str().to_string(),
            ..invitation
        });
    }
    Ok(invitation)
}

fn flip_expired_if_pending(
    conn: &Connection,
    invitation: &TeamInvitationRecord,
) -> crate::Result<()> {
    let status: InvitationStatus = invitation.status.parse()?;
    if status == InvitationStatus::Pending {
        TeamInvitationStore::new(conn).update_status(
            invitation.id,
            InvitationStatus::Expired.as_str(),
            None,
        )?;
        tracing::debug!(invitation_id = invitation.id, "invitation lapsed");
    }
    Ok(())
}
