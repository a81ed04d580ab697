//! Domain enums and value types layered over the stored records.
//!
//! The stores keep enum-like columns as text; everything here round-trips
//! through `as_str`/`FromStr` so a bad stored value surfaces as an internal
//! error instead of silently matching nothing.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Visibility scope of a snippet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Privacy {
    Public,
    Private,
    Team,
    Unlisted,
}

impl Privacy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Private => "private",
            Self::Team => "team",
            Self::Unlisted => "unlisted",
        }
    }
}

impl fmt::Display for Privacy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Privacy {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s {
            "public" => Ok(Self::Public),
            "private" => Ok(Self::Private),
            "team" => Ok(Self::Team),
            "unlisted" => Ok(Self::Unlisted),
            other => Err(crate::Error::internal(format!(
                "unknown privacy value: {}",
                other
            ))),
        }
    }
}

/// What kind of edit produced a snippet version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    Create,
    Edit,
    Fork,
    Restore,
}

impl ChangeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Edit => "edit",
            Self::Fork => "fork",
            Self::Restore => "restore",
        }
    }
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChangeType {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s {
            "create" => Ok(Self::Create),
            "edit" => Ok(Self::Edit),
            "fork" => Ok(Self::Fork),
            "restore" => Ok(Self::Restore),
            other => Err(crate::Error::internal(format!(
                "unknown change type: {}",
                other
            ))),
        }
    }
}

/// Named role of a stored team member. The owner is not a member and has
/// no role row; see [`crate::teams::TeamRoster`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TeamRole {
    Admin,
    Member,
    Viewer,
}

impl TeamRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Member => "member",
            Self::Viewer => "viewer",
        }
    }
}

impl fmt::Display for TeamRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TeamRole {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s {
            "admin" => Ok(Self::Admin),
            "member" => Ok(Self::Member),
            "viewer" => Ok(Self::Viewer),
            other => Err(crate::Error::internal(format!(
                "unknown team role: {}",
                other
            ))),
        }
    }
}

/// Lifecycle state of a team invitation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvitationStatus {
    Pending,
    Accepted,
    Declined,
    Expired,
}

impl InvitationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Declined => "declined",
            Self::Expired => "expired",
        }
    }

    /// Terminal states never transition again.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl fmt::Display for InvitationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InvitationStatus {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s {
            "pending" => Ok(Self::Pending),
            "accepted" => Ok(Self::Accepted),
            "declined" => Ok(Self::Declined),
            "expired" => Ok(Self::Expired),
            other => Err(crate::Error::internal(format!(
                "unknown invitation status: {}",
                other
            ))),
        }
    }
}

/// How a share grant names its audience.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShareType {
    Link,
    User,
    Team,
    Email,
}

impl ShareType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Link => "link",
            Self::User => "user",
            Self::Team => "team",
            Self::Email => "email",
        }
    }
}

impl fmt::Display for ShareType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ShareType {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s {
            "link" => Ok(Self::Link),
            "user" => Ok(Self::User),
            "team" => Ok(Self::Team),
            "email" => Ok(Self::Email),
            other => Err(crate::Error::internal(format!(
                "unknown share type: {}",
                other
            ))),
        }
    }
}

/// Access level carried by a share grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SharePermission {
    View,
    Edit,
}

impl SharePermission {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::View => "view",
            Self::Edit => "edit",
        }
    }
}

impl fmt::Display for SharePermission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SharePermission {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s {
            "view" => Ok(Self::View),
            "edit" => Ok(Self::Edit),
            other => Err(crate::Error::internal(format!(
                "unknown share permission: {}",
                other
            ))),
        }
    }
}

/// A member's effective permissions within a team.
///
/// Stored flags win over role defaults; the role only seeds the flags when
/// a membership row is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CapabilitySet {
    pub create_snippets: bool,
    pub edit_snippets: bool,
    pub delete_snippets: bool,
    pub manage_members: bool,
    pub invite_members: bool,
}

impl CapabilitySet {
    /// Everything allowed. This is what the owner always gets.
    pub fn full() -> Self {
        Self {
            create_snippets: true,
            edit_snippets: true,
            delete_snippets: true,
            manage_members: true,
            invite_members: true,
        }
    }

    /// Nothing allowed. This is what a non-member gets.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Default flags seeded from a role when a membership row is created.
    pub fn defaults_for(role: TeamRole) -> Self {
        match role {
            TeamRole::Admin => Self {
                create_snippets: true,
                edit_snippets: true,
                delete_snippets: true,
                manage_members: true,
                invite_members: true,
            },
            TeamRole::Member => Self {
                create_snippets: true,
                edit_snippets: true,
                delete_snippets: false,
                manage_members: false,
                invite_members: false,
            },
            TeamRole::Viewer => Self::empty(),
        }
    }

    /// Read the authoritative flags off a stored membership row.
    pub fn from_record(record: &sv_local_db::TeamMemberRecord) -> Self {
        Self {
            create_snippets: record.can_create_snippets != 0,
            edit_snippets: record.can_edit_snippets != 0,
            delete_snippets: record.can_delete_snippets != 0,
            manage_members: record.can_manage_members != 0,
            invite_members: record.can_invite_members != 0,
        }
    }

    /// Flags in column order for the membership store.
    pub fn to_flags(&self) -> [i64; 5] {
        [
            self.create_snippets as i64,
            self.edit_snippets as i64,
            self.delete_snippets as i64,
            self.manage_members as i64,
            self.invite_members as i64,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_privacy_round_trip() {
        for privacy in [Privacy::Public, Privacy::Private, Privacy::Team, Privacy::Unlisted] {
            assert_eq!(privacy.as_str().parse::<Privacy>().unwrap(), privacy);
        }
        assert!("secret".parse::<Privacy>().is_err());
    }

    #[test]
    fn test_invitation_status_terminality() {
        assert!(!InvitationStatus::Pending.is_terminal());
        assert!(InvitationStatus::Accepted.is_terminal());
        assert!(InvitationStatus::Declined.is_terminal());
        assert!(InvitationStatus::Expired.is_terminal());
    }

    #[test]
    fn test_role_defaults() {
        assert_eq!(CapabilitySet::defaults_for(TeamRole::Admin), CapabilitySet::full());
        let member = CapabilitySet::defaults_for(TeamRole::Member);
        assert!(member.create_snippets && member.edit_snippets);
        assert!(!member.delete_snippets && !member.manage_members && !member.invite_members);
        assert_eq!(CapabilitySet::defaults_for(TeamRole::Viewer), CapabilitySet::empty());
    }
}
