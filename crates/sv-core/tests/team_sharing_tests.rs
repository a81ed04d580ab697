//! Tests for teams, invitations, and share grants.

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use sv_core::{
    CapabilitySet, Error, FixedClock, NewShare, NewSnippet, NewTeam, Privacy, SequenceTokens,
    ShareGrant, SharePermission, SnipVault, TeamRole,
};
use sv_local_db::{Database, SnippetRecord, TeamRecord, UserRecord};

fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
}

fn fixed_vault() -> SnipVault {
    let db = Database::open_in_memory().expect("open in-memory database");
    SnipVault::with_parts(
        db,
        Arc::new(FixedClock(base_time())),
        Arc::new(SequenceTokens::default()),
    )
}

/// A second vault over the same database whose clock sits `hours` past
/// the base time. Lets a test watch deadlines lapse without sleeping.
fn vault_at_offset(vault: &SnipVault, hours: i64) -> SnipVault {
    SnipVault::with_parts(
        vault.database().clone(),
        Arc::new(FixedClock(base_time() + Duration::hours(hours))),
        Arc::new(SequenceTokens::default()),
    )
}

fn register(vault: &SnipVault, name: &str) -> UserRecord {
    vault
        .users()
        .register(name, &format!("{}@example.com", name), None)
        .expect("register user")
}

fn create_team(vault: &SnipVault, owner_id: i64, name: &str) -> TeamRecord {
    vault
        .teams()
        .create_team(
            owner_id,
            NewTeam {
                name: name.to_string(),
                slug: None,
                privacy: Privacy::Private,
                description: None,
            },
        )
        .expect("create team")
}

fn create_snippet(vault: &SnipVault, owner_id: i64, title: &str, privacy: Privacy) -> SnippetRecord {
    vault
        .snippets()
        .create(
            owner_id,
            NewSnippet {
                title: title.to_string(),
                description: None,
                language: "rust".to_string(),
                code: "fn main() {}\n".to_string(),
                privacy,
                team_id: None,
                tags: Vec::new(),
            },
        )
        .expect("create snippet")
}

#[test]
fn test_owner_is_implicit_member() {
    let vault = fixed_vault();
    let owner = register(&vault, "alice");
    let team = create_team(&vault, owner.id, "Rustaceans");

    let teams = vault.teams();
    assert!(teams.members(team.id).expect("members").is_empty());
    assert!(teams.is_owner(team.id, owner.id).expect("is_owner"));
    assert!(teams.role_of(team.id, owner.id).expect("role_of").is_none());
    let caps = teams.capabilities(team.id, owner.id).expect("capabilities");
    assert!(caps.create_snippets && caps.manage_members && caps.invite_members);
    assert_eq!(team.member_count, 1);

    let err = teams
        .add_member(team.id, owner.id, TeamRole::Admin, owner.id)
        .expect_err("owner must not get a membership row");
    assert!(matches!(err, Error::InvalidState { .. }));
}

#[test]
fn test_team_privacy_is_public_or_private() {
    let vault = fixed_vault();
    let owner = register(&vault, "alice");

    let err = vault
        .teams()
        .create_team(
            owner.id,
            NewTeam {
                name: "Shadow".to_string(),
                slug: None,
                privacy: Privacy::Unlisted,
                description: None,
            },
        )
        .expect_err("teams are public or private only");
    assert!(matches!(err, Error::InvalidState { .. }));
}

#[test]
fn test_role_defaults_seed_capability_flags() {
    let vault = fixed_vault();
    let owner = register(&vault, "alice");
    let admin = register(&vault, "bob");
    let member = register(&vault, "carol");
    let viewer = register(&vault, "dave");
    let team = create_team(&vault, owner.id, "Rustaceans");

    let teams = vault.teams();
    teams
        .add_member(team.id, admin.id, TeamRole::Admin, owner.id)
        .expect("add admin");
    teams
        .add_member(team.id, member.id, TeamRole::Member, owner.id)
        .expect("add member");
    teams
        .add_member(team.id, viewer.id, TeamRole::Viewer, owner.id)
        .expect("add viewer");

    let caps = teams.capabilities(team.id, admin.id).expect("capabilities");
    assert!(caps.create_snippets && caps.edit_snippets && caps.delete_snippets);
    assert!(caps.manage_members && caps.invite_members);

    let caps = teams.capabilities(team.id, member.id).expect("capabilities");
    assert!(caps.create_snippets && caps.edit_snippets);
    assert!(!caps.delete_snippets && !caps.manage_members && !caps.invite_members);

    let caps = teams.capabilities(team.id, viewer.id).expect("capabilities");
    assert!(!caps.create_snippets && !caps.edit_snippets && !caps.delete_snippets);

    assert_eq!(teams.role_of(team.id, member.id).expect("role"), Some(TeamRole::Member));
    assert_eq!(vault.teams().get(team.id).expect("team").member_count, 4);
}

#[test]
fn test_stored_flags_outlive_role_defaults() {
    let vault = fixed_vault();
    let owner = register(&vault, "alice");
    let member = register(&vault, "bob");
    let team = create_team(&vault, owner.id, "Rustaceans");

    let teams = vault.teams();
    teams
        .add_member(team.id, member.id, TeamRole::Viewer, owner.id)
        .expect("add viewer");

    // Hand-tuned flags beyond the role's defaults stick.
    let mut caps = teams.capabilities(team.id, member.id).expect("capabilities");
    caps.create_snippets = true;
    teams
        .set_capabilities(team.id, member.id, caps, owner.id)
        .expect("set capabilities");

    let caps = teams.capabilities(team.id, member.id).expect("capabilities");
    assert!(caps.create_snippets);
    assert_eq!(teams.role_of(team.id, member.id).expect("role"), Some(TeamRole::Viewer));

    // Changing the role reseeds the flags from the new role's defaults.
    teams
        .change_role(team.id, member.id, TeamRole::Member, owner.id)
        .expect("change role");
    let caps = teams.capabilities(team.id, member.id).expect("capabilities");
    assert!(caps.create_snippets && caps.edit_snippets && !caps.delete_snippets);
}

#[test]
fn test_member_removal_and_leaving() {
    let vault = fixed_vault();
    let owner = register(&vault, "alice");
    let member = register(&vault, "bob");
    let team = create_team(&vault, owner.id, "Rustaceans");

    let teams = vault.teams();
    teams
        .add_member(team.id, member.id, TeamRole::Member, owner.id)
        .expect("add member");
    assert_eq!(teams.get(team.id).expect("team").member_count, 2);

    let err = teams
        .remove_member(team.id, owner.id, owner.id)
        .expect_err("owner cannot be removed");
    assert!(matches!(err, Error::InvalidState { .. }));

    teams.leave(team.id, member.id).expect("leave team");
    assert_eq!(teams.get(team.id).expect("team").member_count, 1);
    assert!(teams.members(team.id).expect("members").is_empty());

    let err = teams
        .remove_member(team.id, member.id, owner.id)
        .expect_err("removing a non-member must fail");
    assert!(matches!(err, Error::NotFound { .. }));
}

#[test]
fn test_membership_mutations_check_the_actor() {
    let vault = fixed_vault();
    let owner = register(&vault, "alice");
    let admin = register(&vault, "bob");
    let member = register(&vault, "carol");
    let newcomer = register(&vault, "dave");
    let team = create_team(&vault, owner.id, "Rustaceans");

    let teams = vault.teams();
    teams
        .add_member(team.id, admin.id, TeamRole::Admin, owner.id)
        .expect("add admin");
    teams
        .add_member(team.id, member.id, TeamRole::Member, owner.id)
        .expect("add member");

    // Admins hold manage_members and may add; plain members may not.
    teams
        .add_member(team.id, newcomer.id, TeamRole::Viewer, admin.id)
        .expect("admin adds a member");
    let err = teams
        .add_member(team.id, newcomer.id, TeamRole::Viewer, member.id)
        .expect_err("member may not add");
    assert!(matches!(err, Error::Forbidden { .. }));

    // Removal and role changes stay with the owner.
    let err = teams
        .remove_member(team.id, newcomer.id, admin.id)
        .expect_err("admin may not remove others");
    assert!(matches!(err, Error::Forbidden { .. }));
    let err = teams
        .change_role(team.id, newcomer.id, TeamRole::Member, admin.id)
        .expect_err("admin may not change roles");
    assert!(matches!(err, Error::Forbidden { .. }));
    let err = teams
        .set_capabilities(team.id, newcomer.id, CapabilitySet::full(), member.id)
        .expect_err("member may not set capabilities");
    assert!(matches!(err, Error::Forbidden { .. }));

    teams
        .remove_member(team.id, newcomer.id, owner.id)
        .expect("owner removes");
    assert_eq!(teams.get(team.id).expect("team").member_count, 3);
}

#[test]
fn test_invitation_accept_adds_member() {
    let vault = fixed_vault();
    let owner = register(&vault, "alice");
    let invitee = register(&vault, "bob");
    let team = create_team(&vault, owner.id, "Rustaceans");

    let invitations = vault.invitations();
    let invitation = invitations
        .invite(
            team.id,
            owner.id,
            "bob@example.com",
            TeamRole::Member,
            base_time() + Duration::hours(48),
        )
        .expect("invite");
    assert_eq!(invitation.status, "pending");
    assert_eq!(invitation.token, "tok-1");

    let membership = invitations
        .accept(&invitation.token, invitee.id)
        .expect("accept invitation");
    assert_eq!(membership.team_id, team.id);
    assert_eq!(membership.user_id, invitee.id);
    assert_eq!(membership.role, "member");

    let stored = invitations
        .get_by_token(&invitation.token)
        .expect("get invitation");
    assert_eq!(stored.status, "accepted");
    assert!(stored.accepted_at.is_some());

    // The inviter hears about the acceptance.
    let kinds: Vec<String> = vault
        .notifications()
        .list(owner.id, 10)
        .expect("feed")
        .into_iter()
        .map(|n| n.kind)
        .collect();
    assert!(kinds.contains(&"invitation_accepted".to_string()));

    // Accepting twice is a terminal-state conflict.
    let err = invitations
        .accept(&invitation.token, invitee.id)
        .expect_err("second accept must fail");
    assert!(matches!(err, Error::Conflict { .. }));
}

#[test]
fn test_invitation_email_must_match() {
    let vault = fixed_vault();
    let owner = register(&vault, "alice");
    let wrong_user = register(&vault, "mallory");
    let team = create_team(&vault, owner.id, "Rustaceans");

    let invitation = vault
        .invitations()
        .invite(
            team.id,
            owner.id,
            "bob@example.com",
            TeamRole::Member,
            base_time() + Duration::hours(48),
        )
        .expect("invite");

    let err = vault
        .invitations()
        .accept(&invitation.token, wrong_user.id)
        .expect_err("wrong email must be rejected");
    assert!(matches!(err, Error::Forbidden { .. }));

    // The invitation is still pending for the right address.
    let pending = vault
        .invitations()
        .pending_for(team.id, "bob@example.com")
        .expect("pending_for");
    assert!(pending.is_some());
}

#[test]
fn test_lapsed_invitation_always_reads_expired() {
    let vault = fixed_vault();
    let owner = register(&vault, "alice");
    let invitee = register(&vault, "bob");
    let team = create_team(&vault, owner.id, "Rustaceans");

    let invitation = vault
        .invitations()
        .invite(
            team.id,
            owner.id,
            "bob@example.com",
            TeamRole::Member,
            base_time() + Duration::hours(1),
        )
        .expect("invite");

    let later = vault_at_offset(&vault, 2);
    let err = later
        .invitations()
        .accept(&invitation.token, invitee.id)
        .expect_err("lapsed invitation must not be acceptable");
    assert!(matches!(err, Error::Expired { .. }));

    // The observation flipped the stored status.
    let stored = later
        .invitations()
        .get_by_token(&invitation.token)
        .expect("get invitation");
    assert_eq!(stored.status, "expired");

    // Declining after the deadline reads as expired too, not as declined.
    let err = later
        .invitations()
        .decline(&invitation.token, invitee.id)
        .expect_err("lapsed invitation must not be declinable");
    assert!(matches!(err, Error::Expired { .. }));

    assert!(later
        .invitations()
        .pending_for(team.id, "bob@example.com")
        .expect("pending_for")
        .is_none());
    assert!(vault.teams().members(team.id).expect("members").is_empty());
}

#[test]
fn test_invite_needs_capability_and_sane_input() {
    let vault = fixed_vault();
    let owner = register(&vault, "alice");
    let viewer = register(&vault, "bob");
    let team = create_team(&vault, owner.id, "Rustaceans");
    vault
        .teams()
        .add_member(team.id, viewer.id, TeamRole::Viewer, owner.id)
        .expect("add viewer");

    let deadline = base_time() + Duration::hours(48);
    let err = vault
        .invitations()
        .invite(team.id, viewer.id, "carol@example.com", TeamRole::Member, deadline)
        .expect_err("viewer may not invite");
    assert!(matches!(err, Error::Forbidden { .. }));

    let err = vault
        .invitations()
        .invite(team.id, owner.id, "not-an-email", TeamRole::Member, deadline)
        .expect_err("bad address must be rejected");
    assert!(matches!(err, Error::InvalidState { .. }));

    let err = vault
        .invitations()
        .invite(
            team.id,
            owner.id,
            "carol@example.com",
            TeamRole::Member,
            base_time() - Duration::hours(1),
        )
        .expect_err("deadline in the past must be rejected");
    assert!(matches!(err, Error::InvalidState { .. }));
}

#[test]
fn test_declined_invitation_is_terminal() {
    let vault = fixed_vault();
    let owner = register(&vault, "alice");
    let invitee = register(&vault, "bob");
    let team = create_team(&vault, owner.id, "Rustaceans");

    let invitation = vault
        .invitations()
        .invite(
            team.id,
            owner.id,
            "bob@example.com",
            TeamRole::Member,
            base_time() + Duration::hours(48),
        )
        .expect("invite");

    vault
        .invitations()
        .decline(&invitation.token, invitee.id)
        .expect("decline");

    let stored = vault
        .invitations()
        .get_by_token(&invitation.token)
        .expect("get invitation");
    assert_eq!(stored.status, "declined");
    assert!(stored.accepted_at.is_none());

    let err = vault
        .invitations()
        .accept(&invitation.token, invitee.id)
        .expect_err("declined invitation cannot be accepted");
    assert!(matches!(err, Error::Conflict { .. }));
    assert!(vault.teams().members(team.id).expect("members").is_empty());
}

#[test]
fn test_team_snippets_obey_create_rights() {
    let vault = fixed_vault();
    let owner = register(&vault, "alice");
    let member = register(&vault, "bob");
    let viewer = register(&vault, "carol");
    let team = create_team(&vault, owner.id, "Rustaceans");

    let teams = vault.teams();
    teams
        .add_member(team.id, member.id, TeamRole::Member, owner.id)
        .expect("add member");
    teams
        .add_member(team.id, viewer.id, TeamRole::Viewer, owner.id)
        .expect("add viewer");

    let draft = |title: &str| NewSnippet {
        title: title.to_string(),
        description: None,
        language: "rust".to_string(),
        code: "fn main() {}\n".to_string(),
        privacy: Privacy::Team,
        team_id: Some(team.id),
        tags: Vec::new(),
    };

    vault
        .snippets()
        .create(member.id, draft("from member"))
        .expect("member may create");
    let err = vault
        .snippets()
        .create(viewer.id, draft("from viewer"))
        .expect_err("viewer may not create");
    assert!(matches!(err, Error::Forbidden { .. }));

    assert_eq!(vault.teams().get(team.id).expect("team").snippet_count, 1);

    let listed = vault
        .snippets()
        .list_for_team(team.id, viewer.id)
        .expect("viewer may list");
    assert_eq!(listed.len(), 1);

    let outsider = register(&vault, "mallory");
    let err = vault
        .snippets()
        .list_for_team(team.id, outsider.id)
        .expect_err("outsider may not list");
    assert!(matches!(err, Error::Forbidden { .. }));

    // Deleting the snippet releases the team's count.
    vault
        .snippets()
        .delete(listed[0].id, member.id)
        .expect("author deletes their snippet");
    assert_eq!(vault.teams().get(team.id).expect("team").snippet_count, 0);
}

#[test]
fn test_deleted_team_reads_as_absent() {
    let vault = fixed_vault();
    let owner = register(&vault, "alice");
    let member = register(&vault, "bob");
    let team = create_team(&vault, owner.id, "Rustaceans");
    vault
        .teams()
        .add_member(team.id, member.id, TeamRole::Member, owner.id)
        .expect("add member");

    let snippet = vault
        .snippets()
        .create(
            owner.id,
            NewSnippet {
                title: "team scoped".to_string(),
                description: None,
                language: "rust".to_string(),
                code: "fn main() {}\n".to_string(),
                privacy: Privacy::Team,
                team_id: Some(team.id),
                tags: Vec::new(),
            },
        )
        .expect("create team snippet");

    let err = vault
        .teams()
        .delete_team(team.id, member.id)
        .expect_err("only the owner may delete the team");
    assert!(matches!(err, Error::Forbidden { .. }));
    vault.teams().delete_team(team.id, owner.id).expect("delete team");

    let err = vault.teams().get(team.id).expect_err("deleted team is absent");
    assert!(matches!(err, Error::NotFound { .. }));
    assert!(vault.teams().teams_for_user(member.id).expect("teams").is_empty());

    // Team-scoped visibility collapses with the team; the owner still sees
    // their own snippet.
    let snippet = vault
        .snippets()
        .get_visible(snippet.id, Some(owner.id))
        .expect("owner still sees it");
    assert!(!vault
        .visibility()
        .can_view(&snippet, Some(member.id))
        .expect("can_view"));
}

#[test]
fn test_link_share_lifecycle() {
    let vault = fixed_vault();
    let owner = register(&vault, "alice");
    let snippet = create_snippet(&vault, owner.id, "secret", Privacy::Private);

    let shares = vault.shares();
    let share = shares
        .create(
            owner.id,
            NewShare {
                snippet_id: snippet.id,
                grant: ShareGrant::Link,
                permission: SharePermission::View,
                expires_at: None,
            },
        )
        .expect("create share");
    let token = share.token.clone().expect("link share carries a token");

    let (resolved, resolved_snippet) = shares.resolve_token(&token).expect("resolve");
    assert_eq!(resolved.access_count, 1);
    assert!(resolved.last_accessed_at.is_some());
    assert_eq!(resolved_snippet.id, snippet.id);

    let (resolved, _) = shares.resolve_token(&token).expect("resolve again");
    assert_eq!(resolved.access_count, 2);

    shares.revoke(share.id, owner.id).expect("revoke");
    let err = shares
        .resolve_token(&token)
        .expect_err("revoked share must not resolve");
    assert!(matches!(err, Error::InvalidState { .. }));

    shares.reactivate(share.id, owner.id).expect("reactivate");
    assert!(shares.resolve_token(&token).is_ok());

    assert_eq!(
        vault
            .snippets()
            .get_visible(snippet.id, Some(owner.id))
            .expect("get snippet")
            .share_count,
        1
    );
}

#[test]
fn test_share_deadline_applies_lazily() {
    let vault = fixed_vault();
    let owner = register(&vault, "alice");
    let snippet = create_snippet(&vault, owner.id, "ephemeral", Privacy::Private);

    let share = vault
        .shares()
        .create(
            owner.id,
            NewShare {
                snippet_id: snippet.id,
                grant: ShareGrant::Link,
                permission: SharePermission::View,
                expires_at: Some(base_time() + Duration::hours(1)),
            },
        )
        .expect("create share");
    let token = share.token.clone().expect("token");

    assert!(vault.shares().resolve_token(&token).is_ok());
    assert!(vault.shares().is_valid(&share).expect("is_valid"));

    let later = vault_at_offset(&vault, 2);
    let err = later
        .shares()
        .resolve_token(&token)
        .expect_err("lapsed share must not resolve");
    assert!(matches!(err, Error::Expired { .. }));
    assert!(later.shares().is_expired(&share).expect("is_expired"));
    assert!(!later.shares().is_valid(&share).expect("is_valid"));
}

#[test]
fn test_share_creation_needs_edit_rights() {
    let vault = fixed_vault();
    let owner = register(&vault, "alice");
    let stranger = register(&vault, "mallory");
    let snippet = create_snippet(&vault, owner.id, "public", Privacy::Public);

    // Viewing is not enough to hand out grants.
    let err = vault
        .shares()
        .create(
            stranger.id,
            NewShare {
                snippet_id: snippet.id,
                grant: ShareGrant::Link,
                permission: SharePermission::View,
                expires_at: None,
            },
        )
        .expect_err("share creation needs edit rights");
    assert!(matches!(err, Error::Forbidden { .. }));
}

#[test]
fn test_permission_for_picks_best_grant() {
    let vault = fixed_vault();
    let owner = register(&vault, "alice");
    let grantee = register(&vault, "bob");
    let team = create_team(&vault, owner.id, "Rustaceans");
    vault
        .teams()
        .add_member(team.id, grantee.id, TeamRole::Viewer, owner.id)
        .expect("add member");
    let snippet = create_snippet(&vault, owner.id, "granted", Privacy::Private);

    let shares = vault.shares();
    shares
        .create(
            owner.id,
            NewShare {
                snippet_id: snippet.id,
                grant: ShareGrant::User(grantee.id),
                permission: SharePermission::View,
                expires_at: None,
            },
        )
        .expect("user share");
    assert_eq!(
        shares.permission_for(snippet.id, grantee.id).expect("permission"),
        Some(SharePermission::View)
    );

    // A team grant with edit outranks the view grant.
    let team_share = shares
        .create(
            owner.id,
            NewShare {
                snippet_id: snippet.id,
                grant: ShareGrant::Team(team.id),
                permission: SharePermission::Edit,
                expires_at: None,
            },
        )
        .expect("team share");
    assert_eq!(
        shares.permission_for(snippet.id, grantee.id).expect("permission"),
        Some(SharePermission::Edit)
    );

    // Revoking the team grant drops back to the user grant.
    shares.revoke(team_share.id, owner.id).expect("revoke");
    assert_eq!(
        shares.permission_for(snippet.id, grantee.id).expect("permission"),
        Some(SharePermission::View)
    );

    let outsider = register(&vault, "carol");
    assert_eq!(
        shares.permission_for(snippet.id, outsider.id).expect("permission"),
        None
    );
}

#[test]
fn test_user_share_notifies_grantee() {
    let vault = fixed_vault();
    let owner = register(&vault, "alice");
    let grantee = register(&vault, "bob");
    let snippet = create_snippet(&vault, owner.id, "handed over", Privacy::Private);

    vault
        .shares()
        .create(
            owner.id,
            NewShare {
                snippet_id: snippet.id,
                grant: ShareGrant::User(grantee.id),
                permission: SharePermission::View,
                expires_at: None,
            },
        )
        .expect("create share");

    let feed = vault.notifications().list(grantee.id, 10).expect("feed");
    assert_eq!(feed.len(), 1);
    assert_eq!(feed[0].kind, "share_received");
}

#[test]
fn test_email_share_matches_registered_address() {
    let vault = fixed_vault();
    let owner = register(&vault, "alice");
    let grantee = register(&vault, "bob");
    let snippet = create_snippet(&vault, owner.id, "mailed", Privacy::Private);

    vault
        .shares()
        .create(
            owner.id,
            NewShare {
                snippet_id: snippet.id,
                grant: ShareGrant::Email("bob@example.com".to_string()),
                permission: SharePermission::View,
                expires_at: None,
            },
        )
        .expect("create share");

    assert_eq!(
        vault
            .shares()
            .permission_for(snippet.id, grantee.id)
            .expect("permission"),
        Some(SharePermission::View)
    );
}

#[test]
fn test_audit_trail_records_lifecycle() {
    let vault = fixed_vault();
    let owner = register(&vault, "alice");
    let member = register(&vault, "bob");
    let team = create_team(&vault, owner.id, "Rustaceans");
    vault
        .teams()
        .add_member(team.id, member.id, TeamRole::Member, owner.id)
        .expect("add member");
    let snippet = create_snippet(&vault, owner.id, "tracked", Privacy::Public);
    vault.snippets().delete(snippet.id, owner.id).expect("delete");

    let actions: Vec<String> = vault
        .audit()
        .recent(20)
        .expect("recent audit entries")
        .into_iter()
        .map(|entry| entry.action)
        .collect();
    assert!(actions.contains(&"team.create".to_string()));
    assert!(actions.contains(&"team.member_add".to_string()));
    assert!(actions.contains(&"snippet.create".to_string()));
    assert!(actions.contains(&"snippet.delete".to_string()));

    let team_trail = vault
        .audit()
        .for_entity("team", team.id)
        .expect("team audit entries");
    assert_eq!(team_trail.len(), 2);
}
