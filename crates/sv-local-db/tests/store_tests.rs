//! Integration tests for the SQLite stores.

use sv_local_db::migrations::MigrationManager;
use sv_local_db::{
    Database, FavoriteStore, SnippetRecord, SnippetStore, SnippetVersionRecord,
    SnippetVersionStore, TagRecord, TagStore, TeamInvitationRecord, TeamInvitationStore,
    TeamMemberRecord, TeamMemberStore, TeamRecord, TeamStore, UserRecord, UserStore, ViewStore,
};

fn test_db() -> Database {
    Database::open_in_memory().expect("Failed to open in-memory database")
}

fn sample_user(n: u32) -> UserRecord {
    UserRecord {
        id: 0,
        username: format!("user{}", n),
        email: format!("user{}@example.com", n),
        display_name: None,
        created_at: "2024-01-01T00:00:00Z".to_string(),
    }
}

fn sample_team(owner_id: i64, slug: &str) -> TeamRecord {
    TeamRecord {
        id: 0,
        name: format!("Team {}", slug),
        slug: slug.to_string(),
        owner_id,
        privacy: "private".to_string(),
        description: None,
        member_count: 1,
        snippet_count: 0,
        created_at: "2024-01-01T00:00:00Z".to_string(),
        updated_at: "2024-01-01T00:00:00Z".to_string(),
        deleted_at: None,
    }
}

fn sample_snippet(owner_id: i64, title: &str) -> SnippetRecord {
    SnippetRecord {
        id: 0,
        owner_id,
        team_id: None,
        title: title.to_string(),
        description: None,
        language: "rust".to_string(),
        code: "fn main() {}\n".to_string(),
        privacy: "private".to_string(),
        version_number: 1,
        parent_id: None,
        view_count: 0,
        unique_view_count: 0,
        fork_count: 0,
        favorite_count: 0,
        comment_count: 0,
        share_count: 0,
        created_at: "2024-01-01T00:00:00Z".to_string(),
        updated_at: "2024-01-01T00:00:00Z".to_string(),
        deleted_at: None,
    }
}

#[test]
fn test_migration_applies_once() {
    let db = test_db();
    db.with_conn(|conn| {
        let version = MigrationManager::current_version(conn)?;
        assert_eq!(version, Some(1));
        // Re-running is a no-op.
        MigrationManager::migrate(conn)?;
        assert_eq!(MigrationManager::current_version(conn)?, Some(1));
        Ok(())
    })
    .expect("Failed to check migration state");
}

#[test]
fn test_insert_and_get_user() {
    let db = test_db();
    db.with_conn(|conn| {
        let store = UserStore::new(conn);
        let id = store.insert(&sample_user(1))?;
        assert!(id > 0);

        let found = store.get(id)?.expect("user should exist");
        assert_eq!(found.username, "user1");
        assert_eq!(found.email, "user1@example.com");

        let by_name = store.get_by_username("user1")?.expect("lookup by username");
        assert_eq!(by_name.id, id);

        assert!(store.get(9999)?.is_none());
        Ok(())
    })
    .expect("Failed to exercise user store");
}

#[test]
fn test_duplicate_username_is_unique_violation() {
    let db = test_db();
    let result = db.with_conn(|conn| {
        let store = UserStore::new(conn);
        store.insert(&sample_user(1))?;
        let mut dup = sample_user(2);
        dup.username = "user1".to_string();
        store.insert(&dup)?;
        Ok(())
    });

    let err = result.expect_err("duplicate username should fail");
    assert!(err.is_unique_violation());
}

#[test]
fn test_team_member_unique_pair() {
    let db = test_db();
    let result = db.with_conn(|conn| {
        let users = UserStore::new(conn);
        let owner = users.insert(&sample_user(1))?;
        let member = users.insert(&sample_user(2))?;

        let teams = TeamStore::new(conn);
        let team_id = teams.insert(&sample_team(owner, "alpha"))?;

        let members = TeamMemberStore::new(conn);
        let row = TeamMemberRecord {
            id: 0,
            team_id,
            user_id: member,
            role: "member".to_string(),
            can_create_snippets: 1,
            can_edit_snippets: 1,
            can_delete_snippets: 0,
            can_manage_members: 0,
            can_invite_members: 0,
            joined_at: "2024-01-02T00:00:00Z".to_string(),
        };
        members.insert(&row)?;
        members.insert(&row)?;
        Ok(())
    });

    let err = result.expect_err("duplicate membership should fail");
    assert!(err.is_unique_violation());
}

#[test]
fn test_team_counters_clamp_at_zero() {
    let db = test_db();
    db.with_conn(|conn| {
        let users = UserStore::new(conn);
        let owner = users.insert(&sample_user(1))?;

        let teams = TeamStore::new(conn);
        let team_id = teams.insert(&sample_team(owner, "alpha"))?;

        teams.adjust_snippet_count(team_id, -5)?;
        let team = teams.get(team_id)?.expect("team should exist");
        assert_eq!(team.snippet_count, 0);

        teams.adjust_member_count(team_id, 2)?;
        teams.adjust_member_count(team_id, -1)?;
        let team = teams.get(team_id)?.expect("team should exist");
        assert_eq!(team.member_count, 2);
        Ok(())
    })
    .expect("Failed to exercise team counters");
}

#[test]
fn test_snippet_update_head_guards_on_version() {
    let db = test_db();
    db.with_conn(|conn| {
        let users = UserStore::new(conn);
        let owner = users.insert(&sample_user(1))?;

        let snippets = SnippetStore::new(conn);
        let id = snippets.insert(&sample_snippet(owner, "guarded"))?;

        // Guard matches: version advances.
        assert!(snippets.update_head(id, "fn main() { }\n", 1, "2024-01-02T00:00:00Z")?);
        let snippet = snippets.get(id)?.expect("snippet should exist");
        assert_eq!(snippet.version_number, 2);

        // Stale guard: no write.
        assert!(!snippets.update_head(id, "other\n", 1, "2024-01-03T00:00:00Z")?);
        let snippet = snippets.get(id)?.expect("snippet should exist");
        assert_eq!(snippet.version_number, 2);
        assert_eq!(snippet.code, "fn main() { }\n");
        Ok(())
    })
    .expect("Failed to exercise head update");
}

#[test]
fn test_snippet_soft_delete_and_restore() {
    let db = test_db();
    db.with_conn(|conn| {
        let users = UserStore::new(conn);
        let owner = users.insert(&sample_user(1))?;

        let snippets = SnippetStore::new(conn);
        let id = snippets.insert(&sample_snippet(owner, "doomed"))?;

        assert!(snippets.soft_delete(id, "2024-01-02T00:00:00Z")?);
        assert!(!snippets.soft_delete(id, "2024-01-03T00:00:00Z")?);

        let snippet = snippets.get(id)?.expect("tombstoned row still readable");
        assert!(snippet.is_deleted());
        assert!(snippets.list_by_owner(owner)?.is_empty());

        // A deleted snippet cannot take head updates.
        assert!(!snippets.update_head(id, "x\n", 1, "2024-01-04T00:00:00Z")?);

        assert!(snippets.restore(id, "2024-01-05T00:00:00Z")?);
        assert!(!snippets.restore(id, "2024-01-06T00:00:00Z")?);
        assert_eq!(snippets.list_by_owner(owner)?.len(), 1);
        Ok(())
    })
    .expect("Failed to exercise soft delete");
}

#[test]
fn test_version_rows_unique_per_snippet() {
    let db = test_db();
    let result = db.with_conn(|conn| {
        let users = UserStore::new(conn);
        let owner = users.insert(&sample_user(1))?;
        let snippets = SnippetStore::new(conn);
        let snippet_id = snippets.insert(&sample_snippet(owner, "versioned"))?;

        let versions = SnippetVersionStore::new(conn);
        let row = SnippetVersionRecord {
            id: 0,
            snippet_id,
            version_number: 1,
            code: "fn main() {}\n".to_string(),
            change_type: "create".to_string(),
            lines_added: 1,
            lines_removed: 0,
            summary: None,
            author_id: Some(owner),
            created_at: "2024-01-01T00:00:00Z".to_string(),
        };
        versions.insert(&row)?;
        versions.insert(&row)?;
        Ok(())
    });

    let err = result.expect_err("duplicate version number should fail");
    assert!(err.is_unique_violation());
}

#[test]
fn test_tag_attach_detach_and_usage() {
    let db = test_db();
    db.with_conn(|conn| {
        let users = UserStore::new(conn);
        let owner = users.insert(&sample_user(1))?;
        let snippets = SnippetStore::new(conn);
        let s1 = snippets.insert(&sample_snippet(owner, "one"))?;
        let s2 = snippets.insert(&sample_snippet(owner, "two"))?;

        let tags = TagStore::new(conn);
        let tag_id = tags.insert(&TagRecord {
            id: 0,
            name: "python".to_string(),
            slug: "python".to_string(),
            usage_count: 0,
            created_at: "2024-01-01T00:00:00Z".to_string(),
        })?;

        assert!(tags.attach(s1, tag_id)?);
        tags.increment_usage(tag_id)?;
        // Second attach of the same pair is a no-op.
        assert!(!tags.attach(s1, tag_id)?);
        assert!(tags.attach(s2, tag_id)?);
        tags.increment_usage(tag_id)?;

        let tag = tags.get(tag_id)?.expect("tag should exist");
        assert_eq!(tag.usage_count, 2);

        assert!(tags.detach(s1, tag_id)?);
        tags.decrement_usage(tag_id)?;
        assert!(!tags.detach(s1, tag_id)?);

        // Names are case sensitive.
        assert!(tags.get_by_name("Python")?.is_none());
        assert!(tags.get_by_name("python")?.is_some());

        let attached = tags.tags_for_snippet(s2)?;
        assert_eq!(attached.len(), 1);
        assert_eq!(attached[0].name, "python");
        Ok(())
    })
    .expect("Failed to exercise tag store");
}

#[test]
fn test_tag_usage_never_negative() {
    let db = test_db();
    db.with_conn(|conn| {
        let tags = TagStore::new(conn);
        let tag_id = tags.insert(&TagRecord {
            id: 0,
            name: "rust".to_string(),
            slug: "rust".to_string(),
            usage_count: 0,
            created_at: "2024-01-01T00:00:00Z".to_string(),
        })?;

        tags.decrement_usage(tag_id)?;
        tags.decrement_usage(tag_id)?;
        let tag = tags.get(tag_id)?.expect("tag should exist");
        assert_eq!(tag.usage_count, 0);
        Ok(())
    })
    .expect("Failed to exercise usage clamp");
}

#[test]
fn test_view_fingerprints_dedupe() {
    let db = test_db();
    db.with_conn(|conn| {
        let users = UserStore::new(conn);
        let owner = users.insert(&sample_user(1))?;
        let snippets = SnippetStore::new(conn);
        let snippet_id = snippets.insert(&sample_snippet(owner, "watched"))?;

        let views = ViewStore::new(conn);
        assert!(views.record(snippet_id, "fp-1", "2024-01-01T00:00:00Z")?);
        assert!(!views.record(snippet_id, "fp-1", "2024-01-02T00:00:00Z")?);
        assert!(views.record(snippet_id, "fp-2", "2024-01-03T00:00:00Z")?);
        assert_eq!(views.unique_viewers(snippet_id)?, 2);
        Ok(())
    })
    .expect("Failed to exercise view store");
}

#[test]
fn test_favorite_insert_is_idempotent() {
    let db = test_db();
    db.with_conn(|conn| {
        let users = UserStore::new(conn);
        let user = users.insert(&sample_user(1))?;
        let snippets = SnippetStore::new(conn);
        let snippet_id = snippets.insert(&sample_snippet(user, "starred"))?;

        let favorites = FavoriteStore::new(conn);
        assert!(favorites.insert(user, snippet_id, "2024-01-01T00:00:00Z")?);
        assert!(!favorites.insert(user, snippet_id, "2024-01-02T00:00:00Z")?);
        assert!(favorites.exists(user, snippet_id)?);
        assert!(favorites.delete(user, snippet_id)?);
        assert!(!favorites.delete(user, snippet_id)?);
        Ok(())
    })
    .expect("Failed to exercise favorite store");
}

#[test]
fn test_invitation_status_transitions() {
    let db = test_db();
    db.with_conn(|conn| {
        let users = UserStore::new(conn);
        let owner = users.insert(&sample_user(1))?;
        let teams = TeamStore::new(conn);
        let team_id = teams.insert(&sample_team(owner, "alpha"))?;

        let invitations = TeamInvitationStore::new(conn);
        let id = invitations.insert(&TeamInvitationRecord {
            id: 0,
            team_id,
            email: "new@example.com".to_string(),
            inviter_id: owner,
            role: "member".to_string(),
            token: "tok-1".to_string(),
            status: "pending".to_string(),
            expires_at: "2024-02-01T00:00:00Z".to_string(),
            accepted_at: None,
            created_at: "2024-01-01T00:00:00Z".to_string(),
        })?;

        let pending = invitations
            .pending_for(team_id, "new@example.com")?
            .expect("pending lookup");
        assert_eq!(pending.id, id);

        assert!(invitations.update_status(id, "accepted", Some("2024-01-05T00:00:00Z"))?);
        let accepted = invitations.get(id)?.expect("invitation should exist");
        assert_eq!(accepted.status, "accepted");
        assert_eq!(accepted.accepted_at.as_deref(), Some("2024-01-05T00:00:00Z"));

        assert!(invitations.pending_for(team_id, "new@example.com")?.is_none());

        let by_token = invitations.get_by_token("tok-1")?.expect("token lookup");
        assert_eq!(by_token.id, id);
        Ok(())
    })
    .expect("Failed to exercise invitation store");
}

#[test]
fn test_database_persists_across_reopen() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("snipvault.db");

    {
        let db = Database::open(&path).expect("Failed to open database");
        db.with_conn(|conn| {
            let store = UserStore::new(conn);
            store.insert(&sample_user(1))?;
            Ok(())
        })
        .expect("Failed to insert user");
    }

    let db = Database::open(&path).expect("Failed to reopen database");
    db.with_conn(|conn| {
        let store = UserStore::new(conn);
        let user = store.get_by_username("user1")?;
        assert!(user.is_some());
        Ok(())
    })
    .expect("Failed to read user after reopen");
}

#[test]
fn test_transaction_rolls_back_on_error() {
    let db = test_db();

    let result: sv_local_db::Result<()> = db.transaction(|conn| {
        let store = UserStore::new(conn);
        store.insert(&sample_user(1))?;
        Err(sv_local_db::Error::generic("forced failure"))
    });
    assert!(result.is_err());

    db.with_conn(|conn| {
        let store = UserStore::new(conn);
        assert!(store.get_by_username("user1")?.is_none());
        Ok(())
    })
    .expect("Failed to verify rollback");
}
