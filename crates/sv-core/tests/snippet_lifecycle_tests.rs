//! Tests for the snippet lifecycle: creation, versioning, visibility,
//! tags, views, and the social layer around snippets.

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use sv_core::{
    Error, FixedClock, NewSnippet, NewTeam, Privacy, SequenceTokens, SnipVault, TeamRole,
};
use sv_local_db::{Database, SnippetRecord, UserRecord};

fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
}

/// Vault over an in-memory database with a pinned clock and predictable
/// tokens.
fn fixed_vault() -> SnipVault {
    let db = Database::open_in_memory().expect("open in-memory database");
    SnipVault::with_parts(
        db,
        Arc::new(FixedClock(base_time())),
        Arc::new(SequenceTokens::default()),
    )
}

fn register(vault: &SnipVault, name: &str) -> UserRecord {
    vault
        .users()
        .register(name, &format!("{}@example.com", name), None)
        .expect("register user")
}

fn new_snippet(title: &str, code: &str, privacy: Privacy) -> NewSnippet {
    NewSnippet {
        title: title.to_string(),
        description: None,
        language: "rust".to_string(),
        code: code.to_string(),
        privacy,
        team_id: None,
        tags: Vec::new(),
    }
}

fn create_snippet(vault: &SnipVault, owner_id: i64, title: &str, privacy: Privacy) -> SnippetRecord {
    vault
        .snippets()
        .create(owner_id, new_snippet(title, "fn main() {}\n", privacy))
        .expect("create snippet")
}

#[test]
fn test_create_snippet_starts_at_version_one() {
    let vault = fixed_vault();
    let owner = register(&vault, "alice");

    let snippet = vault
        .snippets()
        .create(owner.id, new_snippet("hello", "a\nb\n", Privacy::Public))
        .expect("create snippet");

    assert_eq!(snippet.version_number, 1);
    let history = vault.versions().history(snippet.id).expect("history");
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].version_number, 1);
    assert_eq!(history[0].change_type, "create");
    assert_eq!(history[0].lines_added, 2);
    assert_eq!(history[0].lines_removed, 0);
}

#[test]
fn test_record_change_counts_line_deltas() {
    let vault = fixed_vault();
    let owner = register(&vault, "alice");
    let snippet = vault
        .snippets()
        .create(owner.id, new_snippet("hello", "a\nb\n", Privacy::Public))
        .expect("create snippet");

    let v2 = vault
        .versions()
        .record_change(snippet.id, Some(owner.id), "a\nb\nc\n", Some("append c"))
        .expect("record change");
    assert_eq!(v2.version_number, 2);
    assert_eq!(v2.lines_added, 1);
    assert_eq!(v2.lines_removed, 0);
    assert_eq!(v2.summary.as_deref(), Some("append c"));

    let v3 = vault
        .versions()
        .record_change(snippet.id, Some(owner.id), "a\nb\n", None)
        .expect("record change");
    assert_eq!(v3.version_number, 3);
    assert_eq!(v3.lines_added, 0);
    assert_eq!(v3.lines_removed, 1);

    // Saving identical code is a no-op: no new row, the latest version
    // comes back.
    let unchanged = vault
        .versions()
        .record_change(snippet.id, Some(owner.id), "a\nb\n", None)
        .expect("record change");
    assert_eq!(unchanged.id, v3.id);
    assert_eq!(unchanged.version_number, 3);

    let head = vault
        .snippets()
        .get_visible(snippet.id, Some(owner.id))
        .expect("get snippet");
    assert_eq!(head.version_number, 3);
    assert_eq!(head.code, "a\nb\n");
    assert_eq!(vault.versions().history(snippet.id).expect("history").len(), 3);
}

#[test]
fn test_restore_version_appends_instead_of_rewriting() {
    let vault = fixed_vault();
    let owner = register(&vault, "alice");
    let snippet = vault
        .snippets()
        .create(owner.id, new_snippet("hello", "a\nb\n", Privacy::Public))
        .expect("create snippet");

    vault
        .versions()
        .record_change(snippet.id, Some(owner.id), "a\nb\nc\n", None)
        .expect("record change");

    let rollback = vault
        .versions()
        .restore_version(snippet.id, Some(owner.id), 1)
        .expect("restore version");
    assert_eq!(rollback.version_number, 3);
    assert_eq!(rollback.change_type, "restore");
    assert_eq!(rollback.code, "a\nb\n");
    assert_eq!(rollback.lines_added, 0);
    assert_eq!(rollback.lines_removed, 1);
    assert_eq!(rollback.summary.as_deref(), Some("restore of version 1"));

    let head = vault
        .snippets()
        .get_visible(snippet.id, Some(owner.id))
        .expect("get snippet");
    assert_eq!(head.version_number, 3);
    assert_eq!(head.code, "a\nb\n");

    // Restoring code identical to the head writes nothing and hands back
    // the head version.
    let unchanged = vault
        .versions()
        .restore_version(snippet.id, Some(owner.id), 1)
        .expect("restore version");
    assert_eq!(unchanged.id, rollback.id);

    let err = vault
        .versions()
        .restore_version(snippet.id, Some(owner.id), 99)
        .expect_err("unknown version must fail");
    assert!(matches!(err, Error::NotFound { .. }));
}

#[test]
fn test_record_change_on_deleted_snippet_rejected() {
    let vault = fixed_vault();
    let owner = register(&vault, "alice");
    let snippet = create_snippet(&vault, owner.id, "doomed", Privacy::Public);

    vault
        .snippets()
        .delete(snippet.id, owner.id)
        .expect("delete snippet");

    let err = vault
        .versions()
        .record_change(snippet.id, Some(owner.id), "changed\n", None)
        .expect_err("change on deleted snippet must fail");
    assert!(matches!(err, Error::InvalidState { .. }));
}

#[test]
fn test_visibility_matrix() {
    let vault = fixed_vault();
    let owner = register(&vault, "alice");
    let teammate = register(&vault, "bob");
    let stranger = register(&vault, "mallory");

    let team = vault
        .teams()
        .create_team(
            owner.id,
            NewTeam {
                name: "Rustaceans".to_string(),
                slug: None,
                privacy: Privacy::Private,
                description: None,
            },
        )
        .expect("create team");
    vault
        .teams()
        .add_member(team.id, teammate.id, TeamRole::Member, owner.id)
        .expect("add member");

    let public = create_snippet(&vault, owner.id, "public", Privacy::Public);
    let unlisted = create_snippet(&vault, owner.id, "unlisted", Privacy::Unlisted);
    let private = create_snippet(&vault, owner.id, "private", Privacy::Private);
    let team_snippet = vault
        .snippets()
        .create(
            owner.id,
            NewSnippet {
                team_id: Some(team.id),
                ..new_snippet("team", "fn main() {}\n", Privacy::Team)
            },
        )
        .expect("create team snippet");

    let visibility = vault.visibility();
    for user in [Some(owner.id), Some(teammate.id), Some(stranger.id), None] {
        assert!(visibility.can_view(&public, user).expect("can_view"));
        assert!(visibility.can_view(&unlisted, user).expect("can_view"));
    }

    assert!(visibility.can_view(&private, Some(owner.id)).expect("can_view"));
    assert!(!visibility.can_view(&private, Some(teammate.id)).expect("can_view"));
    assert!(!visibility.can_view(&private, Some(stranger.id)).expect("can_view"));
    assert!(!visibility.can_view(&private, None).expect("can_view"));

    assert!(visibility.can_view(&team_snippet, Some(owner.id)).expect("can_view"));
    assert!(visibility.can_view(&team_snippet, Some(teammate.id)).expect("can_view"));
    assert!(!visibility.can_view(&team_snippet, Some(stranger.id)).expect("can_view"));
    assert!(!visibility.can_view(&team_snippet, None).expect("can_view"));

    // Editing: the owner always may; a member role carries edit rights on
    // team snippets; nobody else does.
    assert!(visibility.can_edit(&public, Some(owner.id)).expect("can_edit"));
    assert!(!visibility.can_edit(&public, Some(stranger.id)).expect("can_edit"));
    assert!(!visibility.can_edit(&public, None).expect("can_edit"));
    assert!(visibility.can_edit(&team_snippet, Some(teammate.id)).expect("can_edit"));
    assert!(!visibility.can_edit(&team_snippet, Some(stranger.id)).expect("can_edit"));
}

#[test]
fn test_deleted_snippet_reads_as_absent() {
    let vault = fixed_vault();
    let owner = register(&vault, "alice");
    let snippet = create_snippet(&vault, owner.id, "gone", Privacy::Public);

    vault
        .snippets()
        .delete(snippet.id, owner.id)
        .expect("delete snippet");

    let err = vault
        .snippets()
        .get_visible(snippet.id, Some(owner.id))
        .expect_err("deleted snippet must read as absent");
    assert!(matches!(err, Error::NotFound { .. }));

    let err = vault
        .social()
        .favorite(owner.id, snippet.id)
        .expect_err("favoriting a deleted snippet must fail");
    assert!(matches!(err, Error::NotFound { .. }));
}

#[test]
fn test_restore_requires_owner_and_tombstone() {
    let vault = fixed_vault();
    let owner = register(&vault, "alice");
    let stranger = register(&vault, "mallory");
    let snippet = create_snippet(&vault, owner.id, "phoenix", Privacy::Public);
    let tag = vault.tags().attach(snippet.id, "rust").expect("attach");
    assert_eq!(tag.usage_count, 1);

    let err = vault
        .snippets()
        .restore(snippet.id, owner.id)
        .expect_err("restoring a live snippet must fail");
    assert!(matches!(err, Error::InvalidState { .. }));

    vault
        .snippets()
        .delete(snippet.id, owner.id)
        .expect("delete snippet");

    let err = vault
        .snippets()
        .restore(snippet.id, stranger.id)
        .expect_err("only the owner may restore");
    assert!(matches!(err, Error::Forbidden { .. }));

    let restored = vault
        .snippets()
        .restore(snippet.id, owner.id)
        .expect("restore snippet");
    assert!(restored.deleted_at.is_none());
    assert!(vault
        .snippets()
        .get_visible(snippet.id, Some(owner.id))
        .is_ok());

    // Deletion detached the tag and its usage; restore does not reattach.
    assert!(vault
        .tags()
        .for_snippet(snippet.id)
        .expect("tags")
        .is_empty());
    assert_eq!(vault.tags().top(10).expect("top")[0].usage_count, 0);
}

#[test]
fn test_fork_copies_code_and_links_parent() {
    let vault = fixed_vault();
    let owner = register(&vault, "alice");
    let forker = register(&vault, "bob");

    let source = vault
        .snippets()
        .create(
            owner.id,
            NewSnippet {
                tags: vec!["python".to_string()],
                ..new_snippet("origin", "print('hi')\n", Privacy::Public)
            },
        )
        .expect("create snippet");

    let fork = vault
        .snippets()
        .fork(source.id, forker.id)
        .expect("fork snippet");

    assert_eq!(fork.owner_id, forker.id);
    assert_eq!(fork.parent_id, Some(source.id));
    assert_eq!(fork.code, source.code);
    assert_eq!(fork.privacy, "private");
    assert_eq!(fork.version_number, 1);

    let fork_history = vault.versions().history(fork.id).expect("history");
    assert_eq!(fork_history.len(), 1);
    assert_eq!(fork_history[0].change_type, "fork");

    let source_after = vault
        .snippets()
        .get_visible(source.id, Some(owner.id))
        .expect("get source");
    assert_eq!(source_after.fork_count, 1);

    // Tags ride along and the shared tag is now used twice.
    let fork_tags = vault.tags().for_snippet(fork.id).expect("fork tags");
    assert_eq!(fork_tags.len(), 1);
    assert_eq!(fork_tags[0].name, "python");
    assert_eq!(fork_tags[0].usage_count, 2);

    let feed = vault.notifications().list(owner.id, 10).expect("feed");
    assert_eq!(feed.len(), 1);
    assert_eq!(feed[0].kind, "snippet_forked");
}

#[test]
fn test_fork_of_invisible_snippet_rejected() {
    let vault = fixed_vault();
    let owner = register(&vault, "alice");
    let outsider = register(&vault, "mallory");
    let hidden = create_snippet(&vault, owner.id, "hidden", Privacy::Private);

    let err = vault
        .snippets()
        .fork(hidden.id, outsider.id)
        .expect_err("forking an invisible snippet must fail");
    assert!(matches!(err, Error::Forbidden { .. }));
}

#[test]
fn test_view_counts_dedupe_by_fingerprint() {
    let vault = fixed_vault();
    let owner = register(&vault, "alice");
    let snippet = create_snippet(&vault, owner.id, "popular", Privacy::Public);

    let snippets = vault.snippets();
    snippets.record_view(snippet.id, None, "fp-1").expect("view");
    snippets.record_view(snippet.id, None, "fp-1").expect("view");
    snippets.record_view(snippet.id, None, "fp-2").expect("view");

    let after = snippets
        .get_visible(snippet.id, Some(owner.id))
        .expect("get snippet");
    assert_eq!(after.view_count, 3);
    assert_eq!(after.unique_view_count, 2);

    // Anonymous views of a private snippet are rejected.
    let hidden = create_snippet(&vault, owner.id, "hidden", Privacy::Private);
    let err = snippets
        .record_view(hidden.id, None, "fp-1")
        .expect_err("anonymous view of a private snippet must fail");
    assert!(matches!(err, Error::Forbidden { .. }));
    snippets
        .record_view(hidden.id, Some(owner.id), "fp-1")
        .expect("owner view");
}

#[test]
fn test_tag_usage_ledger() {
    let vault = fixed_vault();
    let owner = register(&vault, "alice");
    let first = create_snippet(&vault, owner.id, "first", Privacy::Public);
    let second = create_snippet(&vault, owner.id, "second", Privacy::Public);

    let tags = vault.tags();
    let tag = tags.attach(first.id, "python").expect("attach");
    assert_eq!(tag.usage_count, 1);

    let tag = tags.attach(second.id, "python").expect("attach");
    assert_eq!(tag.usage_count, 2);

    // Attaching the same tag twice does not double-count.
    let tag = tags.attach(second.id, "python").expect("attach");
    assert_eq!(tag.usage_count, 2);

    tags.retag(first.id, &[]).expect("retag");
    let top = tags.top(10).expect("top");
    assert_eq!(top[0].name, "python");
    assert_eq!(top[0].usage_count, 1);

    tags.detach(second.id, "python").expect("detach");
    let top = tags.top(10).expect("top");
    assert_eq!(top[0].usage_count, 0);

    // Detaching an unattached tag is a no-op, never a negative count.
    tags.detach(second.id, "python").expect("detach");
    assert_eq!(tags.top(10).expect("top")[0].usage_count, 0);
}

#[test]
fn test_retag_touches_only_the_difference() {
    let vault = fixed_vault();
    let owner = register(&vault, "alice");
    let snippet = create_snippet(&vault, owner.id, "tagged", Privacy::Public);

    let tags = vault.tags();
    tags.retag(snippet.id, &["alpha".to_string(), "beta".to_string()])
        .expect("retag");
    let current = tags
        .retag(snippet.id, &["beta".to_string(), "gamma".to_string()])
        .expect("retag");

    let names: Vec<&str> = current.iter().map(|tag| tag.name.as_str()).collect();
    assert_eq!(names, vec!["beta", "gamma"]);

    let by_name: std::collections::HashMap<String, i64> = tags
        .top(10)
        .expect("top")
        .into_iter()
        .map(|tag| (tag.name, tag.usage_count))
        .collect();
    assert_eq!(by_name["alpha"], 0);
    assert_eq!(by_name["beta"], 1);
    assert_eq!(by_name["gamma"], 1);
}

#[test]
fn test_favorites_adjust_counter_once() {
    let vault = fixed_vault();
    let owner = register(&vault, "alice");
    let fan = register(&vault, "bob");
    let snippet = create_snippet(&vault, owner.id, "loved", Privacy::Public);

    let social = vault.social();
    social.favorite(fan.id, snippet.id).expect("favorite");
    social.favorite(fan.id, snippet.id).expect("favorite again");

    let after = vault
        .snippets()
        .get_visible(snippet.id, Some(owner.id))
        .expect("get snippet");
    assert_eq!(after.favorite_count, 1);
    assert!(social.is_favorite(fan.id, snippet.id).expect("is_favorite"));

    // One favorite, one notification.
    let feed = vault.notifications().list(owner.id, 10).expect("feed");
    assert_eq!(feed.len(), 1);
    assert_eq!(feed[0].kind, "snippet_favorited");

    social.unfavorite(fan.id, snippet.id).expect("unfavorite");
    social.unfavorite(fan.id, snippet.id).expect("unfavorite again");
    let after = vault
        .snippets()
        .get_visible(snippet.id, Some(owner.id))
        .expect("get snippet");
    assert_eq!(after.favorite_count, 0);
}

#[test]
fn test_comments_thread_and_counter() {
    let vault = fixed_vault();
    let owner = register(&vault, "alice");
    let commenter = register(&vault, "bob");
    let snippet = create_snippet(&vault, owner.id, "discussed", Privacy::Public);

    let social = vault.social();
    let root = social
        .comment(commenter.id, snippet.id, "nice one", None)
        .expect("comment");
    let _reply = social
        .comment(owner.id, snippet.id, "thanks", Some(root.id))
        .expect("reply");

    let err = social
        .comment(owner.id, snippet.id, "", None)
        .expect_err("empty comment must fail");
    assert!(matches!(err, Error::InvalidState { .. }));

    let other = create_snippet(&vault, owner.id, "other", Privacy::Public);
    let err = social
        .comment(owner.id, other.id, "wrong thread", Some(root.id))
        .expect_err("parent from another snippet must fail");
    assert!(matches!(err, Error::InvalidState { .. }));

    let after = vault
        .snippets()
        .get_visible(snippet.id, Some(owner.id))
        .expect("get snippet");
    assert_eq!(after.comment_count, 2);

    // The snippet owner may moderate.
    social.delete_comment(root.id, owner.id).expect("delete comment");
    let remaining = social
        .comments_on(snippet.id, Some(owner.id))
        .expect("comments");
    assert_eq!(remaining.len(), 1);
    let after = vault
        .snippets()
        .get_visible(snippet.id, Some(owner.id))
        .expect("get snippet");
    assert_eq!(after.comment_count, 1);
}

#[test]
fn test_follow_is_not_reflexive() {
    let vault = fixed_vault();
    let alice = register(&vault, "alice");
    let bob = register(&vault, "bob");

    let social = vault.social();
    let err = social
        .follow(alice.id, alice.id)
        .expect_err("self-follow must fail");
    assert!(matches!(err, Error::InvalidState { .. }));

    social.follow(alice.id, bob.id).expect("follow");
    social.follow(alice.id, bob.id).expect("follow again");
    assert_eq!(social.followers_of(bob.id).expect("followers"), vec![alice.id]);
    assert_eq!(vault.notifications().unread_count(bob.id).expect("unread"), 1);

    social.unfollow(alice.id, bob.id).expect("unfollow");
    assert!(social.followers_of(bob.id).expect("followers").is_empty());
}

#[test]
fn test_collections_keep_insertion_order() {
    let vault = fixed_vault();
    let owner = register(&vault, "alice");
    let stranger = register(&vault, "mallory");
    let first = create_snippet(&vault, owner.id, "first", Privacy::Public);
    let second = create_snippet(&vault, owner.id, "second", Privacy::Public);

    let collections = vault.collections();
    let shelf = collections
        .create(owner.id, "favorites", None, false)
        .expect("create collection");

    collections
        .add_snippet(shelf.id, owner.id, first.id)
        .expect("add first");
    collections
        .add_snippet(shelf.id, owner.id, second.id)
        .expect("add second");

    let err = collections
        .add_snippet(shelf.id, owner.id, first.id)
        .expect_err("duplicate entry must conflict");
    assert!(matches!(err, Error::Conflict { .. }));

    let err = collections
        .snippets_in(shelf.id, Some(stranger.id))
        .expect_err("private collection is owner-only");
    assert!(matches!(err, Error::Forbidden { .. }));

    let entries = collections
        .snippets_in(shelf.id, Some(owner.id))
        .expect("entries");
    let ids: Vec<i64> = entries.iter().map(|entry| entry.snippet_id).collect();
    assert_eq!(ids, vec![first.id, second.id]);

    collections
        .remove_snippet(shelf.id, owner.id, first.id)
        .expect("remove");
    let entries = collections
        .snippets_in(shelf.id, Some(owner.id))
        .expect("entries");
    assert_eq!(entries.len(), 1);
}

#[test]
fn test_notifications_acknowledge_once() {
    let vault = fixed_vault();
    let owner = register(&vault, "alice");
    let fan = register(&vault, "bob");
    let snippet = create_snippet(&vault, owner.id, "seen", Privacy::Public);

    vault.social().favorite(fan.id, snippet.id).expect("favorite");
    vault.snippets().fork(snippet.id, fan.id).expect("fork");

    let notifications = vault.notifications();
    assert_eq!(notifications.unread_count(owner.id).expect("unread"), 2);

    let feed = notifications.list(owner.id, 10).expect("feed");
    assert!(notifications
        .mark_read(owner.id, feed[0].id)
        .expect("mark read"));
    assert!(!notifications
        .mark_read(owner.id, feed[0].id)
        .expect("mark read twice"));
    assert_eq!(notifications.unread_count(owner.id).expect("unread"), 1);

    // A user cannot acknowledge someone else's notification.
    assert!(!notifications
        .mark_read(fan.id, feed[1].id)
        .expect("foreign mark read"));

    assert_eq!(notifications.mark_all_read(owner.id).expect("mark all"), 1);
    assert_eq!(notifications.unread_count(owner.id).expect("unread"), 0);
}

#[test]
fn test_create_validations() {
    let vault = fixed_vault();
    let owner = register(&vault, "alice");

    let err = vault
        .snippets()
        .create(owner.id, new_snippet("  ", "code\n", Privacy::Public))
        .expect_err("blank title must fail");
    assert!(matches!(err, Error::InvalidState { .. }));

    let err = vault
        .snippets()
        .create(
            owner.id,
            NewSnippet {
                language: " ".to_string(),
                ..new_snippet("titled", "code\n", Privacy::Public)
            },
        )
        .expect_err("blank language must fail");
    assert!(matches!(err, Error::InvalidState { .. }));

    let err = vault
        .snippets()
        .create(owner.id, new_snippet("team-less", "code\n", Privacy::Team))
        .expect_err("team privacy without a team must fail");
    assert!(matches!(err, Error::InvalidState { .. }));

    let err = vault
        .snippets()
        .create(9999, new_snippet("ghost", "code\n", Privacy::Public))
        .expect_err("unknown owner must fail");
    assert!(matches!(err, Error::NotFound { .. }));
}

#[test]
fn test_vault_persists_across_reopen() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("vault.db");

    let snippet_id = {
        let vault = SnipVault::open(&path).expect("open vault");
        let owner = register(&vault, "alice");
        create_snippet(&vault, owner.id, "durable", Privacy::Public).id
    };

    let vault = SnipVault::open(&path).expect("reopen vault");
    let snippet = vault
        .snippets()
        .get_visible(snippet_id, None)
        .expect("snippet survives reopen");
    assert_eq!(snippet.title, "durable");
}
