//! Favorites, follows and comments.
//!
//! These are lightweight engagement writes; each keeps its denormalized
//! counter in step inside the same transaction.

use std::sync::Arc;

use rusqlite::Connection;
use sv_local_db::{
    CommentRecord, CommentStore, Database, FavoriteStore, FollowStore, SnippetStore, UserStore,
};

use crate::clock::{format_ts, Clock};
use crate::notifications::{self, NotificationKind};
use crate::snippets::live_snippet_on;
use crate::visibility;

pub struct SocialManager {
    db: Database,
    clock: Arc<dyn Clock>,
}

impl SocialManager {
    pub fn new(db: Database, clock: Arc<dyn Clock>) -> Self {
        Self { db, clock }
    }

    /// Favorite a snippet the user can view. Repeat calls are no-ops and
    /// never double-count.
    pub fn favorite(&self, user_id: i64, snippet_id: i64) -> crate::Result<()> {
        let now = format_ts(self.clock.now());
        crate::db::transact(&self.db, |conn| {
            let snippet = live_snippet_on(conn, snippet_id)?;
            if !visibility::can_view_on(conn, &snippet, Some(user_id))? {
                return Err(crate::Error::forbidden("snippet is not visible to you"));
            }
            if !FavoriteStore::new(conn).insert(user_id, snippet_id, &now)? {
                return Ok(());
            }
            SnippetStore::new(conn).adjust_favorite_count(snippet_id, 1)?;
            if snippet.owner_id != user_id {
                notifications::push(
                    conn,
                    &now,
                    snippet.owner_id,
                    NotificationKind::SnippetFavorited,
                    &format!("your snippet \"{}\" was favorited", snippet.title),
                    Some(serde_json::json!({ "snippet_id": snippet_id, "user_id": user_id })),
                )?;
            }
            Ok(())
        })
    }

    /// Remove a favorite; absent rows are a no-op.
    pub fn unfavorite(&self, user_id: i64, snippet_id: i64) -> crate::Result<()> {
        crate::db::transact(&self.db, |conn| {
            if FavoriteStore::new(conn).delete(user_id, snippet_id)? {
                SnippetStore::new(conn).adjust_favorite_count(snippet_id, -1)?;
            }
            Ok(())
        })
    }

    pub fn is_favorite(&self, user_id: i64, snippet_id: i64) -> crate::Result<bool> {
        crate::db::read(&self.db, |conn| {
            Ok(FavoriteStore::new(conn).exists(user_id, snippet_id)?)
        })
    }

    pub fn favorites_of(&self, user_id: i64) -> crate::Result<Vec<i64>> {
        crate::db::read(&self.db, |conn| {
            Ok(FavoriteStore::new(conn).snippet_ids_for_user(user_id)?)
        })
    }

    /// Follow another user. Self-follows are rejected.
    pub fn follow(&self, follower_id: i64, followed_id: i64) -> crate::Result<()> {
        if follower_id == followed_id {
            return Err(crate::Error::invalid_state("cannot follow yourself"));
        }
        let now = format_ts(self.clock.now());
        crate::db::transact(&self.db, |conn| {
            let users = UserStore::new(conn);
            if users.get(follower_id)?.is_none() {
                return Err(crate::Error::not_found("user", follower_id));
            }
            if users.get(followed_id)?.is_none() {
                return Err(crate::Error::not_found("user", followed_id));
            }
            if !FollowStore::new(conn).insert(follower_id, followed_id, &now)? {
                return Ok(());
            }
            notifications::push(
                conn,
                &now,
                followed_id,
                NotificationKind::NewFollower,
                "you have a new follower",
                Some(serde_json::json!({ "follower_id": follower_id })),
            )?;
            Ok(())
        })
    }

    pub fn unfollow(&self, follower_id: i64, followed_id: i64) -> crate::Result<()> {
        crate::db::transact(&self.db, |conn| {
            FollowStore::new(conn).delete(follower_id, followed_id)?;
            Ok(())
        })
    }

    pub fn followers_of(&self, user_id: i64) -> crate::Result<Vec<i64>> {
        crate::db::read(&self.db, |conn| {
            Ok(FollowStore::new(conn).follower_ids(user_id)?)
        })
    }

    pub fn followed_by(&self, user_id: i64) -> crate::Result<Vec<i64>> {
        crate::db::read(&self.db, |conn| {
            Ok(FollowStore::new(conn).followed_ids(user_id)?)
        })
    }

    /// Comment on a visible snippet. Replies must target a live comment
    /// on the same snippet.
    pub fn comment(
        &self,
        author_id: i64,
        snippet_id: i64,
        body: &str,
        parent_id: Option<i64>,
    ) -> crate::Result<CommentRecord> {
        let body = body.trim();
        if body.is_empty() {
            return Err(crate::Error::invalid_state("comment body must not be empty"));
        }
        let now = format_ts(self.clock.now());
        crate::db::transact(&self.db, |conn| {
            let snippet = live_snippet_on(conn, snippet_id)?;
            if !visibility::can_view_on(conn, &snippet, Some(author_id))? {
                return Err(crate::Error::forbidden("snippet is not visible to you"));
            }
            if let Some(parent_id) = parent_id {
                let parent = CommentStore::new(conn)
                    .get(parent_id)?
                    .ok_or_else(|| crate::Error::not_found("comment", parent_id))?;
                if parent.snippet_id != snippet_id {
                    return Err(crate::Error::invalid_state(
                        "parent comment belongs to a different snippet",
                    ));
                }
                if parent.deleted_at.is_some() {
                    return Err(crate::Error::invalid_state("parent comment is deleted"));
                }
            }

            let comments = CommentStore::new(conn);
            let record = CommentRecord {
                id: 0, // Will be set by autoincrement
                snippet_id,
                author_id,
                body: body.to_string(),
                parent_id,
                created_at: now.clone(),
                updated_at: now.clone(),
                deleted_at: None,
            };
            let id = comments.insert(&record)?;
            SnippetStore::new(conn).adjust_comment_count(snippet_id, 1)?;

            if snippet.owner_id != author_id {
                notifications::push(
                    conn,
                    &now,
                    snippet.owner_id,
                    NotificationKind::SnippetCommented,
                    &format!("new comment on \"{}\"", snippet.title),
                    Some(serde_json::json!({ "snippet_id": snippet_id, "comment_id": id })),
                )?;
            }
            Ok(CommentRecord { id, ..record })
        })
    }

    /// Tombstone a comment. The comment's author and the snippet's owner
    /// may both do this.
    pub fn delete_comment(&self, comment_id: i64, actor_id: i64) -> crate::Result<()> {
        let now = format_ts(self.clock.now());
        crate::db::transact(&self.db, |conn| {
            let comments = CommentStore::new(conn);
            let comment = comments
                .get(comment_id)?
                .ok_or_else(|| crate::Error::not_found("comment", comment_id))?;
            if comment.deleted_at.is_some() {
                return Err(crate::Error::not_found("comment", comment_id));
            }
            let snippet_owner = snippet_owner_on(conn, comment.snippet_id)?;
            if actor_id != comment.author_id && Some(actor_id) != snippet_owner {
                return Err(crate::Error::forbidden(
                    "only the author or the snippet owner may delete a comment",
                ));
            }
            if comments.soft_delete(comment_id, &now)? {
                SnippetStore::new(conn).adjust_comment_count(comment.snippet_id, -1)?;
            }
            Ok(())
        })
    }

    /// Live comments on a visible snippet, oldest first.
    pub fn comments_on(
        &self,
        snippet_id: i64,
        acting_user: Option<i64>,
    ) -> crate::Result<Vec<CommentRecord>> {
        crate::db::read(&self.db, |conn| {
            let snippet = live_snippet_on(conn, snippet_id)?;
            if !visibility::can_view_on(conn, &snippet, acting_user)? {
                return Err(crate::Error::forbidden("snippet is not visible to you"));
            }
            Ok(CommentStore::new(conn).list_for_snippet(snippet_id)?)
        })
    }
}

fn snippet_owner_on(conn: &Connection, snippet_id: i64) -> crate::Result<Option<i64>> {
    Ok(SnippetStore::new(conn)
        .get(snippet_id)?
        .map(|snippet| snippet.owner_id))
}
