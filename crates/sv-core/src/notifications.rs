//! In-store notifications.
//!
//! Services push rows as part of the transaction that triggered them;
//! delivery beyond the store (email, websockets) is someone else's job.

use std::sync::Arc;

use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use sv_local_db::{Database, NotificationRecord, NotificationStore};

use crate::clock::{format_ts, Clock};

/// What a notification is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    InvitationAccepted,
    InvitationDeclined,
    MemberJoined,
    ShareReceived,
    SnippetForked,
    SnippetCommented,
    SnippetFavorited,
    NewFollower,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvitationAccepted => "invitation_accepted",
            Self::InvitationDeclined => "invitation_declined",
            Self::MemberJoined => "member_joined",
            Self::ShareReceived => "share_received",
            Self::SnippetForked => "snippet_forked",
            Self::SnippetCommented => "snippet_commented",
            Self::SnippetFavorited => "snippet_favorited",
            Self::NewFollower => "new_follower",
        }
    }
}

/// Push a notification inside the caller's transaction.
pub(crate) fn push(
    conn: &Connection,
    now: &str,
    user_id: i64,
    kind: NotificationKind,
    subject: &str,
    data: Option<serde_json::Value>,
) -> crate::Result<()> {
    let data = match data {
        Some(value) => Some(serde_json::to_string(&value)?),
        None => None,
    };
    let record = NotificationRecord {
        id: 0, // Will be set by autoincrement
        user_id,
        kind: kind.as_str().to_string(),
        subject: subject.to_string(),
        data,
        read_at: None,
        created_at: now.to_string(),
    };
    NotificationStore::new(conn).insert(&record)?;
    Ok(())
}

/// Reading and acknowledging a user's notifications.
pub struct NotificationManager {
    db: Database,
    clock: Arc<dyn Clock>,
}

impl NotificationManager {
    pub fn new(db: Database, clock: Arc<dyn Clock>) -> Self {
        Self { db, clock }
    }

    /// A user's notifications, newest first.
    pub fn list(&self, user_id: i64, limit: i64) -> crate::Result<Vec<NotificationRecord>> {
        crate::db::read(&self.db, |conn| {
            Ok(NotificationStore::new(conn).list_for_user(user_id, limit)?)
        })
    }

    pub fn unread_count(&self, user_id: i64) -> crate::Result<i64> {
        crate::db::read(&self.db, |conn| {
            Ok(NotificationStore::new(conn).unread_count(user_id)?)
        })
    }

    /// Mark one notification read. Returns false when there was nothing to
    /// flip: unknown id, someone else's notification, or already read.
    pub fn mark_read(&self, user_id: i64, notification_id: i64) -> crate::Result<bool> {
        let now = format_ts(self.clock.now());
        crate::db::transact(&self.db, |conn| {
            Ok(NotificationStore::new(conn).mark_read(notification_id, user_id, &now)?)
        })
    }

    /// Mark everything unread as read; returns how many were flipped.
    pub fn mark_all_read(&self, user_id: i64) -> crate::Result<usize> {
        let now = format_ts(self.clock.now());
        crate::db::transact(&self.db, |conn| {
            Ok(NotificationStore::new(conn).mark_all_read(user_id, &now)?)
        })
    }
}
