//! Database models and persistence operations.
//!
//! Each entity gets a plain record struct mirroring its table row and a
//! store type borrowing a connection for the queries the services need.
//! Records carry RFC 3339 timestamps as text; enum-like columns are stored
//! as text and parsed by the domain layer.

mod audit;
mod collection;
mod comment;
mod favorite;
mod follow;
mod notification;
mod share;
mod snippet;
mod tag;
mod team;
mod team_invitation;
mod team_member;
mod user;
mod version;
mod view;

pub use audit::{AuditLogRecord, AuditLogStore};
pub use collection::{CollectionRecord, CollectionSnippetRecord, CollectionStore};
pub use comment::{CommentRecord, CommentStore};
pub use favorite::{FavoriteRecord, FavoriteStore};
pub use follow::{FollowRecord, FollowStore};
pub use notification::{NotificationRecord, NotificationStore};
pub use share::{ShareRecord, ShareStore};
pub use snippet::{SnippetRecord, SnippetStore};
pub use tag::{TagRecord, TagStore};
pub use team::{TeamRecord, TeamStore};
pub use team_invitation::{TeamInvitationRecord, TeamInvitationStore};
pub use team_member::{TeamMemberRecord, TeamMemberStore};
pub use user::{UserRecord, UserStore};
pub use version::{SnippetVersionRecord, SnippetVersionStore};
pub use view::ViewStore;
