//! Core domain services for SnipVault.
//!
//! This crate implements the snippet vault's rules on top of the
//! sv-local-db store: who may see and edit what, how edits become
//! versions, how tags, teams, invitations and shares behave. Everything
//! here is synchronous and talks to a single SQLite database.

pub mod audit;
pub mod clock;
pub mod collections;
mod db;
pub mod diff;
pub mod entities;
pub mod error;
pub mod invitations;
pub mod notifications;
pub mod shares;
pub mod snippets;
pub mod social;
pub mod tags;
pub mod teams;
pub mod token;
pub mod users;
pub mod vault;
pub mod versioning;
pub mod visibility;

/// Result type used throughout the vault services.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type covering all vault operations.
pub use error::Error;

/// The one-stop handle over the store and every service.
pub use vault::SnipVault;

/// Domain enums and the per-team capability set.
pub use entities::{
    CapabilitySet, ChangeType, InvitationStatus, Privacy, SharePermission, ShareType, TeamRole,
};

/// Line-oriented change accounting between two versions of a snippet.
pub use diff::{line_count, line_delta, LineDelta};

/// Snippet lifecycle management.
pub use snippets::{NewSnippet, SnippetManager};

/// Version history and guarded head updates.
pub use versioning::VersionManager;

/// Visibility and edit-permission resolution.
pub use visibility::VisibilityResolver;

/// Tag vocabulary and usage accounting.
pub use tags::{slugify, TagManager};

/// Team membership and roles.
pub use teams::{NewTeam, TeamManager};

/// Invitation lifecycle with lazy expiry.
pub use invitations::InvitationManager;

/// Share grants and token resolution.
pub use shares::{NewShare, ShareGrant, ShareManager};

/// Favorites, follows and comments.
pub use social::SocialManager;

/// User-curated collections.
pub use collections::CollectionManager;

/// Per-user notification feed.
pub use notifications::{NotificationKind, NotificationManager};

/// Append-only audit trail.
pub use audit::AuditTrail;

/// User registration and lookup.
pub use users::UserDirectory;

/// Wall clock abstraction, swappable in tests.
pub use clock::{Clock, FixedClock, SystemClock};

/// Token source abstraction, swappable in tests.
pub use token::{SequenceTokens, TokenGenerator, UuidTokens};
