//! SQLite database management for SnipVault state.
//!
//! This crate provides persistent storage for users, teams, snippets and
//! their version history, tags, shares, invitations and the rest of the
//! SnipVault entities, using SQLite as the backing database.

pub mod connection;
pub mod migrations;
pub mod models;
pub mod schema;

/// Result type for database operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for database operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Migration error: {message}")]
    Migration { message: String },

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Generic database error: {0}")]
    Generic(String),
}

impl Error {
    /// Create a new migration error.
    pub fn migration<S: Into<String>>(message: S) -> Self {
        Self::Migration {
            message: message.into(),
        }
    }

    /// Create a new generic database error.
    pub fn generic<S: Into<String>>(message: S) -> Self {
        Self::Generic(message.into())
    }

    /// Whether this error is a SQLite unique/primary-key constraint
    /// violation. Callers translate these into domain conflicts.
    pub fn is_unique_violation(&self) -> bool {
        match self {
            Self::Database(rusqlite::Error::SqliteFailure(e, _)) => {
                e.code == rusqlite::ErrorCode::ConstraintViolation
            }
            _ => false,
        }
    }
}

/// Database connection and management.
pub use connection::Database;

/// Database models and operations.
pub use models::{
    AuditLogRecord, AuditLogStore, CollectionRecord, CollectionSnippetRecord, CollectionStore,
    CommentRecord, CommentStore, FavoriteRecord, FavoriteStore, FollowRecord, FollowStore,
    NotificationRecord, NotificationStore, ShareRecord, ShareStore, SnippetRecord, SnippetStore,
    SnippetVersionRecord, SnippetVersionStore, TagRecord, TagStore, TeamInvitationRecord,
    TeamInvitationStore, TeamMemberRecord, TeamMemberStore, TeamRecord, TeamStore, UserRecord,
    UserStore, ViewStore,
};

/// Schema definitions and constants.
pub use schema::*;
