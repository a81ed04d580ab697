//! One handle over the whole snippet vault.
//!
//! `SnipVault` owns the database plus the clock and token source every
//! service shares, and hands out the per-concern managers. Services hold
//! no state of their own; accessors build them on demand.

use std::path::Path;
use std::sync::Arc;

use sv_local_db::Database;

use crate::audit::AuditTrail;
use crate::clock::{Clock, SystemClock};
use crate::collections::CollectionManager;
use crate::invitations::InvitationManager;
use crate::notifications::NotificationManager;
use crate::shares::ShareManager;
use crate::snippets::SnippetManager;
use crate::social::SocialManager;
use crate::tags::TagManager;
use crate::teams::TeamManager;
use crate::token::{TokenGenerator, UuidTokens};
use crate::users::UserDirectory;
use crate::versioning::VersionManager;
use crate::visibility::VisibilityResolver;

pub struct SnipVault {
    db: Database,
    clock: Arc<dyn Clock>,
    tokens: Arc<dyn TokenGenerator>,
}

impl SnipVault {
    /// Open the vault at the given path, creating and migrating the
    /// database as needed.
    pub fn open<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let db = Database::open(path)?;
        Ok(Self::with_parts(db, Arc::new(SystemClock), Arc::new(UuidTokens)))
    }

    /// Open the vault at the platform default location.
    pub fn open_default() -> crate::Result<Self> {
        let db = Database::open_default()?;
        Ok(Self::with_parts(db, Arc::new(SystemClock), Arc::new(UuidTokens)))
    }

    /// In-memory vault, for tests and scratch work.
    pub fn open_in_memory() -> crate::Result<Self> {
        let db = Database::open_in_memory()?;
        Ok(Self::with_parts(db, Arc::new(SystemClock), Arc::new(UuidTokens)))
    }

    /// Assemble a vault from explicit parts. Tests swap in a fixed clock
    /// and deterministic tokens here.
    pub fn with_parts(db: Database, clock: Arc<dyn Clock>, tokens: Arc<dyn TokenGenerator>) -> Self {
        Self { db, clock, tokens }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn users(&self) -> UserDirectory {
        UserDirectory::new(self.db.clone(), self.clock.clone())
    }

    pub fn snippets(&self) -> SnippetManager {
        SnippetManager::new(self.db.clone(), self.clock.clone())
    }

    pub fn visibility(&self) -> VisibilityResolver {
        VisibilityResolver::new(self.db.clone())
    }

    pub fn versions(&self) -> VersionManager {
        VersionManager::new(self.db.clone(), self.clock.clone())
    }

    pub fn tags(&self) -> TagManager {
        TagManager::new(self.db.clone(), self.clock.clone())
    }

    pub fn teams(&self) -> TeamManager {
        TeamManager::new(self.db.clone(), self.clock.clone())
    }

    pub fn invitations(&self) -> InvitationManager {
        InvitationManager::new(self.db.clone(), self.clock.clone(), self.tokens.clone())
    }

    pub fn shares(&self) -> ShareManager {
        ShareManager::new(self.db.clone(), self.clock.clone(), self.tokens.clone())
    }

    pub fn social(&self) -> SocialManager {
        SocialManager::new(self.db.clone(), self.clock.clone())
    }

    pub fn collections(&self) -> CollectionManager {
        CollectionManager::new(self.db.clone(), self.clock.clone())
    }

    pub fn notifications(&self) -> NotificationManager {
        NotificationManager::new(self.db.clone(), self.clock.clone())
    }

    pub fn audit(&self) -> AuditTrail {
        AuditTrail::new(self.db.clone())
    }
}
