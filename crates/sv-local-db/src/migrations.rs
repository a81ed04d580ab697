//! Database migration management.

use rusqlite::{params, Connection};

/// Database migration manager.
pub struct MigrationManager;

impl MigrationManager {
    /// Apply all pending migrations to the database.
    pub fn migrate(conn: &Connection) -> crate::Result<()> {
        // Create schema migrations table first
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                applied_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );
            "#,
        )?;

        // Get current version
        let current_version = Self::current_version(conn)?.unwrap_or(0);

        // Apply migrations sequentially
        if current_version < 1 {
            tracing::debug!("applying schema migration 1");
            Self::apply_migration_1(conn)?;
        }

        Ok(())
    }

    /// Apply migration version 1 - the complete SnipVault schema.
    fn apply_migration_1(conn: &Connection) -> crate::Result<()> {
        conn.execute_batch(
            r#"
            -- Accounts. Authentication itself lives outside this store.
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT NOT NULL,
                email TEXT NOT NULL,
                display_name TEXT,
                created_at TEXT NOT NULL,
                UNIQUE(username),
                UNIQUE(email)
            );

            -- Teams give snippets shared ownership. The owner is implicit:
            -- it never appears in team_members. member_count counts the
            -- owner plus stored membership rows.
            CREATE TABLE IF NOT EXISTS teams (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                slug TEXT NOT NULL,
                owner_id INTEGER NOT NULL REFERENCES users(id) ON DELETE RESTRICT,
                privacy TEXT NOT NULL DEFAULT 'private',
                description TEXT,
                member_count INTEGER NOT NULL DEFAULT 1,
                snippet_count INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                deleted_at TEXT,
                UNIQUE(slug)
            );

            -- Membership rows carry the role plus explicit capability
            -- flags; the stored flags are authoritative.
            CREATE TABLE IF NOT EXISTS team_members (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                team_id INTEGER NOT NULL REFERENCES teams(id) ON DELETE CASCADE,
                user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                role TEXT NOT NULL,
                can_create_snippets INTEGER NOT NULL DEFAULT 0,
                can_edit_snippets INTEGER NOT NULL DEFAULT 0,
                can_delete_snippets INTEGER NOT NULL DEFAULT 0,
                can_manage_members INTEGER NOT NULL DEFAULT 0,
                can_invite_members INTEGER NOT NULL DEFAULT 0,
                joined_at TEXT NOT NULL,
                UNIQUE(team_id, user_id)
            );

            -- Time-boxed, token-based membership grants.
            CREATE TABLE IF NOT EXISTS team_invitations (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                team_id INTEGER NOT NULL REFERENCES teams(id) ON DELETE CASCADE,
                email TEXT NOT NULL,
                inviter_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                role TEXT NOT NULL,
                token TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'pending',
                expires_at TEXT NOT NULL,
                accepted_at TEXT,
                created_at TEXT NOT NULL,
                UNIQUE(token)
            );

            -- Snippets. version_number always matches the highest version
            -- row; counters are maintained by co-located updates, never by
            -- scanning.
            CREATE TABLE IF NOT EXISTS snippets (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                owner_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                team_id INTEGER REFERENCES teams(id) ON DELETE SET NULL,
                title TEXT NOT NULL,
                description TEXT,
                language TEXT NOT NULL,
                code TEXT NOT NULL,
                privacy TEXT NOT NULL DEFAULT 'private',
                version_number INTEGER NOT NULL DEFAULT 1,
                parent_id INTEGER REFERENCES snippets(id) ON DELETE SET NULL,
                view_count INTEGER NOT NULL DEFAULT 0,
                unique_view_count INTEGER NOT NULL DEFAULT 0,
                fork_count INTEGER NOT NULL DEFAULT 0,
                favorite_count INTEGER NOT NULL DEFAULT 0,
                comment_count INTEGER NOT NULL DEFAULT 0,
                share_count INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                deleted_at TEXT
            );

            -- Immutable, append-only version history.
            CREATE TABLE IF NOT EXISTS snippet_versions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                snippet_id INTEGER NOT NULL REFERENCES snippets(id) ON DELETE CASCADE,
                version_number INTEGER NOT NULL,
                code TEXT NOT NULL,
                change_type TEXT NOT NULL,
                lines_added INTEGER NOT NULL DEFAULT 0,
                lines_removed INTEGER NOT NULL DEFAULT 0,
                summary TEXT,
                author_id INTEGER REFERENCES users(id) ON DELETE SET NULL,
                created_at TEXT NOT NULL,
                UNIQUE(snippet_id, version_number)
            );

            -- Tags with their usage ledger counter.
            CREATE TABLE IF NOT EXISTS tags (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                slug TEXT NOT NULL,
                usage_count INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                UNIQUE(name)
            );

            CREATE TABLE IF NOT EXISTS snippet_tags (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                snippet_id INTEGER NOT NULL REFERENCES snippets(id) ON DELETE CASCADE,
                tag_id INTEGER NOT NULL REFERENCES tags(id) ON DELETE CASCADE,
                UNIQUE(snippet_id, tag_id)
            );

            -- Reusable access grants. token is present iff share_type='link'.
            CREATE TABLE IF NOT EXISTS shares (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                snippet_id INTEGER NOT NULL REFERENCES snippets(id) ON DELETE CASCADE,
                granter_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                share_type TEXT NOT NULL,
                grantee_user_id INTEGER REFERENCES users(id) ON DELETE CASCADE,
                grantee_team_id INTEGER REFERENCES teams(id) ON DELETE CASCADE,
                grantee_email TEXT,
                permission TEXT NOT NULL DEFAULT 'view',
                token TEXT,
                expires_at TEXT,
                access_count INTEGER NOT NULL DEFAULT 0,
                last_accessed_at TEXT,
                is_active INTEGER NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL,
                UNIQUE(token)
            );

            CREATE TABLE IF NOT EXISTS favorites (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                snippet_id INTEGER NOT NULL REFERENCES snippets(id) ON DELETE CASCADE,
                created_at TEXT NOT NULL,
                UNIQUE(user_id, snippet_id)
            );

            CREATE TABLE IF NOT EXISTS follows (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                follower_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                followed_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                created_at TEXT NOT NULL,
                UNIQUE(follower_id, followed_id)
            );

            CREATE TABLE IF NOT EXISTS comments (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                snippet_id INTEGER NOT NULL REFERENCES snippets(id) ON DELETE CASCADE,
                author_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                body TEXT NOT NULL,
                parent_id INTEGER REFERENCES comments(id) ON DELETE CASCADE,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                deleted_at TEXT
            );

            -- Named snippet lists. The join rows carry ordering, so they
            -- are first-class records with their own ids.
            CREATE TABLE IF NOT EXISTS collections (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                owner_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                name TEXT NOT NULL,
                description TEXT,
                is_public INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS collection_snippets (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                collection_id INTEGER NOT NULL REFERENCES collections(id) ON DELETE CASCADE,
                snippet_id INTEGER NOT NULL REFERENCES snippets(id) ON DELETE CASCADE,
                position INTEGER NOT NULL DEFAULT 0,
                added_at TEXT NOT NULL,
                UNIQUE(collection_id, snippet_id)
            );

            -- In-store notification records; delivery is out of scope.
            CREATE TABLE IF NOT EXISTS notifications (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                kind TEXT NOT NULL,
                subject TEXT NOT NULL,
                data TEXT,
                read_at TEXT,
                created_at TEXT NOT NULL
            );

            -- Append-only audit trail for mutating operations.
            CREATE TABLE IF NOT EXISTS audit_logs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                actor_id INTEGER REFERENCES users(id) ON DELETE SET NULL,
                action TEXT NOT NULL,
                entity_kind TEXT NOT NULL,
                entity_id INTEGER NOT NULL,
                detail TEXT,
                created_at TEXT NOT NULL
            );

            -- Viewer fingerprints backing unique-view accounting.
            CREATE TABLE IF NOT EXISTS snippet_views (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                snippet_id INTEGER NOT NULL REFERENCES snippets(id) ON DELETE CASCADE,
                fingerprint TEXT NOT NULL,
                hits INTEGER NOT NULL DEFAULT 1,
                first_seen_at TEXT NOT NULL,
                last_seen_at TEXT NOT NULL,
                UNIQUE(snippet_id, fingerprint)
            );

            -- Indexes for performance
            CREATE INDEX IF NOT EXISTS idx_snippets_owner ON snippets(owner_id);
            CREATE INDEX IF NOT EXISTS idx_snippets_team ON snippets(team_id);
            CREATE INDEX IF NOT EXISTS idx_snippet_versions_snippet
                ON snippet_versions(snippet_id, version_number);
            CREATE INDEX IF NOT EXISTS idx_snippet_tags_tag ON snippet_tags(tag_id);
            CREATE INDEX IF NOT EXISTS idx_team_members_user ON team_members(user_id);
            CREATE INDEX IF NOT EXISTS idx_invitations_team ON team_invitations(team_id, status);
            CREATE INDEX IF NOT EXISTS idx_shares_snippet ON shares(snippet_id);
            CREATE INDEX IF NOT EXISTS idx_comments_snippet ON comments(snippet_id);
            CREATE INDEX IF NOT EXISTS idx_notifications_user ON notifications(user_id, read_at);
            CREATE INDEX IF NOT EXISTS idx_audit_logs_entity ON audit_logs(entity_kind, entity_id);

            -- Mark migration as applied
            INSERT OR REPLACE INTO schema_migrations (version) VALUES (1);
            "#,
        )?;

        Ok(())
    }

    /// Get the current schema version.
    pub fn current_version(conn: &Connection) -> crate::Result<Option<u32>> {
        let mut stmt = conn.prepare("SELECT MAX(version) FROM schema_migrations")?;

        let version: Option<u32> = stmt.query_row(params![], |row| row.get(0)).ok();

        Ok(version)
    }
}
