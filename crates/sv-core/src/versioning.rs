//! Snippet version history.
//!
//! Every accepted edit appends an immutable version row and advances the
//! snippet's head in the same transaction. The head update is guarded by
//! the version number the editor read, so two concurrent editors cannot
//! mint the same version; the loser gets a conflict and retries.

use std::sync::Arc;

use rusqlite::Connection;
use sv_local_db::{Database, SnippetStore, SnippetVersionRecord, SnippetVersionStore};

use crate::clock::{format_ts, Clock};
use crate::diff;
use crate::entities::ChangeType;

/// Records and reads snippet version history.
pub struct VersionManager {
    db: Database,
    clock: Arc<dyn Clock>,
}

impl VersionManager {
    pub fn new(db: Database, clock: Arc<dyn Clock>) -> Self {
        Self { db, clock }
    }

    /// Record a code change on a snippet.
    ///
    /// Saving byte-identical code is a no-op: no version row is written,
    /// the head stays put, and the existing latest version comes back.
    pub fn record_change(
        &self,
        snippet_id: i64,
        author_id: Option<i64>,
        new_code: &str,
        summary: Option<&str>,
    ) -> crate::Result<SnippetVersionRecord> {
        let now = format_ts(self.clock.now());

        crate::db::transact(&self.db, |conn| {
            let snippets = SnippetStore::new(conn);
            let snippet = snippets
                .get(snippet_id)?
                .ok_or_else(|| crate::Error::not_found("snippet", snippet_id))?;
            if snippet.is_deleted() {
                return Err(crate::Error::invalid_state(
                    "cannot record a change on a deleted snippet",
                ));
            }

            if snippet.code == new_code {
                tracing::debug!(snippet_id, "identical code, skipping version");
                return head_version(conn, &snippet);
            }

            let delta = diff::line_delta(&snippet.code, new_code);
            if !snippets.update_head(snippet_id, new_code, snippet.version_number, &now)? {
                return Err(crate::Error::conflict(format!(
                    "snippet {} advanced past version {}",
                    snippet_id, snippet.version_number
                )));
            }

            let version = write_version(
                conn,
                snippet_id,
                snippet.version_number + 1,
                new_code,
                ChangeType::Edit,
                delta.added,
                delta.removed,
                summary,
                author_id,
                &now,
            )?;

            tracing::debug!(
                snippet_id,
                version = version.version_number,
                added = version.lines_added,
                removed = version.lines_removed,
                "recorded snippet version"
            );
            Ok(version)
        })
    }

    /// Roll a snippet back to the code of an earlier version.
    ///
    /// The rollback is itself a new head version with change type
    /// `restore`, so history stays append-only. Restoring a version whose
    /// code matches the head is a no-op returning the head version.
    pub fn restore_version(
        &self,
        snippet_id: i64,
        author_id: Option<i64>,
        version_number: i64,
    ) -> crate::Result<SnippetVersionRecord> {
        let now = format_ts(self.clock.now());

        crate::db::transact(&self.db, |conn| {
            let snippets = SnippetStore::new(conn);
            let snippet = snippets
                .get(snippet_id)?
                .ok_or_else(|| crate::Error::not_found("snippet", snippet_id))?;
            if snippet.is_deleted() {
                return Err(crate::Error::invalid_state(
                    "cannot restore a version of a deleted snippet",
                ));
            }

            let target = SnippetVersionStore::new(conn)
                .get(snippet_id, version_number)?
                .ok_or_else(|| {
                    crate::Error::not_found(
                        "version",
                        format!("{} of snippet {}", version_number, snippet_id),
                    )
                })?;

            if snippet.code == target.code {
                return head_version(conn, &snippet);
            }

            let delta = diff::line_delta(&snippet.code, &target.code);
            if !snippets.update_head(snippet_id, &target.code, snippet.version_number, &now)? {
                return Err(crate::Error::conflict(format!(
                    "snippet {} advanced past version {}",
                    snippet_id, snippet.version_number
                )));
            }

            let summary = format!("restore of version {}", version_number);
            let version = write_version(
                conn,
                snippet_id,
                snippet.version_number + 1,
                &target.code,
                ChangeType::Restore,
                delta.added,
                delta.removed,
                Some(&summary),
                author_id,
                &now,
            )?;

            tracing::info!(
                snippet_id,
                version = version.version_number,
                restored = version_number,
                "restored snippet version"
            );
            Ok(version)
        })
    }

    /// Full history for a snippet, oldest first.
    pub fn history(&self, snippet_id: i64) -> crate::Result<Vec<SnippetVersionRecord>> {
        crate::db::read(&self.db, |conn| {
            let snippets = SnippetStore::new(conn);
            if snippets.get(snippet_id)?.is_none() {
                return Err(crate::Error::not_found("snippet", snippet_id));
            }
            Ok(SnippetVersionStore::new(conn).list_for(snippet_id)?)
        })
    }

    /// One specific version of a snippet.
    pub fn get_version(
        &self,
        snippet_id: i64,
        version_number: i64,
    ) -> crate::Result<SnippetVersionRecord> {
        crate::db::read(&self.db, |conn| {
            SnippetVersionStore::new(conn)
                .get(snippet_id, version_number)?
                .ok_or_else(|| {
                    crate::Error::not_found(
                        "version",
                        format!("{} of snippet {}", version_number, snippet_id),
                    )
                })
        })
    }
}

/// Append the first version row for a snippet that was just created or
/// forked. Runs inside the caller's transaction.
pub(crate) fn initial_version(
    conn: &Connection,
    snippet_id: i64,
    author_id: Option<i64>,
    code: &str,
    change_type: ChangeType,
    now: &str,
) -> crate::Result<SnippetVersionRecord> {
    write_version(
        conn,
        snippet_id,
        1,
        code,
        change_type,
        diff::line_count(code),
        0,
        None,
        author_id,
        now,
    )
}

/// The version row matching the snippet's current head. Creation mints
/// version 1, so the row exists for any live snippet.
fn head_version(
    conn: &Connection,
    snippet: &sv_local_db::SnippetRecord,
) -> crate::Result<SnippetVersionRecord> {
    SnippetVersionStore::new(conn)
        .get(snippet.id, snippet.version_number)?
        .ok_or_else(|| {
            crate::Error::internal(format!(
                "snippet {} has no row for head version {}",
                snippet.id, snippet.version_number
            ))
        })
}

#[allow(clippy::too_many_arguments)]
fn write_version(
    conn: &Connection,
    snippet_id: i64,
    version_number: i64,
    code: &str,
    change_type: ChangeType,
    lines_added: i64,
    lines_removed: i64,
    summary: Option<&str>,
    author_id: Option<i64>,
    now: &str,
) -> crate::Result<SnippetVersionRecord> {
    let record = SnippetVersionRecord {
        id: 0, // Will be set by autoincrement
        snippet_id,
        version_number,
        code: code.to_string(),
        change_type: change_type.as_str().to_string(),
        lines_added,
        lines_removed,
        summary: summary.map(|s| s.to_string()),
        author_id,
        created_at: now.to_string(),
    };
    let id = SnippetVersionStore::new(conn).insert(&record)?;
    Ok(SnippetVersionRecord { id, ..record })
}
