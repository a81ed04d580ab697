//! Snippet lifecycle: creation, forking, tombstoning, views.
//!
//! Code edits after creation go through [`crate::versioning::VersionManager`];
//! this module owns everything else that writes a snippet row.

use std::sync::Arc;

use rusqlite::Connection;
use sv_local_db::{Database, SnippetRecord, SnippetStore, TeamStore, UserStore, ViewStore};

use crate::audit;
use crate::clock::{format_ts, Clock};
use crate::entities::{ChangeType, Privacy};
use crate::notifications::{self, NotificationKind};
use crate::tags;
use crate::teams;
use crate::versioning;
use crate::visibility;

/// Parameters for creating a snippet.
#[derive(Debug, Clone)]
pub struct NewSnippet {
    pub title: String,
    pub description: Option<String>,
    pub language: String,
    pub code: String,
    pub privacy: Privacy,
    pub team_id: Option<i64>,
    pub tags: Vec<String>,
}

/// Manages snippet records and their derived counters.
pub struct SnippetManager {
    db: Database,
    clock: Arc<dyn Clock>,
}

impl SnippetManager {
    pub fn new(db: Database, clock: Arc<dyn Clock>) -> Self {
        Self { db, clock }
    }

    /// Create a snippet at version 1.
    ///
    /// Team-scoped privacy requires a team; posting into a team requires
    /// create rights there. The snippet row, its first version, its tags
    /// and the team's counter land in one transaction.
    pub fn create(&self, owner_id: i64, draft: NewSnippet) -> crate::Result<SnippetRecord> {
        let title = draft.title.trim();
        if title.is_empty() {
            return Err(crate::Error::invalid_state("snippet title must not be empty"));
        }
        let language = draft.language.trim();
        if language.is_empty() {
            return Err(crate::Error::invalid_state("snippet language must not be empty"));
        }
        if draft.privacy == Privacy::Team && draft.team_id.is_none() {
            return Err(crate::Error::invalid_state(
                "team privacy requires a team",
            ));
        }

        let now = format_ts(self.clock.now());
        crate::db::transact(&self.db, |conn| {
            if UserStore::new(conn).get(owner_id)?.is_none() {
                return Err(crate::Error::not_found("user", owner_id));
            }
            if let Some(team_id) = draft.team_id {
                let caps = teams::capabilities_on(conn, team_id, owner_id)?;
                if !caps.create_snippets {
                    return Err(crate::Error::forbidden(
                        "no create rights on this team",
                    ));
                }
            }

            let snippets = SnippetStore::new(conn);
            let record = SnippetRecord {
                id: 0, // Will be set by autoincrement
                owner_id,
                team_id: draft.team_id,
                title: title.to_string(),
                description: draft.description.clone(),
                language: language.to_string(),
                code: draft.code.clone(),
                privacy: draft.privacy.as_str().to_string(),
                version_number: 1,
                parent_id: None,
                view_count: 0,
                unique_view_count: 0,
                fork_count: 0,
                favorite_count: 0,
                comment_count: 0,
                share_count: 0,
                created_at: now.clone(),
                updated_at: now.clone(),
                deleted_at: None,
            };
            let id = snippets.insert(&record)?;

            versioning::initial_version(conn, id, Some(owner_id), &draft.code, ChangeType::Create, &now)?;
            tags::sync_tags(conn, id, &draft.tags, &now)?;
            if let Some(team_id) = draft.team_id {
                TeamStore::new(conn).adjust_snippet_count(team_id, 1)?;
            }

            audit::log(
                conn,
                &now,
                Some(owner_id),
                audit::actions::SNIPPET_CREATE,
                audit::entities::SNIPPET,
                id,
                None,
            )?;
            tracing::info!(snippet_id = id, owner_id, "created snippet");
            Ok(SnippetRecord { id, ..record })
        })
    }

    /// Fork a snippet the actor can view into a new private snippet of
    /// their own. Code and tags are copied; lineage points at the source.
    pub fn fork(&self, snippet_id: i64, new_owner_id: i64) -> crate::Result<SnippetRecord> {
        let now = format_ts(self.clock.now());
        crate::db::transact(&self.db, |conn| {
            let snippets = SnippetStore::new(conn);
            let source = live_snippet_on(conn, snippet_id)?;
            if !visibility::can_view_on(conn, &source, Some(new_owner_id))? {
                return Err(crate::Error::forbidden("cannot fork an invisible snippet"));
            }
            if UserStore::new(conn).get(new_owner_id)?.is_none() {
                return Err(crate::Error::not_found("user", new_owner_id));
            }

            let record = SnippetRecord {
                id: 0, // Will be set by autoincrement
                owner_id: new_owner_id,
                team_id: None,
                title: source.title.clone(),
                description: source.description.clone(),
                language: source.language.clone(),
                code: source.code.clone(),
                privacy: Privacy::Private.as_str().to_string(),
                version_number: 1,
                parent_id: Some(source.id),
                view_count: 0,
                unique_view_count: 0,
                fork_count: 0,
                favorite_count: 0,
                comment_count: 0,
                share_count: 0,
                created_at: now.clone(),
                updated_at: now.clone(),
                deleted_at: None,
            };
            let id = snippets.insert(&record)?;

            versioning::initial_version(
                conn,
                id,
                Some(new_owner_id),
                &source.code,
                ChangeType::Fork,
                &now,
            )?;
            let tag_names: Vec<String> = sv_local_db::TagStore::new(conn)
                .tags_for_snippet(source.id)?
                .into_iter()
                .map(|tag| tag.name)
                .collect();
            tags::sync_tags(conn, id, &tag_names, &now)?;
            snippets.increment_fork_count(source.id)?;

            if source.owner_id != new_owner_id {
                notifications::push(
                    conn,
                    &now,
                    source.owner_id,
                    NotificationKind::SnippetForked,
                    &format!("your snippet \"{}\" was forked", source.title),
                    Some(serde_json::json!({ "snippet_id": source.id, "fork_id": id })),
                )?;
            }
            audit::log(
                conn,
                &now,
                Some(new_owner_id),
                audit::actions::SNIPPET_FORK,
                audit::entities::SNIPPET,
                id,
                Some(format!("from snippet {}", source.id)),
            )?;
            tracing::info!(snippet_id = id, source_id = source.id, "forked snippet");
            Ok(SnippetRecord { id, ..record })
        })
    }

    /// Tombstone a snippet. Allowed for the owner, or for a team member
    /// holding delete rights when the snippet is team-assigned.
    pub fn delete(&self, snippet_id: i64, actor_id: i64) -> crate::Result<()> {
        let now = format_ts(self.clock.now());
        crate::db::transact(&self.db, |conn| {
            let snippet = live_snippet_on(conn, snippet_id)?;
            if actor_id != snippet.owner_id {
                // A tombstoned team grants nothing.
                let allowed = match snippet.team_id {
                    Some(team_id) => match teams::capabilities_on(conn, team_id, actor_id) {
                        Ok(caps) => caps.delete_snippets,
                        Err(crate::Error::NotFound { .. }) => false,
                        Err(err) => return Err(err),
                    },
                    None => false,
                };
                if !allowed {
                    return Err(crate::Error::forbidden(
                        "no delete rights on this snippet",
                    ));
                }
            }

            // Tombstoned snippets hold no tags; restore does not reattach.
            tags::sync_tags(conn, snippet_id, &[], &now)?;
            SnippetStore::new(conn).soft_delete(snippet_id, &now)?;
            if let Some(team_id) = snippet.team_id {
                TeamStore::new(conn).adjust_snippet_count(team_id, -1)?;
            }

            audit::log(
                conn,
                &now,
                Some(actor_id),
                audit::actions::SNIPPET_DELETE,
                audit::entities::SNIPPET,
                snippet_id,
                None,
            )?;
            tracing::info!(snippet_id, "deleted snippet");
            Ok(())
        })
    }

    /// Clear a snippet's tombstone. Owner-only.
    pub fn restore(&self, snippet_id: i64, actor_id: i64) -> crate::Result<SnippetRecord> {
        let now = format_ts(self.clock.now());
        crate::db::transact(&self.db, |conn| {
            let snippets = SnippetStore::new(conn);
            let snippet = snippets
                .get(snippet_id)?
                .ok_or_else(|| crate::Error::not_found("snippet", snippet_id))?;
            if snippet.owner_id != actor_id {
                return Err(crate::Error::forbidden("only the owner may restore a snippet"));
            }
            if !snippets.restore(snippet_id, &now)? {
                return Err(crate::Error::invalid_state("snippet is not deleted"));
            }
            if let Some(team_id) = snippet.team_id {
                TeamStore::new(conn).adjust_snippet_count(team_id, 1)?;
            }

            audit::log(
                conn,
                &now,
                Some(actor_id),
                audit::actions::SNIPPET_RESTORE,
                audit::entities::SNIPPET,
                snippet_id,
                None,
            )?;
            snippets
                .get(snippet_id)?
                .ok_or_else(|| crate::Error::not_found("snippet", snippet_id))
        })
    }

    /// Fetch a snippet the actor may view. Tombstoned snippets read as
    /// absent for everyone, their owner included.
    pub fn get_visible(
        &self,
        snippet_id: i64,
        acting_user: Option<i64>,
    ) -> crate::Result<SnippetRecord> {
        crate::db::read(&self.db, |conn| {
            let snippet = live_snippet_on(conn, snippet_id)?;
            if !visibility::can_view_on(conn, &snippet, acting_user)? {
                return Err(crate::Error::forbidden("snippet is not visible to you"));
            }
            Ok(snippet)
        })
    }

    /// Count one view by an opaque viewer fingerprint. First sight of a
    /// fingerprint also bumps the unique counter. Anonymous viewers pass
    /// `None` and can only count views on public and unlisted snippets.
    pub fn record_view(
        &self,
        snippet_id: i64,
        acting_user: Option<i64>,
        fingerprint: &str,
    ) -> crate::Result<()> {
        let now = format_ts(self.clock.now());
        crate::db::transact(&self.db, |conn| {
            let snippet = live_snippet_on(conn, snippet_id)?;
            if !visibility::can_view_on(conn, &snippet, acting_user)? {
                return Err(crate::Error::forbidden("snippet is not visible to you"));
            }
            let first_visit = ViewStore::new(conn).record(snippet_id, fingerprint, &now)?;
            SnippetStore::new(conn).increment_view_counts(snippet_id, first_visit)?;
            Ok(())
        })
    }

    /// Change a snippet's privacy. Owner-only; moving to team privacy
    /// requires the owner to participate in the target team.
    pub fn set_privacy(
        &self,
        snippet_id: i64,
        actor_id: i64,
        privacy: Privacy,
        team_id: Option<i64>,
    ) -> crate::Result<SnippetRecord> {
        if privacy == Privacy::Team && team_id.is_none() {
            return Err(crate::Error::invalid_state("team privacy requires a team"));
        }

        let now = format_ts(self.clock.now());
        crate::db::transact(&self.db, |conn| {
            let snippets = SnippetStore::new(conn);
            let snippet = live_snippet_on(conn, snippet_id)?;
            if snippet.owner_id != actor_id {
                return Err(crate::Error::forbidden(
                    "only the owner may change snippet privacy",
                ));
            }
            if let Some(new_team) = team_id {
                let caps = teams::capabilities_on(conn, new_team, actor_id)?;
                if !caps.create_snippets {
                    return Err(crate::Error::forbidden(
                        "no create rights on the target team",
                    ));
                }
            }

            snippets.update_meta(
                snippet_id,
                &snippet.title,
                snippet.description.as_deref(),
                &snippet.language,
                privacy.as_str(),
                team_id,
                &now,
            )?;

            // Keep per-team snippet counters in step with reassignment.
            if snippet.team_id != team_id {
                let teams_store = TeamStore::new(conn);
                if let Some(old_team) = snippet.team_id {
                    teams_store.adjust_snippet_count(old_team, -1)?;
                }
                if let Some(new_team) = team_id {
                    teams_store.adjust_snippet_count(new_team, 1)?;
                }
            }

            audit::log(
                conn,
                &now,
                Some(actor_id),
                audit::actions::SNIPPET_SET_PRIVACY,
                audit::entities::SNIPPET,
                snippet_id,
                Some(privacy.to_string()),
            )?;
            snippets
                .get(snippet_id)?
                .ok_or_else(|| crate::Error::not_found("snippet", snippet_id))
        })
    }

    /// A user's own snippets, newest first.
    pub fn list_for_owner(&self, owner_id: i64) -> crate::Result<Vec<SnippetRecord>> {
        crate::db::read(&self.db, |conn| {
            Ok(SnippetStore::new(conn).list_by_owner(owner_id)?)
        })
    }

    /// The public firehose.
    pub fn list_public(&self, limit: i64) -> crate::Result<Vec<SnippetRecord>> {
        crate::db::read(&self.db, |conn| {
            Ok(SnippetStore::new(conn).list_public(limit)?)
        })
    }

    /// Snippets assigned to a team, for participants only.
    pub fn list_for_team(&self, team_id: i64, actor_id: i64) -> crate::Result<Vec<SnippetRecord>> {
        crate::db::read(&self.db, |conn| {
            let team = teams::live_team(conn, team_id)?;
            let is_participant = team.owner_id == actor_id
                || sv_local_db::TeamMemberStore::new(conn)
                    .get(team_id, actor_id)?
                    .is_some();
            if !is_participant {
                return Err(crate::Error::forbidden("not a member of this team"));
            }
            Ok(SnippetStore::new(conn).list_for_team(team_id)?)
        })
    }
}

pub(crate) fn live_snippet_on(conn: &Connection, snippet_id: i64) -> crate::Result<SnippetRecord> {
    let snippet = SnippetStore::new(conn)
        .get(snippet_id)?
        .ok_or_else(|| crate::Error::not_found("snippet", snippet_id))?;
    if snippet.is_deleted() {
        return Err(crate::Error::not_found("snippet", snippet_id));
    }
    Ok(snippet)
}
