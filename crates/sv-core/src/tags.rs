//! Tag attachment and the usage ledger.
//!
//! `usage_count` is an event-driven aggregate: it moves only when an
//! attachment is actually created or removed, never by rescanning the join
//! table. Retagging computes the symmetric difference between the current
//! and desired sets so unchanged tags are untouched.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::OnceLock;

use regex::Regex;
use rusqlite::Connection;
use sv_local_db::{Database, SnippetStore, TagRecord, TagStore};

use crate::clock::{format_ts, Clock};

/// Manages tag attachments and their usage counters.
pub struct TagManager {
    db: Database,
    clock: Arc<dyn Clock>,
}

impl TagManager {
    pub fn new(db: Database, clock: Arc<dyn Clock>) -> Self {
        Self { db, clock }
    }

    /// Replace a snippet's tag set with `desired`, adjusting usage counts
    /// by the net difference. Returns the tags now attached.
    pub fn retag(&self, snippet_id: i64, desired: &[String]) -> crate::Result<Vec<TagRecord>> {
        let now = format_ts(self.clock.now());

        crate::db::transact(&self.db, |conn| {
            require_live_snippet(conn, snippet_id)?;
            sync_tags(conn, snippet_id, desired, &now)
        })
    }

    /// Attach one tag, creating it on first use. No-op when already
    /// attached.
    pub fn attach(&self, snippet_id: i64, name: &str) -> crate::Result<TagRecord> {
        let now = format_ts(self.clock.now());

        crate::db::transact(&self.db, |conn| {
            require_live_snippet(conn, snippet_id)?;
            let tags = TagStore::new(conn);
            let tag = get_or_create_tag(&tags, name, &now)?;
            if tags.attach(snippet_id, tag.id)? {
                tags.increment_usage(tag.id)?;
            }
            tags.get(tag.id)?
                .ok_or_else(|| crate::Error::not_found("tag", name))
        })
    }

    /// Detach one tag. No-op when the tag is unknown or not attached.
    pub fn detach(&self, snippet_id: i64, name: &str) -> crate::Result<()> {
        crate::db::transact(&self.db, |conn| {
            require_live_snippet(conn, snippet_id)?;
            let tags = TagStore::new(conn);
            if let Some(tag) = tags.get_by_name(name)? {
                if tags.detach(snippet_id, tag.id)? {
                    tags.decrement_usage(tag.id)?;
                }
            }
            Ok(())
        })
    }

    /// Tags attached to a snippet.
    pub fn for_snippet(&self, snippet_id: i64) -> crate::Result<Vec<TagRecord>> {
        crate::db::read(&self.db, |conn| {
            Ok(TagStore::new(conn).tags_for_snippet(snippet_id)?)
        })
    }

    /// Most-used tags.
    pub fn top(&self, limit: i64) -> crate::Result<Vec<TagRecord>> {
        crate::db::read(&self.db, |conn| Ok(TagStore::new(conn).list_top(limit)?))
    }
}

/// Derive a URL-friendly slug from a tag or team name.
pub fn slugify(name: &str) -> String {
    static NON_SLUG: OnceLock<Regex> = OnceLock::new();
    let re = NON_SLUG.get_or_init(|| Regex::new(r"[^a-z0-9]+").unwrap());
    re.replace_all(&name.to_lowercase(), "-")
        .trim_matches('-')
        .to_string()
}

/// Bring a snippet's attachments in line with `desired`. Runs inside the
/// caller's transaction. Tag names are compared exactly; duplicates in
/// `desired` collapse.
pub(crate) fn sync_tags(
    conn: &Connection,
    snippet_id: i64,
    desired: &[String],
    now: &str,
) -> crate::Result<Vec<TagRecord>> {
    let tags = TagStore::new(conn);

    let desired_set: BTreeSet<&str> = desired
        .iter()
        .map(|name| name.trim())
        .filter(|name| !name.is_empty())
        .collect();
    let current = tags.tags_for_snippet(snippet_id)?;

    for tag in &current {
        if !desired_set.contains(tag.name.as_str()) && tags.detach(snippet_id, tag.id)? {
            tags.decrement_usage(tag.id)?;
        }
    }

    let current_names: BTreeSet<&str> = current.iter().map(|tag| tag.name.as_str()).collect();
    for name in desired_set {
        if current_names.contains(name) {
            continue;
        }
        let tag = get_or_create_tag(&tags, name, now)?;
        if tags.attach(snippet_id, tag.id)? {
            tags.increment_usage(tag.id)?;
        }
    }

    Ok(tags.tags_for_snippet(snippet_id)?)
}

fn get_or_create_tag<'a>(
    tags: &TagStore<'a>,
    name: &str,
    now: &str,
) -> crate::Result<TagRecord> {
    if let Some(existing) = tags.get_by_name(name)? {
        return Ok(existing);
    }

    let record = TagRecord {
        id: 0, // Will be set by autoincrement
        name: name.to_string(),
        slug: slugify(name),
        usage_count: 0,
        created_at: now.to_string(),
    };
    match tags.insert(&record) {
        Ok(id) => Ok(TagRecord { id, ..record }),
        // Another writer created the tag between our read and insert.
        Err(e) if e.is_unique_violation() => tags
            .get_by_name(name)?
            .ok_or_else(|| crate::Error::conflict(format!("tag {} vanished mid-create", name))),
        Err(e) => Err(e.into()),
    }
}

fn require_live_snippet(conn: &Connection, snippet_id: i64) -> crate::Result<()> {
    let snippet = SnippetStore::new(conn)
        .get(snippet_id)?
        .ok_or_else(|| crate::Error::not_found("snippet", snippet_id))?;
    if snippet.is_deleted() {
        return Err(crate::Error::invalid_state(
            "cannot change tags on a deleted snippet",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Python"), "python");
        assert_eq!(slugify("Data Structures & Algorithms"), "data-structures-algorithms");
        assert_eq!(slugify("  c++  "), "c");
        assert_eq!(slugify("rust"), "rust");
    }
}
