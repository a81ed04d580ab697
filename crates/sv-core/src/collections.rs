//! User-curated snippet collections.

use std::sync::Arc;

use sv_local_db::{
    CollectionRecord, CollectionSnippetRecord, CollectionStore, Database, UserStore,
};

use crate::clock::{format_ts, Clock};
use crate::snippets::live_snippet_on;
use crate::visibility;

pub struct CollectionManager {
    db: Database,
    clock: Arc<dyn Clock>,
}

impl CollectionManager {
    pub fn new(db: Database, clock: Arc<dyn Clock>) -> Self {
        Self { db, clock }
    }

    pub fn create(
        &self,
        owner_id: i64,
        name: &str,
        description: Option<&str>,
        is_public: bool,
    ) -> crate::Result<CollectionRecord> {
        let name = name.trim();
        if name.is_empty() {
            return Err(crate::Error::invalid_state("collection name must not be empty"));
        }
        let now = format_ts(self.clock.now());
        crate::db::transact(&self.db, |conn| {
            if UserStore::new(conn).get(owner_id)?.is_none() {
                return Err(crate::Error::not_found("user", owner_id));
            }
            let record = CollectionRecord {
                id: 0, // Will be set by autoincrement
                owner_id,
                name: name.to_string(),
                description: description.map(str::to_string),
                is_public: if is_public { 1 } else { 0 },
                created_at: now.clone(),
                updated_at: now.clone(),
            };
            let id = CollectionStore::new(conn).insert(&record)?;
            Ok(CollectionRecord { id, ..record })
        })
    }

    pub fn get(&self, collection_id: i64) -> crate::Result<CollectionRecord> {
        crate::db::read(&self.db, |conn| {
            CollectionStore::new(conn)
                .get(collection_id)?
                .ok_or_else(|| crate::Error::not_found("collection", collection_id))
        })
    }

    pub fn list_for_owner(&self, owner_id: i64) -> crate::Result<Vec<CollectionRecord>> {
        crate::db::read(&self.db, |conn| {
            Ok(CollectionStore::new(conn).list_for_owner(owner_id)?)
        })
    }

    /// Append a snippet the owner can view to their collection. Adding a
    /// snippet twice is a conflict.
    pub fn add_snippet(
        &self,
        collection_id: i64,
        actor_id: i64,
        snippet_id: i64,
    ) -> crate::Result<()> {
        let now = format_ts(self.clock.now());
        crate::db::transact(&self.db, |conn| {
            let collections = CollectionStore::new(conn);
            let collection = collections
                .get(collection_id)?
                .ok_or_else(|| crate::Error::not_found("collection", collection_id))?;
            if collection.owner_id != actor_id {
                return Err(crate::Error::forbidden(
                    "only the owner may edit a collection",
                ));
            }
            let snippet = live_snippet_on(conn, snippet_id)?;
            if !visibility::can_view_on(conn, &snippet, Some(actor_id))? {
                return Err(crate::Error::forbidden("snippet is not visible to you"));
            }
            let position = collections.next_position(collection_id)?;
            if !collections.add_snippet(collection_id, snippet_id, position, &now)? {
                return Err(crate::Error::conflict(format!(
                    "snippet {} is already in collection {}",
                    snippet_id, collection_id
                )));
            }
            Ok(())
        })
    }

    pub fn remove_snippet(
        &self,
        collection_id: i64,
        actor_id: i64,
        snippet_id: i64,
    ) -> crate::Result<()> {
        crate::db::transact(&self.db, |conn| {
            let collections = CollectionStore::new(conn);
            let collection = collections
                .get(collection_id)?
                .ok_or_else(|| crate::Error::not_found("collection", collection_id))?;
            if collection.owner_id != actor_id {
                return Err(crate::Error::forbidden(
                    "only the owner may edit a collection",
                ));
            }
            if !collections.remove_snippet(collection_id, snippet_id)? {
                return Err(crate::Error::not_found("collection entry", snippet_id));
            }
            Ok(())
        })
    }

    /// Entries in insertion order. Private collections are owner-only.
    pub fn snippets_in(
        &self,
        collection_id: i64,
        acting_user: Option<i64>,
    ) -> crate::Result<Vec<CollectionSnippetRecord>> {
        crate::db::read(&self.db, |conn| {
            let collections = CollectionStore::new(conn);
            let collection = collections
                .get(collection_id)?
                .ok_or_else(|| crate::Error::not_found("collection", collection_id))?;
            if collection.is_public == 0 && acting_user != Some(collection.owner_id) {
                return Err(crate::Error::forbidden("collection is private"));
            }
            Ok(collections.snippets_in(collection_id)?)
        })
    }
}
