//! User registration and lookup.

use std::sync::Arc;

use sv_local_db::{Database, UserRecord, UserStore};

use crate::clock::{format_ts, Clock};

pub struct UserDirectory {
    db: Database,
    clock: Arc<dyn Clock>,
}

impl UserDirectory {
    pub fn new(db: Database, clock: Arc<dyn Clock>) -> Self {
        Self { db, clock }
    }

    /// Register a user. Usernames and emails are unique; a taken one is
    /// a conflict.
    pub fn register(
        &self,
        username: &str,
        email: &str,
        display_name: Option<&str>,
    ) -> crate::Result<UserRecord> {
        let username = username.trim();
        if username.is_empty() {
            return Err(crate::Error::invalid_state("username must not be empty"));
        }
        if !email.contains('@') {
            return Err(crate::Error::invalid_state(format!(
                "{} does not look like an email address",
                email
            )));
        }

        let now = format_ts(self.clock.now());
        crate::db::transact(&self.db, |conn| {
            let record = UserRecord {
                id: 0, // Will be set by autoincrement
                username: username.to_string(),
                email: email.to_string(),
                display_name: display_name.map(str::to_string),
                created_at: now.clone(),
            };
            match UserStore::new(conn).insert(&record) {
                Ok(id) => {
                    tracing::info!(user_id = id, username, "registered user");
                    Ok(UserRecord { id, ..record })
                }
                Err(e) if e.is_unique_violation() => Err(crate::Error::conflict(format!(
                    "username or email already registered: {}",
                    username
                ))),
                Err(e) => Err(e.into()),
            }
        })
    }

    pub fn get(&self, user_id: i64) -> crate::Result<UserRecord> {
        crate::db::read(&self.db, |conn| {
            UserStore::new(conn)
                .get(user_id)?
                .ok_or_else(|| crate::Error::not_found("user", user_id))
        })
    }

    pub fn get_by_username(&self, username: &str) -> crate::Result<UserRecord> {
        crate::db::read(&self.db, |conn| {
            UserStore::new(conn)
                .get_by_username(username)?
                .ok_or_else(|| crate::Error::not_found("user", username))
        })
    }

    pub fn get_by_email(&self, email: &str) -> crate::Result<UserRecord> {
        crate::db::read(&self.db, |conn| {
            UserStore::new(conn)
                .get_by_email(email)?
                .ok_or_else(|| crate::Error::not_found("user", email))
        })
    }
}
