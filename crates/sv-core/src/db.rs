//! Shared database access helpers for the domain services.
//!
//! Store operations return database results; the services need domain
//! errors to abort a transaction (a version conflict must roll back the
//! whole write). These helpers run closures that already speak
//! [`crate::Error`], committing only on success.

use rusqlite::Connection;
use sv_local_db::Database;

/// Run a read-only closure against the locked connection.
pub(crate) fn read<F, T>(db: &Database, f: F) -> crate::Result<T>
where
    F: FnOnce(&Connection) -> crate::Result<T>,
{
    let conn = db
        .connection()
        .lock()
        .map_err(|e| crate::Error::internal(format!("Failed to acquire database lock: {}", e)))?;
    f(&conn)
}

/// Run a closure inside a transaction, rolling back on any error.
pub(crate) fn transact<F, T>(db: &Database, f: F) -> crate::Result<T>
where
    F: FnOnce(&Connection) -> crate::Result<T>,
{
    let conn = db
        .connection()
        .lock()
        .map_err(|e| crate::Error::internal(format!("Failed to acquire database lock: {}", e)))?;

    let tx = conn
        .unchecked_transaction()
        .map_err(sv_local_db::Error::from)?;
    match f(&tx) {
        Ok(result) => {
            tx.commit().map_err(sv_local_db::Error::from)?;
            Ok(result)
        }
        Err(e) => {
            tx.rollback().map_err(sv_local_db::Error::from)?;
            Err(e)
        }
    }
}
