//! Database connection management.

use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::migrations::MigrationManager;

/// Database connection wrapper shared across the SnipVault services.
#[derive(Debug, Clone)]
pub struct Database {
    connection: Arc<std::sync::Mutex<Connection>>,
}

impl Database {
    /// Get the default database path based on the SNIPVAULT_DB_PATH
    /// environment variable or platform defaults.
    ///
    /// Priority order:
    /// 1. SNIPVAULT_DB_PATH environment variable (custom)
    /// 2. Platform-specific defaults:
    ///    - Linux: `${XDG_STATE_HOME:-~/.local/state}/snipvault/snipvault.db`
    ///    - macOS: `~/Library/Application Support/snipvault/snipvault.db`
    ///    - Windows: `%LOCALAPPDATA%\snipvault\snipvault.db`
    pub fn default_path() -> crate::Result<PathBuf> {
        if let Ok(custom) = std::env::var("SNIPVAULT_DB_PATH") {
            return Ok(PathBuf::from(custom));
        }

        #[cfg(target_os = "linux")]
        {
            let xdg_state_home =
                std::env::var("XDG_STATE_HOME").map(PathBuf::from).or_else(|_| {
                    std::env::var("HOME")
                        .map(|home| PathBuf::from(home).join(".local").join("state"))
                        .map_err(|_| {
                            crate::Error::generic("HOME environment variable not set")
                        })
                })?;
            Ok(xdg_state_home.join("snipvault").join("snipvault.db"))
        }

        #[cfg(target_os = "macos")]
        {
            let home = std::env::var("HOME")
                .map_err(|_| crate::Error::generic("HOME environment variable not set"))?;
            Ok(PathBuf::from(home)
                .join("Library")
                .join("Application Support")
                .join("snipvault")
                .join("snipvault.db"))
        }

        #[cfg(target_os = "windows")]
        {
            let local_appdata = std::env::var("LOCALAPPDATA").map_err(|_| {
                crate::Error::generic("LOCALAPPDATA environment variable not set")
            })?;
            Ok(PathBuf::from(local_appdata).join("snipvault").join("snipvault.db"))
        }

        #[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
        {
            let home = std::env::var("HOME")
                .map_err(|_| crate::Error::generic("HOME environment variable not set"))?;
            Ok(PathBuf::from(home).join(".snipvault").join("snipvault.db"))
        }
    }

    /// Open the database at the default path, creating parent directories
    /// as needed.
    pub fn open_default() -> crate::Result<Self> {
        let path = Self::default_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Self::open(&path)
    }

    /// Open a new database connection at the specified path.
    ///
    /// If the path doesn't exist, the database will be created. All pending
    /// schema migrations are applied before the handle is returned.
    pub fn open<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        tracing::debug!(path = %path.as_ref().display(), "opening database");
        let conn = Connection::open(path)?;
        Self::initialize(&conn)?;
        Ok(Self {
            connection: Arc::new(std::sync::Mutex::new(conn)),
        })
    }

    /// Open an in-memory database for testing.
    pub fn open_in_memory() -> crate::Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::initialize(&conn)?;
        Ok(Self {
            connection: Arc::new(std::sync::Mutex::new(conn)),
        })
    }

    fn initialize(conn: &Connection) -> crate::Result<()> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        MigrationManager::migrate(conn)
    }

    /// Get a reference to the underlying connection.
    ///
    /// This method provides access to the connection for executing queries.
    /// The caller must ensure proper locking if used concurrently.
    pub fn connection(&self) -> &std::sync::Mutex<Connection> {
        &self.connection
    }

    /// Execute a transaction with automatic rollback on error.
    pub fn transaction<F, T>(&self, f: F) -> crate::Result<T>
    where
        F: FnOnce(&Connection) -> crate::Result<T>,
    {
        let conn = self.connection.lock().map_err(|e| {
            crate::Error::generic(format!("Failed to acquire database lock: {}", e))
        })?;

        let tx = conn.unchecked_transaction()?;
        match f(&tx) {
            Ok(result) => {
                tx.commit()?;
                Ok(result)
            }
            Err(e) => {
                tx.rollback()?;
                Err(e)
            }
        }
    }

    /// Execute a read-only closure against the locked connection.
    pub fn with_conn<F, T>(&self, f: F) -> crate::Result<T>
    where
        F: FnOnce(&Connection) -> crate::Result<T>,
    {
        let conn = self.connection.lock().map_err(|e| {
            crate::Error::generic(format!("Failed to acquire database lock: {}", e))
        })?;
        f(&conn)
    }
}
