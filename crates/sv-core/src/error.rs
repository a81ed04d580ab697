//! Core error types for the SnipVault domain services.

/// Core error type for all SnipVault operations.
///
/// The first five variants are the domain failure categories the services
/// signal; the remaining variants wrap infrastructure faults. Services never
/// catch and suppress their own failures.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Not found: {what}")]
    NotFound { what: String },

    #[error("Forbidden: {message}")]
    Forbidden { message: String },

    #[error("Conflict: {message}")]
    Conflict { message: String },

    #[error("Expired: {message}")]
    Expired { message: String },

    #[error("Invalid state: {message}")]
    InvalidState { message: String },

    #[error("Database error: {0}")]
    Database(#[from] sv_local_db::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a not-found error for an entity and its key.
    pub fn not_found<K: std::fmt::Display>(entity: &str, key: K) -> Self {
        Self::NotFound {
            what: format!("{} {}", entity, key),
        }
    }

    /// Create a permission or identity-mismatch error.
    pub fn forbidden<S: Into<String>>(message: S) -> Self {
        Self::Forbidden {
            message: message.into(),
        }
    }

    /// Create a concurrent-write or duplicate-key error.
    pub fn conflict<S: Into<String>>(message: S) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    /// Create an error for a time-boxed grant past its window.
    pub fn expired<S: Into<String>>(message: S) -> Self {
        Self::Expired {
            message: message.into(),
        }
    }

    /// Create an error for a state-machine transition that is not allowed
    /// from the current state.
    pub fn invalid_state<S: Into<String>>(message: S) -> Self {
        Self::InvalidState {
            message: message.into(),
        }
    }

    /// Create an internal error. These indicate corrupt stored data or
    /// infrastructure faults, never a domain outcome.
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal(message.into())
    }
}
