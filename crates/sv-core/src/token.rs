//! Opaque token generation for invitations and link shares.

use uuid::Uuid;

/// Source of unique opaque tokens.
pub trait TokenGenerator: Send + Sync {
    fn generate(&self) -> String;
}

/// Production generator backed by random UUIDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidTokens;

impl TokenGenerator for UuidTokens {
    fn generate(&self) -> String {
        Uuid::new_v4().simple().to_string()
    }
}

/// Deterministic generator for tests: `tok-1`, `tok-2`, ...
#[derive(Debug, Default)]
pub struct SequenceTokens {
    counter: std::sync::atomic::AtomicU64,
}

impl TokenGenerator for SequenceTokens {
    fn generate(&self) -> String {
        let n = self.counter.fetch_add(1, std::sync::atomic::Ordering::Relaxed) + 1;
        format!("tok-{}", n)
    }
}
