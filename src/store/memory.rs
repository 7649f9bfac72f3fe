//! In-process credential store.

use std::collections::HashMap;

use super::{CredentialStore, LoginDetails, LookupFuture};

/// A credential store backed by a plain `HashMap`.
///
/// Read-only after construction, so it is shared across concurrent requests
/// without a lock. Meant for tests and local development; production traffic
/// belongs on [`RedisStore`](super::RedisStore).
///
/// ```rust
/// use kado::store::MemoryStore;
///
/// let store = MemoryStore::new()
///     .with("alice", "T1")
///     .with("bob", "T2");
/// ```
#[derive(Default)]
pub struct MemoryStore {
    credentials: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a username→token credential. Returns `self` so entries chain.
    pub fn with(mut self, username: impl Into<String>, token: impl Into<String>) -> Self {
        self.credentials.insert(username.into(), token.into());
        self
    }
}

impl CredentialStore for MemoryStore {
    fn login_details<'a>(&'a self, username: &'a str) -> LookupFuture<'a> {
        Box::pin(async move {
            Ok(self.credentials.get(username).map(|token| LoginDetails {
                username: username.to_owned(),
                auth_token: token.clone(),
            }))
        })
    }
}
