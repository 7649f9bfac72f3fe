//! Credential store clients.
//!
//! The gateway never owns credentials — it asks a store. [`CredentialStore`]
//! is the capability the authorization middleware is constructed with:
//! handed in explicitly, never re-acquired ambiently per request, so failure
//! modes and test substitution stay visible at the call site.
//!
//! Two implementations ship with the crate:
//!
//! - [`MemoryStore`] — an in-process map, for tests and local development
//! - [`RedisStore`] — a Redis-backed client with a bounded per-lookup timeout
//!
//! "User not found" and "store unreachable" are different answers on purpose.
//! The first is an `Ok(None)` and becomes a 400 upstream; the second is an
//! `Err(StoreError)` and becomes a 500.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

mod memory;
mod redis;

pub use self::memory::MemoryStore;
pub use self::redis::RedisStore;

/// The stored login record for one username.
///
/// Constructed per lookup, compared once, discarded. The middleware holds no
/// longer-lived copy.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoginDetails {
    pub username: String,
    pub auth_token: String,
}

/// A lookup in flight. Boxed for the same reason handlers are: the
/// middleware holds stores as trait objects.
pub type LookupFuture<'a> =
    Pin<Box<dyn Future<Output = Result<Option<LoginDetails>, StoreError>> + Send + 'a>>;

/// A username→token lookup service.
///
/// Stateless per call from the caller's perspective: no session or
/// connection state is assumed to persist correctness across calls. Pooled
/// connections inside an implementation are invisible to this contract.
pub trait CredentialStore: Send + Sync + 'static {
    /// Returns the stored login details for `username`, or `None` if the
    /// store holds no such user. `Err` means the store could not answer.
    fn login_details<'a>(&'a self, username: &'a str) -> LookupFuture<'a>;
}

/// Why a store could not answer.
#[derive(Debug)]
pub enum StoreError {
    /// Acquiring a store handle failed (e.g. connection refused).
    Connect(String),
    /// The store was reached but the lookup itself failed.
    Lookup(String),
    /// The lookup exceeded its configured deadline.
    Timeout,
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connect(cause) => write!(f, "store connect: {cause}"),
            Self::Lookup(cause) => write!(f, "store lookup: {cause}"),
            Self::Timeout => write!(f, "store lookup timed out"),
        }
    }
}

impl std::error::Error for StoreError {}
