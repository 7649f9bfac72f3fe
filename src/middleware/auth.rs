//! Request authorization middleware.
//!
//! Per request: `Start → extract credentials → look up store → decide →
//! {forwarded | error written}`. The two terminal states are exclusive and
//! exactly one is reached; a request that fails authorization never touches
//! the downstream handler.

use std::sync::Arc;

use tracing::{error, warn};

use super::{BoxFuture, Middleware, Next};
use crate::envelope::ErrorEnvelope;
use crate::request::Request;
use crate::response::IntoResponse;
use crate::store::{CredentialStore, StoreError};

/// Middleware that rejects any request whose credentials do not match the
/// store.
///
/// Credentials travel as a `username` query parameter and the raw
/// `authorization` header value; both are compared byte-for-byte, no
/// trimming or decoding. The store is an injected capability — handed in at
/// construction, shared read-only across concurrent requests.
///
/// Unknown-user and wrong-token rejections are indistinguishable on the
/// wire (same 400 body), so the gateway cannot be used to enumerate
/// usernames. Store failures become a 500 with a generic message; the cause
/// is logged server-side only.
pub struct RequireAuth {
    store: Arc<dyn CredentialStore>,
}

impl RequireAuth {
    pub fn new(store: impl CredentialStore) -> Self {
        Self { store: Arc::new(store) }
    }
}

/// The decision for one request. Computed once, never persisted.
enum Outcome {
    Authorized,
    Unauthorized,
    StoreUnavailable(StoreError),
}

/// One evaluation, no retries. A store failure is surfaced once; retry
/// policy, if any, belongs to the store client.
async fn authorize(store: &dyn CredentialStore, req: &Request) -> Outcome {
    let username = req.query("username").unwrap_or("");
    let token = req.header("authorization").unwrap_or("");

    // Empty username short-circuits before the store is consulted.
    if username.is_empty() {
        return Outcome::Unauthorized;
    }

    match store.login_details(username).await {
        Err(cause) => Outcome::StoreUnavailable(cause),
        Ok(None) => Outcome::Unauthorized,
        Ok(Some(details)) if details.auth_token.as_bytes() != token.as_bytes() => {
            Outcome::Unauthorized
        }
        Ok(Some(_)) => Outcome::Authorized,
    }
}

impl Middleware for RequireAuth {
    fn handle(&self, req: Request, next: Next) -> BoxFuture {
        let store = Arc::clone(&self.store);
        Box::pin(async move {
            match authorize(store.as_ref(), &req).await {
                Outcome::Authorized => next.run(req).await,
                Outcome::Unauthorized => {
                    // Best-effort log, then exactly one envelope.
                    warn!(
                        username = req.query("username").unwrap_or(""),
                        path = req.path(),
                        "authorization rejected"
                    );
                    ErrorEnvelope::unauthorized().into_response()
                }
                Outcome::StoreUnavailable(cause) => {
                    error!(path = req.path(), %cause, "credential store unavailable");
                    ErrorEnvelope::server_error().into_response()
                }
            }
        })
    }
}
