//! # kado
//!
//! A minimal HTTP gateway for Rust services behind a reverse proxy.
//! It does one thing the proxy cannot: decide, per request, whether the
//! caller is who they claim to be — before any business handler runs.
//!
//! ## The contract
//!
//! nginx handles TLS, rate limiting, slow clients, and body-size limits.
//! kado does not — by design. The proxy does proxy things. The gateway does
//! gateway things:
//!
//! - Radix-tree routing — O(path-length) lookup via [`matchit`]
//! - A middleware chain that can short-circuit a request before it reaches
//!   a handler — see [`middleware`]
//! - Credential verification against a pluggable store — see [`store`]
//! - Uniform JSON error envelopes on every failure path — see [`ErrorEnvelope`]
//! - Graceful shutdown — SIGTERM / Ctrl-C, drains in-flight requests
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use kado::middleware::RequireAuth;
//! use kado::store::MemoryStore;
//! use kado::{Request, Response, Router, Server};
//!
//! #[tokio::main]
//! async fn main() {
//!     let store = MemoryStore::new().with("alice", "T1");
//!
//!     let app = Router::new()
//!         .get("/balance", balance)
//!         .layer(RequireAuth::new(store));
//!
//!     Server::bind("0.0.0.0:3000").serve(app).await.unwrap();
//! }
//!
//! async fn balance(_req: Request) -> Response {
//!     Response::json(br#"{"balance":100}"#.to_vec())
//! }
//! ```
//!
//! A request reaches `balance` only if its `username` query parameter names a
//! stored credential and its `authorization` header carries the matching
//! token. Everything else gets `{"code":400,"message":"invalid username or
//! token"}` — and a store outage gets a 500 without leaking why.

mod envelope;
mod error;
mod handler;
mod request;
mod response;
mod router;
mod server;

pub mod health;
pub mod middleware;
pub mod store;

pub use envelope::{ErrorEnvelope, SERVER_ERROR_MESSAGE, UNAUTHORIZED_MESSAGE};
pub use error::Error;
pub use handler::Handler;
pub use request::Request;
pub use response::{ContentType, IntoResponse, Response};
pub use router::Router;
pub use server::Server;
