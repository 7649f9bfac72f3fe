//! HTTP server and graceful shutdown.
//!
//! # Graceful shutdown and Kubernetes
//!
//! When Kubernetes terminates a pod it sends **SIGTERM** and waits
//! `terminationGracePeriodSeconds` (default 30 s) before sending SIGKILL.
//!
//! The server reacts by:
//! 1. Immediately stopping `listener.accept()` — no new connections.
//! 2. Letting every in-flight connection task run to completion.
//! 3. Returning from [`Server::serve`], which lets `main` exit cleanly.
//!
//! Set `terminationGracePeriodSeconds` longer than your slowest request
//! (credential-store timeout included).

use std::net::SocketAddr;
use std::sync::Arc;

use http_body_util::BodyExt;
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::envelope::ErrorEnvelope;
use crate::error::Error;
use crate::request::Request;
use crate::response::{IntoResponse, Response};
use crate::router::Router;

/// The HTTP server.
pub struct Server {
    addr: SocketAddr,
}

impl Server {
    /// Configures the server to bind to `addr` when [`serve`](Server::serve)
    /// is called.
    ///
    /// # Panics
    ///
    /// Panics if `addr` is not a valid `host:port` string.
    pub fn bind(addr: &str) -> Self {
        let addr: SocketAddr = addr.parse().expect("invalid socket address");
        Self { addr }
    }

    /// Starts accepting connections and dispatching them through `router`.
    ///
    /// Returns only after a full graceful shutdown (SIGTERM or Ctrl-C,
    /// followed by all in-flight requests completing).
    pub async fn serve(self, router: Router) -> Result<(), Error> {
        let listener = TcpListener::bind(self.addr).await?;

        // Shared across connection tasks without copying the routing table
        // or the middleware chain.
        let router = Arc::new(router);

        info!(addr = %self.addr, "kado listening");

        // JoinSet tracks every spawned connection task so graceful shutdown
        // can wait for them all.
        let mut tasks = tokio::task::JoinSet::new();

        let shutdown = shutdown_signal();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                // `biased` checks arms top-to-bottom: a SIGTERM stops
                // accepting immediately, even with connections queued.
                biased;

                () = &mut shutdown => {
                    info!(in_flight = tasks.len(), "shutdown signal received, draining connections");
                    break;
                }

                res = listener.accept() => {
                    let (stream, remote_addr) = match res {
                        Ok(v) => v,
                        Err(e) => {
                            error!("accept error: {e}");
                            continue;
                        }
                    };

                    let router = Arc::clone(&router);
                    let io = TokioIo::new(stream);

                    tasks.spawn(async move {
                        // Called once per request on the connection, not
                        // once per connection.
                        let svc = service_fn(move |req| {
                            let router = Arc::clone(&router);
                            async move { dispatch(router, req).await }
                        });

                        // `auto::Builder` handles both HTTP/1.1 and HTTP/2,
                        // whatever the client negotiates.
                        if let Err(e) = ConnBuilder::new(TokioExecutor::new())
                            .serve_connection(io, svc)
                            .await
                        {
                            error!(peer = %remote_addr, "connection error: {e}");
                        }
                    });
                }

                // Reap finished tasks so the JoinSet does not grow without
                // bound on long-running servers.
                Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
            }
        }

        // Drain every in-flight connection before returning.
        while tasks.join_next().await.is_some() {}

        info!("kado stopped");
        Ok(())
    }
}

// ── Request dispatch ──────────────────────────────────────────────────────────

/// Core hot path: one request in, one response out.
///
/// The error type is [`Infallible`](std::convert::Infallible) — every
/// failure becomes an [`ErrorEnvelope`] here or earlier, so hyper never sees
/// an error. If the client goes away mid-flight, hyper drops this future and
/// no response is written; nothing here cares.
async fn dispatch(
    router: Arc<Router>,
    req: hyper::Request<hyper::body::Incoming>,
) -> Result<http::Response<http_body_util::Full<bytes::Bytes>>, std::convert::Infallible> {
    let (parts, body) = req.into_parts();

    let response = match body.collect().await {
        Ok(collected) => route(&router, parts, collected.to_bytes()).await,
        Err(e) => {
            warn!("failed to read request body: {e}");
            unreadable_body()
        }
    };

    Ok(response.into_inner())
}

/// Routing once the body is in hand: match, build the chain, run it.
///
/// Split from [`dispatch`] so it works on plain request parts — `dispatch`
/// is just body collection around this.
async fn route(router: &Router, parts: http::request::Parts, body: bytes::Bytes) -> Response {
    let path = parts.uri.path().to_owned();
    match router.lookup(&parts.method, &path) {
        Some((handler, params)) => {
            let request = Request::new(parts, body, params);
            router.chain(handler).run(request).await
        }
        // Unknown paths get the same envelope shape as every other failure.
        None => ErrorEnvelope::not_found().into_response(),
    }
}

/// The envelope for a body that could not be read off the wire.
fn unreadable_body() -> Response {
    ErrorEnvelope::new(http::StatusCode::BAD_REQUEST, "malformed request body").into_response()
}

// ── Shutdown signal ───────────────────────────────────────────────────────────

/// Resolves on the first shutdown signal the process receives.
///
/// On Unix this listens for both **SIGTERM** (Kubernetes) and **SIGINT**
/// (Ctrl-C, local dev). On Windows only Ctrl-C is available.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let sigterm = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    // `pending()` never resolves — the SIGTERM arm is effectively disabled
    // on non-Unix platforms.
    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c   => {}
        () = sigterm  => {}
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use http::StatusCode;

    use super::*;

    fn parts(method: http::Method, uri: &str) -> http::request::Parts {
        let (parts, ()) = http::Request::builder()
            .method(method)
            .uri(uri)
            .body(())
            .unwrap()
            .into_parts();
        parts
    }

    fn app() -> Router {
        Router::new().get("/balance", |_req: Request| async { Response::text("ok") })
    }

    #[tokio::test]
    async fn matched_route_runs_the_handler() {
        let res = route(&app(), parts(http::Method::GET, "/balance"), Bytes::new()).await;

        assert_eq!(res.status, StatusCode::OK);
        assert_eq!(res.body, b"ok");
    }

    #[tokio::test]
    async fn unmatched_path_gets_a_404_envelope() {
        let res = route(&app(), parts(http::Method::GET, "/missing"), Bytes::new()).await;

        assert_eq!(res.status, StatusCode::NOT_FOUND);
        assert_eq!(res.body, br#"{"code":404,"message":"not found"}"#);
        assert!(res.headers.contains(&("content-type".to_owned(), "application/json".to_owned())));
    }

    #[tokio::test]
    async fn unmatched_method_gets_the_same_404_envelope() {
        let res = route(&app(), parts(http::Method::POST, "/balance"), Bytes::new()).await;

        assert_eq!(res.status, StatusCode::NOT_FOUND);
        assert_eq!(res.body, br#"{"code":404,"message":"not found"}"#);
    }

    #[test]
    fn unreadable_body_is_a_400_envelope() {
        let res = unreadable_body();

        assert_eq!(res.status, StatusCode::BAD_REQUEST);
        assert_eq!(res.body, br#"{"code":400,"message":"malformed request body"}"#);
        assert!(res.headers.contains(&("content-type".to_owned(), "application/json".to_owned())));
    }
}
