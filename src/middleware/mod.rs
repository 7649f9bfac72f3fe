//! Middleware layer.
//!
//! Middleware intercepts requests before a terminal handler and is the right
//! place for cross-cutting concerns: authorization, structured tracing,
//! request-id injection. A middleware receives the [`Request`] and a
//! [`Next`] — the rest of the chain. It either calls `next.run(req)` to
//! forward the unmodified request, or returns its own [`Response`] without
//! calling it, in which case nothing downstream executes.
//!
//! Built-in middleware:
//! - [`RequireAuth`] — credential verification against a
//!   [`CredentialStore`](crate::store::CredentialStore)
//! - [`Trace`] — per-request log line with method, path, status, latency
//!
//! Two ways to attach middleware, with identical behaviour:
//!
//! - [`Router::layer`](crate::Router::layer) — applies to every route,
//!   outermost first in registration order
//! - [`wrap`] — pre-composes one middleware around one handler
//!
//! Closures work too: any `Fn(Request, Next) -> impl Future<Output =
//! Response>` is a middleware.

use std::future::Future;
use std::sync::Arc;

mod auth;
mod trace;

pub use auth::RequireAuth;
pub use trace::Trace;

use crate::handler::{BoxedHandler, Handler};
use crate::request::Request;
use crate::response::Response;

pub use crate::handler::BoxFuture;

/// A stage in the request-processing chain.
///
/// The contract: per invocation, either forward via `next.run(req)` or
/// return a fully-formed response — never both, never neither. The returned
/// future owns everything it needs (`'static`); implementations clone their
/// shared state into it.
pub trait Middleware: Send + Sync + 'static {
    fn handle(&self, req: Request, next: Next) -> BoxFuture;
}

/// Any `Fn(Request, Next) -> Future<Response>` closure is a middleware.
impl<F, Fut> Middleware for F
where
    F: Fn(Request, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    fn handle(&self, req: Request, next: Next) -> BoxFuture {
        Box::pin((self)(req, next))
    }
}

/// The remainder of the chain: zero or more middleware, then the terminal
/// handler.
///
/// Consumed by `run` — a middleware cannot invoke the rest of the chain
/// twice, which is what keeps "at most one response per request" a
/// type-level guarantee rather than a convention.
pub struct Next {
    middlewares: Arc<[Arc<dyn Middleware>]>,
    index: usize,
    handler: BoxedHandler,
}

impl Next {
    pub(crate) fn new(middlewares: Arc<[Arc<dyn Middleware>]>, handler: BoxedHandler) -> Self {
        Self { middlewares, index: 0, handler }
    }

    fn terminal(handler: BoxedHandler) -> Self {
        Self::new(Arc::from(Vec::new()), handler)
    }

    /// Runs the rest of the chain to completion.
    pub fn run(mut self, req: Request) -> BoxFuture {
        match self.middlewares.get(self.index) {
            Some(mw) => {
                let mw = Arc::clone(mw);
                self.index += 1;
                mw.handle(req, self)
            }
            None => self.handler.call(req),
        }
    }
}

/// Pre-composes `middleware` around `handler`, yielding a new handler.
///
/// Associative with [`Router::layer`](crate::Router::layer): wrapping with
/// `M1` then `M2` behaves identically whether done here in one expression or
/// layered in two steps on the router.
///
/// ```rust,no_run
/// use kado::middleware::{wrap, RequireAuth};
/// use kado::store::MemoryStore;
/// use kado::{Request, Response, Router};
///
/// # async fn balance(_req: Request) -> Response { Response::text("") }
/// # async fn healthz(_req: Request) -> Response { Response::text("") }
/// let auth = RequireAuth::new(MemoryStore::new().with("alice", "T1"));
///
/// // Only /balance requires credentials; /healthz stays open.
/// let app = Router::new()
///     .get("/balance", wrap(auth, balance))
///     .get("/healthz", healthz);
/// ```
pub fn wrap(middleware: impl Middleware, handler: impl Handler) -> impl Handler {
    let middleware = Arc::new(middleware);
    let handler = handler.into_boxed_handler();
    move |req: Request| {
        let middleware = Arc::clone(&middleware);
        let handler = Arc::clone(&handler);
        async move { middleware.handle(req, Next::terminal(handler)).await }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use bytes::Bytes;
    use http::StatusCode;

    use super::*;

    fn request(uri: &str) -> Request {
        let (parts, ()) = http::Request::builder()
            .method(http::Method::GET)
            .uri(uri)
            .body(())
            .unwrap()
            .into_parts();
        Request::new(parts, Bytes::new(), HashMap::new())
    }

    /// Handler that counts invocations and answers with a fixed body.
    fn counting_handler(hits: Arc<AtomicUsize>) -> impl Handler {
        move |_req: Request| {
            let hits = Arc::clone(&hits);
            async move {
                hits.fetch_add(1, Ordering::SeqCst);
                Response::text("terminal")
            }
        }
    }

    /// Middleware that appends `tag` to the response body on the way out.
    fn tagging(tag: &'static str) -> impl Middleware {
        move |req: Request, next: Next| async move {
            let mut res = next.run(req).await;
            res.body.extend_from_slice(tag.as_bytes());
            res
        }
    }

    #[tokio::test]
    async fn middleware_runs_in_registration_order() {
        let hits = Arc::new(AtomicUsize::new(0));
        let chain: Arc<[Arc<dyn Middleware>]> =
            Arc::from(vec![
                Arc::new(tagging("-outer")) as Arc<dyn Middleware>,
                Arc::new(tagging("-inner")),
            ]);
        let handler = counting_handler(Arc::clone(&hits)).into_boxed_handler();

        let res = Next::new(chain, handler).run(request("/")).await;

        // Inner middleware finishes first, so its tag lands first.
        assert_eq!(res.body, b"terminal-inner-outer");
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn short_circuit_stops_the_whole_chain() {
        let hits = Arc::new(AtomicUsize::new(0));
        let rejecting = |_req: Request, _next: Next| async move {
            Response::status(StatusCode::FORBIDDEN)
        };
        let chain: Arc<[Arc<dyn Middleware>]> = Arc::from(vec![
            Arc::new(rejecting) as Arc<dyn Middleware>,
            Arc::new(tagging("-never")),
        ]);
        let handler = counting_handler(Arc::clone(&hits)).into_boxed_handler();

        let res = Next::new(chain, handler).run(request("/")).await;

        assert_eq!(res.status, StatusCode::FORBIDDEN);
        assert!(res.body.is_empty());
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn wrap_composition_matches_layered_chain() {
        let hits = Arc::new(AtomicUsize::new(0));

        // Pre-composed: M1 ∘ (M2 ∘ handler).
        let composed = wrap(tagging("-m1"), wrap(tagging("-m2"), counting_handler(Arc::clone(&hits))))
            .into_boxed_handler();
        let composed_res = composed.call(request("/")).await;

        // Layered: [M1, M2] applied by the chain walker.
        let chain: Arc<[Arc<dyn Middleware>]> = Arc::from(vec![
            Arc::new(tagging("-m1")) as Arc<dyn Middleware>,
            Arc::new(tagging("-m2")),
        ]);
        let layered_res = Next::new(chain, counting_handler(Arc::clone(&hits)).into_boxed_handler())
            .run(request("/"))
            .await;

        assert_eq!(composed_res.body, layered_res.body);
        assert_eq!(composed_res.status, layered_res.status);
    }
}
