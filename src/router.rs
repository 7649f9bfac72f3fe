//! Radix-tree request router.
//!
//! One tree per HTTP method. O(path-length) lookup. You register a path, you
//! get a handler — plus an ordered middleware chain every match passes
//! through before the handler runs.

use std::collections::HashMap;
use std::sync::Arc;

use http::Method;
use matchit::Router as MatchitRouter;

use crate::handler::{BoxedHandler, Handler};
use crate::middleware::{Middleware, Next};

/// The application router.
///
/// One radix tree per HTTP method. Build it once at startup; pass it to
/// [`Server::serve`](crate::Server::serve). Each registration returns `self`
/// so calls chain naturally.
pub struct Router {
    routes: HashMap<Method, MatchitRouter<BoxedHandler>>,
    middlewares: Arc<[Arc<dyn Middleware>]>,
}

impl Router {
    pub fn new() -> Self {
        Self { routes: HashMap::new(), middlewares: Arc::from(Vec::new()) }
    }

    /// Register a handler for a method + path pair. Returns `self` for chaining.
    ///
    /// Path parameters use `{name}` syntax — `req.param("name")` retrieves them:
    ///
    /// ```rust,no_run
    /// # use http::Method;
    /// # use kado::{Request, Response, Router};
    /// # async fn get_account(_: Request) -> Response { Response::text("") }
    /// Router::new().on(Method::GET, "/accounts/{id}", get_account);
    /// ```
    pub fn on(mut self, method: Method, path: &str, handler: impl Handler) -> Self {
        self.routes
            .entry(method)
            .or_default()
            .insert(path, handler.into_boxed_handler())
            .unwrap_or_else(|e| panic!("invalid route `{path}`: {e}"));
        self
    }

    pub fn get(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::GET, path, handler)
    }

    pub fn post(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::POST, path, handler)
    }

    pub fn put(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::PUT, path, handler)
    }

    pub fn delete(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::DELETE, path, handler)
    }

    /// Attach a middleware to every route, matched or future.
    ///
    /// Middleware run in registration order, outermost first:
    /// `.layer(a).layer(b)` gives `a` the request before `b`, and `b`'s
    /// response before the client sees it.
    pub fn layer(mut self, middleware: impl Middleware) -> Self {
        let mut chain = self.middlewares.to_vec();
        chain.push(Arc::new(middleware));
        self.middlewares = Arc::from(chain);
        self
    }

    pub(crate) fn lookup(
        &self,
        method: &Method,
        path: &str,
    ) -> Option<(BoxedHandler, HashMap<String, String>)> {
        let tree = self.routes.get(method)?;
        let matched = tree.at(path).ok()?;
        let handler = Arc::clone(matched.value);
        let params = matched.params.iter()
            .map(|(k, v)| (k.to_owned(), v.to_owned()))
            .collect();
        Some((handler, params))
    }

    /// Builds the full chain for one matched handler. One `Arc` clone of the
    /// shared middleware slice per request, nothing else.
    pub(crate) fn chain(&self, handler: BoxedHandler) -> Next {
        Next::new(Arc::clone(&self.middlewares), handler)
    }
}

impl Default for Router {
    fn default() -> Self { Self::new() }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use bytes::Bytes;
    use http::StatusCode;

    use super::*;
    use crate::request::Request;
    use crate::response::Response;

    fn request(uri: &str, params: HashMap<String, String>) -> Request {
        let (parts, ()) = http::Request::builder()
            .method(Method::GET)
            .uri(uri)
            .body(())
            .unwrap()
            .into_parts();
        Request::new(parts, Bytes::new(), params)
    }

    async fn echo_id(req: Request) -> Response {
        Response::text(req.param("id").unwrap_or("none").to_owned())
    }

    #[tokio::test]
    async fn lookup_matches_method_and_path() {
        let router = Router::new().get("/accounts/{id}", echo_id);

        assert!(router.lookup(&Method::GET, "/accounts/42").is_some());
        assert!(router.lookup(&Method::POST, "/accounts/42").is_none());
        assert!(router.lookup(&Method::GET, "/missing").is_none());
    }

    #[tokio::test]
    async fn route_params_reach_the_handler() {
        let router = Router::new().get("/accounts/{id}", echo_id);
        let (handler, params) = router.lookup(&Method::GET, "/accounts/42").unwrap();

        let res = router.chain(handler).run(request("/accounts/42", params)).await;

        assert_eq!(res.status, StatusCode::OK);
        assert_eq!(res.body, b"42");
    }

    #[tokio::test]
    async fn layered_middleware_wraps_every_route() {
        let stamp = |req: Request, next: crate::middleware::Next| async move {
            let mut res = next.run(req).await;
            res.headers.push(("x-gateway".to_owned(), "kado".to_owned()));
            res
        };
        let router = Router::new().get("/accounts/{id}", echo_id).layer(stamp);
        let (handler, params) = router.lookup(&Method::GET, "/accounts/7").unwrap();

        let res = router.chain(handler).run(request("/accounts/7", params)).await;

        assert!(res.headers.contains(&("x-gateway".to_owned(), "kado".to_owned())));
    }

    #[tokio::test]
    async fn layers_apply_outermost_first_in_registration_order() {
        let first = |req: Request, next: crate::middleware::Next| async move {
            let mut res = next.run(req).await;
            res.body.extend_from_slice(b"-first");
            res
        };
        let second = |req: Request, next: crate::middleware::Next| async move {
            let mut res = next.run(req).await;
            res.body.extend_from_slice(b"-second");
            res
        };
        let router = Router::new()
            .get("/accounts/{id}", echo_id)
            .layer(first)
            .layer(second);
        let (handler, params) = router.lookup(&Method::GET, "/accounts/9").unwrap();

        let res = router.chain(handler).run(request("/accounts/9", params)).await;

        // `.layer(first)` is outermost: it sees the request first and the
        // response last, so its tag lands last.
        assert_eq!(res.body, b"9-second-first");
    }
}
