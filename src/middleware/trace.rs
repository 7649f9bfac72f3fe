//! Per-request trace logging.

use std::time::Instant;

use tracing::info;

use super::{BoxFuture, Middleware, Next};
use crate::request::Request;

/// Middleware that logs one line per request: method, path, status, latency.
///
/// Place it outermost so the latency figure covers the whole chain,
/// authorization included:
///
/// ```rust,no_run
/// # use kado::Router;
/// # use kado::middleware::Trace;
/// let app = Router::new().layer(Trace);
/// ```
pub struct Trace;

impl Middleware for Trace {
    fn handle(&self, req: Request, next: Next) -> BoxFuture {
        Box::pin(async move {
            let start = Instant::now();
            let method = req.method().clone();
            let path = req.path().to_owned();

            let res = next.run(req).await;

            info!(
                %method,
                %path,
                status = res.status.as_u16(),
                elapsed_ms = start.elapsed().as_millis() as u64,
                "request"
            );
            res
        })
    }
}
