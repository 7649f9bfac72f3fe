//! Minimal kado gateway — an authorized balance endpoint plus open health
//! checks.
//!
//! Run with:
//!   RUST_LOG=info cargo run --example basic
//!
//! Try:
//!   curl 'http://localhost:3000/balance?username=alice' -H 'authorization: T1'
//!   curl 'http://localhost:3000/balance?username=alice' -H 'authorization: WRONG'
//!   curl 'http://localhost:3000/balance?username='
//!   curl http://localhost:3000/healthz

use kado::middleware::{wrap, RequireAuth, Trace};
use kado::store::MemoryStore;
use kado::{health, Request, Response, Router, Server};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    // Swap for a real deployment:
    //   let store = RedisStore::connect("redis://127.0.0.1:6379",
    //                                   Duration::from_millis(500)).await?;
    let store = MemoryStore::new()
        .with("alice", "T1")
        .with("bob", "T2");

    let app = Router::new()
        .get("/balance", wrap(RequireAuth::new(store), balance))
        .get("/healthz", health::liveness)
        .get("/readyz", health::readiness)
        .layer(Trace);

    Server::bind("0.0.0.0:3000")
        .serve(app)
        .await
        .expect("server error");
}

// GET /balance?username=alice  (authorization header holds the token)
//
// Runs only after RequireAuth has matched the credentials against the store.
async fn balance(req: Request) -> Response {
    let username = req.query("username").unwrap_or("unknown");
    Response::json(format!(r#"{{"username":"{username}","balance":100}}"#).into_bytes())
}
