//! Redis-backed credential store.

use std::time::Duration;

use redis::aio::ConnectionManager;
use redis::AsyncCommands;

use super::{CredentialStore, LoginDetails, LookupFuture, StoreError};

/// Key prefix under which tokens live: `auth:token:<username>` → token.
const KEY_PREFIX: &str = "auth:token:";

/// A credential store backed by Redis.
///
/// [`connect`](RedisStore::connect) is the fallible handle acquisition: a
/// refused connection or a bad URL surfaces there as
/// [`StoreError::Connect`], never as an unauthorized lookup. The
/// `ConnectionManager` reconnects on its own after transient drops; a lookup
/// issued while the connection is down fails with [`StoreError::Lookup`].
///
/// Every lookup runs under `timeout` so an unresponsive store produces a
/// bounded [`StoreError::Timeout`] instead of a hung request.
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
    timeout: Duration,
}

impl RedisStore {
    /// Connects to `url` (e.g. `redis://127.0.0.1:6379`).
    pub async fn connect(url: &str, timeout: Duration) -> Result<Self, StoreError> {
        let client =
            redis::Client::open(url).map_err(|e| StoreError::Connect(e.to_string()))?;
        let conn = ConnectionManager::new(client)
            .await
            .map_err(|e| StoreError::Connect(e.to_string()))?;
        Ok(Self { conn, timeout })
    }
}

impl CredentialStore for RedisStore {
    fn login_details<'a>(&'a self, username: &'a str) -> LookupFuture<'a> {
        Box::pin(async move {
            let mut conn = self.conn.clone();
            let key = format!("{KEY_PREFIX}{username}");
            let lookup = conn.get::<_, Option<String>>(key);
            let token = tokio::time::timeout(self.timeout, lookup)
                .await
                .map_err(|_| StoreError::Timeout)?
                .map_err(|e| StoreError::Lookup(e.to_string()))?;
            Ok(token.map(|auth_token| LoginDetails {
                username: username.to_owned(),
                auth_token,
            }))
        })
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    use super::*;

    #[tokio::test]
    async fn bad_url_fails_at_connect_not_at_lookup() {
        let err = match RedisStore::connect("not-a-url", Duration::from_millis(100)).await {
            Ok(_) => panic!("connect must fail on a malformed url"),
            Err(e) => e,
        };
        assert!(matches!(err, StoreError::Connect(_)));
    }

    #[tokio::test]
    async fn silent_store_times_out_within_the_deadline() {
        // Accepts connections and swallows bytes without ever answering.
        // The TCP connect succeeds, so the failure has to come from the
        // lookup deadline, not from handle acquisition.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else { break };
                tokio::spawn(async move {
                    let mut buf = [0u8; 512];
                    while matches!(socket.read(&mut buf).await, Ok(n) if n > 0) {}
                });
            }
        });

        let store = RedisStore::connect(&format!("redis://{addr}"), Duration::from_millis(200))
            .await
            .expect("tcp connect to the local listener should succeed");

        let start = std::time::Instant::now();
        let err = store.login_details("alice").await.unwrap_err();

        assert!(matches!(err, StoreError::Timeout));
        // Bounded failure: well under the test runner's patience, just over
        // the configured deadline.
        assert!(start.elapsed() < Duration::from_secs(2));
    }
}
