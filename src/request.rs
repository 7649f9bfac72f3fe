//! Incoming HTTP request type.

use std::collections::HashMap;

use bytes::Bytes;
use http::request::Parts;

/// An incoming HTTP request.
///
/// Built once per request from the hyper request head plus the fully
/// collected body. Immutable from a handler's point of view: middleware
/// reads from it and either forwards it untouched or drops it.
pub struct Request {
    pub(crate) parts: Parts,
    pub(crate) body: Bytes,
    pub(crate) query: HashMap<String, String>,
    pub(crate) params: HashMap<String, String>,
}

impl Request {
    pub(crate) fn new(parts: Parts, body: Bytes, params: HashMap<String, String>) -> Self {
        let query = parse_query(parts.uri.query().unwrap_or(""));
        Self { parts, body, query, params }
    }

    pub fn method(&self) -> &http::Method {
        &self.parts.method
    }

    pub fn path(&self) -> &str {
        self.parts.uri.path()
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Case-insensitive header lookup. Non-UTF-8 header values read as absent.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.parts.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns a query-string parameter, exactly as it appeared on the wire.
    ///
    /// Values are raw: no percent-decoding, trimming, or case-folding. A
    /// gateway compares credentials byte-for-byte; decoding is the business
    /// handler's concern.
    pub fn query(&self, key: &str) -> Option<&str> {
        self.query.get(key).map(String::as_str)
    }

    /// Returns a named path parameter.
    ///
    /// For a route `/users/{id}`, `req.param("id")` on `/users/42` returns `Some("42")`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }
}

/// Splits `a=1&b=2` into pairs without decoding. A key without `=` maps to
/// the empty string; a repeated key keeps its last value.
fn parse_query(raw: &str) -> HashMap<String, String> {
    raw.split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((k, v)) => (k.to_owned(), v.to_owned()),
            None => (pair.to_owned(), String::new()),
        })
        .collect()
}
