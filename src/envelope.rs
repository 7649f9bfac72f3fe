//! Uniform JSON error envelope.
//!
//! Every failure a client sees leaves the gateway in the same shape:
//!
//! ```json
//! {"code": 400, "message": "invalid username or token"}
//! ```
//!
//! with `Content-Type: application/json` and the HTTP status equal to
//! `code`. Client-caused failures carry a fixed message that does not reveal
//! whether the username or the token was wrong; server-caused failures carry
//! a fixed generic message and the real cause stays in the server log.

use http::StatusCode;
use serde::Serialize;

use crate::response::{IntoResponse, Response};

/// The one message every rejected credential gets.
///
/// Unknown-user and wrong-token are deliberately indistinguishable here so
/// the endpoint cannot be used to enumerate usernames.
pub const UNAUTHORIZED_MESSAGE: &str = "invalid username or token";

/// The one message every internal failure gets. The cause is logged, never
/// returned to the client.
pub const SERVER_ERROR_MESSAGE: &str = "An unexpected error occurred.";

/// The fixed `{code, message}` body written on any failure.
///
/// Immutable once built; serialized and discarded. At most one envelope is
/// written per request — the middleware returns immediately after producing
/// one.
#[derive(Debug, Serialize)]
pub struct ErrorEnvelope {
    code: u16,
    message: String,
}

impl ErrorEnvelope {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self { code: status.as_u16(), message: message.into() }
    }

    /// `400` with [`UNAUTHORIZED_MESSAGE`].
    pub fn unauthorized() -> Self {
        Self::new(StatusCode::BAD_REQUEST, UNAUTHORIZED_MESSAGE)
    }

    /// `500` with [`SERVER_ERROR_MESSAGE`].
    pub fn server_error() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, SERVER_ERROR_MESSAGE)
    }

    /// `404` for paths the router does not know.
    pub fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, "not found")
    }
}

impl IntoResponse for ErrorEnvelope {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        match serde_json::to_vec(&self) {
            Ok(body) => Response::builder().status(status).json(body),
            Err(_) => Response::status(StatusCode::INTERNAL_SERVER_ERROR),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthorized_envelope_is_a_400_json_body() {
        let res = ErrorEnvelope::unauthorized().into_response();
        assert_eq!(res.status, StatusCode::BAD_REQUEST);
        assert!(res.headers.contains(&("content-type".to_owned(), "application/json".to_owned())));
        assert_eq!(res.body, br#"{"code":400,"message":"invalid username or token"}"#);
    }

    #[test]
    fn server_error_envelope_is_a_500_with_the_generic_message() {
        let res = ErrorEnvelope::server_error().into_response();
        assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(res.body, br#"{"code":500,"message":"An unexpected error occurred."}"#);
    }

    #[test]
    fn status_always_equals_the_code_field() {
        let res = ErrorEnvelope::new(StatusCode::NOT_FOUND, "not found").into_response();
        assert_eq!(res.status.as_u16(), 404);
        assert!(String::from_utf8(res.body).unwrap().contains(r#""code":404"#));
    }
}
