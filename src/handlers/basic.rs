//! HTTP basic authentication.

use async_trait::async_trait;
use axum::http::header::{AUTHORIZATION, WWW_AUTHENTICATE};
use axum::http::{HeaderValue, Request, StatusCode};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bytes::Bytes;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::pipeline::{Handler, ResponseSink};

/// Username reported when the credentials could not be parsed.
const UNKNOWN_USER: &str = "unknown";

/// Error registered when a request fails authentication.
#[derive(Debug, thiserror::Error)]
#[error("invalid username or password (username: {username})")]
pub struct AuthError {
    pub username: String,
}

/// Rejects requests without the configured credentials.
///
/// On success the handler does nothing. On failure it answers
/// `401 Unauthorized` with a `WWW-Authenticate` challenge, which terminates
/// the pipe, and registers an [`AuthError`].
pub struct BasicAuth {
    realm: String,
    username_digest: [u8; 32],
    password_digest: [u8; 32],
}

impl BasicAuth {
    pub fn new(realm: impl Into<String>, username: &str, password: &str) -> Self {
        Self {
            realm: realm.into(),
            username_digest: digest(username),
            password_digest: digest(password),
        }
    }

    pub fn realm(&self) -> &str {
        &self.realm
    }

    /// Validate an `Authorization` header value.
    ///
    /// Returns whether the credentials are valid and the username provided.
    fn check(&self, header: Option<&str>) -> (bool, String) {
        let Some((user, pass)) = header.and_then(parse_credentials) else {
            return (false, UNKNOWN_USER.to_string());
        };

        let valid_user = digest(&user)[..].ct_eq(&self.username_digest[..]);
        let valid_pass = digest(&pass)[..].ct_eq(&self.password_digest[..]);
        (bool::from(valid_user & valid_pass), user)
    }

    fn challenge(&self) -> Option<HeaderValue> {
        HeaderValue::from_str(&format!("Basic realm=\"{}\"", self.realm)).ok()
    }
}

impl std::fmt::Debug for BasicAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicAuth")
            .field("realm", &self.realm)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Handler for BasicAuth {
    async fn handle(&self, sink: &mut ResponseSink, req: &Request<Bytes>) {
        let header = req
            .headers()
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok());

        let (valid, username) = self.check(header);
        if valid {
            return;
        }

        tracing::debug!(username = %username, realm = %self.realm, "Basic auth rejected");
        if let Some(challenge) = self.challenge() {
            sink.headers_mut().insert(WWW_AUTHENTICATE, challenge);
        }
        sink.error(
            StatusCode::UNAUTHORIZED,
            StatusCode::UNAUTHORIZED.canonical_reason().unwrap_or("Unauthorized"),
        );
        sink.register_error(AuthError { username });
    }
}

fn digest(value: &str) -> [u8; 32] {
    Sha256::digest(value.as_bytes()).into()
}

fn parse_credentials(header: &str) -> Option<(String, String)> {
    let (scheme, encoded) = header.split_once(' ')?;
    if scheme != "Basic" {
        return None;
    }
    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (user, pass) = decoded.split_once(':')?;
    Some((user.to_string(), pass.to_string()))
}
