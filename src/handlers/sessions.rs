//! Cookie-based session identifiers.
//!
//! # Responsibilities
//! - Issue a random session id to clients that do not own a live one
//! - Remember issued ids in memory until they expire
//! - Let later handlers look up the id of the current request
//!
//! # Design Decisions
//! - Issuing a session never commits the response status, so the pipe
//!   continues into the page handlers
//! - The freshly issued id is also stored in the sink extensions, so handlers
//!   of the same request see it before the client sends the cookie back
//! - Store is a `DashMap`; handlers are shared across concurrent requests
//! - Expired entries are swept when a new id is issued, at most once per
//!   session lifetime

use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::{HeaderValue, Request, StatusCode};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use bytes::Bytes;
use dashmap::DashMap;
use rand::RngCore;

use crate::config::SessionConfig;
use crate::pipeline::{Handler, ResponseSink};

/// Session id length in random bytes.
const SESSION_ID_LEN: usize = 32;

/// Failure to resolve the session of a request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("no session cookie `{0}` in request")]
    NoCookie(String),

    #[error("unknown or expired session id")]
    Unknown,
}

/// Session id attached to the sink by [`Sessions`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionId(pub String);

/// Handler issuing session cookies.
#[derive(Debug)]
pub struct Sessions {
    config: SessionConfig,
    store: DashMap<String, Instant>,
    last_sweep: Mutex<Instant>,
}

impl Sessions {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            store: DashMap::new(),
            last_sweep: Mutex::new(Instant::now()),
        }
    }

    pub fn cookie_name(&self) -> &str {
        &self.config.cookie_name
    }

    /// Number of live sessions in the store.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    fn ttl(&self) -> Duration {
        Duration::from_secs(self.config.max_age_secs)
    }

    /// The session id of the current request.
    ///
    /// An id issued earlier in the same pipe wins over the request cookie.
    pub fn session_id(&self, sink: &ResponseSink, req: &Request<Bytes>) -> Result<String, SessionError> {
        if let Some(SessionId(id)) = sink.extensions().get::<SessionId>() {
            return Ok(id.clone());
        }
        self.cookie_session(req)
    }

    fn cookie_session(&self, req: &Request<Bytes>) -> Result<String, SessionError> {
        let id = cookie_value(req, &self.config.cookie_name)
            .ok_or_else(|| SessionError::NoCookie(self.config.cookie_name.clone()))?;

        let live = match self.store.get(&id) {
            Some(issued) => issued.elapsed() < self.ttl(),
            None => return Err(SessionError::Unknown),
        };
        if !live {
            self.store.remove(&id);
            return Err(SessionError::Unknown);
        }
        Ok(id)
    }

    /// Drop expired entries if a full lifetime has passed since the last sweep.
    fn sweep_expired(&self) {
        let ttl = self.ttl();
        let Ok(mut last) = self.last_sweep.try_lock() else {
            return;
        };
        if last.elapsed() < ttl {
            return;
        }
        *last = Instant::now();

        let before = self.store.len();
        self.store.retain(|_, issued| issued.elapsed() < ttl);
        let removed = before.saturating_sub(self.store.len());
        if removed > 0 {
            tracing::debug!(removed, live = self.store.len(), "Expired sessions swept");
        }
    }

    fn set_cookie(&self, id: &str) -> Result<HeaderValue, axum::http::header::InvalidHeaderValue> {
        let mut cookie = format!(
            "{}={}; Path={}; Max-Age={}",
            self.config.cookie_name, id, self.config.path, self.config.max_age_secs
        );
        if self.config.http_only {
            cookie.push_str("; HttpOnly");
        }
        HeaderValue::from_str(&cookie)
    }
}

#[async_trait]
impl Handler for Sessions {
    async fn handle(&self, sink: &mut ResponseSink, req: &Request<Bytes>) {
        if self.cookie_session(req).is_ok() {
            return;
        }

        let id = new_session_id();
        match self.set_cookie(&id) {
            Ok(cookie) => {
                sink.headers_mut().append(SET_COOKIE, cookie);
            }
            Err(err) => {
                sink.error(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error");
                sink.register_error(err);
                return;
            }
        }

        tracing::debug!(cookie = %self.config.cookie_name, "Session issued");
        self.sweep_expired();
        self.store.insert(id.clone(), Instant::now());
        sink.extensions_mut().insert(SessionId(id));
    }
}

fn new_session_id() -> String {
    let mut buf = [0u8; SESSION_ID_LEN];
    rand::rngs::OsRng.fill_bytes(&mut buf);
    URL_SAFE_NO_PAD.encode(buf)
}

fn cookie_value(req: &Request<Bytes>, name: &str) -> Option<String> {
    req.headers()
        .get_all(COOKIE)
        .iter()
        .filter_map(|h| h.to_str().ok())
        .flat_map(|h| h.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
}
