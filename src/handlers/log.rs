//! Access logging handler.
//!
//! Renders one line per request from a format string and emits it as a
//! tracing event, followed by one event per error registered earlier in the
//! pipe. Usually registered last and marked mandatory so it also runs for
//! terminated pipes.
//!
//! Placeholders: `{remote}`, `{method}`, `{uri}`, `{path}`, `{status}`,
//! `{request_id}`, `{errors}`.

use std::fmt::Write;
use std::net::SocketAddr;

use async_trait::async_trait;
use axum::extract::ConnectInfo;
use axum::http::{Request, StatusCode};
use bytes::Bytes;

use crate::http::X_REQUEST_ID;
use crate::pipeline::{Handler, ResponseSink};

/// Tracing target of access log events.
pub const ACCESS_LOG_TARGET: &str = "pipemux::access";

/// Errors found while parsing a log format.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LogFormatError {
    #[error("unknown placeholder `{{{0}}}`")]
    UnknownPlaceholder(String),

    #[error("unclosed placeholder at byte {0}")]
    Unclosed(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Remote,
    Method,
    Uri,
    Path,
    Status,
    RequestId,
    Errors,
}

/// Handler writing an access log line per request.
#[derive(Debug, Clone)]
pub struct LogHandler {
    segments: Vec<Segment>,
}

impl LogHandler {
    /// Parse `format`. Fails on unknown or unclosed placeholders.
    pub fn new(format: &str) -> Result<Self, LogFormatError> {
        Ok(Self {
            segments: parse_format(format)?,
        })
    }

    /// Render the log line for the current state of the pipe.
    pub fn render(&self, sink: &ResponseSink, req: &Request<Bytes>) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Remote => match req.extensions().get::<ConnectInfo<SocketAddr>>() {
                    Some(ConnectInfo(addr)) => {
                        let _ = write!(out, "{}", addr);
                    }
                    None => out.push('-'),
                },
                Segment::Method => out.push_str(req.method().as_str()),
                Segment::Uri => {
                    let _ = write!(out, "{}", req.uri());
                }
                Segment::Path => out.push_str(req.uri().path()),
                Segment::Status => {
                    let status = sink.status().unwrap_or(StatusCode::OK);
                    let _ = write!(out, "{}", status.as_u16());
                }
                Segment::RequestId => out.push_str(
                    req.headers()
                        .get(X_REQUEST_ID)
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("-"),
                ),
                Segment::Errors => {
                    let joined = sink
                        .errors()
                        .iter()
                        .map(|e| e.to_string())
                        .collect::<Vec<_>>()
                        .join("; ");
                    out.push_str(&joined);
                }
            }
        }
        out
    }
}

#[async_trait]
impl Handler for LogHandler {
    async fn handle(&self, sink: &mut ResponseSink, req: &Request<Bytes>) {
        let line = self.render(sink, req);
        tracing::info!(target: ACCESS_LOG_TARGET, "{}", line);

        for err in sink.errors() {
            tracing::warn!(target: ACCESS_LOG_TARGET, error = %err, "Pipe error");
        }
    }
}

fn parse_format(format: &str) -> Result<Vec<Segment>, LogFormatError> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut rest = format;
    let mut offset = 0;

    while let Some(start) = rest.find('{') {
        literal.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let end = after
            .find('}')
            .ok_or(LogFormatError::Unclosed(offset + start))?;

        let segment = match &after[..end] {
            "remote" => Segment::Remote,
            "method" => Segment::Method,
            "uri" => Segment::Uri,
            "path" => Segment::Path,
            "status" => Segment::Status,
            "request_id" => Segment::RequestId,
            "errors" => Segment::Errors,
            other => return Err(LogFormatError::UnknownPlaceholder(other.to_string())),
        };
        if !literal.is_empty() {
            segments.push(Segment::Literal(std::mem::take(&mut literal)));
        }
        segments.push(segment);

        let consumed = start + 1 + end + 1;
        offset += consumed;
        rest = &rest[consumed..];
    }

    literal.push_str(rest);
    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }
    Ok(segments)
}
