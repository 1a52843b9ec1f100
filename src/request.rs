//! Incoming HTTP request type.

use bytes::Bytes;
use http::header::{HeaderMap, HeaderName, HeaderValue};
use tracing::{debug, warn};

use crate::method::Method;

/// An incoming HTTP request with its body fully read.
///
/// Built by the server from a hyper request, or directly with
/// [`Request::new`] when driving an [`App`](crate::App) in-process:
///
/// ```rust
/// use keel::{Method, Request};
///
/// let req = Request::new(Method::Post, "/users?notify=1")
///     .with_header("content-type", "application/json")
///     .with_body(r#"{"name":"alice"}"#);
///
/// assert_eq!(req.path(), "/users");
/// assert_eq!(req.query(), Some("notify=1"));
/// ```
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    path: String,
    query: Option<String>,
    headers: HeaderMap,
    body: Bytes,
}

impl Request {
    /// `target` is the request target: a path, optionally followed by `?query`.
    /// The path is percent-decoded; the query is kept as sent.
    pub fn new(method: Method, target: &str) -> Self {
        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (decode_path(path), Some(query.to_owned())),
            None => (decode_path(target), None),
        };
        Self { method, path, query, headers: HeaderMap::new(), body: Bytes::new() }
    }

    pub(crate) fn from_parts(
        method: Method,
        uri: &http::Uri,
        headers: HeaderMap,
        body: Bytes,
    ) -> Self {
        Self {
            method,
            path: decode_path(uri.path()),
            query: uri.query().map(str::to_owned),
            headers,
            body,
        }
    }

    /// Appends a header. Names or values that are not valid HTTP are dropped
    /// with a warning.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        match (HeaderName::from_bytes(name.as_bytes()), HeaderValue::from_str(value)) {
            (Ok(name), Ok(value)) => {
                self.headers.append(name, value);
            }
            _ => warn!(header = name, "dropping invalid request header"),
        }
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn method(&self) -> Method { self.method }
    pub fn path(&self) -> &str { &self.path }
    pub fn query(&self) -> Option<&str> { self.query.as_deref() }
    pub fn headers(&self) -> &HeaderMap { &self.headers }
    pub fn body(&self) -> &[u8] { &self.body }

    /// Case-insensitive header lookup. Returns `None` for values that are not
    /// visible ASCII.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Value of the named cookie from the `Cookie` header(s).
    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.headers
            .get_all(http::header::COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|line| line.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v.trim_matches('"'))
    }
}

/// Percent-decodes a request path. A path that does not decode to UTF-8 is
/// kept as sent.
fn decode_path(raw: &str) -> String {
    match urlencoding::decode(raw) {
        Ok(path) => path.into_owned(),
        Err(e) => {
            debug!(path = raw, "path is not UTF-8 after decoding, keeping it encoded: {e}");
            raw.to_owned()
        }
    }
}
