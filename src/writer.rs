//! The per-request writer handle.
//!
//! A [`ResponseWriter`] stages a status, headers and a body. The first write
//! *commits* it: the `handled` flag flips and from then on every write and
//! every header mutation is silently ignored. That is what keeps a
//! middleware, a handler and the dispatcher from ever producing two
//! responses, or half of one, for the same request.

use bytes::Bytes;
use http::header::{self, HeaderMap, HeaderName, HeaderValue};
use http::StatusCode;
use http_body_util::Full;
use tracing::warn;

#[derive(Debug)]
pub struct ResponseWriter {
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
    handled: bool,
}

impl ResponseWriter {
    pub(crate) fn new() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: Vec::new(),
            handled: false,
        }
    }

    /// `true` once something has been written.
    pub fn is_handled(&self) -> bool { self.handled }
    pub fn status(&self) -> StatusCode { self.status }
    pub fn headers(&self) -> &HeaderMap { &self.headers }
    pub fn body(&self) -> &[u8] { &self.body }

    /// Sets (replaces) a header. No-op once handled.
    pub fn set_header(&mut self, name: &str, value: &str) {
        if self.handled {
            return;
        }
        if let Some((name, value)) = header_pair(name, value) {
            self.headers.insert(name, value);
        }
    }

    /// Appends a header, keeping existing values (e.g. `set-cookie`).
    /// No-op once handled.
    pub fn append_header(&mut self, name: &str, value: &str) {
        if self.handled {
            return;
        }
        if let Some((name, value)) = header_pair(name, value) {
            self.headers.append(name, value);
        }
    }

    /// Commits `code`, `content_type` and `body`. Returns `false` (and writes
    /// nothing) when the writer was already handled.
    pub fn write(&mut self, code: u16, content_type: &str, body: impl Into<Vec<u8>>) -> bool {
        if self.handled {
            return false;
        }
        self.set_header(header::CONTENT_TYPE.as_str(), content_type);
        self.commit(code, body.into());
        true
    }

    /// Commits a status with no body and no content type (e.g. `204`,
    /// redirects). Returns `false` when already handled.
    pub fn write_status(&mut self, code: u16) -> bool {
        if self.handled {
            return false;
        }
        self.commit(code, Vec::new());
        true
    }

    fn commit(&mut self, code: u16, body: Vec<u8>) {
        self.status = StatusCode::from_u16(code).unwrap_or_else(|_| {
            warn!(code, "invalid status code written, sending 500");
            StatusCode::INTERNAL_SERVER_ERROR
        });
        self.body = body;
        self.handled = true;
    }

    /// Converts the staged state into a hyper-ready response. An unhandled
    /// writer becomes an empty `200` carrying whatever headers were staged.
    pub(crate) fn into_http(self) -> http::Response<Full<Bytes>> {
        let mut resp = http::Response::new(Full::new(Bytes::from(self.body)));
        *resp.status_mut() = self.status;
        *resp.headers_mut() = self.headers;
        resp
    }
}

fn header_pair(name: &str, value: &str) -> Option<(HeaderName, HeaderValue)> {
    match (HeaderName::from_bytes(name.as_bytes()), HeaderValue::from_str(value)) {
        (Ok(name), Ok(value)) => Some((name, value)),
        _ => {
            warn!(header = name, "dropping invalid response header");
            None
        }
    }
}
