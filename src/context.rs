//! Per-request context and the raw-write helpers.
//!
//! A [`Context`] is created for one request, handed by `&mut` down the
//! middleware chain to the handler, and dropped once the reply is produced.
//! It is never shared between requests.
//!
//! The write helpers (`text`, `html`, `json`, ...) go straight through the
//! [`ResponseWriter`] and mark the request handled. They also return a
//! [`Response`] describing what was written, so a handler can simply
//! `return ctx.html(200, page)`: the dispatcher sees the context is handled
//! and does not serialize the envelope on top.

use std::collections::HashMap;
use std::path::Path;

use http::{StatusCode, header};
use tracing::{error, warn};

use crate::method::Method;
use crate::request::Request;
use crate::response::Response;
use crate::writer::ResponseWriter;

/// Path parameters bound by the router, e.g. `{"id": "42"}` for
/// `/users/:id` matched against `/users/42`.
pub type Params = HashMap<String, String>;

pub struct Context {
    request: Request,
    params: Params,
    locals: HashMap<String, String>,
    writer: ResponseWriter,
}

impl Context {
    pub fn new(request: Request) -> Self {
        Self {
            request,
            params: Params::new(),
            locals: HashMap::new(),
            writer: ResponseWriter::new(),
        }
    }

    pub(crate) fn set_params(&mut self, params: Params) {
        self.params = params;
    }

    pub fn request(&self) -> &Request { &self.request }
    pub fn method(&self) -> Method { self.request.method() }
    pub fn path(&self) -> &str { self.request.path() }
    pub fn header(&self, name: &str) -> Option<&str> { self.request.header(name) }
    pub fn cookie(&self, name: &str) -> Option<&str> { self.request.cookie(name) }
    pub fn params(&self) -> &Params { &self.params }

    /// Returns a named path parameter.
    ///
    /// For a route `/users/:id`, `ctx.param("id")` on `/users/42` returns `Some("42")`.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// Request-scoped value set by an earlier middleware (e.g. the CSRF token).
    pub fn local(&self, key: &str) -> Option<&str> {
        self.locals.get(key).map(String::as_str)
    }

    pub fn set_local(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.locals.insert(key.into(), value.into());
    }

    pub fn writer(&self) -> &ResponseWriter { &self.writer }
    pub fn writer_mut(&mut self) -> &mut ResponseWriter { &mut self.writer }

    /// `true` once a response has been written for this request.
    pub fn is_handled(&self) -> bool { self.writer.is_handled() }

    pub(crate) fn into_writer(self) -> ResponseWriter { self.writer }

    // ── Raw-write helpers ────────────────────────────────────────────────────

    /// Writes `text/plain`. The returned envelope carries the text as message.
    pub fn text(&mut self, code: u16, body: impl Into<String>) -> Response {
        let body = body.into();
        self.writer.write(code, "text/plain; charset=utf-8", body.as_bytes());
        Response::new(true, body, code)
    }

    /// Writes `text/html`.
    pub fn html(&mut self, code: u16, html: impl Into<String>) -> Response {
        self.writer.write(code, "text/html; charset=utf-8", html.into());
        Response::new(true, "HTML written", code)
    }

    /// Writes raw bytes with the given content type.
    pub fn blob(&mut self, code: u16, content_type: &str, data: impl Into<Vec<u8>>) -> Response {
        self.writer.write(code, content_type, data);
        Response::new(true, "Blob written", code)
    }

    /// Writes the JSON envelope immediately and returns it.
    pub fn json(
        &mut self,
        success: bool,
        message: impl Into<String>,
        details: Option<serde_json::Value>,
        code: u16,
    ) -> Response {
        let resp = Response { success, message: message.into(), details, code };
        self.write_envelope(&resp);
        resp
    }

    /// [`json`](Self::json) with `success: false`.
    pub fn error_json(
        &mut self,
        message: impl Into<String>,
        details: Option<serde_json::Value>,
        code: u16,
    ) -> Response {
        self.json(false, message, details, code)
    }

    /// Sends a redirect with a `Location` header and no body.
    pub fn redirect(&mut self, code: u16, location: &str) -> Response {
        if self.is_handled() {
            return Response::error(code, "Response already handled");
        }
        self.writer.set_header(header::LOCATION.as_str(), location);
        self.writer.write_status(code);
        Response::new(true, format!("Redirected to {location}"), code)
    }

    /// Serves a file from disk, content type chosen by extension.
    ///
    /// When the file cannot be read nothing is written and a `404` envelope is
    /// returned, which the dispatcher then serializes.
    pub fn file(&mut self, path: impl AsRef<Path>) -> Response {
        let path = path.as_ref();
        if self.is_handled() {
            return Response::error(500, "Response already handled");
        }
        let data = match std::fs::read(path) {
            Ok(data) => data,
            Err(_) => return Response::error(404, "File not found"),
        };
        self.writer.write(200, content_type_for(path), data);
        Response::ok(format!("Served file: {}", path.display()))
    }

    /// Serializes `resp` into the writer as `application/json`, unless handled.
    ///
    /// `code` always matches the status sent: an envelope whose code is not a
    /// valid HTTP status goes out as a `500` failure with the same message and
    /// details.
    pub(crate) fn write_envelope(&mut self, resp: &Response) {
        if self.is_handled() {
            return;
        }
        let rewritten;
        let resp = if StatusCode::from_u16(resp.code).is_ok() {
            resp
        } else {
            warn!(code = resp.code, "envelope code is not an HTTP status, sending 500");
            rewritten = Response { success: false, code: 500, ..resp.clone() };
            &rewritten
        };
        match serde_json::to_vec(resp) {
            Ok(body) => {
                self.writer.write(resp.code, "application/json", body);
            }
            Err(e) => {
                error!("failed to serialize response envelope: {e}");
                self.writer.write_status(500);
            }
        }
    }
}

fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    match ext.as_str() {
        "html" | "htm" => "text/html; charset=utf-8",
        "css"          => "text/css",
        "js"           => "application/javascript",
        "json"         => "application/json",
        "txt"          => "text/plain; charset=utf-8",
        "xml"          => "application/xml",
        "svg"          => "image/svg+xml",
        "png"          => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif"          => "image/gif",
        "pdf"          => "application/pdf",
        _              => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> Context {
        Context::new(Request::new(Method::Get, "/"))
    }

    #[test]
    fn text_writes_and_describes() {
        let mut c = ctx();
        let resp = c.text(200, "hello");
        assert_eq!(resp.message, "hello");
        assert!(c.is_handled());
        assert_eq!(c.writer().body(), b"hello");
    }

    #[test]
    fn second_helper_leaves_first_output_intact() {
        let mut c = ctx();
        c.html(200, "<p>first</p>");
        c.json(false, "second", None, 500);
        c.blob(202, "image/png", vec![1, 2, 3]);

        let w = c.writer();
        assert_eq!(w.status().as_u16(), 200);
        assert_eq!(w.body(), b"<p>first</p>");
        assert_eq!(w.headers()["content-type"], "text/html; charset=utf-8");
    }

    #[test]
    fn json_writes_envelope() {
        let mut c = ctx();
        c.error_json("nope", Some(serde_json::json!("why")), 418);
        let body: serde_json::Value = serde_json::from_slice(c.writer().body()).unwrap();
        assert_eq!(body["message"], "nope");
        assert_eq!(body["details"], "why");
        assert_eq!(body["code"], 418);
        assert_eq!(c.writer().status().as_u16(), 418);
    }

    #[test]
    fn invalid_envelope_code_is_sent_as_500() {
        let mut c = ctx();
        c.write_envelope(&Response::error(1000, "odd").with_details("extra"));

        assert_eq!(c.writer().status().as_u16(), 500);
        let body: serde_json::Value = serde_json::from_slice(c.writer().body()).unwrap();
        assert_eq!(
            body,
            serde_json::json!({ "success": false, "message": "odd", "details": "extra", "code": 500 })
        );
    }

    #[test]
    fn redirect_sets_location() {
        let mut c = ctx();
        let resp = c.redirect(302, "/login");
        assert!(resp.success);
        assert_eq!(c.writer().headers()["location"], "/login");
        assert_eq!(c.writer().status().as_u16(), 302);

        let again = c.redirect(301, "/elsewhere");
        assert!(!again.success);
        assert_eq!(again.message, "Response already handled");
        assert_eq!(c.writer().headers()["location"], "/login");
    }

    #[test]
    fn missing_file_is_404_envelope_without_write() {
        let mut c = ctx();
        let resp = c.file("/definitely/not/here.txt");
        assert_eq!(resp.code, 404);
        assert!(!c.is_handled());
    }

    #[test]
    fn content_types_by_extension() {
        assert_eq!(content_type_for(Path::new("a/index.HTML")), "text/html; charset=utf-8");
        assert_eq!(content_type_for(Path::new("logo.png")), "image/png");
        assert_eq!(content_type_for(Path::new("blob")), "application/octet-stream");
    }

    #[test]
    fn locals_are_separate_from_params() {
        let mut c = ctx();
        c.set_local("csrf_token", "t");
        assert_eq!(c.local("csrf_token"), Some("t"));
        assert_eq!(c.param("csrf_token"), None);
    }
}
