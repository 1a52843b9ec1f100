//! Request-body binding and query helpers.
//!
//! Two families:
//!
//! - `should_bind*` decode and hand back a [`BindError`]; the handler decides
//!   what to reply.
//! - `bind*` do the same but also write a `400` envelope on failure, so the
//!   handler can just `?` out:
//!
//! ```rust
//! use keel::{Context, Error, Response};
//! use serde::Deserialize;
//!
//! #[derive(Deserialize)]
//! struct NewUser { name: String }
//!
//! fn create_user(ctx: &mut Context) -> Result<Response, Error> {
//!     let user: NewUser = ctx.bind_json()?;
//!     Ok(Response::created(format!("created {}", user.name)))
//! }
//! ```
//!
//! When `bind_json` fails above, the `400` is already written and the `Err`
//! only lets the dispatcher log it; the context being handled keeps the
//! generic `500` from going out.
//!
//! Struct decoding goes through serde derive. Multipart bodies are not
//! decoded.

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::context::Context;
use crate::error::BindError;

const FORM: &str = "application/x-www-form-urlencoded";

impl Context {
    // ── Silent variants ──────────────────────────────────────────────────────

    /// Decodes the body according to its `Content-Type`: JSON, XML or
    /// urlencoded form.
    pub fn should_bind<T: DeserializeOwned>(&self) -> Result<T, BindError> {
        let media_type = self.media_type()?;
        match media_type.as_str() {
            "application/json" => self.decode_json(),
            "application/xml" | "text/xml" => self.decode_xml(),
            FORM => self.should_bind_form(),
            _ => Err(BindError::UnsupportedContentType(media_type)),
        }
    }

    /// Decodes a JSON body. Requires `Content-Type: application/json`.
    pub fn should_bind_json<T: DeserializeOwned>(&self) -> Result<T, BindError> {
        if self.media_type().ok().as_deref() != Some("application/json") {
            return Err(BindError::UnexpectedContentType { expected: "application/json" });
        }
        self.decode_json()
    }

    /// Decodes an XML body. Requires `application/xml` or `text/xml`.
    pub fn should_bind_xml<T: DeserializeOwned>(&self) -> Result<T, BindError> {
        match self.media_type().ok().as_deref() {
            Some("application/xml" | "text/xml") => self.decode_xml(),
            _ => Err(BindError::UnexpectedContentType { expected: "application/xml" }),
        }
    }

    /// Decodes an urlencoded form body into `T`. An empty form is an error.
    pub fn should_bind_form<T: DeserializeOwned>(&self) -> Result<T, BindError> {
        let body = self.request().body();
        let pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(body)?;
        if pairs.is_empty() {
            return Err(BindError::EmptyForm);
        }
        Ok(serde_urlencoded::from_bytes(body)?)
    }

    // ── Auto-responding variants ─────────────────────────────────────────────

    /// [`should_bind`](Self::should_bind), writing `400 Invalid request body` on failure.
    pub fn bind<T: DeserializeOwned>(&mut self) -> Result<T, BindError> {
        let result = self.should_bind();
        self.reject_on_error(result, "Invalid request body")
    }

    /// [`should_bind_json`](Self::should_bind_json), writing `400 Invalid JSON body` on failure.
    pub fn bind_json<T: DeserializeOwned>(&mut self) -> Result<T, BindError> {
        let result = self.should_bind_json();
        self.reject_on_error(result, "Invalid JSON body")
    }

    /// [`should_bind_xml`](Self::should_bind_xml), writing `400 Invalid XML body` on failure.
    pub fn bind_xml<T: DeserializeOwned>(&mut self) -> Result<T, BindError> {
        let result = self.should_bind_xml();
        self.reject_on_error(result, "Invalid XML body")
    }

    // ── Forms and query ──────────────────────────────────────────────────────

    /// Form fields, first value per key. Requires an urlencoded content type
    /// (parameters such as `charset` are allowed).
    pub fn bind_form(&self) -> Result<HashMap<String, String>, BindError> {
        let mut fields = HashMap::new();
        for (key, value) in self.form_pairs()? {
            fields.entry(key).or_insert(value);
        }
        Ok(fields)
    }

    /// Form fields, every value per key in arrival order.
    pub fn bind_form_all(&self) -> Result<HashMap<String, Vec<String>>, BindError> {
        let mut fields: HashMap<String, Vec<String>> = HashMap::new();
        for (key, value) in self.form_pairs()? {
            fields.entry(key).or_default().push(value);
        }
        Ok(fields)
    }

    /// First value of a query parameter: `/search?q=rust` → `query("q") == Some("rust")`.
    pub fn query(&self, key: &str) -> Option<String> {
        self.query_pairs().into_iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Every value of a query parameter: `/filter?tag=go&tag=web` → `["go", "web"]`.
    pub fn query_array(&self, key: &str) -> Vec<String> {
        self.query_pairs()
            .into_iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v)
            .collect()
    }

    /// A form field from the body if the body is a form, else from the query.
    pub fn form_value(&self, name: &str) -> Option<String> {
        self.form_pairs()
            .ok()
            .and_then(|pairs| pairs.into_iter().find(|(k, _)| k == name).map(|(_, v)| v))
            .or_else(|| self.query(name))
    }

    // ── Internals ────────────────────────────────────────────────────────────

    /// Lowercased media type of `Content-Type`, parameters stripped.
    fn media_type(&self) -> Result<String, BindError> {
        let raw = self.header("content-type").ok_or(BindError::MissingContentType)?;
        let media_type = raw.split(';').next().unwrap_or_default().trim().to_ascii_lowercase();
        if media_type.is_empty() || !media_type.contains('/') {
            return Err(BindError::InvalidContentType(raw.to_owned()));
        }
        Ok(media_type)
    }

    fn decode_json<T: DeserializeOwned>(&self) -> Result<T, BindError> {
        Ok(serde_json::from_slice(self.request().body())?)
    }

    fn decode_xml<T: DeserializeOwned>(&self) -> Result<T, BindError> {
        let body = std::str::from_utf8(self.request().body())?;
        Ok(quick_xml::de::from_str(body)?)
    }

    fn form_pairs(&self) -> Result<Vec<(String, String)>, BindError> {
        let media_type = self.media_type()?;
        if media_type != FORM {
            return Err(BindError::NotForm(media_type));
        }
        Ok(serde_urlencoded::from_bytes(self.request().body())?)
    }

    fn query_pairs(&self) -> Vec<(String, String)> {
        self.request()
            .query()
            .and_then(|q| serde_urlencoded::from_str(q).ok())
            .unwrap_or_default()
    }

    fn reject_on_error<T>(&mut self, result: Result<T, BindError>, message: &str) -> Result<T, BindError> {
        if let Err(e) = &result {
            self.error_json(message, Some(Value::String(e.to_string())), 400);
        }
        result
    }
}
