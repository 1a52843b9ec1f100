//! Unified error types.
//!
//! Application-level outcomes (404, 403, 422, ...) are expressed as
//! [`Response`](crate::Response) envelopes, not as errors. [`Error`] covers
//! the failures that *escape* a handler or the server: infrastructure
//! problems, handler `Err` returns and captured panics. [`BindError`] is the
//! one error category handed back to handler code on purpose, because the
//! handler decides what the user gets to see.

use thiserror::Error;

/// The error type returned by keel's fallible operations.
///
/// When a handler returns `Err(e)`, the dispatcher converts it into a
/// `500` envelope whose `details` field carries `e.to_string()`.
#[derive(Debug, Error)]
pub enum Error {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid socket address `{0}`")]
    Addr(String),

    #[error(transparent)]
    Bind(#[from] BindError),

    #[error("{0}")]
    Handler(String),

    #[error("panic: {0}")]
    Panic(String),
}

impl Error {
    /// Free-form handler failure.
    ///
    /// ```rust
    /// use keel::{Context, Error, Response};
    ///
    /// fn lookup(ctx: &mut Context) -> Result<Response, Error> {
    ///     let id = ctx.param("id").ok_or_else(|| Error::msg("missing id"))?;
    ///     Ok(Response::ok(format!("user {id}")))
    /// }
    /// ```
    pub fn msg(message: impl Into<String>) -> Self {
        Self::Handler(message.into())
    }
}

/// Request-body and content-type decoding failures.
///
/// Returned by the `should_bind*` family as-is; the `bind*` family also
/// writes a `400` envelope before returning it.
#[derive(Debug, Error)]
pub enum BindError {
    #[error("missing Content-Type header")]
    MissingContentType,

    #[error("invalid Content-Type: {0}")]
    InvalidContentType(String),

    #[error("unsupported Content-Type: {0}")]
    UnsupportedContentType(String),

    #[error("expected Content-Type: {expected}")]
    UnexpectedContentType { expected: &'static str },

    #[error("invalid content type, expected application/x-www-form-urlencoded, got {0}")]
    NotForm(String),

    #[error("no form values found")]
    EmptyForm,

    #[error("invalid UTF-8 in request body: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid XML: {0}")]
    Xml(#[from] quick_xml::DeError),

    #[error("failed to parse form: {0}")]
    Form(#[from] serde_urlencoded::de::Error),
}
