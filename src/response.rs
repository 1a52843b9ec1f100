//! The response envelope and the conversions handlers return through.
//!
//! Every handler produces the same shape:
//!
//! ```json
//! {"success": true, "message": "created", "details": {"id": 42}, "code": 201}
//! ```
//!
//! `details` is opaque to keel. It is carried as a [`serde_json::Value`] and
//! omitted from the wire format when absent. `code` doubles as the HTTP
//! status of the reply.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::Error;

/// The canonical output of a handler.
///
/// ```rust
/// use keel::Response;
/// use serde_json::json;
///
/// let resp = Response::created("user created").with_details(json!({ "id": 42 }));
/// assert_eq!(resp.code, 201);
/// assert!(resp.success);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    pub code: u16,
}

impl Response {
    pub fn new(success: bool, message: impl Into<String>, code: u16) -> Self {
        Self { success, message: message.into(), details: None, code }
    }

    /// `200`, `success: true`.
    pub fn ok(message: impl Into<String>) -> Self {
        Self::new(true, message, 200)
    }

    /// `201`, `success: true`.
    pub fn created(message: impl Into<String>) -> Self {
        Self::new(true, message, 201)
    }

    /// `success: false` with the given status.
    pub fn error(code: u16, message: impl Into<String>) -> Self {
        Self::new(false, message, code)
    }

    /// The envelope sent when no route matches.
    pub fn not_found() -> Self {
        Self::error(404, "Not Found")
    }

    pub fn internal_error(details: impl Into<serde_json::Value>) -> Self {
        Self::error(500, "Internal Server Error").with_details(details)
    }

    pub fn with_details(mut self, details: impl Into<serde_json::Value>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Serializes `details` from any `Serialize` value. A value that fails to
    /// serialize is dropped with a warning rather than failing the request.
    pub fn with_serialized_details<T: Serialize>(mut self, details: &T) -> Self {
        match serde_json::to_value(details) {
            Ok(value) => self.details = Some(value),
            Err(e) => warn!("dropping unserializable response details: {e}"),
        }
        self
    }
}

// ── Outcome ───────────────────────────────────────────────────────────────────

/// What every handler and middleware hands back up the chain.
///
/// - `Ok(Some(resp))`: serialize `resp` as the JSON envelope.
/// - `Ok(None)`: the output was already written through the context.
/// - `Err(e)`: converted into a `500` envelope by the dispatcher.
pub type Outcome = Result<Option<Response>, Error>;

/// Conversion into an [`Outcome`].
///
/// Implemented for [`Response`], `Option<Response>` and any
/// `Result<T, E>` where `T: IntoOutcome` and `E: Into<Error>`, so handlers
/// can return whichever is most natural and use `?` freely.
pub trait IntoOutcome {
    fn into_outcome(self) -> Outcome;
}

impl IntoOutcome for Response {
    fn into_outcome(self) -> Outcome { Ok(Some(self)) }
}

impl IntoOutcome for Option<Response> {
    fn into_outcome(self) -> Outcome { Ok(self) }
}

impl<T, E> IntoOutcome for Result<T, E>
where
    T: IntoOutcome,
    E: Into<Error>,
{
    fn into_outcome(self) -> Outcome {
        match self {
            Ok(value) => value.into_outcome(),
            Err(e) => Err(e.into()),
        }
    }
}
