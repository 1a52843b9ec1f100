//! Middleware and how layers compose.
//!
//! A [`Middleware`] turns a handler into another handler. It can run code
//! before and after the layer it wraps, return its own response without
//! calling through (short-circuit), or write raw output through the context
//! and return `Ok(None)`.
//!
//! # Ordering
//!
//! Layers are folded so that the **first registered** layer is the
//! **outermost** one. For a route registered through a group with global
//! middleware `[A, B]` and group middleware `[C]`:
//!
//! ```text
//! request  → A → B → C → handler
//! response ← A ← B ← C ← handler
//! ```
//!
//! Conditional middleware (`App::middleware_if`) is applied per request,
//! outside the route's own chain, and follows the same rule among itself.
//!
//! # Built-in middleware
//!
//! - [`logger`]: one `tracing` event per request
//! - [`recovery`]: handler panics become a `500` when nothing was written yet
//! - [`profiling`]: latency plus process memory, at `debug`
//! - [`cors`] / [`cors_with_config`]: CORS headers and preflight replies
//! - [`csrf`] / [`csrf_with_config`]: signed double-submit CSRF tokens

use std::fmt;
use std::sync::Arc;

use crate::context::Context;
use crate::handler::{BoxedHandler, Handler};
use crate::response::Outcome;

mod cors;
mod csrf;
mod logger;
mod profiling;
mod recovery;

pub use cors::{CorsConfig, cors, cors_with_config};
pub use csrf::{CsrfConfig, CsrfErrorHandler, csrf, csrf_with_config, sign_token};
pub use logger::logger;
pub use profiling::profiling;
pub use recovery::recovery;

/// A handler-to-handler transformation.
///
/// Stateless with respect to any single request: the same instance serves
/// every concurrent request, so per-request data belongs in the
/// [`Context`], not in the closure.
#[derive(Clone)]
pub struct Middleware(Arc<dyn Fn(BoxedHandler) -> BoxedHandler + Send + Sync + 'static>);

impl Middleware {
    /// The general form: receive `next`, return the wrapping handler.
    pub fn new<F>(wrap: F) -> Self
    where
        F: Fn(BoxedHandler) -> BoxedHandler + Send + Sync + 'static,
    {
        Self(Arc::new(wrap))
    }

    /// The common "around" form.
    ///
    /// ```rust
    /// use keel::middleware::Middleware;
    ///
    /// let stamp = Middleware::from_fn(|ctx, next| {
    ///     ctx.writer_mut().set_header("x-served-by", "keel");
    ///     next.call(ctx)
    /// });
    /// ```
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(&mut Context, &BoxedHandler) -> Outcome + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        Self::new(move |next: BoxedHandler| {
            let f = Arc::clone(&f);
            (move |ctx: &mut Context| f(ctx, &next)).into_boxed_handler()
        })
    }

    /// Wraps `next` in this layer.
    pub fn wrap(&self, next: BoxedHandler) -> BoxedHandler {
        (self.0)(next)
    }
}

impl fmt::Debug for Middleware {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Middleware")
    }
}

/// Middleware gated on a path prefix.
///
/// The pattern is a path prefix optionally ending in `*`; the `*` is
/// stripped and the rest compared with `str::starts_with`. `"/api/*"`
/// therefore matches `/api/v1/x` but not `/api`, and `"/api"` matches
/// `/api`, `/api/x` and also `/apikeys`.
#[derive(Clone, Debug)]
pub struct ConditionalMiddleware {
    pub pattern: String,
    pub middleware: Middleware,
}

impl ConditionalMiddleware {
    pub fn new(pattern: impl Into<String>, middleware: Middleware) -> Self {
        Self { pattern: pattern.into(), middleware }
    }

    pub fn matches(&self, path: &str) -> bool {
        let prefix = self.pattern.strip_suffix('*').unwrap_or(&self.pattern);
        path.starts_with(prefix)
    }
}

/// Wraps `handler` in `layers`, `layers[0]` outermost.
pub fn chain<'a, I>(handler: BoxedHandler, layers: I) -> BoxedHandler
where
    I: IntoIterator<Item = &'a Middleware>,
    I::IntoIter: DoubleEndedIterator,
{
    layers.into_iter().rev().fold(handler, |next, mw| mw.wrap(next))
}
