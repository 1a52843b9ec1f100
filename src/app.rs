//! The application: route table, middleware registrations and dispatch.
//!
//! Registration is done by value, builder style, and finished before
//! serving. [`Server::serve`](crate::Server::serve) then freezes the `App`
//! behind an `Arc`; from that point it is read-only and shared by every
//! request.
//!
//! Global middleware is composed into a route's handler **when the route is
//! registered**. A `middleware(...)` call therefore only affects routes added
//! after it. Conditional middleware is matched on each request.

use tracing::{debug, error};

use crate::context::Context;
use crate::group::Group;
use crate::handler::{BoxedHandler, Handler};
use crate::method::Method;
use crate::middleware::{ConditionalMiddleware, Middleware, chain};
use crate::request::Request;
use crate::response::Response;
use crate::router::Router;
use crate::writer::ResponseWriter;

/// Routes plus middleware.
///
/// ```rust
/// use keel::{App, Context, Method, Request, Response};
/// use keel::middleware::{logger, recovery};
///
/// fn get_user(ctx: &mut Context) -> Response {
///     Response::ok(format!("user {}", ctx.param("id").unwrap_or_default()))
/// }
///
/// let app = App::new()
///     .middleware(recovery())
///     .middleware(logger())
///     .get("/users/:id", get_user);
///
/// let w = app.call(Request::new(Method::Get, "/users/42"));
/// assert_eq!(w.status().as_u16(), 200);
/// ```
#[derive(Default)]
pub struct App {
    router: Router,
    middlewares: Vec<Middleware>,
    conditional: Vec<ConditionalMiddleware>,
}

impl App {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds global middleware. Applies to routes registered afterwards.
    pub fn middleware(mut self, mw: Middleware) -> Self {
        self.middlewares.push(mw);
        self
    }

    /// Adds middleware that runs only when the request path starts with
    /// `pattern` (a trailing `*` is ignored). See [`ConditionalMiddleware`].
    pub fn middleware_if(mut self, pattern: impl Into<String>, mw: Middleware) -> Self {
        self.conditional.push(ConditionalMiddleware::new(pattern, mw));
        self
    }

    /// Registers `handler` for `method` and `path`, wrapped in the global
    /// middleware registered so far.
    pub fn on(mut self, method: Method, path: &str, handler: impl Handler) -> Self {
        self.register(method, path, handler.into_boxed_handler(), &[]);
        self
    }

    pub fn get(self, path: &str, handler: impl Handler) -> Self { self.on(Method::Get, path, handler) }
    pub fn post(self, path: &str, handler: impl Handler) -> Self { self.on(Method::Post, path, handler) }
    pub fn put(self, path: &str, handler: impl Handler) -> Self { self.on(Method::Put, path, handler) }
    pub fn patch(self, path: &str, handler: impl Handler) -> Self { self.on(Method::Patch, path, handler) }
    pub fn delete(self, path: &str, handler: impl Handler) -> Self { self.on(Method::Delete, path, handler) }
    pub fn options(self, path: &str, handler: impl Handler) -> Self { self.on(Method::Options, path, handler) }

    /// Registers a set of routes under a shared path prefix.
    ///
    /// ```rust
    /// use keel::{App, Context, Response};
    /// use keel::middleware::Middleware;
    ///
    /// let auth = Middleware::from_fn(|ctx, next| {
    ///     if ctx.header("authorization").is_none() {
    ///         return Ok(Some(Response::error(401, "Unauthorized")));
    ///     }
    ///     next.call(ctx)
    /// });
    ///
    /// let app = App::new().group("/api/v1", |g| {
    ///     g.middleware(auth);
    ///     g.get("/users", |_: &mut Context| Response::ok("users"));
    /// });
    /// ```
    pub fn group(mut self, prefix: &str, build: impl FnOnce(&mut Group<'_>)) -> Self {
        let mut group = Group::new(prefix, &mut self);
        build(&mut group);
        self
    }

    /// Composes `handler` with the global middleware, then `extra` inside it,
    /// and stores the result.
    pub(crate) fn register(
        &mut self,
        method: Method,
        path: &str,
        handler: BoxedHandler,
        extra: &[Middleware],
    ) {
        let layers: Vec<&Middleware> = self.middlewares.iter().chain(extra).collect();
        debug!(%method, path, layers = layers.len(), "route registered");
        let composed = chain(handler, layers);
        self.router.handle(method, path, composed);
    }

    /// Runs one request through routing and the middleware chain and returns
    /// what was written.
    ///
    /// Synchronous: the server calls it on the blocking pool, tests call it
    /// directly.
    pub fn call(&self, request: Request) -> ResponseWriter {
        let mut ctx = Context::new(request);
        self.dispatch(&mut ctx);
        ctx.into_writer()
    }

    fn dispatch(&self, ctx: &mut Context) {
        let Some((handler, params)) = self.router.find(ctx.method(), ctx.path()) else {
            debug!(method = %ctx.method(), path = ctx.path(), "no route");
            ctx.write_envelope(&Response::not_found());
            return;
        };
        ctx.set_params(params);

        let conditional: Vec<&Middleware> = self
            .conditional
            .iter()
            .filter(|c| c.matches(ctx.path()))
            .map(|c| &c.middleware)
            .collect();
        let handler = chain(handler, conditional);

        match handler.call(ctx) {
            Ok(Some(resp)) => ctx.write_envelope(&resp),
            Ok(None) => {}
            Err(e) => {
                error!(method = %ctx.method(), path = ctx.path(), "handler error: {e}");
                ctx.write_envelope(&Response::internal_error(e.to_string()));
            }
        }
    }
}
