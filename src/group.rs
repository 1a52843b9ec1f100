use crate::app::App;
use crate::handler::Handler;
use crate::method::Method;
use crate::middleware::Middleware;

/// Routes sharing a path prefix and a middleware list.
///
/// Obtained through [`App::group`]. A route registered here is wrapped, from
/// the outside in, by the app's global middleware, then the group's
/// middleware in registration order, then the handler:
///
/// ```text
/// global[0] → … → global[n] → group[0] → … → group[m] → handler
/// ```
///
/// As with the app, [`middleware`](Group::middleware) only affects routes
/// registered after the call.
pub struct Group<'a> {
    prefix: String,
    app: &'a mut App,
    middlewares: Vec<Middleware>,
}

impl<'a> Group<'a> {
    pub(crate) fn new(prefix: &str, app: &'a mut App) -> Self {
        Self { prefix: prefix.to_owned(), app, middlewares: Vec::new() }
    }

    pub fn middleware(&mut self, mw: Middleware) -> &mut Self {
        self.middlewares.push(mw);
        self
    }

    /// Registers `prefix + path`.
    pub fn on(&mut self, method: Method, path: &str, handler: impl Handler) -> &mut Self {
        let full = format!("{}{}", self.prefix, path);
        self.app.register(method, &full, handler.into_boxed_handler(), &self.middlewares);
        self
    }

    pub fn get(&mut self, path: &str, handler: impl Handler) -> &mut Self { self.on(Method::Get, path, handler) }
    pub fn post(&mut self, path: &str, handler: impl Handler) -> &mut Self { self.on(Method::Post, path, handler) }
    pub fn put(&mut self, path: &str, handler: impl Handler) -> &mut Self { self.on(Method::Put, path, handler) }
    pub fn patch(&mut self, path: &str, handler: impl Handler) -> &mut Self { self.on(Method::Patch, path, handler) }
    pub fn delete(&mut self, path: &str, handler: impl Handler) -> &mut Self { self.on(Method::Delete, path, handler) }
    pub fn options(&mut self, path: &str, handler: impl Handler) -> &mut Self { self.on(Method::Options, path, handler) }

    pub fn prefix(&self) -> &str { &self.prefix }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::context::Context;
    use crate::request::Request;
    use crate::response::Response;

    type Log = Arc<Mutex<Vec<String>>>;

    fn tracer(name: &'static str, log: Log) -> Middleware {
        Middleware::from_fn(move |ctx, next| {
            log.lock().unwrap().push(format!("{name}>"));
            let out = next.call(ctx);
            log.lock().unwrap().push(format!("<{name}"));
            out
        })
    }

    fn ok(_: &mut Context) -> Response {
        Response::ok("ok")
    }

    #[test]
    fn prefix_is_prepended() {
        let app = App::new().group("/api/v1", |g| {
            assert_eq!(g.prefix(), "/api/v1");
            g.get("/users/:id", |ctx: &mut Context| {
                Response::ok(ctx.param("id").unwrap_or_default().to_owned())
            });
        });

        let w = app.call(Request::new(Method::Get, "/api/v1/users/7"));
        assert_eq!(w.status().as_u16(), 200);
        assert_eq!(w.body(), br#"{"success":true,"message":"7","code":200}"#);
        assert_eq!(app.call(Request::new(Method::Get, "/users/7")).status().as_u16(), 404);
    }

    #[test]
    fn global_wraps_group_wraps_handler() {
        let log: Log = Arc::default();
        let inner = Arc::clone(&log);

        let app = App::new()
            .middleware(tracer("a", Arc::clone(&log)))
            .middleware(tracer("b", Arc::clone(&log)))
            .group("/g", |g| {
                g.middleware(tracer("c", Arc::clone(&log)));
                g.get("/x", move |_: &mut Context| {
                    inner.lock().unwrap().push("handler".to_owned());
                    Response::ok("x")
                });
            });

        app.call(Request::new(Method::Get, "/g/x"));
        assert_eq!(*log.lock().unwrap(), ["a>", "b>", "c>", "handler", "<c", "<b", "<a"]);
    }

    #[test]
    fn group_middleware_affects_later_routes_only() {
        let log: Log = Arc::default();
        let app = App::new().group("/g", |g| {
            g.get("/early", ok);
            g.middleware(tracer("late", Arc::clone(&log)));
            g.get("/later", ok);
        });

        app.call(Request::new(Method::Get, "/g/early"));
        assert!(log.lock().unwrap().is_empty());

        app.call(Request::new(Method::Get, "/g/later"));
        assert_eq!(*log.lock().unwrap(), ["late>", "<late"]);
    }

    #[test]
    fn group_middleware_does_not_leak_to_app_routes() {
        let log: Log = Arc::default();
        let app = App::new()
            .group("/g", |g| {
                g.middleware(tracer("g", Arc::clone(&log)));
                g.post("/x", ok);
            })
            .get("/outside", ok);

        app.call(Request::new(Method::Get, "/outside"));
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn verbs_register_their_method() {
        let app = App::new().group("/r", |g| {
            g.get("", ok).post("", ok).put("", ok).patch("", ok).delete("", ok).options("", ok);
        });
        for method in [
            Method::Get,
            Method::Post,
            Method::Put,
            Method::Patch,
            Method::Delete,
            Method::Options,
        ] {
            assert_eq!(app.call(Request::new(method, "/r")).status().as_u16(), 200);
        }
        assert_eq!(app.call(Request::new(Method::Head, "/r")).status().as_u16(), 404);
    }
}
