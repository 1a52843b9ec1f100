//! Segment-exact request router.
//!
//! Routes live in one `Vec`, scanned in registration order. No radix tree, no
//! wildcards, no regex: a pattern is split on `/` and compared to the path
//! segment by segment. A `:name` segment matches any single segment and binds
//! it; every other segment must be byte-equal. Both sides must have the same
//! number of segments, so `/users/:id` never matches `/users/42/extra` and a
//! trailing slash is a segment of its own.
//!
//! Overlapping patterns are allowed. The first registered route wins.

use crate::context::Params;
use crate::handler::BoxedHandler;
use crate::method::Method;

struct Route {
    method: Method,
    pattern: String,
    handler: BoxedHandler,
}

/// The route table. Built once during registration, read-only while serving.
#[derive(Default)]
pub struct Router {
    routes: Vec<Route>,
}

impl Router {
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    /// Appends a route. No validation: duplicates are accepted and simply
    /// shadowed by the earlier registration.
    pub fn handle(&mut self, method: Method, pattern: impl Into<String>, handler: BoxedHandler) {
        self.routes.push(Route { method, pattern: pattern.into(), handler });
    }

    /// Finds the first route matching `method` and `path`.
    ///
    /// `None` means not found. A match on a pattern without parameters yields
    /// `Some` with an empty map, which is a different thing.
    pub fn find(&self, method: Method, path: &str) -> Option<(BoxedHandler, Params)> {
        self.routes
            .iter()
            .filter(|route| route.method == method)
            .find_map(|route| {
                match_pattern(&route.pattern, path).map(|params| (route.handler.clone(), params))
            })
    }

    pub fn len(&self) -> usize { self.routes.len() }
    pub fn is_empty(&self) -> bool { self.routes.is_empty() }
}

/// Matches one pattern against one path, returning the bound parameters.
fn match_pattern(pattern: &str, path: &str) -> Option<Params> {
    if pattern.split('/').count() != path.split('/').count() {
        return None;
    }

    let mut params = Params::new();
    for (expected, actual) in pattern.split('/').zip(path.split('/')) {
        match expected.strip_prefix(':') {
            Some(name) => {
                params.insert(name.to_owned(), actual.to_owned());
            }
            None if expected == actual => {}
            None => return None,
        }
    }
    Some(params)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::context::Context;
    use crate::handler::Handler;
    use crate::request::Request;
    use crate::response::Response;

    fn named(message: &'static str) -> BoxedHandler {
        (move |_: &mut Context| Response::ok(message)).into_boxed_handler()
    }

    fn message_of(handler: &BoxedHandler) -> String {
        let mut ctx = Context::new(Request::new(Method::Get, "/"));
        handler.call(&mut ctx).unwrap().unwrap().message
    }

    #[test]
    fn binds_single_param() {
        let mut router = Router::new();
        router.handle(Method::Get, "/users/:id", named("user"));

        let (_, params) = router.find(Method::Get, "/users/42").unwrap();
        assert_eq!(params.len(), 1);
        assert_eq!(params["id"], "42");
    }

    #[test]
    fn binds_multiple_params() {
        let mut router = Router::new();
        router.handle(Method::Get, "/users/:uid/posts/:pid", named("post"));

        let (_, params) = router.find(Method::Get, "/users/1/posts/99").unwrap();
        assert_eq!(params["uid"], "1");
        assert_eq!(params["pid"], "99");
    }

    #[test]
    fn literal_route_matches_with_empty_params() {
        let mut router = Router::new();
        router.handle(Method::Get, "/health", named("health"));

        let (_, params) = router.find(Method::Get, "/health").unwrap();
        assert!(params.is_empty());
    }

    #[test]
    fn no_routes_never_match() {
        let router = Router::new();
        assert!(router.is_empty());
        assert!(router.find(Method::Get, "/").is_none());
    }

    #[test]
    fn segment_count_must_be_equal() {
        let mut router = Router::new();
        router.handle(Method::Get, "/users/:id", named("user"));

        assert!(router.find(Method::Get, "/users/123/extra").is_none());
        assert!(router.find(Method::Get, "/users").is_none());
    }

    #[test]
    fn literal_mismatch_rejects() {
        let mut router = Router::new();
        router.handle(Method::Get, "/users/:id/profile", named("profile"));
        assert!(router.find(Method::Get, "/users/1/settings").is_none());
    }

    #[test]
    fn method_must_match() {
        let mut router = Router::new();
        router.handle(Method::Get, "/users", named("list"));
        assert!(router.find(Method::Post, "/users").is_none());
    }

    #[test]
    fn trailing_slash_is_a_segment() {
        let mut router = Router::new();
        router.handle(Method::Get, "/users", named("list"));
        router.handle(Method::Get, "/items/", named("items"));

        assert!(router.find(Method::Get, "/users/").is_none());
        assert!(router.find(Method::Get, "/items").is_none());
        assert!(router.find(Method::Get, "/items/").is_some());
    }

    #[test]
    fn param_may_bind_empty_segment() {
        let mut router = Router::new();
        router.handle(Method::Get, "/users/:id", named("user"));

        let (_, params) = router.find(Method::Get, "/users/").unwrap();
        assert_eq!(params["id"], "");
    }

    #[test]
    fn first_registered_wins() {
        let mut router = Router::new();
        router.handle(Method::Get, "/users/:id", named("param"));
        router.handle(Method::Get, "/users/me", named("literal"));

        let (handler, params) = router.find(Method::Get, "/users/me").unwrap();
        assert_eq!(message_of(&handler), "param");
        assert_eq!(params["id"], "me");
        assert_eq!(router.len(), 2);
    }

    #[test]
    fn matched_handler_runs_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let mut router = Router::new();
        router.handle(
            Method::Get,
            "/users/:id",
            (move |ctx: &mut Context| {
                counter.fetch_add(1, Ordering::SeqCst);
                Response::ok(ctx.param("id").unwrap_or_default().to_owned())
            })
            .into_boxed_handler(),
        );

        let (handler, params) = router.find(Method::Get, "/users/42").unwrap();
        let mut ctx = Context::new(Request::new(Method::Get, "/users/42"));
        ctx.set_params(params);
        let resp = handler.call(&mut ctx).unwrap().unwrap();

        assert_eq!(resp.message, "42");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
