//! End-to-end dispatch through `App::call`: routing, envelope serialization
//! and the write-once guarantee.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use keel::{App, Context, Error, Method, Request, Response};
use serde_json::{Value, json};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn envelope(body: &[u8]) -> Value {
    serde_json::from_slice(body).expect("body is a JSON envelope")
}

#[test]
fn param_route_binds_and_runs_once() {
    init_tracing();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);

    let app = App::new().get("/users/:id", move |ctx: &mut Context| {
        counter.fetch_add(1, Ordering::SeqCst);
        Response::ok("user").with_serialized_details(ctx.params())
    });

    let w = app.call(Request::new(Method::Get, "/users/42"));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(w.status().as_u16(), 200);
    assert_eq!(envelope(w.body())["details"], json!({ "id": "42" }));
}

#[test]
fn wrong_method_is_uniform_404() {
    let app = App::new().get("/users", |_: &mut Context| Response::ok("list"));

    let wrong_method = app.call(Request::new(Method::Post, "/users"));
    let unknown_path = app.call(Request::new(Method::Get, "/nope"));

    assert_eq!(wrong_method.status().as_u16(), 404);
    assert_eq!(wrong_method.body(), unknown_path.body());
    assert_eq!(
        envelope(wrong_method.body()),
        json!({ "success": false, "message": "Not Found", "code": 404 })
    );
}

#[test]
fn shape_mismatch_is_404() {
    let app = App::new().get("/users/:id", |_: &mut Context| Response::ok("user"));
    for path in ["/users", "/users/1/extra", "/users/1/"] {
        assert_eq!(app.call(Request::new(Method::Get, path)).status().as_u16(), 404, "{path}");
    }
}

#[test]
fn details_omitted_when_absent() {
    let app = App::new()
        .get("/plain", |_: &mut Context| Response::ok("plain"))
        .get("/rich", |_: &mut Context| Response::ok("rich").with_details(json!([1, 2])));

    let plain = app.call(Request::new(Method::Get, "/plain"));
    assert!(!envelope(plain.body()).as_object().unwrap().contains_key("details"));

    let rich = app.call(Request::new(Method::Get, "/rich"));
    assert_eq!(envelope(rich.body())["details"], json!([1, 2]));
}

#[test]
fn envelope_code_is_the_status() {
    let app = App::new().post("/things", |_: &mut Context| Response::error(422, "name is required"));
    let w = app.call(Request::new(Method::Post, "/things"));
    assert_eq!(w.status().as_u16(), 422);
    assert_eq!(w.headers()["content-type"], "application/json");
    assert_eq!(envelope(w.body())["success"], false);
}

#[test]
fn handler_error_is_500_with_details() {
    init_tracing();
    let app = App::new().get("/orders/:id", |ctx: &mut Context| -> Result<Response, Error> {
        let id = ctx.param("id").unwrap_or_default().to_owned();
        Err(Error::msg(format!("order {id} unavailable")))
    });

    let w = app.call(Request::new(Method::Get, "/orders/9"));
    assert_eq!(w.status().as_u16(), 500);
    assert_eq!(
        envelope(w.body()),
        json!({
            "success": false,
            "message": "Internal Server Error",
            "details": "order 9 unavailable",
            "code": 500
        })
    );
}

#[test]
fn second_write_leaves_first_response_intact() {
    let app = App::new().get("/", |ctx: &mut Context| {
        ctx.text(201, "first");
        ctx.html(500, "<p>second</p>");
        ctx.writer_mut().set_header("x-late", "1");
        Response::error(503, "third")
    });

    let w = app.call(Request::new(Method::Get, "/"));
    assert_eq!(w.status().as_u16(), 201);
    assert_eq!(w.body(), b"first");
    assert_eq!(w.headers()["content-type"], "text/plain; charset=utf-8");
    assert!(!w.headers().contains_key("x-late"));
}

#[test]
fn raw_json_helper_is_not_serialized_twice() {
    let app = App::new().get("/", |ctx: &mut Context| {
        ctx.json(true, "written", Some(json!({ "n": 1 })), 200)
    });
    let w = app.call(Request::new(Method::Get, "/"));
    assert_eq!(
        envelope(w.body()),
        json!({ "success": true, "message": "written", "details": { "n": 1 }, "code": 200 })
    );
}

#[test]
fn binding_failure_short_circuits_with_400() {
    #[derive(serde::Deserialize)]
    struct NewUser {
        #[allow(dead_code)]
        name: String,
    }

    let app = App::new().post("/users", |ctx: &mut Context| -> Result<Response, Error> {
        let _user: NewUser = ctx.bind_json()?;
        Ok(Response::created("created"))
    });

    let bad = app.call(
        Request::new(Method::Post, "/users")
            .with_header("content-type", "application/json")
            .with_body(r#"{"nom":"x"}"#),
    );
    assert_eq!(bad.status().as_u16(), 400);
    assert_eq!(envelope(bad.body())["message"], "Invalid JSON body");

    let good = app.call(
        Request::new(Method::Post, "/users")
            .with_header("content-type", "application/json")
            .with_body(r#"{"name":"x"}"#),
    );
    assert_eq!(good.status().as_u16(), 201);
}

#[test]
fn redirect_has_no_body() {
    let app = App::new().get("/old", |ctx: &mut Context| ctx.redirect(301, "/new"));
    let w = app.call(Request::new(Method::Get, "/old"));
    assert_eq!(w.status().as_u16(), 301);
    assert_eq!(w.headers()["location"], "/new");
    assert!(w.body().is_empty());
}

#[test]
fn missing_file_serializes_404_envelope() {
    let app = App::new().get("/download", |ctx: &mut Context| ctx.file("/no/such/file.pdf"));
    let w = app.call(Request::new(Method::Get, "/download"));
    assert_eq!(w.status().as_u16(), 404);
    assert_eq!(envelope(w.body())["message"], "File not found");
}

#[test]
fn query_and_cookie_reach_the_handler() {
    let app = App::new().get("/search", |ctx: &mut Context| {
        Response::ok("search").with_details(json!({
            "q": ctx.query("q"),
            "tags": ctx.query_array("tag"),
            "session": ctx.cookie("session"),
        }))
    });

    let w = app.call(
        Request::new(Method::Get, "/search?q=rust&tag=a&tag=b")
            .with_header("cookie", "theme=dark; session=abc123"),
    );
    assert_eq!(
        envelope(w.body())["details"],
        json!({ "q": "rust", "tags": ["a", "b"], "session": "abc123" })
    );
}

#[test]
fn encoded_paths_match_decoded_routes() {
    let app = App::new()
        .get("/users/:id", |ctx: &mut Context| {
            Response::ok(ctx.param("id").unwrap_or_default().to_owned())
        })
        .get("/café", |_: &mut Context| Response::ok("menu"));

    let user = app.call(Request::new(Method::Get, "/users/john%20doe"));
    assert_eq!(envelope(user.body())["message"], "john doe");

    let literal = app.call(Request::new(Method::Get, "/caf%C3%A9"));
    assert_eq!(literal.status().as_u16(), 200);
    assert_eq!(envelope(literal.body())["message"], "menu");
}
