//! Minimal keel example: CRUD-style JSON endpoints under `/api/v1`.
//!
//! Run with:
//!   RUST_LOG=keel=debug cargo run --example basic
//!
//! Try:
//!   curl http://localhost:3000/api/v1/users/42
//!   curl -X POST http://localhost:3000/api/v1/users \
//!        -H 'content-type: application/json' \
//!        -H 'authorization: Bearer demo' \
//!        -d '{"name":"alice"}'
//!   curl -X DELETE http://localhost:3000/api/v1/users/42 -H 'authorization: Bearer demo'
//!   curl 'http://localhost:3000/search?q=rust&tag=web&tag=cli'
//!   curl http://localhost:3000/panic

use keel::middleware::{Middleware, cors, logger, profiling, recovery};
use keel::{App, Context, Error, Response, Server};
use serde::Deserialize;
use serde_json::json;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Deserialize)]
struct NewUser {
    name: String,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "keel=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let app = App::new()
        .middleware(recovery())
        .middleware(logger())
        .middleware(cors())
        .middleware_if("/api/*", profiling())
        .get("/search", search)
        .get("/panic", |_: &mut Context| -> Response { panic!("demo panic") })
        .group("/api/v1", |g| {
            g.get("/users/:id", get_user);
            g.middleware(require_auth());
            g.post("/users", create_user);
            g.delete("/users/:id", delete_user);
        });

    Server::bind("0.0.0.0:3000").serve(app).await
}

/// Rejects requests without an `Authorization` header.
fn require_auth() -> Middleware {
    Middleware::from_fn(|ctx, next| {
        if ctx.header("authorization").is_none() {
            return Ok(Some(Response::error(401, "Unauthorized")));
        }
        next.call(ctx)
    })
}

// GET /api/v1/users/:id
fn get_user(ctx: &mut Context) -> Response {
    let id = ctx.param("id").unwrap_or("unknown");
    Response::ok("user found").with_details(json!({ "id": id, "name": "alice" }))
}

// POST /api/v1/users
//
// A malformed body gets a 400 from `bind_json` before `?` returns.
fn create_user(ctx: &mut Context) -> Result<Response, Error> {
    let user: NewUser = ctx.bind_json()?;
    ctx.writer_mut().set_header("location", "/api/v1/users/99");
    Ok(Response::created("user created").with_details(json!({ "id": "99", "name": user.name })))
}

// DELETE /api/v1/users/:id → 204, no body
fn delete_user(ctx: &mut Context) -> Response {
    ctx.writer_mut().write_status(204);
    Response::new(true, "deleted", 204)
}

// GET /search?q=...&tag=...
fn search(ctx: &mut Context) -> Response {
    Response::ok("search").with_details(json!({
        "q": ctx.query("q"),
        "tags": ctx.query_array("tag"),
    }))
}
