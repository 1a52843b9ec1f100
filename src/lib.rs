//! # keel
//!
//! A small HTTP routing and middleware layer built on hyper, with one JSON
//! response envelope for everything the framework itself answers.
//!
//! - Segment-exact routing with `:name` parameters, first match wins
//! - Global, per-group and path-conditional middleware, first registered outermost
//! - A write-once [`ResponseWriter`]: the first write commits the response
//! - Built-in logging, panic recovery, profiling, CORS and CSRF middleware
//! - Graceful shutdown on SIGTERM / Ctrl-C
//!
//! ## The envelope
//!
//! ```json
//! {"success": false, "message": "Not Found", "code": 404}
//! ```
//!
//! `details` is added only when present. A handler returning a [`Response`]
//! gets it serialized with `code` as the HTTP status, unless the handler (or
//! a middleware) already wrote something through the [`Context`].
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use keel::middleware::{logger, recovery};
//! use keel::{App, Context, Error, Response, Server};
//! use serde::Deserialize;
//!
//! #[derive(Deserialize)]
//! struct NewUser { name: String }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Error> {
//!     let app = App::new()
//!         .middleware(recovery())
//!         .middleware(logger())
//!         .group("/api/v1", |g| {
//!             g.get("/users/:id", get_user);
//!             g.post("/users", create_user);
//!         });
//!
//!     Server::bind("0.0.0.0:3000").serve(app).await
//! }
//!
//! fn get_user(ctx: &mut Context) -> Response {
//!     let id = ctx.param("id").unwrap_or("unknown");
//!     Response::ok("user found").with_details(serde_json::json!({ "id": id }))
//! }
//!
//! fn create_user(ctx: &mut Context) -> Result<Response, Error> {
//!     let user: NewUser = ctx.bind_json()?;
//!     Ok(Response::created(format!("created {}", user.name)))
//! }
//! ```

mod app;
mod bind;
mod context;
mod error;
mod group;
mod handler;
mod method;
mod request;
mod response;
mod router;
mod server;
mod writer;

pub mod middleware;

pub use app::App;
pub use context::{Context, Params};
pub use error::{BindError, Error};
pub use group::Group;
pub use handler::{BoxedHandler, Handler};
pub use method::{Method, UnknownMethod};
pub use request::Request;
pub use response::{IntoOutcome, Outcome, Response};
pub use router::Router;
pub use server::Server;
pub use writer::ResponseWriter;
