//! HTTP server and graceful shutdown.
//!
//! On **SIGTERM** or **Ctrl-C** the server:
//! 1. Stops calling `listener.accept()`, so no new connections are made.
//! 2. Lets every in-flight connection task run to completion.
//! 3. Returns from [`Server::serve`], which lets `main` exit cleanly.
//!
//! # Request path
//!
//! Each request body is collected in full on the connection task. The
//! synchronous handler chain then runs on tokio's blocking pool via
//! [`App::call`], and the staged [`ResponseWriter`](crate::ResponseWriter)
//! is turned back into a hyper response.

use std::convert::Infallible;
use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Body;
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::app::App;
use crate::context::Context;
use crate::error::Error;
use crate::method::Method;
use crate::request::Request;
use crate::response::Response;

/// The HTTP server.
pub struct Server {
    addr: String,
}

impl Server {
    /// Configures the server to bind to `addr` when [`serve`](Server::serve)
    /// is called. The address is parsed there.
    ///
    /// ```rust,no_run
    /// use keel::Server;
    /// let server = Server::bind("0.0.0.0:3000");
    /// ```
    pub fn bind(addr: impl Into<String>) -> Self {
        Self { addr: addr.into() }
    }

    /// Starts accepting connections and dispatching them through `app`.
    ///
    /// Returns only after a full graceful shutdown (SIGTERM or Ctrl-C,
    /// followed by all in-flight requests completing). Fails with
    /// [`Error::Addr`] if the address does not parse and [`Error::Io`] if it
    /// cannot be bound.
    pub async fn serve(self, app: App) -> Result<(), Error> {
        let addr: SocketAddr = self.addr.parse().map_err(|_| Error::Addr(self.addr.clone()))?;
        let listener = TcpListener::bind(addr).await?;

        let app = Arc::new(app);

        info!(%addr, "keel listening");

        let mut tasks = tokio::task::JoinSet::new();

        let shutdown = shutdown_signal();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                // Shutdown is checked first so a signal stops accepting even
                // when connections are queued.
                biased;

                () = &mut shutdown => {
                    info!(in_flight = tasks.len(), "shutdown signal received, draining connections");
                    break;
                }

                res = listener.accept() => {
                    let (stream, remote_addr) = match res {
                        Ok(v) => v,
                        Err(e) => {
                            error!("accept error: {e}");
                            continue;
                        }
                    };

                    let app = Arc::clone(&app);
                    let io = TokioIo::new(stream);

                    tasks.spawn(async move {
                        let svc = service_fn(move |req| {
                            let app = Arc::clone(&app);
                            async move { dispatch(app, req).await }
                        });

                        if let Err(e) = ConnBuilder::new(TokioExecutor::new())
                            .serve_connection(io, svc)
                            .await
                        {
                            error!(peer = %remote_addr, "connection error: {e}");
                        }
                    });
                }

                // Reap finished connection tasks.
                Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
            }
        }

        while tasks.join_next().await.is_some() {}

        info!("keel stopped");
        Ok(())
    }
}

// ── Request dispatch ──────────────────────────────────────────────────────────

/// Turns one request into one response. Every failure is answered with an
/// envelope, so hyper never sees an error.
async fn dispatch<B>(
    app: Arc<App>,
    req: http::Request<B>,
) -> Result<http::Response<Full<Bytes>>, Infallible>
where
    B: Body,
    B::Error: fmt::Display,
{
    let (parts, body) = req.into_parts();

    let body = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            warn!(path = parts.uri.path(), "failed to read request body: {e}");
            return Ok(envelope(Response::error(400, "Bad Request").with_details(e.to_string())));
        }
    };

    // Methods outside the supported set can never match a route.
    let Ok(method) = Method::try_from(&parts.method) else {
        return Ok(envelope(Response::not_found()));
    };

    let request = Request::from_parts(method, &parts.uri, parts.headers, body);
    match tokio::task::spawn_blocking(move || app.call(request)).await {
        Ok(writer) => Ok(writer.into_http()),
        // Only reachable when a panic escapes the chain without `recovery`.
        Err(e) => {
            let err = Error::Panic(e.to_string());
            error!(%method, path = parts.uri.path(), "request task failed: {err}");
            Ok(envelope(Response::internal_error(err.to_string())))
        }
    }
}

/// Serializes a standalone envelope, outside any handler chain.
fn envelope(resp: Response) -> http::Response<Full<Bytes>> {
    let mut ctx = Context::new(Request::new(Method::Get, "/"));
    ctx.write_envelope(&resp);
    ctx.into_writer().into_http()
}

// ── Shutdown signal ───────────────────────────────────────────────────────────

/// Resolves on the first shutdown signal the process receives: **SIGTERM**
/// or **SIGINT** on Unix, Ctrl-C elsewhere.
///
/// If a handler cannot be installed its arm never resolves and the failure
/// is logged.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("failed to install Ctrl-C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let sigterm = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c   => {}
        () = sigterm  => {}
    }
}
