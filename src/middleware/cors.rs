use serde::Deserialize;

use super::Middleware;
use crate::method::Method;
use crate::response::Response;

/// CORS settings.
///
/// Empty lists are replaced by defaults when the middleware is built. The
/// struct deserializes with per-field defaults, so a partial config section
/// is enough:
///
/// ```rust
/// use keel::middleware::CorsConfig;
///
/// let cfg: CorsConfig = serde_json::from_str(r#"{"allow_origins":["https://app.example"]}"#).unwrap();
/// assert!(cfg.allow_credentials);
/// assert!(cfg.allow_methods.contains(&"GET".to_owned()));
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Allowed origins, or `"*"` for any. Matching is case-insensitive.
    pub allow_origins: Vec<String>,
    pub allow_methods: Vec<String>,
    pub allow_headers: Vec<String>,
    pub allow_credentials: bool,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allow_origins: vec!["*".to_owned()],
            allow_methods: ["GET", "HEAD", "PUT", "PATCH", "POST", "DELETE"]
                .map(str::to_owned)
                .to_vec(),
            allow_headers: ["Content-Type", "Authorization", "Accept", "Origin", "X-Requested-With"]
                .map(str::to_owned)
                .to_vec(),
            allow_credentials: true,
        }
    }
}

/// CORS with [`CorsConfig::default`].
pub fn cors() -> Middleware {
    cors_with_config(CorsConfig::default())
}

/// CORS with a custom configuration.
///
/// A matching `Origin` is echoed back in `Access-Control-Allow-Origin`.
/// `OPTIONS` requests are answered with `204` right here and never reach the
/// handler. The route itself still has to exist for the preflight to be
/// routed, e.g. `app.options("/users", ...)` or a catch-all per path.
pub fn cors_with_config(mut cfg: CorsConfig) -> Middleware {
    if cfg.allow_origins.is_empty() {
        cfg.allow_origins = vec!["*".to_owned()];
    }
    if cfg.allow_methods.is_empty() {
        cfg.allow_methods = ["GET", "POST", "PUT", "PATCH", "DELETE", "OPTIONS"]
            .map(str::to_owned)
            .to_vec();
    }
    if cfg.allow_headers.is_empty() {
        cfg.allow_headers = vec!["Content-Type".to_owned(), "Authorization".to_owned()];
    }

    let methods = cfg.allow_methods.join(", ");
    let headers = cfg.allow_headers.join(", ");

    Middleware::from_fn(move |ctx, next| {
        let allowed_origin = ctx.header("origin").filter(|origin| {
            cfg.allow_origins
                .iter()
                .any(|o| o == "*" || o.eq_ignore_ascii_case(origin))
        });
        if let Some(origin) = allowed_origin.map(str::to_owned) {
            ctx.writer_mut().set_header("access-control-allow-origin", &origin);
        }

        let w = ctx.writer_mut();
        w.set_header("access-control-allow-methods", &methods);
        w.set_header("access-control-allow-headers", &headers);
        if cfg.allow_credentials {
            w.set_header("access-control-allow-credentials", "true");
        }

        if ctx.method() == Method::Options {
            ctx.writer_mut().write_status(204);
            return Ok(Some(Response::new(true, "CORS preflight", 204)));
        }
        next.call(ctx)
    })
}
