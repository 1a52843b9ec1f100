//! Signed double-submit CSRF protection.
//!
//! Every request that passes through gets a random token in a cookie. The
//! HMAC-SHA256 signature of that token (keyed with [`CsrfConfig::secret`]) is
//! what a legitimate client must echo back in the token header on unsafe
//! methods. Handlers read the signature with `ctx.local(&cfg.context_key)`
//! to embed it in pages or hand it to scripts. A cross-site attacker can
//! make the browser send the cookie but cannot read it, and cannot produce
//! the signature without the secret.
//!
//! Decision table for methods outside [`CsrfConfig::skip_methods`]:
//!
//! | cookie | header | result |
//! |---|---|---|
//! | absent | absent | first visit: issue a token, continue |
//! | present | absent | rejected |
//! | any | present | continue if the header is the signature of the cookie token |

use std::sync::Arc;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;

use super::Middleware;
use crate::context::Context;
use crate::method::Method;
use crate::response::Outcome;

type HmacSha256 = Hmac<Sha256>;

const TOKEN_BYTES: usize = 32;

/// Message of the default `403` reply.
const INVALID_TOKEN: &str = "invalid CSRF token";

/// Custom reply for rejected requests. Receives the rejection reason.
pub type CsrfErrorHandler = Arc<dyn Fn(&mut Context, &str) -> Outcome + Send + Sync>;

#[derive(Clone)]
pub struct CsrfConfig {
    /// Request header carrying the signed token.
    pub token_header: String,
    /// Cookie carrying the raw token.
    pub token_cookie: String,
    /// Key under which the signed token is stored in the context locals.
    pub context_key: String,
    /// Cookie lifetime (`Max-Age`).
    pub expiry: Duration,
    /// HMAC key. Replace the default in any real deployment.
    pub secret: Vec<u8>,
    pub skip_methods: Vec<Method>,
    pub cookie_secure: bool,
    pub cookie_http_only: bool,
    pub error_handler: Option<CsrfErrorHandler>,
}

impl Default for CsrfConfig {
    fn default() -> Self {
        Self {
            token_header: "X-CSRF-Token".to_owned(),
            token_cookie: "csrf_token".to_owned(),
            context_key: "csrf_token".to_owned(),
            expiry: Duration::from_secs(24 * 60 * 60),
            secret: b"supersecretkey".to_vec(),
            skip_methods: vec![Method::Get, Method::Head, Method::Options, Method::Trace],
            cookie_secure: true,
            cookie_http_only: true,
            error_handler: None,
        }
    }
}

/// CSRF protection with [`CsrfConfig::default`].
pub fn csrf() -> Middleware {
    csrf_with_config(CsrfConfig::default())
}

/// CSRF protection with a custom configuration.
pub fn csrf_with_config(cfg: CsrfConfig) -> Middleware {
    let cfg = Arc::new(cfg);
    Middleware::from_fn(move |ctx, next| {
        if cfg.skip_methods.contains(&ctx.method()) {
            return next.call(ctx);
        }

        let cookie_token = ctx.cookie(&cfg.token_cookie).map(str::to_owned);
        let client_token = ctx.header(&cfg.token_header).map(str::to_owned);

        let verdict = match (&cookie_token, &client_token) {
            (None, None) => Ok(()),
            (Some(_), None) => Err("missing CSRF token"),
            (cookie, Some(signed)) => match cookie {
                Some(token) if verify_token(&cfg.secret, token, signed) => Ok(()),
                _ => Err(INVALID_TOKEN),
            },
        };
        if let Err(reason) = verdict {
            return match &cfg.error_handler {
                Some(handler) => handler(ctx, reason),
                None => Ok(Some(ctx.text(403, INVALID_TOKEN))),
            };
        }

        let token = cookie_token.unwrap_or_else(generate_token);
        let signed = sign_token(&cfg.secret, &token);
        ctx.writer_mut().append_header("set-cookie", &session_cookie(&cfg, &token));
        ctx.set_local(cfg.context_key.clone(), signed);

        next.call(ctx)
    })
}

/// The value a client must send in the token header for `token`.
pub fn sign_token(secret: &[u8], token: &str) -> String {
    URL_SAFE_NO_PAD.encode(mac(secret, token).finalize().into_bytes())
}

fn verify_token(secret: &[u8], token: &str, signed: &str) -> bool {
    match URL_SAFE_NO_PAD.decode(signed) {
        // `verify_slice` compares in constant time.
        Ok(tag) => mac(secret, token).verify_slice(&tag).is_ok(),
        Err(_) => false,
    }
}

fn mac(secret: &[u8], token: &str) -> HmacSha256 {
    let mut mac = <HmacSha256 as Mac>::new_from_slice(secret)
        .unwrap_or_else(|_| unreachable!("HMAC accepts any key length"));
    mac.update(token.as_bytes());
    mac
}

fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

fn session_cookie(cfg: &CsrfConfig, token: &str) -> String {
    let mut cookie = format!(
        "{}={}; Path=/; Max-Age={}",
        cfg.token_cookie,
        token,
        cfg.expiry.as_secs()
    );
    if cfg.cookie_secure {
        cookie.push_str("; Secure");
    }
    if cfg.cookie_http_only {
        cookie.push_str("; HttpOnly");
    }
    cookie
}
