use std::time::Instant;

use tracing::info;

use super::Middleware;
use crate::context::Context;
use crate::response::Outcome;

/// One `info` event per request: method, path, status and latency.
///
/// The status is the envelope's `code` when the chain returned one, otherwise
/// whatever the writer committed.
pub fn logger() -> Middleware {
    Middleware::from_fn(|ctx, next| {
        let start = Instant::now();
        let outcome = next.call(ctx);
        info!(
            method = %ctx.method(),
            path = ctx.path(),
            status = status_of(ctx, &outcome),
            elapsed_us = start.elapsed().as_micros() as u64,
            "request"
        );
        outcome
    })
}

/// Status as the client will see it.
pub(super) fn status_of(ctx: &Context, outcome: &Outcome) -> u16 {
    if ctx.is_handled() {
        return ctx.writer().status().as_u16();
    }
    match outcome {
        Ok(Some(resp)) => resp.code,
        Ok(None) => ctx.writer().status().as_u16(),
        Err(_) => 500,
    }
}
