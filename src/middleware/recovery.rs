use std::any::Any;
use std::backtrace::Backtrace;
use std::panic::{self, AssertUnwindSafe};

use serde_json::Value;
use tracing::error;

use super::Middleware;

/// Catches panics from the layers it wraps.
///
/// If nothing has been written yet, the client gets a `500`: an HTML page
/// when its `Accept` header mentions `text/html`, otherwise the JSON envelope
/// with the panic message in `details`. If the response was already
/// committed, the panic is only logged; writing again would corrupt it.
/// Either way the chain continues with `Ok(None)`.
///
/// Register it first so it wraps everything else.
pub fn recovery() -> Middleware {
    Middleware::from_fn(|ctx, next| {
        // The context is request-local and dropped after dispatch.
        let caught = panic::catch_unwind(AssertUnwindSafe(|| next.call(ctx)));
        let payload = match caught {
            Ok(outcome) => return outcome,
            Err(payload) => payload,
        };

        let message = panic_message(payload.as_ref());
        error!(
            panic = %message,
            path = ctx.path(),
            handled = ctx.is_handled(),
            backtrace = %Backtrace::force_capture(),
            "recovered from handler panic"
        );

        if !ctx.is_handled() {
            let wants_html = ctx.header("accept").is_some_and(|a| a.contains("text/html"));
            if wants_html {
                ctx.html(500, "<h1>500 Internal Server Error</h1>");
            } else {
                ctx.error_json("Internal Server Error", Some(Value::String(message)), 500);
            }
        }
        Ok(None)
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_owned()
    }
}
