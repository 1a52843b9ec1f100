//! Handler trait and type erasure.
//!
//! # How handlers are stored
//!
//! The router holds handlers of *different* concrete types in one `Vec`, and
//! middleware must be able to wrap any of them. Both work on a single erased
//! type, [`BoxedHandler`]: an `Arc` around a `dyn ErasedHandler`.
//!
//! ```text
//! fn get_user(ctx: &mut Context) -> Response { … }   ← user writes this
//!        ↓ app.get("/users/:id", get_user)
//! get_user.into_boxed_handler()                      ← Handler blanket impl
//!        ↓
//! BoxedHandler(Arc::new(FnHandler(get_user)))        ← one heap allocation
//!        ↓  wrapped by each middleware, stored in the router
//! handler.call(&mut ctx)  at request time            ← one vtable call per layer
//!        ↓
//! get_user(ctx).into_outcome()
//! ```
//!
//! Handlers are synchronous. The server reads the body asynchronously and
//! then runs the whole chain on tokio's blocking pool, one worker per
//! request, which lets a middleware hold `&mut Context` across the call to
//! the next layer and inspect it afterwards.

use std::fmt;
use std::sync::Arc;

use crate::context::Context;
use crate::response::{IntoOutcome, Outcome};

// ── Erased handler ────────────────────────────────────────────────────────────

/// Internal dispatch interface.
///
/// `#[doc(hidden)] pub` rather than `pub(crate)` because it appears inside
/// the public [`BoxedHandler`].
#[doc(hidden)]
pub trait ErasedHandler {
    fn call(&self, ctx: &mut Context) -> Outcome;
}

/// A type-erased handler shared across concurrent requests.
///
/// This is what middleware receive as `next` and what they hand back.
/// Cloning is one atomic increment.
#[derive(Clone)]
pub struct BoxedHandler(Arc<dyn ErasedHandler + Send + Sync + 'static>);

impl BoxedHandler {
    /// Runs the handler (and everything it wraps) against `ctx`.
    pub fn call(&self, ctx: &mut Context) -> Outcome {
        self.0.call(ctx)
    }
}

impl fmt::Debug for BoxedHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BoxedHandler")
    }
}

// ── Public Handler trait ──────────────────────────────────────────────────────

/// Implemented for every valid route handler.
///
/// You never implement this yourself. It is satisfied by any function or
/// closure with the signature
///
/// ```text
/// fn name(ctx: &mut Context) -> impl IntoOutcome
/// ```
///
/// and by [`BoxedHandler`] itself. The trait is sealed: only the impls in
/// this module can satisfy it.
pub trait Handler: private::Sealed + Send + Sync + 'static {
    #[doc(hidden)]
    fn into_boxed_handler(self) -> BoxedHandler;
}

mod private {
    pub trait Sealed {}
}

impl<F, R> private::Sealed for F
where
    F: Fn(&mut Context) -> R + Send + Sync + 'static,
    R: IntoOutcome,
{
}

impl<F, R> Handler for F
where
    F: Fn(&mut Context) -> R + Send + Sync + 'static,
    R: IntoOutcome,
{
    fn into_boxed_handler(self) -> BoxedHandler {
        BoxedHandler(Arc::new(FnHandler(self)))
    }
}

impl private::Sealed for BoxedHandler {}

impl Handler for BoxedHandler {
    fn into_boxed_handler(self) -> BoxedHandler { self }
}

// ── Concrete wrapper ──────────────────────────────────────────────────────────

/// Bridges a concrete `F` to the trait-object world.
struct FnHandler<F>(F);

impl<F, R> ErasedHandler for FnHandler<F>
where
    F: Fn(&mut Context) -> R + Send + Sync,
    R: IntoOutcome,
{
    fn call(&self, ctx: &mut Context) -> Outcome {
        (self.0)(ctx).into_outcome()
    }
}
