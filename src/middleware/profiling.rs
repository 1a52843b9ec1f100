use std::time::Instant;

use tracing::debug;

use super::Middleware;
use super::logger::status_of;

/// Request latency plus process memory after the handler ran, at `debug`.
///
/// Memory figures come from the OS via `memory-stats` and are reported in
/// KiB; they are omitted on platforms where it cannot read them.
pub fn profiling() -> Middleware {
    Middleware::from_fn(|ctx, next| {
        let start = Instant::now();
        let outcome = next.call(ctx);
        let elapsed = start.elapsed();

        let (physical_kb, virtual_kb) = memory_stats::memory_stats()
            .map(|m| (Some(m.physical_mem as u64 / 1024), Some(m.virtual_mem as u64 / 1024)))
            .unwrap_or((None, None));

        debug!(
            route = ctx.path(),
            status = status_of(ctx, &outcome),
            elapsed_us = elapsed.as_micros() as u64,
            physical_kb,
            virtual_kb,
            "profile"
        );
        outcome
    })
}
