//! Tracing setup for watching simulation runs.
//!
//! A run is only legible through its log stream: which voter moved, what it
//! voted, and when the attacker reacted. [`init_run_logging`] installs a
//! subscriber tuned for that stream, and the scheduler wraps its loop in
//! [`scheduler_span`] so every tick line carries the knobs that shape the
//! run (breaker threshold and tick interval).

use crate::config::SimConfig;
use tracing::{info_span, Span};
use tracing_subscriber::EnvFilter;

/// Install a subscriber for observing a run.
///
/// When `RUST_LOG` is not set, defaults to this crate's `debug` stream —
/// opinion changes, attacker casts, scheduler start/stop — without the
/// per-vote `trace` firehose. Safe to call from every test: a subscriber
/// that is already installed wins and the call is a no-op.
pub fn init_run_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("metabreak_sim=debug"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// Span for one scheduler run. Breaker zero means the tiebreak rule is off,
/// which is worth seeing on every line when a run refuses to converge.
pub(crate) fn scheduler_span(config: &SimConfig) -> Span {
    info_span!(
        "scheduler",
        breaker_ms = config.breaker_threshold.as_millis() as u64,
        tick_ms = config.tick_interval.as_millis() as u64,
    )
}
