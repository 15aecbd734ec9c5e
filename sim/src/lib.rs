//! Simulation harness for the metastability-breaking voting rule.
//!
//! A population of weighted voters repeatedly broadcasts votes for one of
//! several conflicting branches over an in-process event bus. Each voter
//! keeps its own view of per-branch approval weight and re-votes for
//! whichever branch its consensus rule currently favors; adversarial
//! strategies react to honest votes to sustain a metastable tie. The
//! time-decaying breaker threshold, once matured, collapses honest voters
//! onto the lowest branch id and dissolves the tie.
//!
//! ## Module overview
//!
//! - [`network`] — voter registry, synchronous vote broadcast, scheduler.
//! - [`voter`] — the honest core and the four voting strategies.
//! - [`report`] — voter-type × branch weight aggregation and rendering.
//! - [`config`] — simulation configuration.
//! - [`logging`] — run observation: subscriber setup and the scheduler span.
//! - [`error`] — simulation error types.

pub mod config;
pub mod error;
pub mod logging;
pub mod network;
mod report;
pub mod voter;

pub use config::SimConfig;
pub use error::SimError;
pub use logging::init_run_logging;
pub use network::Network;
pub use voter::{
    new_honest_voter, new_lower_hash_voter, new_minority_voter, new_slow_minority_voter,
    Strategy, Voter,
};
