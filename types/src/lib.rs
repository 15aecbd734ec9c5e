//! Fundamental types for the metabreak workspace.
//!
//! This crate defines the types shared across every other crate in the
//! workspace: voter and branch identifiers, the vote record, and fixed-point
//! stake weights with the read-only weight distribution.

pub mod ids;
pub mod vote;
pub mod weight;

pub use ids::{BranchId, VoterId};
pub use vote::Vote;
pub use weight::{Weight, WeightTable};
