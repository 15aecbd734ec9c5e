//! Fixed-point stake weights and the network-wide weight distribution.
//!
//! Weights are stored as integer micro-units (1.0 stake == 1_000_000) so the
//! repeated subtract/add cycles of statement changes stay exact: summing the
//! distribution entries of the voters observed on a branch reproduces the
//! branch total bit-for-bit, and resolution checks can compare with `==`.

use crate::ids::VoterId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// A non-negative stake weight in micro-units.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Weight(u64);

/// Micro-units per 1.0 of stake.
const SCALE: u64 = 1_000_000;

impl Weight {
    pub const ZERO: Self = Self(0);

    /// Convert from a real-valued stake. Negative, NaN, and infinite inputs
    /// map to zero; everything else rounds to the nearest micro-unit.
    pub fn from_f64(value: f64) -> Self {
        if !value.is_finite() || value <= 0.0 {
            return Self::ZERO;
        }
        Self((value * SCALE as f64).round() as u64)
    }

    pub fn from_micros(micros: u64) -> Self {
        Self(micros)
    }

    pub fn as_micros(&self) -> u64 {
        self.0
    }

    /// The real-valued stake, used by the dimensionless threshold math.
    pub fn to_f64(&self) -> f64 {
        self.0 as f64 / SCALE as f64
    }

    pub fn saturating_add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }

    pub fn saturating_sub(self, rhs: Self) -> Self {
        Self(self.0.saturating_sub(rhs.0))
    }

    pub fn abs_diff(self, rhs: Self) -> Self {
        Self(self.0.abs_diff(rhs.0))
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Weight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.to_f64())
    }
}

/// The network-wide voter → weight mapping.
///
/// Populated once at voter registration and read-only thereafter. Issuers
/// without an entry (synthetic branch-seeding issuers) weigh zero.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct WeightTable {
    weights: HashMap<VoterId, Weight>,
}

impl WeightTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, voter: VoterId, weight: Weight) {
        self.weights.insert(voter, weight);
    }

    /// A voter's registered weight. Unknown voters weigh zero.
    pub fn get(&self, voter: VoterId) -> Weight {
        self.weights.get(&voter).copied().unwrap_or(Weight::ZERO)
    }

    pub fn contains(&self, voter: VoterId) -> bool {
        self.weights.contains_key(&voter)
    }

    pub fn iter(&self) -> impl Iterator<Item = (VoterId, Weight)> + '_ {
        self.weights.iter().map(|(id, w)| (*id, *w))
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }
}
