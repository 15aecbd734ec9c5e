//! Voter and branch identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a voter.
///
/// Allocated from a network-scoped monotonically increasing counter at voter
/// construction. Synthetic issuers (used to seed branches) draw from the same
/// counter but never appear in the weight distribution.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VoterId(u64);

impl VoterId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for VoterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VoterID({})", self.0)
    }
}

/// Identifier of a branch — one candidate among mutually exclusive
/// conflicting proposals.
///
/// Branch ids are externally supplied integers. The total order on ids is the
/// deterministic tiebreaker of the consensus rule. [`BranchId::UNDEFINED`]
/// (zero) marks "no branch". Ids are signed: a voter that keeps advertising
/// `branch - 1` walks past the sentinel into negative ids without any guard.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BranchId(i64);

impl BranchId {
    /// Sentinel marking the absence of a branch.
    pub const UNDEFINED: Self = Self(0);

    pub fn new(raw: i64) -> Self {
        Self(raw)
    }

    pub fn as_i64(&self) -> i64 {
        self.0
    }

    pub fn is_undefined(&self) -> bool {
        *self == Self::UNDEFINED
    }

    /// The next-lower branch id. May reach or pass [`BranchId::UNDEFINED`].
    pub fn predecessor(&self) -> Self {
        Self(self.0 - 1)
    }
}

impl fmt::Display for BranchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BranchID({})", self.0)
    }
}
