//! The vote record — the sole message type on the simulated network.

use crate::ids::{BranchId, VoterId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single broadcast statement: `issuer` currently endorses `branch`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Vote {
    pub issuer: VoterId,
    pub branch: BranchId,
}

impl Vote {
    pub fn new(issuer: VoterId, branch: BranchId) -> Self {
        Self { issuer, branch }
    }
}

impl fmt::Display for Vote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} votes for {}", self.issuer, self.branch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_issuer_and_branch() {
        let vote = Vote::new(VoterId::new(3), BranchId::new(1000));
        assert_eq!(vote.to_string(), "VoterID(3) votes for BranchID(1000)");
    }
}
