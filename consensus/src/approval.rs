//! Approval-weight accounting.
//!
//! Tracks, for one voter, the total approval weight per branch and the most
//! recent statement observed from each issuer. The two maps move together:
//! when an issuer's statement changes, their distribution weight leaves the
//! old branch and lands on the new one, so each issuer is counted on exactly
//! one branch at any time.

use metabreak_types::{BranchId, Vote, VoterId, Weight, WeightTable};
use std::collections::HashMap;
use tracing::trace;

/// Per-voter approval-weight totals and last observed statements.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ApprovalWeights {
    /// branch → total approval weight from issuers last observed on it.
    weights: HashMap<BranchId, Weight>,
    /// issuer → the most recent statement observed from them.
    last_statements: HashMap<VoterId, BranchId>,
}

/// Exact inverse of one simulated statement. Applying it through
/// [`ApprovalWeights::undo`] restores the pre-simulation state pointwise.
#[derive(Clone, Copy, Debug)]
pub struct StatementUndo {
    voter: VoterId,
    branch: BranchId,
    prev: Option<BranchId>,
    weight: Weight,
}

impl ApprovalWeights {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply an observed vote.
    ///
    /// Moves the issuer's distribution weight from their previous branch (if
    /// any) to the voted branch and records the new statement. A vote equal
    /// to the issuer's current statement is a no-op.
    ///
    /// Returns whether the vote was processed — callers treat `true` as the
    /// vote-processed signal for strategy reactions.
    pub fn process_vote(&mut self, vote: Vote, distribution: &WeightTable) -> bool {
        if let Some(&prev) = self.last_statements.get(&vote.issuer) {
            if prev == vote.branch {
                return false;
            }
            let weight = distribution.get(vote.issuer);
            self.subtract(prev, weight);
            self.add(vote.branch, weight);
            trace!(issuer = %vote.issuer, from = %prev, to = %vote.branch, "statement changed");
        } else {
            self.add(vote.branch, distribution.get(vote.issuer));
            trace!(issuer = %vote.issuer, branch = %vote.branch, "first statement");
        }
        self.last_statements.insert(vote.issuer, vote.branch);
        true
    }

    /// Total approval weight on a branch. Unknown branches weigh zero.
    pub fn weight(&self, branch: BranchId) -> Weight {
        self.weights.get(&branch).copied().unwrap_or(Weight::ZERO)
    }

    /// The most recent statement observed from a voter.
    pub fn last_statement(&self, voter: VoterId) -> Option<BranchId> {
        self.last_statements.get(&voter).copied()
    }

    /// Snapshot copy of the statement map. Callers never observe a partial
    /// update.
    pub fn last_statements(&self) -> HashMap<VoterId, BranchId> {
        self.last_statements.clone()
    }

    /// Current per-branch totals, for diagnostics.
    pub fn branch_weights(&self) -> impl Iterator<Item = (BranchId, Weight)> + '_ {
        self.weights.iter().map(|(branch, w)| (*branch, *w))
    }

    /// Record a hypothetical statement without treating it as processed.
    ///
    /// Mutates the state exactly like [`process_vote`] (including the
    /// duplicate case, which moves weight off and back onto the same branch)
    /// and returns the exact inverse. No vote-processed signal is implied.
    ///
    /// [`process_vote`]: ApprovalWeights::process_vote
    pub fn simulate_statement(
        &mut self,
        voter: VoterId,
        branch: BranchId,
        distribution: &WeightTable,
    ) -> StatementUndo {
        let weight = distribution.get(voter);
        let prev = self.last_statements.get(&voter).copied();

        if let Some(prev) = prev {
            self.subtract(prev, weight);
        }
        self.add(branch, weight);
        self.last_statements.insert(voter, branch);

        StatementUndo {
            voter,
            branch,
            prev,
            weight,
        }
    }

    /// Roll back one simulated statement. Undo records must be applied in
    /// reverse order of their creation.
    pub fn undo(&mut self, undo: StatementUndo) {
        self.subtract(undo.branch, undo.weight);
        match undo.prev {
            Some(prev) => {
                self.add(prev, undo.weight);
                self.last_statements.insert(undo.voter, prev);
            }
            None => {
                self.last_statements.remove(&undo.voter);
            }
        }
    }

    fn add(&mut self, branch: BranchId, weight: Weight) {
        let entry = self.weights.entry(branch).or_insert(Weight::ZERO);
        *entry = entry.saturating_add(weight);
    }

    fn subtract(&mut self, branch: BranchId, weight: Weight) {
        if let Some(entry) = self.weights.get_mut(&branch) {
            *entry = entry.saturating_sub(weight);
            if entry.is_zero() {
                self.weights.remove(&branch);
            }
        }
    }
}
