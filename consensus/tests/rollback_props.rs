//! Property tests for approval-weight accounting.
//!
//! Random vote sequences must keep the weight totals derivable from the
//! statement map, and every simulated statement must be exactly reversible.

use proptest::prelude::*;

use metabreak_consensus::ApprovalWeights;
use metabreak_types::{BranchId, Vote, VoterId, Weight, WeightTable};

fn distribution(weights: &[u32]) -> WeightTable {
    let mut table = WeightTable::new();
    for (index, &micros) in weights.iter().enumerate() {
        table.set(
            VoterId::new(index as u64 + 1),
            Weight::from_micros(micros as u64),
        );
    }
    table
}

fn arb_votes() -> impl Strategy<Value = (Vec<u32>, Vec<(u64, i64)>)> {
    (
        prop::collection::vec(1u32..=500_000, 1..8),
        prop::collection::vec((1u64..=8, -2i64..=6), 0..64),
    )
}

/// Recompute per-branch totals from scratch out of the statement map.
fn recomputed_weight(approvals: &ApprovalWeights, table: &WeightTable, branch: BranchId) -> Weight {
    approvals
        .last_statements()
        .iter()
        .filter(|(_, b)| **b == branch)
        .fold(Weight::ZERO, |acc, (voter, _)| {
            acc.saturating_add(table.get(*voter))
        })
}

proptest! {
    /// Applying any vote sequence keeps every branch total equal to the sum
    /// of the distribution weights of the voters last observed on it.
    #[test]
    fn totals_always_match_the_statement_map((weights, votes) in arb_votes()) {
        let table = distribution(&weights);
        let mut approvals = ApprovalWeights::new();

        for (issuer, branch) in votes {
            approvals.process_vote(
                Vote::new(VoterId::new(issuer), BranchId::new(branch)),
                &table,
            );

            for (branch, total) in approvals.branch_weights() {
                prop_assert_eq!(total, recomputed_weight(&approvals, &table, branch));
            }
        }
    }

    /// Simulating n statements and reverting the undo records in reverse
    /// order restores the starting state pointwise.
    #[test]
    fn reverse_undo_restores_initial_state((weights, votes) in arb_votes()) {
        let table = distribution(&weights);
        let mut approvals = ApprovalWeights::new();

        // Arbitrary starting point: half the sequence applied for real.
        let split = votes.len() / 2;
        for &(issuer, branch) in &votes[..split] {
            approvals.process_vote(
                Vote::new(VoterId::new(issuer), BranchId::new(branch)),
                &table,
            );
        }
        let before = approvals.clone();

        let mut undos = Vec::new();
        for &(issuer, branch) in &votes[split..] {
            undos.push(approvals.simulate_statement(
                VoterId::new(issuer),
                BranchId::new(branch),
                &table,
            ));
        }
        for undo in undos.into_iter().rev() {
            approvals.undo(undo);
        }

        prop_assert_eq!(approvals, before);
    }

    /// Re-sending an issuer's current statement never changes anything and
    /// never counts as processed.
    #[test]
    fn duplicate_statements_are_inert((weights, votes) in arb_votes()) {
        let table = distribution(&weights);
        let mut approvals = ApprovalWeights::new();

        for (issuer, branch) in votes {
            let vote = Vote::new(VoterId::new(issuer), BranchId::new(branch));
            approvals.process_vote(vote, &table);

            let before = approvals.clone();
            prop_assert!(!approvals.process_vote(vote, &table));
            prop_assert_eq!(&approvals, &before);
        }
    }
}
