//! The favored-branch rule.
//!
//! A voter favors the heaviest branch it knows — unless the weight gap
//! between the two heaviest branches is still within a tolerance that grows
//! with the time both have been pending. While the gap is inside the
//! tolerance, every honest voter deterministically endorses the
//! numerically-lower branch id, which dissolves adversarially sustained ties.

use crate::approval::ApprovalWeights;
use crate::branches::BranchRegistry;
use metabreak_types::{BranchId, Weight};
use std::time::{Duration, Instant};

/// Fraction of total stake the time-scaled tolerance grows toward.
pub const CONFIRMATION_THRESHOLD: f64 = 0.66;

/// The two branches with the highest current approval weight, as
/// `(largest, second_largest)`.
///
/// Equal-weight branches may swap slots between calls (the branch scanned
/// later replaces the incumbent at equal weight), so callers must treat ties
/// as unordered. Missing slots are [`BranchId::UNDEFINED`].
pub fn competing_branches(
    branches: &BranchRegistry,
    approvals: &ApprovalWeights,
) -> (BranchId, BranchId) {
    let mut largest = BranchId::UNDEFINED;
    let mut second = BranchId::UNDEFINED;
    let mut largest_weight = Weight::ZERO;
    let mut second_weight = Weight::ZERO;

    for branch in branches.branch_ids() {
        let weight = approvals.weight(branch);
        if weight >= largest_weight {
            second = largest;
            second_weight = largest_weight;
            largest = branch;
            largest_weight = weight;
        } else if weight >= second_weight {
            second = branch;
            second_weight = weight;
        }
    }

    (largest, second)
}

/// The branch this voter endorses next.
///
/// With fewer than two known branches the sole candidate (or
/// [`BranchId::UNDEFINED`]) wins outright. Otherwise, while the breaker is
/// enabled and the weight gap lies within the time-scaled tolerance, the
/// lower branch id wins; past the tolerance the heavier branch wins.
///
/// # Panics
///
/// Panics if a competing branch has no registry entry — votes register
/// branches before the rule can ever see them, so a missing entry is a
/// caller bug.
pub fn favored_branch(
    branches: &BranchRegistry,
    approvals: &ApprovalWeights,
    breaker_threshold: Duration,
    now: Instant,
) -> BranchId {
    favored_branch_with_offset(branches, approvals, breaker_threshold, now, Duration::ZERO)
}

/// [`favored_branch`] evaluated as if `offset` had already elapsed.
///
/// The offset exists for attackers probing "what would the rule say after my
/// next delay"; every normal evaluation passes zero.
pub fn favored_branch_with_offset(
    branches: &BranchRegistry,
    approvals: &ApprovalWeights,
    breaker_threshold: Duration,
    now: Instant,
    offset: Duration,
) -> BranchId {
    let (heaviest, second) = competing_branches(branches, approvals);
    if heaviest.is_undefined() || second.is_undefined() {
        return heaviest;
    }

    if !breaker_threshold.is_zero() {
        let gap = approvals.weight(heaviest).abs_diff(approvals.weight(second));
        let tolerance =
            time_scaling(branches, breaker_threshold, now + offset, heaviest, second)
                * CONFIRMATION_THRESHOLD;
        if gap.to_f64() <= tolerance {
            return heaviest.min(second);
        }
    }

    if approvals.weight(heaviest) > approvals.weight(second) {
        heaviest
    } else {
        second
    }
}

/// How long both branches have been pending: elapsed time since the later of
/// the two solidification stamps.
fn pending_time(
    branches: &BranchRegistry,
    at: Instant,
    branch_a: BranchId,
    branch_b: BranchId,
) -> Duration {
    let solidified_a = branches
        .info(branch_a)
        .expect("competing branch missing from registry")
        .solidified_at;
    let solidified_b = branches
        .info(branch_b)
        .expect("competing branch missing from registry")
        .solidified_at;

    at.saturating_duration_since(solidified_a.max(solidified_b))
}

/// Pending time as a fraction of the breaker threshold, capped at 1.
/// Evaluated in nanoseconds.
fn time_scaling(
    branches: &BranchRegistry,
    breaker_threshold: Duration,
    at: Instant,
    branch_a: BranchId,
    branch_b: BranchId,
) -> f64 {
    let pending = pending_time(branches, at, branch_a, branch_b);
    (pending.as_nanos() as f64 / breaker_threshold.as_nanos() as f64).min(1.0)
}
