//! End-to-end attack scenarios.
//!
//! Each test wires a full network — honest voters plus one adversarial
//! strategy — seeds a conflict, and observes whether the honest population
//! consolidates onto a single branch within the observation window. The
//! scenarios run in real time against the 100 ms scheduler tick, so the
//! resolving cases poll with a generous 20 s cap and the sustained-tie cases
//! observe for 15 s before asserting.

use metabreak_sim::{
    init_run_logging, new_honest_voter, new_lower_hash_voter, new_minority_voter,
    new_slow_minority_voter, Network,
};
use metabreak_types::BranchId;
use std::time::Duration;

const BREAKER: Duration = Duration::from_secs(5);
const RESOLVE_WITHIN: Duration = Duration::from_secs(20);
const OBSERVE_FOR: Duration = Duration::from_secs(15);
const POLL_EVERY: Duration = Duration::from_millis(50);

/// Poll until the conflict resolves or the deadline passes.
async fn resolved_within(network: &Network, timeout: Duration) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if network.conflict_resolved() {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(POLL_EVERY).await;
    }
}

fn branches(ids: &[i64]) -> Vec<BranchId> {
    ids.iter().copied().map(BranchId::new).collect()
}

#[tokio::test(flavor = "multi_thread")]
async fn minority_voter_breaker_enabled() {
    init_run_logging();
    let network = Network::with_breaker(BREAKER);
    network
        .add_voters(8, new_honest_voter, |_| 0.1)
        .expect("honest registration");
    network
        .add_voters(1, new_minority_voter, |_| 0.2)
        .expect("attacker registration");
    network
        .resolve_conflicts(&branches(&[1, 2]))
        .expect("launch");

    assert!(
        resolved_within(&network, RESOLVE_WITHIN).await,
        "failed to resolve metastable state"
    );
    network.stop();
}

#[tokio::test(flavor = "multi_thread")]
async fn minority_voter_breaker_disabled() {
    init_run_logging();
    let network = Network::with_breaker(Duration::ZERO);
    network
        .add_voters(8, new_honest_voter, |_| 0.1)
        .expect("honest registration");
    network
        .add_voters(1, new_minority_voter, |_| 0.2)
        .expect("attacker registration");
    network
        .resolve_conflicts(&branches(&[1, 2]))
        .expect("launch");

    tokio::time::sleep(OBSERVE_FOR).await;

    assert!(
        !network.conflict_resolved(),
        "metastable state expected to be maintained"
    );
    network.stop();
}

#[tokio::test(flavor = "multi_thread")]
async fn lower_hash_voter_with_heaviest_weight() {
    init_run_logging();
    let network = Network::with_breaker(BREAKER);
    network
        .add_voters(8, new_honest_voter, |_| 0.1)
        .expect("honest registration");
    network
        .add_voters(1, new_lower_hash_voter, |_| 0.2)
        .expect("attacker registration");
    network
        .resolve_conflicts(&branches(&[1000]))
        .expect("launch");

    tokio::time::sleep(OBSERVE_FOR).await;

    assert!(
        !network.conflict_resolved(),
        "metastable state expected to be maintained"
    );
    network.stop();
}

#[tokio::test(flavor = "multi_thread")]
async fn lower_hash_voter_against_high_weight_honest_subset() {
    init_run_logging();
    let network = Network::with_breaker(BREAKER);
    network
        .add_voters(8, new_honest_voter, |id| {
            if id.as_u64() % 2 == 0 {
                0.16
            } else {
                0.1
            }
        })
        .expect("honest registration");
    network
        .add_voters(1, new_lower_hash_voter, |_| 0.15)
        .expect("attacker registration");
    network
        .resolve_conflicts(&branches(&[1000]))
        .expect("launch");

    assert!(
        resolved_within(&network, RESOLVE_WITHIN).await,
        "failed to resolve metastable state"
    );
    network.stop();
}

#[tokio::test(flavor = "multi_thread")]
async fn lower_hash_voter_with_low_weight() {
    init_run_logging();
    let network = Network::with_breaker(BREAKER);
    network
        .add_voters(8, new_honest_voter, |_| 0.1)
        .expect("honest registration");
    network
        .add_voters(1, new_lower_hash_voter, |_| 0.08)
        .expect("attacker registration");
    network
        .resolve_conflicts(&branches(&[1000]))
        .expect("launch");

    assert!(
        resolved_within(&network, RESOLVE_WITHIN).await,
        "failed to resolve metastable state"
    );
    network.stop();
}

#[tokio::test(flavor = "multi_thread")]
async fn slow_minority_voter_breaker_enabled() {
    init_run_logging();
    let network = Network::with_breaker(BREAKER);
    network
        .add_voters(18, new_honest_voter, |_| 0.05)
        .expect("honest registration");
    network
        .add_voters(1, new_slow_minority_voter, |_| 0.1)
        .expect("attacker registration");
    network
        .resolve_conflicts(&branches(&[1, 2]))
        .expect("launch");

    assert!(
        resolved_within(&network, RESOLVE_WITHIN).await,
        "failed to resolve metastable state"
    );
    network.stop();
}

#[tokio::test(flavor = "multi_thread")]
async fn seeding_determines_the_first_favored_branch() {
    init_run_logging();
    let network = Network::with_breaker(BREAKER);
    network
        .add_voters(2, new_honest_voter, |_| 0.1)
        .expect("honest registration");
    network
        .resolve_conflicts(&branches(&[1, 2]))
        .expect("launch");

    for voter in network.voters() {
        let favored = voter.favored_branch();
        assert!(
            favored == BranchId::new(1) || favored == BranchId::new(2),
            "favored branch {favored} is not one of the seeds"
        );
    }
    network.stop();
}
