//! Voters and their strategies.
//!
//! Every voter owns an isolated view of the conflict — its own branch
//! registry and approval weights, guarded by one lock so totals and
//! statements never diverge under observation. The honest behavior lives in
//! [`HonestCore`]; adversarial strategies wrap the same core and add a
//! reaction to processed votes or to the scheduler's before-next-vote hook.

use crate::network::{Network, NetworkInner};
use metabreak_consensus::{rule, ApprovalWeights, BranchRegistry};
use metabreak_types::{BranchId, Vote, VoterId, Weight};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::Instant;
use tracing::{debug, trace};

pub(crate) const HONEST_TAG: &str = "HonestVoter";

/// A voter's local view of the conflict.
#[derive(Debug, Default)]
struct LocalView {
    branches: BranchRegistry,
    approvals: ApprovalWeights,
}

/// State shared by every strategy: identity, the network back-reference,
/// and the locked local view.
struct HonestCore {
    id: VoterId,
    network: Weak<NetworkInner>,
    view: Mutex<LocalView>,
}

/// Which voting behavior a voter runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Strategy {
    /// Votes for the favored branch whenever its opinion changes.
    Honest,
    /// Counter-votes for the currently-second branch after every honest
    /// vote, sustaining a tie.
    Minority,
    /// Advertises `branch - 1` after every honest vote, exploiting the
    /// lower-id tiebreaker with ever-lower phantom branches.
    LowerHash,
    /// Simulates its own next vote under the scheduler delay and only casts
    /// when the rule would still fail to consolidate.
    SlowMinority,
}

impl Strategy {
    pub fn type_tag(&self) -> &'static str {
        match self {
            Strategy::Honest => HONEST_TAG,
            Strategy::Minority => "MinorityVoter",
            Strategy::LowerHash => "LowerHashVoter",
            Strategy::SlowMinority => "SlowMinorityVoter",
        }
    }
}

/// A registered participant: the honest core plus the strategy driving it.
pub struct Voter {
    core: HonestCore,
    strategy: Strategy,
}

/// Factory for [`Network::add_voters`]: an honest voter.
pub fn new_honest_voter(network: &Network) -> Voter {
    Voter::new(network, Strategy::Honest)
}

/// Factory for [`Network::add_voters`]: a tie-sustaining minority voter.
pub fn new_minority_voter(network: &Network) -> Voter {
    Voter::new(network, Strategy::Minority)
}

/// Factory for [`Network::add_voters`]: a lower-id phantom-branch voter.
pub fn new_lower_hash_voter(network: &Network) -> Voter {
    Voter::new(network, Strategy::LowerHash)
}

/// Factory for [`Network::add_voters`]: a delay-simulating minority voter.
pub fn new_slow_minority_voter(network: &Network) -> Voter {
    Voter::new(network, Strategy::SlowMinority)
}

impl Voter {
    fn new(network: &Network, strategy: Strategy) -> Self {
        Self {
            core: HonestCore {
                id: network.inner.allocate_voter_id(),
                network: Arc::downgrade(&network.inner),
                view: Mutex::new(LocalView::default()),
            },
            strategy,
        }
    }

    pub fn id(&self) -> VoterId {
        self.core.id
    }

    pub fn type_tag(&self) -> &'static str {
        self.strategy.type_tag()
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    pub fn is_honest(&self) -> bool {
        self.strategy == Strategy::Honest
    }

    /// Snapshot of the statements this voter has observed, one per issuer.
    pub fn last_statements(&self) -> HashMap<VoterId, BranchId> {
        self.core.view.lock().approvals.last_statements()
    }

    /// The approval weight this voter currently sees on a branch.
    pub fn approval_weight(&self, branch: BranchId) -> Weight {
        self.core.view.lock().approvals.weight(branch)
    }

    /// All branches this voter has registered locally.
    pub fn known_branches(&self) -> Vec<BranchId> {
        self.core.view.lock().branches.branch_ids().collect()
    }

    /// The branch this voter would endorse right now.
    pub fn favored_branch(&self) -> BranchId {
        let Some(net) = self.core.network.upgrade() else {
            return BranchId::UNDEFINED;
        };
        let view = self.core.view.lock();
        rule::favored_branch(
            &view.branches,
            &view.approvals,
            net.config.breaker_threshold,
            Instant::now(),
        )
    }

    /// Bus handler: feed the vote into the local view, then let the strategy
    /// react if the vote was actually processed.
    pub(crate) fn on_vote_received(&self, vote: Vote) {
        let Some(net) = self.core.network.upgrade() else {
            return;
        };

        let processed = {
            let weights = net.weights();
            let mut view = self.core.view.lock();
            view.branches.register(vote.branch, Instant::now());
            view.approvals.process_vote(vote, &weights)
        };

        if processed {
            self.react_to_processed(vote, &net);
        }
    }

    /// Scheduler tick: honest voters publish when their opinion changed.
    /// Reactive strategies do nothing here.
    pub(crate) fn send_vote(&self) -> bool {
        if self.strategy != Strategy::Honest {
            return false;
        }
        let Some(net) = self.core.network.upgrade() else {
            return false;
        };

        let favored = {
            let view = self.core.view.lock();
            let favored = rule::favored_branch(
                &view.branches,
                &view.approvals,
                net.config.breaker_threshold,
                Instant::now(),
            );
            let current = view
                .approvals
                .last_statement(self.core.id)
                .unwrap_or(BranchId::UNDEFINED);
            if favored == current {
                return false;
            }
            favored
        };

        debug!(voter = %self.core.id, branch = %favored, "opinion changed");
        net.publish(Vote::new(self.core.id, favored));
        true
    }

    fn react_to_processed(&self, vote: Vote, net: &Arc<NetworkInner>) {
        match self.strategy {
            Strategy::Honest | Strategy::SlowMinority => {}
            Strategy::Minority => {
                if net.is_honest(vote.issuer) {
                    let second = {
                        let view = self.core.view.lock();
                        rule::competing_branches(&view.branches, &view.approvals).1
                    };
                    trace!(attacker = %self.core.id, branch = %second, "queueing counter-vote");
                    net.enqueue(Vote::new(self.core.id, second));
                }
            }
            Strategy::LowerHash => {
                if net.is_honest(vote.issuer) {
                    // No lower bound: repeated application walks past the
                    // UNDEFINED sentinel into negative branch ids.
                    let lower = vote.branch.predecessor();
                    trace!(attacker = %self.core.id, branch = %lower, "queueing phantom branch");
                    net.enqueue(Vote::new(self.core.id, lower));
                }
            }
        }
    }

    /// Scheduler hook, fired for every voter just before `target` moves.
    ///
    /// The delay-simulating attacker predicts the mover's vote, records it
    /// and its own minority vote as hypotheticals, evaluates the rule one
    /// lookahead ahead, rolls both back, and only casts for real when the
    /// attack would not itself trip the breaker on the next turn.
    pub(crate) fn on_before_next_vote(&self, target: &Voter) {
        if self.strategy != Strategy::SlowMinority || !target.is_honest() {
            return;
        }
        let Some(net) = self.core.network.upgrade() else {
            return;
        };

        let threshold = net.config.breaker_threshold;
        let lookahead = net.config.attacker_lookahead;
        let now = Instant::now();

        let (minority, predicted_after, already_stated) = {
            let weights = net.weights();
            let mut view = self.core.view.lock();

            let predicted =
                rule::favored_branch(&view.branches, &view.approvals, threshold, now);
            let (largest, second) =
                rule::competing_branches(&view.branches, &view.approvals);
            let minority = if largest == predicted { second } else { largest };

            view.branches.register(predicted, now);
            let undo_target =
                view.approvals
                    .simulate_statement(target.id(), predicted, &weights);
            view.branches.register(minority, now);
            let undo_self =
                view.approvals
                    .simulate_statement(self.core.id, minority, &weights);

            let predicted_after = rule::favored_branch_with_offset(
                &view.branches,
                &view.approvals,
                threshold,
                now,
                lookahead,
            );

            view.approvals.undo(undo_self);
            view.approvals.undo(undo_target);

            let already_stated =
                view.approvals.last_statement(self.core.id) == Some(minority);
            (minority, predicted_after, already_stated)
        };

        if predicted_after != minority && !already_stated {
            debug!(attacker = %self.core.id, branch = %minority, "slow minority casts");
            net.publish(Vote::new(self.core.id, minority));
        } else {
            trace!(attacker = %self.core.id, branch = %minority, "slow minority holds");
        }
    }
}
