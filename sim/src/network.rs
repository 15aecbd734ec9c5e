//! The simulated network: voter registry, synchronous vote broadcast, and
//! the periodic vote scheduler.
//!
//! The network is the only coupling between voters. It owns the voter
//! registry and the shared weight distribution; each voter holds a weak
//! back-reference used to consult the distribution and publish votes.
//! Delivery is a single-topic broadcast: every published vote reaches every
//! registered voter, in registration order. Votes that strategies emit
//! while a delivery is in flight land on an outgoing queue and are drained
//! once the current vote has reached everyone, keeping dispatch
//! non-reentrant.

use crate::config::SimConfig;
use crate::error::SimError;
use crate::logging;
use crate::report;
use crate::voter::Voter;
use metabreak_types::{BranchId, Vote, VoterId, Weight, WeightTable};
use parking_lot::{Mutex, RwLock, RwLockReadGuard};
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, trace, Instrument};

/// Handle to a simulated network. Cheap to clone; all clones share state.
#[derive(Clone)]
pub struct Network {
    pub(crate) inner: Arc<NetworkInner>,
}

pub(crate) struct NetworkInner {
    pub(crate) config: SimConfig,
    /// Voter → stake weight. Writes confined to the registration phase.
    weights: RwLock<WeightTable>,
    /// All registered voters, in registration (= delivery) order.
    voters: RwLock<Vec<Arc<Voter>>>,
    /// Votes emitted while a delivery was in flight.
    pending: Mutex<VecDeque<Vote>>,
    /// Network-scoped id counter; also serves the synthetic seed issuers.
    next_voter_id: AtomicU64,
    resolving: AtomicBool,
    stopped: AtomicBool,
    shutdown: broadcast::Sender<()>,
}

impl Network {
    pub fn new(config: SimConfig) -> Self {
        let (shutdown, _) = broadcast::channel(1);
        Self {
            inner: Arc::new(NetworkInner {
                config,
                weights: RwLock::new(WeightTable::new()),
                voters: RwLock::new(Vec::new()),
                pending: Mutex::new(VecDeque::new()),
                next_voter_id: AtomicU64::new(0),
                resolving: AtomicBool::new(false),
                stopped: AtomicBool::new(false),
                shutdown,
            }),
        }
    }

    /// Network with the given metastability-breaking threshold and default
    /// timings. Zero disables the breaker.
    pub fn with_breaker(threshold: std::time::Duration) -> Self {
        Self::new(SimConfig::with_breaker(threshold))
    }

    pub fn config(&self) -> &SimConfig {
        &self.inner.config
    }

    /// Construct and register `count` voters.
    ///
    /// Each voter gets a fresh id, the weight `weight_fn` assigns to that id,
    /// and a slot in the broadcast order. A voter is registered exactly once;
    /// registration after [`Network::stop`] is refused.
    pub fn add_voters<F, W>(&self, count: usize, factory: F, weight_fn: W) -> Result<(), SimError>
    where
        F: Fn(&Network) -> Voter,
        W: Fn(VoterId) -> f64,
    {
        if self.inner.stopped.load(Ordering::SeqCst) {
            return Err(SimError::NetworkStopped);
        }

        for _ in 0..count {
            let voter = Arc::new(factory(self));
            let id = voter.id();
            self.inner
                .weights
                .write()
                .set(id, Weight::from_f64(weight_fn(id)));
            self.inner.voters.write().push(voter);
            trace!(voter = %id, "voter registered");
        }
        Ok(())
    }

    /// Seed the conflict and launch the periodic vote scheduler.
    ///
    /// One synthetic vote per branch registers it with every voter and stamps
    /// its solidification time; the synthetic issuers have no weight-table
    /// entry, so they contribute no approval weight. The scheduler then ticks
    /// voters round-robin until [`Network::stop`] is called.
    pub fn resolve_conflicts(&self, branches: &[BranchId]) -> Result<(), SimError> {
        if self.inner.stopped.load(Ordering::SeqCst) {
            return Err(SimError::NetworkStopped);
        }
        if self.inner.resolving.swap(true, Ordering::SeqCst) {
            return Err(SimError::AlreadyResolving);
        }

        for &branch in branches {
            let issuer = self.inner.allocate_voter_id();
            debug!(%branch, %issuer, "seeding conflict branch");
            self.inner.publish(Vote::new(issuer, branch));
        }

        self.spawn_scheduler();
        Ok(())
    }

    fn spawn_scheduler(&self) {
        let inner = Arc::clone(&self.inner);
        let mut shutdown = inner.shutdown.subscribe();
        let span = logging::scheduler_span(&inner.config);

        let ticker = async move {
            debug!("vote scheduler started");
            loop {
                let voters = inner.snapshot_voters();
                if voters.is_empty() {
                    tokio::select! {
                        _ = tokio::time::sleep(inner.config.tick_interval) => continue,
                        _ = shutdown.recv() => {
                            debug!("vote scheduler stopped");
                            return;
                        }
                    }
                }
                for voter in &voters {
                    // The before-next-vote hook fires synchronously so
                    // observers see the mover's state exactly as send_vote
                    // will.
                    for observer in &voters {
                        observer.on_before_next_vote(voter);
                    }
                    voter.send_vote();

                    tokio::select! {
                        _ = tokio::time::sleep(inner.config.tick_interval) => {}
                        _ = shutdown.recv() => {
                            debug!("vote scheduler stopped");
                            return;
                        }
                    }
                }
            }
        };
        tokio::spawn(ticker.instrument(span));
    }

    /// Whether, from the view of one honest voter, some branch carries the
    /// approval weight of the entire honest population.
    ///
    /// Note the check is loose on purpose: it accepts agreement on *any*
    /// branch rather than pinning a particular winner.
    pub fn conflict_resolved(&self) -> bool {
        let by_type = report::approval_weight_by_voter_type(&self.inner);
        let Some(honest_rows) = by_type.get(crate::voter::HONEST_TAG) else {
            return false;
        };

        let expected = self.inner.total_honest_weight();
        honest_rows.values().any(|weight| *weight == expected)
    }

    /// One honest voter's observed last-statements, aggregated into
    /// voter-type → branch → total weight rows.
    pub fn approval_weight_by_voter_type(&self) -> HashMap<String, HashMap<BranchId, Weight>> {
        report::approval_weight_by_voter_type(&self.inner)
    }

    /// Snapshot of the registered voters, in delivery order.
    pub fn voters(&self) -> Vec<Arc<Voter>> {
        self.inner.snapshot_voters()
    }

    /// Stop the scheduler and refuse further registration.
    pub fn stop(&self) {
        if self.inner.stopped.swap(true, Ordering::SeqCst) {
            return;
        }
        let _ = self.inner.shutdown.send(());
        debug!("network stopped");
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        report::render_table(f, &report::approval_weight_by_voter_type(&self.inner))
    }
}

impl NetworkInner {
    pub(crate) fn allocate_voter_id(&self) -> VoterId {
        VoterId::new(self.next_voter_id.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub(crate) fn weights(&self) -> RwLockReadGuard<'_, WeightTable> {
        self.weights.read()
    }

    pub(crate) fn snapshot_voters(&self) -> Vec<Arc<Voter>> {
        self.voters.read().clone()
    }

    pub(crate) fn is_honest(&self, id: VoterId) -> bool {
        self.voters
            .read()
            .iter()
            .any(|voter| voter.id() == id && voter.is_honest())
    }

    fn total_honest_weight(&self) -> Weight {
        let voters = self.snapshot_voters();
        let weights = self.weights();
        voters
            .iter()
            .filter(|voter| voter.is_honest())
            .fold(Weight::ZERO, |acc, voter| {
                acc.saturating_add(weights.get(voter.id()))
            })
    }

    /// Queue a vote for delivery once the in-flight vote (if any) has
    /// reached every voter.
    pub(crate) fn enqueue(&self, vote: Vote) {
        self.pending.lock().push_back(vote);
    }

    /// Publish a vote and drain the outgoing queue, including votes that
    /// strategies emit in reaction to the ones being delivered.
    pub(crate) fn publish(&self, vote: Vote) {
        self.enqueue(vote);
        self.dispatch_pending();
    }

    fn dispatch_pending(&self) {
        loop {
            let next = self.pending.lock().pop_front();
            let Some(vote) = next else { break };
            self.deliver(vote);
        }
    }

    fn deliver(&self, vote: Vote) {
        trace!(%vote, "delivering");
        for voter in self.snapshot_voters() {
            voter.on_vote_received(vote);
        }
    }
}
