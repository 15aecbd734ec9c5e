//! Per-voter branch registry with first-seen solidification stamps.

use metabreak_types::BranchId;
use std::collections::HashMap;
use std::time::Instant;

/// Metadata recorded when a voter first sees a branch. Write-once per key.
#[derive(Clone, Copy, Debug)]
pub struct BranchInfo {
    /// The instant this voter first registered the branch locally.
    pub solidified_at: Instant,
}

/// The set of branches a voter knows about.
#[derive(Clone, Debug, Default)]
pub struct BranchRegistry {
    info: HashMap<BranchId, BranchInfo>,
}

impl BranchRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a branch, stamping its solidification time on first sight.
    /// Idempotent: re-registering never moves the stamp. Returns whether the
    /// branch was new.
    pub fn register(&mut self, branch: BranchId, now: Instant) -> bool {
        match self.info.entry(branch) {
            std::collections::hash_map::Entry::Occupied(_) => false,
            std::collections::hash_map::Entry::Vacant(entry) => {
                entry.insert(BranchInfo { solidified_at: now });
                true
            }
        }
    }

    /// Metadata for a branch, if it has been registered.
    pub fn info(&self, branch: BranchId) -> Option<BranchInfo> {
        self.info.get(&branch).copied()
    }

    /// All registered branch ids, in no particular order.
    pub fn branch_ids(&self) -> impl Iterator<Item = BranchId> + '_ {
        self.info.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.info.len()
    }

    pub fn is_empty(&self) -> bool {
        self.info.is_empty()
    }
}
