//! Aggregated views of the conflict for resolution checks and rendering.

use crate::network::NetworkInner;
use metabreak_types::{BranchId, Weight};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Bucket for statements whose issuer is unknown to the voter registry
/// (the synthetic branch-seeding issuers).
const UNKNOWN_TAG: &str = "<None>";

/// Aggregate one honest voter's observed last-statements into
/// voter-type → branch → total weight rows.
///
/// Statements from unknown issuers land in the `"<None>"` bucket at zero
/// weight; `"<None>"` rows are dropped again for branches that at least one
/// known voter endorses, so the bucket only ever shows branches nobody real
/// is on.
pub(crate) fn approval_weight_by_voter_type(
    inner: &NetworkInner,
) -> HashMap<String, HashMap<BranchId, Weight>> {
    let mut by_type: HashMap<String, HashMap<BranchId, Weight>> = HashMap::new();

    let voters = inner.snapshot_voters();
    let Some(observer) = voters.iter().find(|voter| voter.is_honest()) else {
        return by_type;
    };

    let weights = inner.weights();
    let mut branches_with_known_voters: HashSet<BranchId> = HashSet::new();

    for (issuer, branch) in observer.last_statements() {
        let (tag, weight) = match voters.iter().find(|voter| voter.id() == issuer) {
            Some(known) => {
                branches_with_known_voters.insert(branch);
                (known.type_tag(), weights.get(issuer))
            }
            None => (UNKNOWN_TAG, Weight::ZERO),
        };

        let row = by_type.entry(tag.to_string()).or_default();
        let entry = row.entry(branch).or_insert(Weight::ZERO);
        *entry = entry.saturating_add(weight);
    }

    if let Some(rows) = by_type.get_mut(UNKNOWN_TAG) {
        rows.retain(|branch, _| !branches_with_known_voters.contains(branch));
    }

    by_type
}

/// Render the aggregation as an aligned `Voter | BranchID | Weight` table,
/// rows sorted by voter type then branch id for stable output.
pub(crate) fn render_table(
    f: &mut fmt::Formatter<'_>,
    by_type: &HashMap<String, HashMap<BranchId, Weight>>,
) -> fmt::Result {
    let mut rows: Vec<(&str, BranchId, Weight)> = Vec::new();
    for (tag, branches) in by_type {
        for (branch, weight) in branches {
            rows.push((tag, *branch, *weight));
        }
    }
    rows.sort_by(|a, b| a.0.cmp(b.0).then(a.1.cmp(&b.1)));

    let voter_width = rows
        .iter()
        .map(|(tag, _, _)| tag.len())
        .chain(["Voter".len()])
        .max()
        .unwrap_or(0);
    let branch_width = rows
        .iter()
        .map(|(_, branch, _)| branch.to_string().len())
        .chain(["BranchID".len()])
        .max()
        .unwrap_or(0);

    writeln!(
        f,
        "{:voter_width$}  {:branch_width$}  Weight",
        "Voter", "BranchID"
    )?;
    for (tag, branch, weight) in rows {
        writeln!(
            f,
            "{:voter_width$}  {:branch_width$}  {}",
            tag,
            branch.to_string(),
            weight
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::Network;
    use crate::voter::{new_honest_voter, new_minority_voter};
    use metabreak_types::{Vote, VoterId};
    use std::time::Duration;

    fn network() -> Network {
        let network = Network::with_breaker(Duration::from_secs(5));
        network
            .add_voters(2, new_honest_voter, |_| 0.1)
            .expect("honest registration");
        network
            .add_voters(1, new_minority_voter, |_| 0.2)
            .expect("attacker registration");
        network
    }

    #[test]
    fn empty_without_an_honest_observer() {
        let network = Network::with_breaker(Duration::from_secs(5));
        network
            .add_voters(1, new_minority_voter, |_| 0.2)
            .expect("registration");

        assert!(network.approval_weight_by_voter_type().is_empty());
    }

    #[test]
    fn rows_group_weight_by_type_and_branch() {
        let network = network();
        network
            .inner
            .publish(Vote::new(VoterId::new(1), BranchId::new(1)));
        network
            .inner
            .publish(Vote::new(VoterId::new(2), BranchId::new(1)));

        let by_type = network.approval_weight_by_voter_type();
        let honest = by_type.get("HonestVoter").expect("honest row");
        assert_eq!(honest.get(&BranchId::new(1)), Some(&Weight::from_f64(0.2)));

        // The minority voter reacted to the honest votes; its statement
        // shows up under its own tag from the observer's view.
        let minority = by_type.get("MinorityVoter").expect("minority row");
        assert_eq!(minority.values().count(), 1);
    }

    #[test]
    fn unknown_issuers_fill_the_none_bucket_until_claimed() {
        let network = network();

        // A synthetic issuer registers branch 9: nobody real is on it.
        let seed = network.inner.allocate_voter_id();
        network.inner.publish(Vote::new(seed, BranchId::new(9)));

        let by_type = network.approval_weight_by_voter_type();
        let unknown = by_type.get("<None>").expect("unknown bucket");
        assert_eq!(unknown.get(&BranchId::new(9)), Some(&Weight::ZERO));

        // Once a known voter endorses branch 9, the bucket row is pruned.
        network
            .inner
            .publish(Vote::new(VoterId::new(1), BranchId::new(9)));
        let by_type = network.approval_weight_by_voter_type();
        assert!(by_type
            .get("<None>")
            .map(|rows| !rows.contains_key(&BranchId::new(9)))
            .unwrap_or(true));
    }
}
