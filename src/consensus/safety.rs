//! Quorum-size formulas and the SafeNode predicate (C2).
//!
//! No real cryptography backs any of this: a QC's "signature" is the set of
//! voter ids it carries, and `qc_extends` stands in for chain-hash
//! extension by comparing `(view, value)` pairs instead.

use crate::types::{NodeState, QuorumCert};

/// `2*floor((n-1)/3) + 1`, the number of (weighted) votes a global QC needs.
pub fn global_quorum(n: u32) -> u32 {
    2 * ((n.saturating_sub(1)) / 3) + 1
}

/// `2*floor((group_size-1)/3) + 1`, the intra-group member threshold a
/// group leader waits for before emitting a `GroupVote`.
pub fn local_quorum(group_size: u32) -> u32 {
    2 * ((group_size.saturating_sub(1)) / 3) + 1
}

/// Whether `candidate` extends `base`: `base` absent always extends;
/// `candidate` absent while `base` is present never extends; otherwise
/// `candidate` must be from a strictly later view and carry the same value.
pub fn qc_extends(candidate: Option<&QuorumCert>, base: Option<&QuorumCert>) -> bool {
    match (candidate, base) {
        (_, None) => true,
        (None, Some(_)) => false,
        (Some(c), Some(b)) => c.view > b.view && c.value == b.value,
    }
}

/// The SafeNode predicate: may a replica holding `node` accept a proposal
/// of `(proposal_view, proposal_value)` justified by `proposal_qc`?
///
/// With no locked QC, anything is safe. Otherwise the proposal is safe if
/// it is from a strictly later view than the lock (liveness rule), or if
/// its justifying QC extends the lock (safety rule), or — absent a
/// justifying QC — if it simply repeats the locked value at or after the
/// locked view.
pub fn safe_node(
    node: &NodeState,
    proposal_view: u64,
    proposal_value: i64,
    proposal_qc: Option<&QuorumCert>,
) -> bool {
    let locked = match &node.locked_qc {
        None => return true,
        Some(locked) => locked,
    };

    if proposal_view > locked.view {
        return true;
    }

    if let Some(pqc) = proposal_qc {
        return qc_extends(Some(pqc), Some(locked));
    }

    proposal_value == locked.value && proposal_view >= locked.view
}

/// Classify `node_id` as honest or Byzantine given `m` faulty nodes out of
/// `n`, with `faulty_proposer` indicating whether node 0 — the designated
/// proposer role — is itself one of the faulty nodes.
///
/// Ported from the original `consensus_engine.is_honest`: a scenario-builder
/// helper, not something the live aggregator consults (votes are accepted
/// or rejected on their topological and safety merits, not on a node's
/// a-priori honesty label).
pub fn is_honest(node_id: u32, n: u32, m: u32, faulty_proposer: bool) -> bool {
    if m == 0 {
        return true;
    }
    if faulty_proposer {
        if node_id == 0 {
            false
        } else {
            node_id <= n - m
        }
    } else if node_id == 0 {
        true
    } else {
        node_id < n - m
    }
}
