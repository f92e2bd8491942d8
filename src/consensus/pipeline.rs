//! Proposal and QC pipeline (C5): PRE-PREPARE emission, replica reception
//! of a proposal, replica reception of a QC, and the hierarchical broadcast
//! that fans either one out across the two-level tree.

use std::collections::BTreeMap;

use chrono::Utc;

use super::{node_state, safety, topology};
use crate::network_sim::NetworkSimulator;
use crate::session::state::Session;
use crate::types::{Message, MessageHeader, PrePrepare, QuorumCert, Recipient};

/// Targets a hierarchical broadcast addresses at a given view: the group
/// leaders the Leader unicasts to directly, and each group leader's own
/// members, reached through a second hop.
#[derive(Clone, Debug, Default)]
pub struct Routing {
    pub global_leader: u32,
    pub group_leaders: Vec<u32>,
    pub members_by_group_leader: BTreeMap<u32, Vec<u32>>,
}

/// Compute the fan-out targets for `view`. A group whose start coincides
/// with the current Leader is skipped entirely — the Leader's own group is
/// not forwarded to by anyone, matching the original routing computation
/// (see DESIGN.md for the consequence this has on who can vote in view 0
/// of a two-group topology).
pub fn compute_routing(n: u32, branch_count: u32, view: u64) -> Routing {
    let leader_id = topology::leader(view, n);
    let k = branch_count.max(1);
    let group_size = (n / k).max(1);

    let mut group_leaders = Vec::new();
    for g in 0..k {
        let start = g * group_size;
        if start < n && start != leader_id {
            group_leaders.push(start);
        }
    }

    let mut members_by_group_leader = BTreeMap::new();
    for &gl in &group_leaders {
        let info = topology::resolve(view, gl, n, k);
        let group_id = info.group_id.expect("group leader always has a group id");
        let start = group_id * group_size;
        let end = ((group_id + 1) * group_size).min(n);
        let members: Vec<u32> = (start + 1..end).collect();
        members_by_group_leader.insert(gl, members);
    }

    Routing {
        global_leader: leader_id,
        group_leaders,
        members_by_group_leader,
    }
}

/// Emit a new PRE-PREPARE for the session's current view, de-duplicating
/// against a view that has already seen one. Used when the current Leader
/// is robot-controlled and proposes automatically.
pub fn emit_pre_prepare(session: &mut Session, high_qc: Option<QuorumCert>) -> Option<PrePrepare> {
    let view = session.current_view;
    if session.last_pre_prepare_view == Some(view) {
        return None;
    }
    let leader_id = session.leader_id();
    let value = high_qc
        .as_ref()
        .map(|qc| qc.value)
        .unwrap_or(session.config.proposal_value);

    let message = PrePrepare {
        header: MessageHeader {
            from: leader_id,
            to: Recipient::GroupLeaders,
            view,
            round: session.current_round,
            timestamp: Utc::now(),
        },
        value,
        qc: high_qc,
        tampered: false,
    };

    session.last_pre_prepare_view = Some(view);
    session.messages.pre_prepare.push(message.clone());
    session.phase = crate::types::Phase::Prepare;
    session.current_proposal_value = Some(value);
    Some(message)
}

pub enum ProposalOutcome {
    Buffered,
    Ignored,
    WrongSender,
    SafetyViolation,
    Accepted,
}

/// A single replica's reception of a PRE-PREPARE: buffer it if it is ahead
/// of the replica's view, reject a sender that is not the expected Leader,
/// then run the SafeNode predicate against that replica's own lock.
pub fn handle_proposal(session: &mut Session, node_id: u32, msg: &PrePrepare) -> ProposalOutcome {
    let view = msg.header.view;
    if view > session.current_view {
        session
            .buffer
            .buffer_proposal(node_id, view, Message::PrePrepare(msg.clone()));
        return ProposalOutcome::Buffered;
    }
    if view < session.current_view {
        return ProposalOutcome::Ignored;
    }
    let leader_id = topology::leader(view, session.config.node_count);
    if msg.header.from != leader_id {
        return ProposalOutcome::WrongSender;
    }
    let state = session.node_state(node_id);
    if !safety::safe_node(state, view, msg.value, msg.qc.as_ref()) {
        return ProposalOutcome::SafetyViolation;
    }
    ProposalOutcome::Accepted
}

/// Apply a received QC to one node's safety state: `prepareQC` always, and
/// `lockedQC` only when the QC is a commit-phase certificate.
pub fn apply_qc_to_node(state: &mut crate::types::NodeState, qc: &QuorumCert) {
    node_state::update_prepare_qc(state, qc);
    if qc.phase == crate::types::Phase::Commit {
        node_state::update_locked_qc(state, qc);
    }
}

pub fn apply_qc_to_all(session: &mut Session, qc: &QuorumCert) {
    for state in session.node_states.iter_mut() {
        apply_qc_to_node(state, qc);
    }
}

/// Fan a message out across the two-level tree: one unicast per group
/// leader, then one unicast per member of each group leader. Every target
/// (reachable or not) increments `network_stats.total_messages_sent`
/// before the delivery gate is consulted — the gate only decides whether
/// `on_target` is told the send was delivered, it never suppresses the
/// count.
pub fn broadcast_hierarchical(
    session: &mut Session,
    net: &mut NetworkSimulator,
    view: u64,
    mut on_target: impl FnMut(&mut Session, u32, bool),
) {
    let n = session.config.node_count;
    let k = session.config.branch_count;
    let rate = session.config.message_delivery_rate;
    let routing = compute_routing(n, k, view);

    for &gl in &routing.group_leaders {
        session.network_stats.total_messages_sent += 1;
        let delivered = net.should_deliver(rate);
        on_target(session, gl, delivered);
    }
    for (&gl, members) in &routing.members_by_group_leader {
        for &member in members {
            session.network_stats.total_messages_sent += 1;
            let delivered = net.should_deliver(rate);
            on_target(session, member, delivered);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn routing_skips_the_leaders_own_group() {
        let routing = compute_routing(4, 2, 0);
        assert_eq!(routing.group_leaders, vec![2]);
        assert_eq!(routing.members_by_group_leader.get(&2), Some(&vec![3]));
    }

    #[test]
    fn routing_rotates_with_the_leader() {
        let routing = compute_routing(4, 2, 1);
        // leader is now node 1; group0 (start 0) is no longer the leader's group.
        assert!(routing.group_leaders.contains(&0));
    }
}
