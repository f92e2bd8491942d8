//! Two-level vote aggregator (C4).
//!
//! Member votes accumulate into an intra-group pool keyed by group leader;
//! once that pool reaches the local quorum, a single synthetic `GroupVote`
//! is produced and immediately fed back into the global pool as if it were
//! a vote cast by the group leader itself. Group-leader and root votes go
//! straight into the global pool. Reaching the global quorum produces a QC
//! and advances the session's phase.

use std::collections::BTreeSet;

use chrono::Utc;

use super::{pipeline, safety, topology};
use crate::consensus::topology::Role;
use crate::session::state::{Contribution, Session, VoteTally};
use crate::types::{Message, MessageHeader, Phase, QuorumCert, Recipient, Vote};

pub enum VoteOutcome {
    Buffered,
    Ignored,
    InvalidTarget,
    Pending,
    /// Quorum for this `(view, phase, value)` was already reached and the
    /// session has moved on; the vote is recorded but produces nothing.
    PhaseDrift,
    GroupVoteGenerated { group_vote: Box<Vote> },
    QcGenerated {
        qc_message: Box<crate::types::Qc>,
        routing: pipeline::Routing,
    },
}

/// Entry point for any vote, whether cast directly by a member/group-leader
/// robot or submitted by an external client.
pub fn process_vote(session: &mut Session, vote: Vote) -> VoteOutcome {
    let view = vote.header.view;
    if view > session.current_view {
        session.buffer.buffer_vote(view, Message::Vote(vote));
        return VoteOutcome::Buffered;
    }
    if view < session.current_view {
        return VoteOutcome::Ignored;
    }

    let voter = vote.header.from;
    let info = topology::resolve(view, voter, session.config.node_count, session.config.branch_count);
    match info.role {
        Role::Member => process_member_vote(session, voter, info.parent.unwrap(), info.group_size.unwrap_or(1), vote),
        Role::GroupLeader | Role::Root => process_global_vote(session, vote),
    }
}

fn process_member_vote(
    session: &mut Session,
    _voter: u32,
    group_leader_id: u32,
    group_size: u32,
    vote: Vote,
) -> VoteOutcome {
    let Recipient::Node(target) = vote.header.to else {
        return VoteOutcome::InvalidTarget;
    };
    if target != group_leader_id {
        return VoteOutcome::InvalidTarget;
    }

    let view = vote.header.view;
    let key = (view, vote.phase, vote.value, group_leader_id);
    let set = session.pending_group_votes.entry(key).or_default();
    set.insert(vote.header.from);

    let threshold = safety::local_quorum(group_size);
    if (set.len() as u32) < threshold {
        return VoteOutcome::Pending;
    }

    let voters: BTreeSet<u32> = set.clone();
    let global_leader_id = topology::leader(view, session.config.node_count);
    let group_vote = Vote {
        header: MessageHeader {
            from: group_leader_id,
            to: Recipient::Node(global_leader_id),
            view,
            round: session.current_round,
            timestamp: Utc::now(),
        },
        phase: vote.phase,
        value: vote.value,
        is_group_vote: true,
        weight: voters.len() as u32,
        group_voters: Some(voters),
    };
    session.messages.vote.push(group_vote.clone());
    session.network_stats.group_votes_emitted += 1;

    match process_global_vote(session, group_vote.clone()) {
        qc @ VoteOutcome::QcGenerated { .. } => qc,
        _ => VoteOutcome::GroupVoteGenerated {
            group_vote: Box::new(group_vote),
        },
    }
}

fn process_global_vote(session: &mut Session, vote: Vote) -> VoteOutcome {
    let view = vote.header.view;
    let n = session.config.node_count;
    let global_leader_id = topology::leader(view, n);

    let Recipient::Node(target) = vote.header.to else {
        return VoteOutcome::InvalidTarget;
    };
    if target != global_leader_id {
        return VoteOutcome::InvalidTarget;
    }

    let key = (view, vote.phase, vote.value);
    let weight = if vote.is_group_vote { vote.weight } else { 1 };
    let voter_ids = vote
        .group_voters
        .clone()
        .unwrap_or_else(|| BTreeSet::from([vote.header.from]));

    let tally = session.pending_votes.entry(key).or_insert_with(VoteTally::default);
    tally.total_weight += weight;
    tally.contributions.push(Contribution {
        from: vote.header.from,
        weight,
        voter_ids,
    });

    let threshold = safety::global_quorum(n);
    if tally.total_weight < threshold {
        return VoteOutcome::Pending;
    }

    if session.phase != vote.phase {
        return VoteOutcome::PhaseDrift;
    }

    let mut signers = BTreeSet::new();
    for contribution in &tally.contributions {
        signers.extend(contribution.voter_ids.iter().copied());
    }
    let total_weight = tally.total_weight;

    let qc = QuorumCert {
        phase: vote.phase,
        view,
        value: vote.value,
        signers,
        total_weight,
        is_multi_layer: true,
    };
    let next_phase = vote.phase.next();
    session.phase = next_phase;
    session.phase_step += 1;
    session.network_stats.qcs_emitted += 1;

    let qc_message = crate::types::Qc {
        header: MessageHeader {
            from: global_leader_id,
            to: Recipient::GroupLeaders,
            view,
            round: session.current_round,
            timestamp: Utc::now(),
        },
        phase: vote.phase,
        next_phase,
        qc,
    };
    session.messages.qc.push(qc_message.clone());

    let routing = pipeline::compute_routing(n, session.config.branch_count, view);
    VoteOutcome::QcGenerated {
        qc_message: Box::new(qc_message),
        routing,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vote(from: u32, to: u32, view: u64, phase: Phase, value: i64) -> Vote {
        Vote {
            header: MessageHeader {
                from,
                to: Recipient::Node(to),
                view,
                round: 0,
                timestamp: Utc::now(),
            },
            phase,
            value,
            is_group_vote: false,
            weight: 1,
            group_voters: None,
        }
    }

    fn session(node_count: u32, branch_count: u32) -> Session {
        let mut cfg = crate::types::SessionConfig::default();
        cfg.node_count = node_count;
        cfg.branch_count = branch_count;
        let mut s = Session::new("test".into(), cfg);
        s.phase = Phase::Prepare;
        s
    }

    #[test]
    fn member_votes_below_local_quorum_stay_pending() {
        let mut s = session(7, 1);
        // single group (branch_count=1): group_size = 7, local_quorum = 2*floor(6/3)+1 = 5
        let outcome = process_member_vote(&mut s, 1, 0, 7, vote(1, 0, 0, Phase::Prepare, 1));
        assert!(matches!(outcome, VoteOutcome::Pending));
    }

    #[test]
    fn four_node_two_group_topology_reaches_global_quorum_on_prepare() {
        let mut s = session(4, 2);
        // node 1 (member of leader's own group, parent=0)
        let o1 = process_vote(&mut s, vote(1, 0, 0, Phase::Prepare, 1));
        assert!(matches!(o1, VoteOutcome::GroupVoteGenerated { .. }) || matches!(o1, VoteOutcome::QcGenerated { .. }));
        // node 2 (group leader of group1) votes directly to leader 0; still short of quorum
        let o2 = process_vote(&mut s, vote(2, 0, 0, Phase::Prepare, 1));
        assert!(matches!(o2, VoteOutcome::Pending));
        // node 3 (member of group1, parent=2) pushes node 2's group over local quorum
        let o3 = process_vote(&mut s, vote(3, 2, 0, Phase::Prepare, 1));
        assert!(matches!(o3, VoteOutcome::QcGenerated { .. }));
        if let VoteOutcome::QcGenerated { qc_message, .. } = o3 {
            assert_eq!(qc_message.qc.signer_count(), 3);
            assert_eq!(qc_message.qc.total_weight, 3);
        }
    }

    #[test]
    fn wrong_target_is_rejected() {
        let mut s = session(4, 2);
        let outcome = process_vote(&mut s, vote(2, 1, 0, Phase::Prepare, 1));
        assert!(matches!(outcome, VoteOutcome::InvalidTarget));
    }
}
