//! Robot agent (C8): the simulated participants the server votes on behalf
//! of so a session can run to completion without a human operating every
//! node's client.
//!
//! Robots are server-local, not network peers — they observe the session's
//! state directly rather than through the delivery-gated transport, so
//! their reception of a proposal is unconditional once it has been
//! emitted. Only the pacing delay before a robot actually casts its vote
//! is timer-driven; that delay lives in `session::driver`, not here.

use crate::consensus::topology::{self, Role};
use crate::session::state::Session;
use crate::types::{MessageHeader, Phase, Recipient, RobotNodeState, Vote};
use chrono::Utc;

/// Reset every robot's per-view scratch flags. Called on a view change and
/// on the start of a fresh round (the two share the exact same reset).
pub fn reset_for_view_change(session: &mut Session) {
    for &id in session.robot_nodes.clone().iter() {
        session.robot_node_states.insert(id, RobotNodeState::default());
    }
}

pub fn reset_for_new_round(session: &mut Session) {
    reset_for_view_change(session);
}

/// Mark every robot except `proposer_id` as having received the current
/// proposal. Robots are in-process, so this happens regardless of whether
/// the hierarchical broadcast's delivery gate would have reached them.
pub fn mark_all_received(session: &mut Session, proposer_id: u32) {
    for &id in session.robot_nodes.clone().iter() {
        if id == proposer_id {
            continue;
        }
        session.robot_node_states.entry(id).or_default().received_pre_prepare = true;
    }
}

/// Synthesize `robot_id`'s vote for `(phase, value)` at the session's
/// current view, addressed to its topological parent. Returns `None` for a
/// root-role robot — the Leader never votes on its own proposal.
pub fn generate_vote(session: &mut Session, robot_id: u32, phase: Phase, value: i64) -> Option<Vote> {
    let view = session.current_view;
    let info = topology::resolve(view, robot_id, session.config.node_count, session.config.branch_count);
    if info.role == Role::Root {
        return None;
    }
    let target = info.parent?;
    let vote = Vote {
        header: MessageHeader {
            from: robot_id,
            to: Recipient::Node(target),
            view,
            round: session.current_round,
            timestamp: Utc::now(),
        },
        phase,
        value,
        is_group_vote: false,
        weight: 1,
        group_voters: None,
    };
    session.messages.vote.push(vote.clone());
    Some(vote)
}

/// Generate votes for every non-Leader, non-root robot at `view`. Used for
/// the pre-commit and commit phase advances, which are not gated on
/// proposal reception the way the initial prepare vote is.
pub fn generate_votes_for_phase(session: &mut Session, view: u64, phase: Phase, value: i64) -> Vec<Vote> {
    let leader_id = topology::leader(view, session.config.node_count);
    let robots: Vec<u32> = session.robot_nodes.iter().copied().collect();
    let mut votes = Vec::new();
    for robot_id in robots {
        if robot_id == leader_id {
            continue;
        }
        let info = topology::resolve(view, robot_id, session.config.node_count, session.config.branch_count);
        if info.role == Role::Root {
            continue;
        }
        if let Some(vote) = generate_vote(session, robot_id, phase, value) {
            votes.push(vote);
        }
    }
    votes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SessionConfig;

    fn session() -> Session {
        let mut cfg = SessionConfig::default();
        cfg.node_count = 4;
        cfg.robot_nodes = 4;
        Session::new("t".into(), cfg)
    }

    #[test]
    fn leader_never_votes_for_its_own_proposal() {
        let mut s = session();
        assert!(generate_vote(&mut s, 0, Phase::Prepare, 1).is_none());
    }

    #[test]
    fn non_root_robots_vote_to_their_parent() {
        let mut s = session();
        let vote = generate_vote(&mut s, 3, Phase::Prepare, 1).unwrap();
        assert_eq!(vote.header.to, Recipient::Node(2));
    }

    #[test]
    fn phase_advance_skips_leader_and_root() {
        let mut s = session();
        let votes = generate_votes_for_phase(&mut s, 0, Phase::PreCommit, 1);
        assert_eq!(votes.len(), 3);
        assert!(votes.iter().all(|v| v.header.from != 0));
    }
}
