//! View-change / liveness engine (C6).
//!
//! On a view timeout every node (conceptually) emits a NEW-VIEW message
//! carrying its `highQC`; once the new leader has collected a global
//! quorum of these, it proposes using whichever carried the highest view.

use chrono::Utc;

use super::{safety, topology};
use crate::robot;
use crate::session::state::Session;
use crate::types::{MessageHeader, NewView, QuorumCert, Recipient};

pub struct ViewChangeOutcome {
    pub old_view: u64,
    pub new_view: u64,
    pub new_leader: u32,
}

/// Bump the view, reset robot scratch state, and synthesize a NEW-VIEW
/// message for every node (logged unconditionally; counted and pooled
/// toward the new leader's quorum for every node except the new leader
/// itself, who does not need to hear from itself).
pub fn on_view_timeout(session: &mut Session) -> ViewChangeOutcome {
    let old_view = session.current_view;
    let new_view = old_view + 1;
    session.current_view = new_view;
    session.network_stats.view_changes += 1;
    robot::reset_for_view_change(session);

    let new_leader = topology::leader(new_view, session.config.node_count);
    for node_id in 0..session.config.node_count {
        let high_qc = session.node_state(node_id).high_qc.clone();
        let message = NewView {
            header: MessageHeader {
                from: node_id,
                to: Recipient::Node(new_leader),
                view: new_view,
                round: session.current_round,
                timestamp: Utc::now(),
            },
            old_view,
            high_qc,
        };
        session.messages.new_view.push(message.clone());
        if node_id != new_leader {
            session.network_stats.total_messages_sent += 1;
            session
                .pending_new_views
                .entry(new_view)
                .or_default()
                .insert(node_id, message);
        }
    }

    ViewChangeOutcome {
        old_view,
        new_view,
        new_leader,
    }
}

/// Check whether `new_view`'s pending pool has reached a global quorum.
/// Returns `None` if not yet, or `Some(high_qc)` — the highest-view
/// `highQC` seen, ties broken toward the lowest node id — once it has.
pub fn start_new_view_consensus(session: &Session, new_view: u64) -> Option<Option<QuorumCert>> {
    let n = session.config.node_count;
    let threshold = safety::global_quorum(n);
    let collected = session.pending_new_views.get(&new_view)?;
    if (collected.len() as u32) < threshold {
        return None;
    }

    let mut best: Option<&QuorumCert> = None;
    for message in collected.values() {
        if let Some(candidate) = &message.high_qc {
            let is_better = match best {
                None => true,
                Some(current) => candidate.view > current.view,
            };
            if is_better {
                best = Some(candidate);
            }
        }
    }
    Some(best.cloned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SessionConfig;

    #[test]
    fn timeout_bumps_view_and_excludes_new_leader_from_pool() {
        let mut cfg = SessionConfig::default();
        cfg.node_count = 4;
        let mut s = Session::new("t".into(), cfg);
        let outcome = on_view_timeout(&mut s);
        assert_eq!(outcome.new_view, 1);
        assert_eq!(outcome.new_leader, 1);
        assert!(!s.pending_new_views[&1].contains_key(&1));
        assert_eq!(s.pending_new_views[&1].len(), 3);
    }

    #[test]
    fn quorum_not_reached_returns_none() {
        let mut cfg = SessionConfig::default();
        cfg.node_count = 7;
        let mut s = Session::new("t".into(), cfg);
        s.current_view = 1;
        // only one of the five required NEW-VIEWs has arrived
        s.pending_new_views.entry(1).or_default().insert(
            0,
            NewView {
                header: MessageHeader {
                    from: 0,
                    to: Recipient::Node(1),
                    view: 1,
                    round: 0,
                    timestamp: Utc::now(),
                },
                old_view: 0,
                high_qc: None,
            },
        );
        assert!(start_new_view_consensus(&s, 1).is_none());
    }
}
