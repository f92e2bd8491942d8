//! Session driver (C10): the synchronous core of a running consensus
//! instance.
//!
//! `SessionDriver` owns the `Session` state and a `NetworkSimulator`, and
//! mutates them in response to inbound messages and timer wakes. It never
//! spawns a task or starts a clock itself — every such need comes back out
//! as an `Effect` for the caller (an async actor, or a test) to act on.

use crate::consensus::{aggregator, pipeline, topology, view_change, VoteOutcome};
use crate::network_sim::NetworkSimulator;
use crate::robot;
use crate::session::effects::{Effect, RouteOutcome};
use crate::session::state::{Session, SessionStatus};
use crate::types::{Message, NetworkStats, Phase, PrePrepare, Recipient, SessionConfig, Vote};
use crate::{consensus, finalize};

const VIEW_TIMEOUT_MS: u64 = 5_000;
const ROBOT_VOTE_DELAY_MS: u64 = 300;
const NEXT_ROUND_DELAY_MS: u64 = 1_500;

pub struct SessionDriver {
    session: Session,
    net: NetworkSimulator,
}

impl SessionDriver {
    pub fn new(id: String, config: SessionConfig) -> Self {
        Self {
            session: Session::new(id, config),
            net: NetworkSimulator::new(),
        }
    }

    /// Deterministic constructor for tests and reproducible demo runs.
    pub fn with_seed(id: String, config: SessionConfig, seed: u64) -> Self {
        Self {
            session: Session::new(id, config),
            net: NetworkSimulator::with_seed(seed),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    fn is_malicious_leader(&self, leader_id: u32) -> bool {
        leader_id == 0 && self.session.config.malicious_proposer
    }

    fn leader_should_auto_propose(&self) -> bool {
        let leader_id = self.session.leader_id();
        self.session.robot_nodes.contains(&leader_id) && !self.is_malicious_leader(leader_id)
    }

    /// Arm the first view timer and, if the initial Leader is a
    /// well-behaved robot, immediately propose.
    pub fn start(&mut self) -> Vec<Effect> {
        self.session.status = SessionStatus::Running;
        let mut effects = vec![Effect::ArmViewTimer {
            view: self.session.current_view,
            duration_ms: VIEW_TIMEOUT_MS,
        }];
        if self.leader_should_auto_propose() {
            effects.extend(self.propose());
        }
        effects
    }

    /// Emit a PRE-PREPARE for the current view from the current Leader.
    /// No-op if a proposal has already gone out for this view.
    pub fn propose(&mut self) -> Vec<Effect> {
        let view = self.session.current_view;
        let leader_id = self.session.leader_id();
        let high_qc = self.session.node_state(leader_id).high_qc.clone();
        match pipeline::emit_pre_prepare(&mut self.session, high_qc) {
            Some(pre_prepare) => self.finish_pre_prepare_propagation(leader_id, view, pre_prepare),
            None => Vec::new(),
        }
    }

    /// Route one inbound message to the handler for its kind.
    pub fn handle_inbound(&mut self, message: Message) -> (RouteOutcome, Vec<Effect>) {
        match message {
            Message::PrePrepare(msg) => self.handle_pre_prepare(msg),
            Message::Vote(vote) => self.feed_vote(vote),
            Message::Qc(_) => (RouteOutcome::Accepted, Vec::new()),
            Message::NewView(_) => (RouteOutcome::Ignored, Vec::new()),
        }
    }

    fn handle_pre_prepare(&mut self, msg: PrePrepare) -> (RouteOutcome, Vec<Effect>) {
        let view = msg.header.view;
        if view > self.session.current_view {
            self.session
                .buffer
                .buffer_proposal(msg.header.from, view, Message::PrePrepare(msg));
            return (RouteOutcome::Buffered, Vec::new());
        }
        if view < self.session.current_view {
            return (RouteOutcome::Ignored, Vec::new());
        }
        if self.session.last_pre_prepare_view == Some(view) {
            return (RouteOutcome::DeDuplicated, Vec::new());
        }
        let leader_id = self.session.leader_id();
        if msg.header.from != leader_id {
            return (RouteOutcome::WrongSender, Vec::new());
        }

        self.session.messages.pre_prepare.push(msg.clone());
        self.session.last_pre_prepare_view = Some(view);
        self.session.phase = Phase::Prepare;
        self.session.current_proposal_value = Some(msg.value);

        let effects = self.finish_pre_prepare_propagation(leader_id, view, msg);
        (RouteOutcome::Accepted, effects)
    }

    /// Broadcast a just-accepted PRE-PREPARE through the hierarchy, mark
    /// every robot as having received it unconditionally, and schedule the
    /// non-leader robots' prepare votes.
    fn finish_pre_prepare_propagation(
        &mut self,
        proposer: u32,
        view: u64,
        pre_prepare: PrePrepare,
    ) -> Vec<Effect> {
        let mut effects = Vec::new();
        {
            let session = &mut self.session;
            let net = &mut self.net;
            pipeline::broadcast_hierarchical(session, net, view, |_session, target, delivered| {
                if delivered {
                    effects.push(Effect::Send {
                        to: Recipient::Node(target),
                        message: Message::PrePrepare(pre_prepare.clone()),
                    });
                }
            });
        }

        robot::mark_all_received(&mut self.session, proposer);

        let n = self.session.config.node_count;
        let k = self.session.config.branch_count;
        for &robot_id in self.session.robot_nodes.clone().iter() {
            if robot_id == proposer {
                continue;
            }
            let info = topology::resolve(view, robot_id, n, k);
            if info.role == consensus::Role::Root {
                continue;
            }
            effects.push(Effect::ScheduleRobotPrepare {
                robot_id,
                view,
                delay_ms: ROBOT_VOTE_DELAY_MS,
            });
        }
        effects.push(Effect::Persist);
        effects
    }

    /// Feed a cast vote (human or robot) into the two-level aggregator.
    pub fn feed_vote(&mut self, vote: Vote) -> (RouteOutcome, Vec<Effect>) {
        let view = vote.header.view;
        match aggregator::process_vote(&mut self.session, vote) {
            VoteOutcome::Buffered => (RouteOutcome::Buffered, Vec::new()),
            VoteOutcome::Ignored => (RouteOutcome::Ignored, Vec::new()),
            VoteOutcome::InvalidTarget => (RouteOutcome::InvalidTarget, Vec::new()),
            VoteOutcome::Pending => (RouteOutcome::Pending, Vec::new()),
            VoteOutcome::PhaseDrift => (RouteOutcome::PhaseDrift, Vec::new()),
            VoteOutcome::GroupVoteGenerated { .. } => {
                (RouteOutcome::GroupVoteGenerated, vec![Effect::Persist])
            }
            VoteOutcome::QcGenerated { qc_message, routing } => {
                self.handle_qc_generated(view, qc_message, routing)
            }
        }
    }

    fn handle_qc_generated(
        &mut self,
        view: u64,
        qc_message: Box<crate::types::Qc>,
        _routing: pipeline::Routing,
    ) -> (RouteOutcome, Vec<Effect>) {
        let qc = qc_message.qc.clone();
        pipeline::apply_qc_to_all(&mut self.session, &qc);

        let mut effects = Vec::new();
        {
            let session = &mut self.session;
            let net = &mut self.net;
            pipeline::broadcast_hierarchical(session, net, view, |_session, target, delivered| {
                if delivered {
                    effects.push(Effect::Send {
                        to: Recipient::Node(target),
                        message: Message::Qc((*qc_message).clone()),
                    });
                }
            });
        }

        let next_phase = qc.phase.next();
        if next_phase == Phase::Decide {
            let result = finalize::finalize(
                &mut self.session,
                "Consensus Success",
                "Decide reached: proposed value committed by global quorum",
            );
            effects.push(Effect::Finalized(Box::new(result)));
            if let Some(history_item) = self.session.consensus_history.last() {
                effects.push(Effect::AppendHistory(Box::new(history_item.clone())));
            }
            effects.push(Effect::Persist);
            effects.push(Effect::CancelViewTimer);
            effects.push(Effect::ScheduleNextRound {
                delay_ms: NEXT_ROUND_DELAY_MS,
            });
            return (RouteOutcome::Finalized, effects);
        }

        effects.push(Effect::ScheduleRobotPhaseAdvance {
            view,
            phase: next_phase,
            value: qc.value,
            delay_ms: ROBOT_VOTE_DELAY_MS,
        });
        effects.push(Effect::Persist);
        (RouteOutcome::QcGenerated, effects)
    }

    /// Fired when a scheduled robot prepare-vote wake arrives. A stale wake
    /// (the view has already moved on) is a silent no-op.
    pub fn handle_robot_prepare_wake(&mut self, robot_id: u32, view: u64) -> Vec<Effect> {
        if self.session.current_view != view {
            return Vec::new();
        }
        let value = self
            .session
            .current_proposal_value
            .unwrap_or(self.session.config.proposal_value);
        match robot::generate_vote(&mut self.session, robot_id, Phase::Prepare, value) {
            Some(vote) => self.feed_vote(vote).1,
            None => Vec::new(),
        }
    }

    /// Fired when a scheduled robot phase-advance wake arrives: every
    /// eligible robot casts its vote for `phase` at `view`.
    pub fn handle_robot_phase_wake(&mut self, view: u64, phase: Phase, value: i64) -> Vec<Effect> {
        if self.session.current_view != view {
            return Vec::new();
        }
        let votes = robot::generate_votes_for_phase(&mut self.session, view, phase, value);
        let mut effects = Vec::new();
        for vote in votes {
            effects.extend(self.feed_vote(vote).1);
        }
        effects
    }

    /// Fired when the armed view timer expires. A stale timer (the view
    /// already advanced through some other path) is a silent no-op.
    pub fn handle_view_timeout(&mut self, expected_view: u64) -> Vec<Effect> {
        if expected_view != self.session.current_view {
            return Vec::new();
        }
        let outcome = view_change::on_view_timeout(&mut self.session);
        let new_view = outcome.new_view;
        let n = self.session.config.node_count;

        let mut effects = Vec::new();
        for node_id in 0..n {
            for msg in self.session.buffer.drain_proposal(node_id, new_view) {
                if let Message::PrePrepare(pp) = msg {
                    effects.extend(self.handle_pre_prepare(pp).1);
                }
            }
        }
        for msg in self.session.buffer.drain_votes(new_view) {
            if let Message::Vote(v) = msg {
                effects.extend(self.feed_vote(v).1);
            }
        }

        effects.push(Effect::ArmViewTimer {
            view: new_view,
            duration_ms: VIEW_TIMEOUT_MS,
        });
        effects.extend(self.maybe_start_new_view_consensus(new_view));
        effects
    }

    fn maybe_start_new_view_consensus(&mut self, new_view: u64) -> Vec<Effect> {
        let Some(high_qc) = view_change::start_new_view_consensus(&self.session, new_view) else {
            return Vec::new();
        };
        if !self.leader_should_auto_propose() {
            return Vec::new();
        }
        let leader_id = self.session.leader_id();
        match pipeline::emit_pre_prepare(&mut self.session, high_qc) {
            Some(pp) => self.finish_pre_prepare_propagation(leader_id, new_view, pp),
            None => Vec::new(),
        }
    }

    /// Fired after a completed round's post-decide pause elapses: advance
    /// to the next round, reset per-round robot state, and re-propose if
    /// the (possibly rotated) Leader is a well-behaved robot.
    pub fn handle_next_round_wake(&mut self) -> Vec<Effect> {
        self.session.current_round += 1;
        self.session.current_view += 1;
        self.session.phase = Phase::Waiting;
        self.session.status = SessionStatus::Running;
        self.session.last_pre_prepare_view = None;
        self.session.current_proposal_value = None;
        self.session.network_stats = NetworkStats::default();
        robot::reset_for_new_round(&mut self.session);

        let mut effects = vec![Effect::ArmViewTimer {
            view: self.session.current_view,
            duration_ms: VIEW_TIMEOUT_MS,
        }];
        if self.leader_should_auto_propose() {
            effects.extend(self.propose());
        }
        effects
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{MessageHeader, Recipient};
    use chrono::Utc;

    fn all_robot_config(node_count: u32, branch_count: u32) -> SessionConfig {
        let mut cfg = SessionConfig::default();
        cfg.node_count = node_count;
        cfg.branch_count = branch_count;
        cfg.robot_nodes = node_count;
        cfg
    }

    #[test]
    fn starting_with_a_robot_leader_auto_proposes() {
        let mut driver = SessionDriver::with_seed("s1".into(), all_robot_config(4, 2), 7);
        let effects = driver.start();
        assert!(effects.iter().any(|e| matches!(e, Effect::ArmViewTimer { .. })));
        assert_eq!(driver.session().messages.pre_prepare.len(), 1);
        // member of leader's own group got a scheduled vote; leader itself did not
        assert!(effects.iter().any(|e| matches!(
            e,
            Effect::ScheduleRobotPrepare { robot_id: 1, .. }
        )));
    }

    #[test]
    fn robot_votes_drive_a_round_to_finalization() {
        let mut driver = SessionDriver::with_seed("s1".into(), all_robot_config(4, 2), 7);
        driver.start();
        let view = driver.session().current_view;

        // Drive prepare phase.
        for robot_id in [1u32, 2, 3] {
            driver.handle_robot_prepare_wake(robot_id, view);
        }
        assert_eq!(driver.session().phase, Phase::PreCommit);

        // Pre-commit phase advance.
        driver.handle_robot_phase_wake(view, Phase::PreCommit, 1);
        assert_eq!(driver.session().phase, Phase::Commit);

        // Commit phase advance reaches Decide and finalizes.
        let effects = driver.handle_robot_phase_wake(view, Phase::Commit, 1);
        assert!(effects.iter().any(|e| matches!(e, Effect::Finalized(_))));
        assert_eq!(driver.session().phase, Phase::Completed);
    }

    #[test]
    fn stale_view_timeout_is_a_no_op() {
        let mut driver = SessionDriver::with_seed("s1".into(), all_robot_config(4, 1), 1);
        driver.start();
        let effects = driver.handle_view_timeout(99);
        assert!(effects.is_empty());
    }

    /// P7: a vote for a view ahead of the session's current one is buffered
    /// rather than dropped, and replays into the same pool it would have
    /// landed in had it arrived in-order once the view-change reaches it.
    #[test]
    fn p7_buffered_vote_from_a_future_view_replays_after_view_change() {
        let mut cfg = SessionConfig::default();
        cfg.node_count = 7;
        cfg.branch_count = 1;
        cfg.robot_nodes = 0;
        let mut driver = SessionDriver::with_seed("p7".into(), cfg, 1);
        driver.start();

        // node 2 is a Member of the sole group (parent = group leader 0);
        // node 1 is Root (leader) at view 1. Cast its view-1 vote early,
        // while the session is still at view 0.
        let future_vote = Vote {
            header: MessageHeader {
                from: 2,
                to: Recipient::Node(0),
                view: 1,
                round: 1,
                timestamp: Utc::now(),
            },
            phase: Phase::Prepare,
            value: 1,
            is_group_vote: false,
            weight: 1,
            group_voters: None,
        };
        let (outcome, effects) = driver.feed_vote(future_vote);
        assert_eq!(outcome, RouteOutcome::Buffered);
        assert!(effects.is_empty());

        driver.handle_view_timeout(0);
        assert_eq!(driver.session().current_view, 1);

        let key = (1u64, Phase::Prepare, 1i64, 0u32);
        let pool = driver
            .session()
            .pending_group_votes
            .get(&key)
            .expect("buffered vote replayed into the member pool");
        assert!(pool.contains(&2));
    }

    /// P9: after driving a session through more than one round, every
    /// message still in the (never-cleared) log carries the `round` that was
    /// current when it was emitted.
    #[test]
    fn p9_messages_stay_tagged_with_the_round_active_when_they_were_emitted() {
        let mut driver = SessionDriver::with_seed("p9".into(), all_robot_config(4, 2), 7);
        driver.start();
        let round1_view = driver.session().current_view;

        for robot_id in [1u32, 2, 3] {
            driver.handle_robot_prepare_wake(robot_id, round1_view);
        }
        driver.handle_robot_phase_wake(round1_view, Phase::PreCommit, 1);
        let effects = driver.handle_robot_phase_wake(round1_view, Phase::Commit, 1);
        assert!(effects.iter().any(|e| matches!(e, Effect::Finalized(_))));

        driver.handle_next_round_wake();
        let round2_view = driver.session().current_view;
        assert_ne!(round1_view, round2_view);

        let round2_leader = driver.session().leader_id();
        for robot_id in (0..4u32).filter(|&id| id != round2_leader) {
            driver.handle_robot_prepare_wake(robot_id, round2_view);
        }
        let value = driver.session().current_proposal_value.unwrap();
        driver.handle_robot_phase_wake(round2_view, Phase::PreCommit, value);
        driver.handle_robot_phase_wake(round2_view, Phase::Commit, value);

        assert_eq!(driver.session().messages.pre_prepare[0].header.round, 1);
        assert_eq!(driver.session().messages.pre_prepare[1].header.round, 2);
        for v in &driver.session().messages.vote {
            let expected_round = if v.header.view == round1_view { 1 } else { 2 };
            assert_eq!(v.header.round, expected_round, "vote at view {} mistagged", v.header.view);
        }
        for qc in &driver.session().messages.qc {
            let expected_round = if qc.header.view == round1_view { 1 } else { 2 };
            assert_eq!(qc.header.round, expected_round, "qc at view {} mistagged", qc.header.view);
        }
    }

    #[test]
    fn human_sent_pre_prepare_from_the_wrong_sender_is_rejected() {
        let mut driver = SessionDriver::with_seed("s1".into(), all_robot_config(4, 1), 1);
        let msg = PrePrepare {
            header: MessageHeader {
                from: 2,
                to: Recipient::GroupLeaders,
                view: 0,
                round: 0,
                timestamp: Utc::now(),
            },
            value: 1,
            qc: None,
            tampered: false,
        };
        let (outcome, effects) = driver.handle_inbound(Message::PrePrepare(msg));
        assert_eq!(outcome, RouteOutcome::WrongSender);
        assert!(effects.is_empty());
    }
}
