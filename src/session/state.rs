//! The session data model: everything a running consensus instance owns.
//!
//! Kept as one plain struct, mutated in place by the free functions in
//! `consensus::*`, mirroring the original system's single `session` dict
//! threaded through its pure handler functions.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::consensus::buffer::MessageBuffer;
use crate::types::{
    ConsensusResult, HistoryItem, MessageLog, NetworkStats, NewView, NodeState, Phase,
    RobotNodeState, SessionConfig,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Waiting,
    Running,
    Completed,
    Stopped,
}

/// Key for the intra-group vote pool: `(view, phase, value, group_leader)`.
pub type GroupVoteKey = (u64, Phase, i64, u32);
/// Key for the global vote pool: `(view, phase, value)`.
pub type VoteKey = (u64, Phase, i64);

/// One contribution toward a global quorum tally — either a single direct
/// vote (`voter_ids` has one member) or a `GroupVote`'s rolled-up set.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Contribution {
    pub from: u32,
    pub weight: u32,
    pub voter_ids: BTreeSet<u32>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct VoteTally {
    pub total_weight: u32,
    pub contributions: Vec<Contribution>,
}

pub struct Session {
    pub id: String,
    pub config: SessionConfig,
    pub status: SessionStatus,
    pub phase: Phase,
    pub phase_step: u8,
    pub current_view: u64,
    pub current_round: u32,
    pub start_view_of_round: u64,
    pub robot_nodes: BTreeSet<u32>,
    pub human_nodes: BTreeSet<u32>,
    pub node_states: Vec<NodeState>,
    pub current_proposal_value: Option<i64>,
    pub messages: MessageLog,
    pub pending_group_votes: HashMap<GroupVoteKey, BTreeSet<u32>>,
    pub pending_votes: HashMap<VoteKey, VoteTally>,
    pub pending_new_views: HashMap<u64, BTreeMap<u32, NewView>>,
    pub buffer: MessageBuffer,
    pub robot_node_states: HashMap<u32, RobotNodeState>,
    pub network_stats: NetworkStats,
    pub consensus_finalized_view: Option<u64>,
    pub last_pre_prepare_view: Option<u64>,
    pub consensus_history: Vec<HistoryItem>,
    pub consensus_result: Option<ConsensusResult>,
    pub created_at: DateTime<Utc>,
}

impl Session {
    pub fn new(id: String, config: SessionConfig) -> Self {
        let n = config.node_count;
        let robot_count = config.robot_nodes.min(n);
        let robot_nodes: BTreeSet<u32> = (0..robot_count).collect();
        let human_nodes: BTreeSet<u32> = (robot_count..n).collect();
        let node_states = (0..n).map(|_| NodeState::default()).collect();
        let robot_node_states = robot_nodes.iter().map(|&id| (id, RobotNodeState::default())).collect();

        Self {
            id,
            config,
            status: SessionStatus::Waiting,
            phase: Phase::Waiting,
            phase_step: 0,
            current_view: 0,
            current_round: 1,
            start_view_of_round: 0,
            robot_nodes,
            human_nodes,
            node_states,
            current_proposal_value: None,
            messages: MessageLog::default(),
            pending_group_votes: HashMap::new(),
            pending_votes: HashMap::new(),
            pending_new_views: HashMap::new(),
            buffer: MessageBuffer::default(),
            robot_node_states,
            network_stats: NetworkStats::default(),
            consensus_finalized_view: None,
            last_pre_prepare_view: None,
            consensus_history: Vec::new(),
            consensus_result: None,
            created_at: Utc::now(),
        }
    }

    pub fn leader_id(&self) -> u32 {
        crate::consensus::topology::leader(self.current_view, self.config.node_count)
    }

    pub fn node_state(&self, node_id: u32) -> &NodeState {
        &self.node_states[node_id as usize]
    }

    pub fn node_state_mut(&mut self, node_id: u32) -> &mut NodeState {
        &mut self.node_states[node_id as usize]
    }
}
