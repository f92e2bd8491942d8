use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Live network counters for the round currently in flight. Reset at the
/// start of every round (see `session::driver::SessionDriver::start_round`).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct NetworkStats {
    pub total_messages_sent: u64,
    pub view_changes: u64,
    pub group_votes_emitted: u64,
    pub qcs_emitted: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NetworkStatsSummary {
    pub actual_messages: u64,
    pub node_count: u32,
    pub branch_count: u32,
}

/// One row of the four-way complexity comparison the finalizer reports.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AlgorithmStats {
    pub name: String,
    pub theoretical: f64,
    pub actual: f64,
    pub complexity: String,
    pub is_current: bool,
    pub optimization_ratio: Option<f64>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ComplexityComparison {
    pub double_hotstuff: AlgorithmStats,
    pub pbft_pure: AlgorithmStats,
    pub hotstuff_pure: AlgorithmStats,
    pub pbft_multi_layer: AlgorithmStats,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConsensusStats {
    pub expected_nodes: u32,
    pub expected_prepare_nodes: u32,
    pub total_messages: usize,
    pub complexity_comparison: ComplexityComparison,
    pub network_stats: NetworkStatsSummary,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConsensusResult {
    pub status: String,
    pub description: String,
    pub stats: ConsensusStats,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HistoryItem {
    pub round: u32,
    pub view: u64,
    pub status: String,
    pub description: String,
    pub stats: ConsensusStats,
    pub timestamp: DateTime<Utc>,
}
