//! Finalizer / complexity reporter (C11).
//!
//! Settles a session once the commit-phase QC has carried the pipeline to
//! `Decide`, and computes the four-way message-complexity comparison the
//! simulator exists to teach: this run's actual hierarchical-broadcast
//! count against the theoretical cost of double-layer HotStuff, pure
//! PBFT, pure HotStuff, and a multi-layer PBFT variant.

use chrono::Utc;

use crate::session::state::{Session, SessionStatus};
use crate::types::{
    AlgorithmStats, ComplexityComparison, ConsensusResult, ConsensusStats, HistoryItem,
    NetworkStatsSummary, Phase,
};

/// Finalize `session` at its current view. Idempotent: a second call for a
/// view already finalized returns the previously computed result instead
/// of recomputing (and re-appending to history).
pub fn finalize(session: &mut Session, status: &str, description: &str) -> ConsensusResult {
    let current_view = session.current_view;
    if session.consensus_finalized_view == Some(current_view) {
        if let Some(result) = &session.consensus_result {
            return result.clone();
        }
    }
    session.consensus_finalized_view = Some(current_view);
    session.phase = Phase::Completed;
    session.phase_step = 4;
    session.status = SessionStatus::Completed;

    let stats = compute_stats(session);
    let result = ConsensusResult {
        status: status.to_string(),
        description: description.to_string(),
        stats: stats.clone(),
    };
    session.consensus_result = Some(result.clone());

    session.consensus_history.push(HistoryItem {
        round: session.current_round,
        view: current_view,
        status: status.to_string(),
        description: description.to_string(),
        stats,
        timestamp: Utc::now(),
    });

    result
}

fn compute_stats(session: &Session) -> ConsensusStats {
    let n = session.config.node_count as i64;
    let k = (session.config.branch_count.max(1)) as i64;
    let group_size = (n / k).max(1);
    let actual = session.network_stats.total_messages_sent as f64;

    let shadow_pbft = (2 * n * (n - 1)) as f64;
    let shadow_hotstuff = (8 * (n - 1)) as f64;
    let shadow_multi = (2 * k * (k - 1) + k * 2 * group_size * (group_size - 1)) as f64;

    let theo_double = (8 * n) as f64;
    let theo_pbft = (2 * n * n) as f64;
    let theo_hotstuff = (4 * n) as f64;
    let theo_multi = (2 * k * k + (2 * n * n) / k) as f64;

    let ratio = |theoretical: f64| if actual > 0.0 { theoretical / actual } else { 0.0 };

    let comparison = ComplexityComparison {
        double_hotstuff: AlgorithmStats {
            name: "Double-Layer HotStuff".to_string(),
            theoretical: theo_double,
            actual,
            complexity: "O(N)".to_string(),
            is_current: true,
            optimization_ratio: None,
        },
        pbft_pure: AlgorithmStats {
            name: "PBFT (pure)".to_string(),
            theoretical: theo_pbft,
            actual: shadow_pbft,
            complexity: "O(N^2)".to_string(),
            is_current: false,
            optimization_ratio: Some(ratio(theo_pbft)),
        },
        hotstuff_pure: AlgorithmStats {
            name: "HotStuff (pure)".to_string(),
            theoretical: theo_hotstuff,
            actual: shadow_hotstuff,
            complexity: "O(N)".to_string(),
            is_current: false,
            optimization_ratio: Some(ratio(theo_hotstuff)),
        },
        pbft_multi_layer: AlgorithmStats {
            name: "PBFT (multi-layer)".to_string(),
            theoretical: theo_multi,
            actual: shadow_multi,
            complexity: "O(K^2 + N^2/K)".to_string(),
            is_current: false,
            optimization_ratio: Some(ratio(theo_multi)),
        },
    };

    ConsensusStats {
        expected_nodes: session.config.node_count,
        expected_prepare_nodes: session.config.node_count.saturating_sub(1),
        total_messages: session.messages.vote.len() + session.messages.qc.len(),
        complexity_comparison: comparison,
        network_stats: NetworkStatsSummary {
            actual_messages: session.network_stats.total_messages_sent,
            node_count: session.config.node_count,
            branch_count: session.config.branch_count,
        },
    }
}
