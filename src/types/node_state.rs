use serde::{Deserialize, Serialize};

use super::QuorumCert;

/// Per-node safety bookkeeping: the three QC slots every HotStuff replica
/// carries, plus the view it believes it is in.
///
/// `lockedQC` only ever moves forward (see `consensus::node_state`); a
/// `None` slot means "no QC of that kind has been seen yet", not view 0.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct NodeState {
    pub locked_qc: Option<QuorumCert>,
    pub prepare_qc: Option<QuorumCert>,
    pub high_qc: Option<QuorumCert>,
    pub current_view: u64,
}

/// Per-robot scratch state reset at the start of every view and round.
///
/// Mirrors the teacher's pattern of a small plain-data struct per
/// tracked entity rather than scattering booleans across the session.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct RobotNodeState {
    pub received_pre_prepare: bool,
    pub received_prepare_count: u32,
    pub received_commit_count: u32,
    pub sent_prepare: bool,
    pub sent_commit: bool,
}
