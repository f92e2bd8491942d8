//! Per-node QC bookkeeping (C3): `prepareQC`/`highQC`/`lockedQC` only ever
//! move forward, never regress on a stale or equal-view QC.

use crate::types::{NodeState, Phase, QuorumCert};

/// Adopt `qc` as the node's `prepareQC` (and mirror it into `highQC`) if it
/// is newer than whatever is currently held.
pub fn update_prepare_qc(state: &mut NodeState, qc: &QuorumCert) {
    let should_update = match &state.prepare_qc {
        None => true,
        Some(current) => qc.view > current.view,
    };
    if should_update {
        state.prepare_qc = Some(qc.clone());
        state.high_qc = Some(qc.clone());
    }
}

/// Adopt `qc` as the node's `lockedQC` if it is a commit-phase QC newer
/// than whatever is currently locked.
pub fn update_locked_qc(state: &mut NodeState, qc: &QuorumCert) {
    if qc.phase != Phase::Commit {
        return;
    }
    let should_update = match &state.locked_qc {
        None => true,
        Some(current) => qc.view > current.view,
    };
    if should_update {
        state.locked_qc = Some(qc.clone());
    }
}
