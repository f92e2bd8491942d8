use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::Phase;

/// A quorum certificate: the simulator's stand-in for a real threshold
/// signature. Instead of cryptographic proof, a QC carries the set of node
/// ids that signed it; `qc_extends` and the quorum-size invariants treat
/// this set as the trust anchor.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QuorumCert {
    pub phase: Phase,
    pub view: u64,
    pub value: i64,
    pub signers: BTreeSet<u32>,
    pub total_weight: u32,
    pub is_multi_layer: bool,
}

impl QuorumCert {
    pub fn signer_count(&self) -> usize {
        self.signers.len()
    }
}
