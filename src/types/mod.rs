pub mod config;
pub mod message;
pub mod node_state;
pub mod phase;
pub mod qc;
pub mod stats;

pub use config::SessionConfig;
pub use message::{Message, MessageHeader, MessageLog, NewView, PrePrepare, Qc, Recipient, Vote};
pub use node_state::{NodeState, RobotNodeState};
pub use phase::Phase;
pub use qc::QuorumCert;
pub use stats::{
    AlgorithmStats, ComplexityComparison, ConsensusResult, ConsensusStats, HistoryItem,
    NetworkStats, NetworkStatsSummary,
};
