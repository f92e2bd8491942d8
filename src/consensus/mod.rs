pub mod aggregator;
pub mod buffer;
pub mod node_state;
pub mod pipeline;
pub mod safety;
pub mod topology;
pub mod view_change;

pub use aggregator::{process_vote, VoteOutcome};
pub use buffer::MessageBuffer;
pub use pipeline::{
    apply_qc_to_all, apply_qc_to_node, broadcast_hierarchical, compute_routing, emit_pre_prepare,
    handle_proposal, ProposalOutcome, Routing,
};
pub use safety::{global_quorum, is_honest, local_quorum, qc_extends, safe_node};
pub use topology::{leader, resolve, Role, TopologyInfo};
pub use view_change::{on_view_timeout, start_new_view_consensus, ViewChangeOutcome};
