use serde::{Deserialize, Serialize};

/// Parameters a client supplies when creating a session. Field names follow
/// the original system's camelCase wire schema; Rust code reaches them via
/// the usual `serde(rename_all)` bridge so the API surface stays
/// recognizable to an embedding frontend.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionConfig {
    pub node_count: u32,
    pub faulty_nodes: u32,
    pub robot_nodes: u32,
    pub topology: String,
    #[serde(default = "default_branch_count")]
    pub branch_count: u32,
    pub proposal_value: i64,
    #[serde(default)]
    pub proposal_content: String,
    #[serde(default)]
    pub malicious_proposer: bool,
    #[serde(default)]
    pub allow_tampering: bool,
    #[serde(default = "default_delivery_rate")]
    pub message_delivery_rate: u8,
}

fn default_branch_count() -> u32 {
    2
}

fn default_delivery_rate() -> u8 {
    100
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            node_count: 4,
            faulty_nodes: 0,
            robot_nodes: 4,
            topology: "star".to_string(),
            branch_count: default_branch_count(),
            proposal_value: 1,
            proposal_content: String::new(),
            malicious_proposer: false,
            allow_tampering: false,
            message_delivery_rate: default_delivery_rate(),
        }
    }
}
