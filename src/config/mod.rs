//! CLI/file configuration surface (C: ambient). Parses `hotstuff-sim`'s
//! command line, optionally overlaying a TOML file, and builds the
//! `types::SessionConfig` the engine itself runs on.

use std::path::PathBuf;

use clap::Parser;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::types::SessionConfig;

#[derive(Parser, Debug, Clone)]
#[command(name = "hotstuff-sim", about = "Double-Layer HotStuff BFT consensus simulator")]
pub struct SimulatorConfig {
    /// Optional TOML file providing (or overriding) the session parameters below.
    #[arg(long)]
    pub config_file: Option<PathBuf>,

    #[arg(long, default_value_t = 4)]
    pub node_count: u32,

    #[arg(long, default_value_t = 0)]
    pub faulty_nodes: u32,

    #[arg(long, default_value_t = 4)]
    pub robot_nodes: u32,

    #[arg(long, default_value = "star")]
    pub topology: String,

    #[arg(long, default_value_t = 2)]
    pub branch_count: u32,

    #[arg(long, default_value_t = 1)]
    pub proposal_value: i64,

    #[arg(long, default_value = "")]
    pub proposal_content: String,

    #[arg(long, default_value_t = false)]
    pub malicious_proposer: bool,

    #[arg(long, default_value_t = false)]
    pub allow_tampering: bool,

    #[arg(long, default_value_t = 100)]
    pub message_delivery_rate: u8,

    /// Seed for the network simulator's delivery RNG; omit for OS entropy.
    #[arg(long)]
    pub seed: Option<u64>,
}

/// The subset of `SimulatorConfig` a TOML file is allowed to override.
/// Every field is optional so a file only needs to mention what it changes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileOverrides {
    pub node_count: Option<u32>,
    pub faulty_nodes: Option<u32>,
    pub robot_nodes: Option<u32>,
    pub topology: Option<String>,
    pub branch_count: Option<u32>,
    pub proposal_value: Option<i64>,
    pub proposal_content: Option<String>,
    pub malicious_proposer: Option<bool>,
    pub allow_tampering: Option<bool>,
    pub message_delivery_rate: Option<u8>,
}

impl SimulatorConfig {
    /// Parse `std::env::args`, then overlay a config file if one was named.
    pub fn load() -> Result<Self, EngineError> {
        let mut config = Self::parse();
        if let Some(path) = config.config_file.clone() {
            let contents = std::fs::read_to_string(&path)?;
            let overrides: FileOverrides = toml::from_str(&contents)?;
            config.apply_overrides(overrides);
        }
        config.validate()?;
        Ok(config)
    }

    fn apply_overrides(&mut self, overrides: FileOverrides) {
        if let Some(v) = overrides.node_count {
            self.node_count = v;
        }
        if let Some(v) = overrides.faulty_nodes {
            self.faulty_nodes = v;
        }
        if let Some(v) = overrides.robot_nodes {
            self.robot_nodes = v;
        }
        if let Some(v) = overrides.topology {
            self.topology = v;
        }
        if let Some(v) = overrides.branch_count {
            self.branch_count = v;
        }
        if let Some(v) = overrides.proposal_value {
            self.proposal_value = v;
        }
        if let Some(v) = overrides.proposal_content {
            self.proposal_content = v;
        }
        if let Some(v) = overrides.malicious_proposer {
            self.malicious_proposer = v;
        }
        if let Some(v) = overrides.allow_tampering {
            self.allow_tampering = v;
        }
        if let Some(v) = overrides.message_delivery_rate {
            self.message_delivery_rate = v;
        }
    }

    fn validate(&self) -> Result<(), EngineError> {
        if self.node_count == 0 {
            return Err(EngineError::Configuration("node_count must be at least 1".into()));
        }
        if self.branch_count == 0 {
            return Err(EngineError::Configuration("branch_count must be at least 1".into()));
        }
        if self.robot_nodes > self.node_count {
            return Err(EngineError::Configuration(
                "robot_nodes cannot exceed node_count".into(),
            ));
        }
        if self.message_delivery_rate > 100 {
            return Err(EngineError::Configuration(
                "message_delivery_rate must be a percentage in 0..=100".into(),
            ));
        }
        Ok(())
    }

    pub fn to_session_config(&self) -> SessionConfig {
        SessionConfig {
            node_count: self.node_count,
            faulty_nodes: self.faulty_nodes,
            robot_nodes: self.robot_nodes,
            topology: self.topology.clone(),
            branch_count: self.branch_count,
            proposal_value: self.proposal_value,
            proposal_content: self.proposal_content.clone(),
            malicious_proposer: self.malicious_proposer,
            allow_tampering: self.allow_tampering,
            message_delivery_rate: self.message_delivery_rate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> SimulatorConfig {
        SimulatorConfig {
            config_file: None,
            node_count: 4,
            faulty_nodes: 0,
            robot_nodes: 4,
            topology: "star".into(),
            branch_count: 2,
            proposal_value: 1,
            proposal_content: String::new(),
            malicious_proposer: false,
            allow_tampering: false,
            message_delivery_rate: 100,
            seed: None,
        }
    }

    #[test]
    fn zero_node_count_is_rejected() {
        let mut cfg = base();
        cfg.node_count = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn robot_nodes_over_node_count_is_rejected() {
        let mut cfg = base();
        cfg.robot_nodes = 5;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn to_session_config_carries_every_field() {
        let cfg = base();
        let session_cfg = cfg.to_session_config();
        assert_eq!(session_cfg.node_count, 4);
        assert_eq!(session_cfg.branch_count, 2);
    }
}
