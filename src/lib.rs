pub mod config;
pub mod consensus;
pub mod error;
pub mod finalize;
pub mod metrics;
pub mod network_sim;
pub mod persistence;
pub mod robot;
pub mod session;
pub mod types;

pub use error::EngineError;
pub use session::{Session, SessionDriver};
pub use types::{Phase, QuorumCert, SessionConfig};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a_robot_only_four_node_two_group_session_reaches_decide() {
        let mut cfg = SessionConfig::default();
        cfg.node_count = 4;
        cfg.branch_count = 2;
        cfg.robot_nodes = 4;
        let mut driver = SessionDriver::with_seed("integration".into(), cfg, 11);

        driver.start();
        let view = driver.session().current_view;
        for robot_id in [1u32, 2, 3] {
            driver.handle_robot_prepare_wake(robot_id, view);
        }
        assert_eq!(driver.session().phase, Phase::PreCommit);

        driver.handle_robot_phase_wake(view, Phase::PreCommit, 1);
        assert_eq!(driver.session().phase, Phase::Commit);

        let effects = driver.handle_robot_phase_wake(view, Phase::Commit, 1);
        assert!(effects
            .iter()
            .any(|e| matches!(e, session::Effect::Finalized(_))));
        assert_eq!(driver.session().network_stats.total_messages_sent, 8);
        assert_eq!(driver.session().network_stats.qcs_emitted, 3);
    }
}
