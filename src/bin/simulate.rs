//! CLI entry point: run one Double-Layer HotStuff session to completion
//! (or until a view-change storm forces a manual stop) and print the
//! resulting complexity report.

use std::sync::Arc;
use std::time::Duration;

use dual_layer_hotstuff_sim::config::SimulatorConfig;
use dual_layer_hotstuff_sim::persistence::{InMemoryStore, SessionStore};
use dual_layer_hotstuff_sim::session::{Effect, RouteOutcome, SessionDriver};
use log::{info, warn};

#[tokio::main]
async fn main() {
    env_logger::init();

    let config = match SimulatorConfig::load() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("configuration error: {err}");
            std::process::exit(1);
        }
    };

    let session_config = config.to_session_config();
    let mut driver = match config.seed {
        Some(seed) => SessionDriver::with_seed("cli-session".into(), session_config, seed),
        None => SessionDriver::new("cli-session".into(), session_config),
    };

    let store: Arc<dyn SessionStore> = Arc::new(InMemoryStore::new());

    info!(
        "starting session with {} nodes ({} robots), branch_count={}",
        driver.session().config.node_count,
        driver.session().config.robot_nodes,
        driver.session().config.branch_count
    );

    let mut effects = driver.start();
    loop {
        let mut next_wakes = Vec::new();
        for effect in effects.drain(..) {
            match effect {
                Effect::Send { to, message } => {
                    info!("send {:?} -> {:?}", message.view(), to);
                }
                Effect::ArmViewTimer { view, duration_ms } => {
                    next_wakes.push(Wake::ViewTimeout(view, duration_ms));
                }
                Effect::CancelViewTimer => {}
                Effect::ScheduleRobotPrepare { robot_id, view, delay_ms } => {
                    next_wakes.push(Wake::RobotPrepare(robot_id, view, delay_ms));
                }
                Effect::ScheduleRobotPhaseAdvance { view, phase, value, delay_ms } => {
                    next_wakes.push(Wake::RobotPhase(view, phase, value, delay_ms));
                }
                Effect::ScheduleNextRound { delay_ms } => {
                    next_wakes.push(Wake::NextRound(delay_ms));
                }
                Effect::Persist => {
                    if let Err(err) = store.upsert(driver.session()) {
                        warn!("persist failed: {err}");
                    }
                }
                Effect::AppendHistory(item) => {
                    if let Err(err) = store.append_history(&driver.session().id, &item) {
                        warn!("history append failed: {err}");
                    }
                }
                Effect::Finalized(result) => {
                    println!("{}", serde_json::to_string_pretty(&result).unwrap_or_default());
                    return;
                }
            }
        }

        if next_wakes.is_empty() {
            break;
        }

        // The CLI runs a single round deterministically: fire every
        // scheduled wake immediately in delay order rather than sleeping a
        // real clock, since there is no external client to race against.
        next_wakes.sort_by_key(|w| w.delay_ms());
        for wake in next_wakes {
            tokio::time::sleep(Duration::from_millis(0)).await;
            let (outcome, more) = match wake {
                Wake::ViewTimeout(view, _) => (RouteOutcome::Accepted, driver.handle_view_timeout(view)),
                Wake::RobotPrepare(robot_id, view, _) => {
                    (RouteOutcome::Accepted, driver.handle_robot_prepare_wake(robot_id, view))
                }
                Wake::RobotPhase(view, phase, value, _) => {
                    (RouteOutcome::Accepted, driver.handle_robot_phase_wake(view, phase, value))
                }
                Wake::NextRound(_) => (RouteOutcome::Accepted, driver.handle_next_round_wake()),
            };
            let _ = outcome;
            effects.extend(more);
        }
    }
}

enum Wake {
    ViewTimeout(u64, u64),
    RobotPrepare(u32, u64, u64),
    RobotPhase(u64, dual_layer_hotstuff_sim::types::Phase, i64, u64),
    NextRound(u64),
}

impl Wake {
    fn delay_ms(&self) -> u64 {
        match self {
            Wake::ViewTimeout(_, d) => *d,
            Wake::RobotPrepare(_, _, d) => *d,
            Wake::RobotPhase(_, _, _, d) => *d,
            Wake::NextRound(d) => *d,
        }
    }
}
