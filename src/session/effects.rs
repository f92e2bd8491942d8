//! Side-effect descriptions produced by the synchronous session core.
//!
//! `SessionDriver` never touches a clock, a socket, or a task spawner
//! itself — it returns a `Vec<Effect>` describing what the caller (the
//! async `SessionActor`, or a test harness) should do. This keeps the
//! consensus core deterministic and unit-testable without an executor.

use crate::types::{ConsensusResult, HistoryItem, Message, Recipient};

#[derive(Debug, Clone)]
pub enum Effect {
    /// Hand `message` to the transport for delivery to `to`.
    Send { to: Recipient, message: Message },
    /// (Re)arm the view timer for `view`, firing after `duration_ms`.
    ArmViewTimer { view: u64, duration_ms: u64 },
    CancelViewTimer,
    /// Wake `robot_id` after `delay_ms` to cast its prepare vote.
    ScheduleRobotPrepare { robot_id: u32, view: u64, delay_ms: u64 },
    /// Wake every eligible robot after `delay_ms` to advance past `phase`.
    ScheduleRobotPhaseAdvance {
        view: u64,
        phase: crate::types::Phase,
        value: i64,
        delay_ms: u64,
    },
    /// Wake the driver after `delay_ms` to start the next round.
    ScheduleNextRound { delay_ms: u64 },
    /// Ask the caller to persist the current session state.
    Persist,
    AppendHistory(Box<HistoryItem>),
    Finalized(Box<ConsensusResult>),
}

/// Outward-facing result of routing one inbound message through the
/// driver. Distinct from `consensus::aggregator::VoteOutcome` /
/// `consensus::pipeline::ProposalOutcome`, which describe the lower-level
/// aggregation/proposal mechanics that a `RouteOutcome` wraps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteOutcome {
    Buffered,
    Ignored,
    WrongSender,
    SafetyViolation,
    Accepted,
    InvalidTarget,
    Pending,
    PhaseDrift,
    GroupVoteGenerated,
    QcGenerated,
    Finalized,
    DeDuplicated,
}
