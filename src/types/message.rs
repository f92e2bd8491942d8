use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Phase, QuorumCert};

/// Addressing target of an outbound message. `GroupLeaders` is the
/// broadcast sentinel a Leader's PRE-PREPARE and a Leader's QC are logged
/// with; the session driver expands it into concrete unicasts via
/// `consensus::pipeline::broadcast_hierarchical`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recipient {
    Node(u32),
    GroupLeaders,
}

/// Fields common to every message kind.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MessageHeader {
    pub from: u32,
    pub to: Recipient,
    pub view: u64,
    pub round: u32,
    pub timestamp: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PrePrepare {
    pub header: MessageHeader,
    pub value: i64,
    pub qc: Option<QuorumCert>,
    pub tampered: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Vote {
    pub header: MessageHeader,
    pub phase: Phase,
    pub value: i64,
    pub is_group_vote: bool,
    pub weight: u32,
    pub group_voters: Option<std::collections::BTreeSet<u32>>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Qc {
    pub header: MessageHeader,
    pub phase: Phase,
    pub next_phase: Phase,
    pub qc: QuorumCert,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NewView {
    pub header: MessageHeader,
    pub old_view: u64,
    pub high_qc: Option<QuorumCert>,
}

/// Tagged union of the four wire message kinds, matching the original
/// system's single `messages` dict keyed by kind.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Message {
    PrePrepare(PrePrepare),
    Vote(Vote),
    Qc(Qc),
    NewView(NewView),
}

impl Message {
    pub fn header(&self) -> &MessageHeader {
        match self {
            Message::PrePrepare(m) => &m.header,
            Message::Vote(m) => &m.header,
            Message::Qc(m) => &m.header,
            Message::NewView(m) => &m.header,
        }
    }

    pub fn view(&self) -> u64 {
        self.header().view
    }
}

/// Per-kind message log, append-only for the lifetime of a session.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct MessageLog {
    pub pre_prepare: Vec<PrePrepare>,
    pub vote: Vec<Vote>,
    pub qc: Vec<Qc>,
    pub new_view: Vec<NewView>,
}

impl MessageLog {
    pub fn total_len(&self) -> usize {
        self.pre_prepare.len() + self.vote.len() + self.qc.len() + self.new_view.len()
    }
}
