//! Message buffer (C7): two compartments for messages that arrive ahead of
//! the session's current view.

use std::collections::BTreeMap;

use crate::types::Message;

#[derive(Clone, Debug, Default)]
pub struct MessageBuffer {
    votes_by_view: BTreeMap<u64, Vec<Message>>,
    proposals_by_node_view: BTreeMap<(u32, u64), Vec<Message>>,
}

impl MessageBuffer {
    pub fn buffer_vote(&mut self, view: u64, message: Message) {
        self.votes_by_view.entry(view).or_default().push(message);
    }

    pub fn buffer_proposal(&mut self, node_id: u32, view: u64, message: Message) {
        self.proposals_by_node_view
            .entry((node_id, view))
            .or_default()
            .push(message);
    }

    /// Remove and return every vote buffered for `view`.
    pub fn drain_votes(&mut self, view: u64) -> Vec<Message> {
        self.votes_by_view.remove(&view).unwrap_or_default()
    }

    /// Remove and return every proposal buffered for `(node_id, view)`.
    pub fn drain_proposal(&mut self, node_id: u32, view: u64) -> Vec<Message> {
        self.proposals_by_node_view
            .remove(&(node_id, view))
            .unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.votes_by_view.is_empty() && self.proposals_by_node_view.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Message, MessageHeader, PrePrepare, Recipient};
    use chrono::Utc;

    fn pp(view: u64) -> Message {
        Message::PrePrepare(PrePrepare {
            header: MessageHeader {
                from: 0,
                to: Recipient::GroupLeaders,
                view,
                round: 0,
                timestamp: Utc::now(),
            },
            value: 1,
            qc: None,
            tampered: false,
        })
    }

    #[test]
    fn drain_returns_and_clears() {
        let mut buf = MessageBuffer::default();
        buf.buffer_proposal(2, 5, pp(5));
        assert_eq!(buf.drain_proposal(2, 5).len(), 1);
        assert!(buf.drain_proposal(2, 5).is_empty());
    }

    #[test]
    fn votes_are_keyed_by_view_only() {
        let mut buf = MessageBuffer::default();
        buf.buffer_vote(3, pp(3));
        buf.buffer_vote(3, pp(3));
        assert_eq!(buf.drain_votes(3).len(), 2);
    }
}
