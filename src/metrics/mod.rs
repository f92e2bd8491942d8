//! Session-level metrics mirroring `types::NetworkStats`, exposed either as
//! a plain snapshot or, with the `metrics` feature, as Prometheus gauges.

use log::debug;

use crate::types::NetworkStats;

#[derive(Debug, Clone, Default)]
pub struct SessionMetrics {
    pub total_messages_sent: u64,
    pub view_changes: u64,
    pub group_votes_emitted: u64,
    pub qcs_emitted: u64,
    pub phases_completed: u64,
}

impl SessionMetrics {
    pub fn record_network_stats(&mut self, stats: &NetworkStats) {
        self.total_messages_sent = stats.total_messages_sent;
        self.view_changes = stats.view_changes;
        self.group_votes_emitted = stats.group_votes_emitted;
        self.qcs_emitted = stats.qcs_emitted;
        debug!(
            "metrics updated: messages={} view_changes={} group_votes={} qcs={}",
            self.total_messages_sent, self.view_changes, self.group_votes_emitted, self.qcs_emitted
        );
    }

    pub fn record_phase_completed(&mut self) {
        self.phases_completed += 1;
    }
}

#[cfg(feature = "metrics")]
pub mod prometheus_exporter {
    use once_cell::sync::Lazy;
    use prometheus::{IntCounter, IntGauge, Registry};

    pub static REGISTRY: Lazy<Registry> = Lazy::new(Registry::new);

    pub static MESSAGES_SENT: Lazy<IntCounter> = Lazy::new(|| {
        let counter = IntCounter::new(
            "hotstuff_sim_messages_sent_total",
            "Total unicast sends attempted by the hierarchical broadcast",
        )
        .expect("metric construction is infallible for static names");
        REGISTRY
            .register(Box::new(counter.clone()))
            .expect("metric registered exactly once");
        counter
    });

    pub static VIEW_CHANGES: Lazy<IntCounter> = Lazy::new(|| {
        let counter = IntCounter::new("hotstuff_sim_view_changes_total", "Total view changes")
            .expect("metric construction is infallible for static names");
        REGISTRY
            .register(Box::new(counter.clone()))
            .expect("metric registered exactly once");
        counter
    });

    pub static ACTIVE_SESSIONS: Lazy<IntGauge> = Lazy::new(|| {
        let gauge = IntGauge::new("hotstuff_sim_active_sessions", "Sessions currently running")
            .expect("metric construction is infallible for static names");
        REGISTRY
            .register(Box::new(gauge.clone()))
            .expect("metric registered exactly once");
        gauge
    });

    /// Push a `SessionMetrics` snapshot's deltas into the process-wide
    /// registry. Called after each effect batch is applied.
    pub fn observe(metrics: &super::SessionMetrics, previous_messages_sent: u64, previous_view_changes: u64) {
        let message_delta = metrics.total_messages_sent.saturating_sub(previous_messages_sent);
        let view_change_delta = metrics.view_changes.saturating_sub(previous_view_changes);
        MESSAGES_SENT.inc_by(message_delta);
        VIEW_CHANGES.inc_by(view_change_delta);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_network_stats_mirrors_every_counter() {
        let mut metrics = SessionMetrics::default();
        let stats = NetworkStats {
            total_messages_sent: 8,
            view_changes: 1,
            group_votes_emitted: 2,
            qcs_emitted: 3,
        };
        metrics.record_network_stats(&stats);
        assert_eq!(metrics.total_messages_sent, 8);
        assert_eq!(metrics.qcs_emitted, 3);
    }
}
