//! Network simulator (C9): a single delivery-probability gate shared by
//! every outbound unicast in a hierarchical broadcast.
//!
//! The gate only governs whether a send reaches its target's transport
//! handoff — `consensus::pipeline::broadcast_hierarchical` always
//! increments the message counter first, regardless of the gate's
//! verdict, and robot-to-robot consensus logic does not consult the gate
//! at all (see `robot` module doc comment).

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub struct NetworkSimulator {
    rng: StdRng,
}

impl NetworkSimulator {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }

    /// Deterministic constructor for tests and reproducible demo runs.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Roll the delivery gate for a single unicast. `rate` is a percentage
    /// in `0..=100`; `100` always delivers without touching the RNG.
    pub fn should_deliver(&mut self, rate: u8) -> bool {
        if rate >= 100 {
            return true;
        }
        if rate == 0 {
            return false;
        }
        self.rng.random_range(0..100u32) < rate as u32
    }
}

impl Default for NetworkSimulator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_delivery_rate_always_delivers() {
        let mut net = NetworkSimulator::with_seed(1);
        for _ in 0..50 {
            assert!(net.should_deliver(100));
        }
    }

    #[test]
    fn zero_delivery_rate_never_delivers() {
        let mut net = NetworkSimulator::with_seed(1);
        for _ in 0..50 {
            assert!(!net.should_deliver(0));
        }
    }

    #[test]
    fn seeded_rng_is_reproducible() {
        let mut a = NetworkSimulator::with_seed(42);
        let mut b = NetworkSimulator::with_seed(42);
        let seq_a: Vec<bool> = (0..20).map(|_| a.should_deliver(50)).collect();
        let seq_b: Vec<bool> = (0..20).map(|_| b.should_deliver(50)).collect();
        assert_eq!(seq_a, seq_b);
    }
}
