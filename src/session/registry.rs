//! Concurrent registry of live sessions, keyed by session id.
//!
//! A `SessionActor` wrapper (owning the real timers and channels around a
//! `SessionDriver`) would be looked up here by every inbound request; kept
//! as a thin `DashMap` wrapper rather than a `Mutex<HashMap<_>>` so lookups
//! for distinct sessions never contend on the same lock.

use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;

use crate::session::driver::SessionDriver;

#[derive(Default)]
pub struct SessionRegistry {
    sessions: DashMap<String, Arc<Mutex<SessionDriver>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, id: String, driver: SessionDriver) {
        self.sessions.insert(id, Arc::new(Mutex::new(driver)));
    }

    pub fn get(&self, id: &str) -> Option<Arc<Mutex<SessionDriver>>> {
        self.sessions.get(id).map(|entry| entry.value().clone())
    }

    pub fn remove(&self, id: &str) -> Option<Arc<Mutex<SessionDriver>>> {
        self.sessions.remove(id).map(|(_, driver)| driver)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
