//! Per-owner session cache of the latest result.
//!
//! Replaces the process-global "last result" slot of the interactive front
//! end: every owner has its own entry and ending a session drops only that
//! owner's entry. The cache is bounded; once full, storing a result for a new
//! owner evicts the owner whose result was stored longest ago.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::domain::DiagnosisResult;

/// Owners kept by [`SessionCache::new`].
pub const DEFAULT_SESSION_CAPACITY: usize = 1024;

#[derive(Debug, Default)]
struct Entries {
    /// Owner to (store sequence, result)
    by_owner: HashMap<String, (u64, DiagnosisResult)>,
    next_seq: u64,
}

#[derive(Debug)]
pub struct SessionCache {
    latest: RwLock<Entries>,
    capacity: usize,
}

impl Default for SessionCache {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_SESSION_CAPACITY)
    }
}

impl SessionCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache holding at most `capacity` owners (at least one).
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            latest: RwLock::new(Entries::default()),
            capacity: capacity.max(1),
        }
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Remember `result` as the owner's latest.
    pub fn store(&self, owner: &str, result: DiagnosisResult) {
        let Ok(mut latest) = self.latest.write() else {
            tracing::warn!("Session cache lock poisoned; result not cached");
            return;
        };

        let seq = latest.next_seq;
        latest.next_seq += 1;
        latest.by_owner.insert(owner.to_string(), (seq, result));

        if latest.by_owner.len() > self.capacity {
            let oldest = latest
                .by_owner
                .iter()
                .min_by_key(|(_, (seq, _))| *seq)
                .map(|(owner, _)| owner.clone());
            if let Some(oldest) = oldest {
                latest.by_owner.remove(&oldest);
                tracing::debug!("Session cache full; evicted oldest entry");
            }
        }
    }

    #[must_use]
    pub fn latest(&self, owner: &str) -> Option<DiagnosisResult> {
        match self.latest.read() {
            Ok(latest) => latest.by_owner.get(owner).map(|(_, r)| r.clone()),
            Err(_) => None,
        }
    }

    /// Forget the owner's latest result. Returns whether one was cached.
    pub fn clear(&self, owner: &str) -> bool {
        match self.latest.write() {
            Ok(mut latest) => latest.by_owner.remove(owner).is_some(),
            Err(_) => false,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.latest.read().map(|l| l.by_owner.len()).unwrap_or(0)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
