//! Per-IP note quota with an admin allowlist.
//!
//! Counts live in memory and are seeded from persisted notes at startup, so
//! a restart does not hand out fresh quota for notes already on disk. This
//! is bookkeeping for one deployment, not a general rate limiter.

use std::{
    collections::{HashMap, HashSet},
    sync::Mutex,
};

pub struct QuotaLedger {
    limit: usize,
    admin_ips: HashSet<String>,
    counts: Mutex<HashMap<String, usize>>,
}

impl QuotaLedger {
    pub fn new(limit: usize, admin_ips: HashSet<String>) -> Self {
        Self {
            limit,
            admin_ips,
            counts: Mutex::new(HashMap::new()),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Whether this client may create another note.
    pub fn is_allowed(&self, ip: &str) -> bool {
        if self.admin_ips.contains(ip) {
            return true;
        }
        let counts = self.counts.lock().expect("quota ledger poisoned");
        counts.get(ip).copied().unwrap_or(0) < self.limit
    }

    /// Count one created note against this client.
    pub fn record(&self, ip: &str) {
        let mut counts = self.counts.lock().expect("quota ledger poisoned");
        *counts.entry(ip.to_string()).or_insert(0) += 1;
    }
}
