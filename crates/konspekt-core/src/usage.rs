//! Per-run token accounting.
//!
//! One tracker is created for each pipeline run and threaded by reference
//! through the map and reduce stages. Concurrent map calls report into the
//! same tracker, so the counters are atomics; two runs never share one.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// USD per 1000 input tokens.
pub const RATE_INPUT_PER_1K: f64 = 0.0025;
/// USD per 1000 output tokens. Output pricing is several times input pricing.
pub const RATE_OUTPUT_PER_1K: f64 = 0.01;

#[derive(Debug, Default)]
pub struct UsageTracker {
    input_tokens: AtomicU64,
    output_tokens: AtomicU64,
}

impl UsageTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one model call's usage. Safe to call from concurrent tasks.
    pub fn add(&self, input_tokens: u64, output_tokens: u64) {
        self.input_tokens.fetch_add(input_tokens, Ordering::Relaxed);
        self.output_tokens.fetch_add(output_tokens, Ordering::Relaxed);
    }

    /// Totals so far, with the derived cost estimate.
    pub fn snapshot(&self) -> CostStats {
        let input_tokens = self.input_tokens.load(Ordering::Relaxed);
        let output_tokens = self.output_tokens.load(Ordering::Relaxed);
        CostStats {
            input_tokens,
            output_tokens,
            cost: (input_tokens as f64 / 1000.0) * RATE_INPUT_PER_1K
                + (output_tokens as f64 / 1000.0) * RATE_OUTPUT_PER_1K,
        }
    }
}

/// Snapshot of a run's accumulated usage, in tokens and USD.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostStats {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub cost: f64,
}
