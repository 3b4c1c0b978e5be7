//! Chunk and entity cleanup bookkeeping
//!
//! The loaded-chunk figure is an estimate derived from the player count and
//! the removal counts are placeholders; actual unloading belongs to the host.

use std::time::{Duration, Instant};

use serde::Serialize;

use super::constants::cleanup;

/// Lifetime totals, reset only on process restart
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OptimizationCounters {
    pub total_optimizations: u64,
    pub chunks_cleared_total: u64,
    pub entities_removed_total: u64,
}

#[derive(Debug, Clone, Copy)]
pub struct CleanupThresholds {
    pub chunk_threshold: u64,
    pub aggressive_chunk_threshold: u64,
    pub entity_batch: u64,
    pub aggressive_entity_batch: u64,
    pub max_chunks_per_player: u64,
    pub optimization_interval: Duration,
}

impl Default for CleanupThresholds {
    fn default() -> Self {
        Self {
            chunk_threshold: cleanup::CHUNK_THRESHOLD,
            aggressive_chunk_threshold: cleanup::AGGRESSIVE_CHUNK_THRESHOLD,
            entity_batch: cleanup::ENTITY_BATCH,
            aggressive_entity_batch: cleanup::AGGRESSIVE_ENTITY_BATCH,
            max_chunks_per_player: cleanup::MAX_CHUNKS_PER_PLAYER,
            optimization_interval: Duration::from_secs(cleanup::OPTIMIZATION_INTERVAL_SECS),
        }
    }
}

#[derive(Debug)]
pub struct Optimizations {
    thresholds: CleanupThresholds,
    estimated_chunks: u64,
    aggressive: bool,
    last_auto_run: Option<Instant>,
    counters: OptimizationCounters,
}

impl Optimizations {
    pub fn new(thresholds: CleanupThresholds) -> Self {
        Self {
            thresholds,
            estimated_chunks: 0,
            aggressive: false,
            last_auto_run: None,
            counters: OptimizationCounters::default(),
        }
    }

    /// Refresh the chunk estimate from the online player count
    pub fn update_estimate(&mut self, online_players: usize) -> u64 {
        self.estimated_chunks = online_players as u64 * self.thresholds.max_chunks_per_player;
        self.estimated_chunks
    }

    /// Clear estimated chunks above the current threshold (lower in
    /// aggressive mode). Returns how many were counted as cleared.
    pub fn optimize_chunks(&mut self) -> u64 {
        let threshold = if self.aggressive {
            self.thresholds.aggressive_chunk_threshold
        } else {
            self.thresholds.chunk_threshold
        };
        self.clear_chunks_above(threshold)
    }

    /// Scheduled cleanup pass; always uses the normal threshold
    pub fn cleanup_chunks(&mut self) -> u64 {
        self.clear_chunks_above(self.thresholds.chunk_threshold)
    }

    fn clear_chunks_above(&mut self, threshold: u64) -> u64 {
        if self.estimated_chunks <= threshold {
            return 0;
        }

        let count = self.estimated_chunks - threshold;
        self.estimated_chunks = 0;
        self.counters.chunks_cleared_total += count;
        count
    }

    /// Report a batch of removed entities (fixed size, larger when aggressive)
    pub fn optimize_entities(&mut self) -> u64 {
        let count = if self.aggressive {
            self.thresholds.aggressive_entity_batch
        } else {
            self.thresholds.entity_batch
        };
        self.counters.entities_removed_total += count;
        count
    }

    /// Whether the auto-optimize task should run: low TPS or interval elapsed
    pub fn auto_optimize_due(&self, now: Instant, tps: f64, warning_tps: f64) -> bool {
        if tps < warning_tps {
            return true;
        }
        match self.last_auto_run {
            None => true,
            Some(last) => {
                now.saturating_duration_since(last) >= self.thresholds.optimization_interval
            }
        }
    }

    /// Mark an auto-optimize pass as completed at `now`
    pub fn record_auto_run(&mut self, now: Instant) {
        self.last_auto_run = Some(now);
        self.counters.total_optimizations += 1;
    }

    pub fn set_aggressive(&mut self, aggressive: bool) {
        self.aggressive = aggressive;
    }

    pub fn is_aggressive(&self) -> bool {
        self.aggressive
    }

    pub fn estimated_chunks(&self) -> u64 {
        self.estimated_chunks
    }

    pub fn counters(&self) -> OptimizationCounters {
        self.counters
    }

    #[cfg(test)]
    pub(crate) fn set_estimated_chunks(&mut self, chunks: u64) {
        self.estimated_chunks = chunks;
    }
}

impl Default for Optimizations {
    fn default() -> Self {
        Self::new(CleanupThresholds::default())
    }
}
