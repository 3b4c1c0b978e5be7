//! Load and overload thresholds
//!
//! Player count and the estimated chunk count are compared against warning
//! and critical levels. Critical findings start emergency recovery.

use std::fmt;

use smallvec::SmallVec;

use super::constants::{memory, overload};

/// Why the server was judged overloaded
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OverloadReason {
    Players(usize),
    Chunks(u64),
    Memory(f32),
}

impl fmt::Display for OverloadReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OverloadReason::Players(n) => write!(f, "Players: {}", n),
            OverloadReason::Chunks(n) => write!(f, "Chunks: {}", n),
            OverloadReason::Memory(pct) => write!(f, "Memory: {:.1}%", pct),
        }
    }
}

pub type OverloadReasons = SmallVec<[OverloadReason; 3]>;

/// Join reasons as `"Players: 120, Chunks: 7680"`
pub fn describe(reasons: &[OverloadReason]) -> String {
    reasons
        .iter()
        .map(|r| r.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug, Clone, Copy)]
pub struct OverloadThresholds {
    pub players_warning: usize,
    pub players_critical: usize,
    pub chunks_warning: u64,
    pub chunks_critical: u64,
    pub memory_critical_percent: f32,
}

impl Default for OverloadThresholds {
    fn default() -> Self {
        Self {
            players_warning: overload::PLAYERS_WARNING,
            players_critical: overload::PLAYERS_CRITICAL,
            chunks_warning: overload::CHUNKS_WARNING,
            chunks_critical: overload::CHUNKS_CRITICAL,
            memory_critical_percent: memory::CRITICAL_PERCENT,
        }
    }
}

/// Result of one overload evaluation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverloadCheck {
    /// Reasons to start emergency recovery
    pub critical: OverloadReasons,
    /// Readings past the warning level only
    pub warnings: OverloadReasons,
}

impl OverloadCheck {
    pub fn is_overloaded(&self) -> bool {
        !self.critical.is_empty()
    }
}

impl OverloadThresholds {
    /// Evaluate the current load. `memory_percent` is `None` when the host
    /// cannot report memory usage.
    pub fn evaluate(
        &self,
        players: usize,
        estimated_chunks: u64,
        memory_percent: Option<f32>,
    ) -> OverloadCheck {
        let mut check = OverloadCheck::default();

        if players >= self.players_critical {
            check.critical.push(OverloadReason::Players(players));
        } else if players >= self.players_warning {
            check.warnings.push(OverloadReason::Players(players));
        }

        if estimated_chunks >= self.chunks_critical {
            check.critical.push(OverloadReason::Chunks(estimated_chunks));
        } else if estimated_chunks >= self.chunks_warning {
            check.warnings.push(OverloadReason::Chunks(estimated_chunks));
        }

        if let Some(pct) = memory_percent {
            if pct >= self.memory_critical_percent {
                check.critical.push(OverloadReason::Memory(pct));
            }
        }

        check
    }
}
