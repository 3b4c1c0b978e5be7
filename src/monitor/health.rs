//! Health scoring and TPS banding
//!
//! Both are pure lookups on the current TPS. The message layer turns the
//! resulting band or color key into player-facing text.

use serde::Serialize;

use super::constants::health;
use super::window::SampleWindow;

/// Semantic color of a reading, rendered by the message layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorKey {
    Green,
    Yellow,
    Gold,
    Red,
}

impl ColorKey {
    /// Single-character formatting code understood by the game client
    pub fn code(&self) -> char {
        match self {
            ColorKey::Green => 'a',
            ColorKey::Yellow => 'e',
            ColorKey::Gold => '6',
            ColorKey::Red => 'c',
        }
    }
}

/// Human-readable TPS band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TpsBand {
    /// 19 TPS and above
    Excellent,
    /// 18 to 19 TPS
    Good,
    /// 15 to 18 TPS
    Fair,
    /// Below 15 TPS
    Poor,
}

impl TpsBand {
    pub fn from_tps(tps: f64) -> Self {
        if tps >= 19.0 {
            TpsBand::Excellent
        } else if tps >= 18.0 {
            TpsBand::Good
        } else if tps >= 15.0 {
            TpsBand::Fair
        } else {
            TpsBand::Poor
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TpsBand::Excellent => "Excellent",
            TpsBand::Good => "Good",
            TpsBand::Fair => "Fair",
            TpsBand::Poor => "Poor",
        }
    }

    pub fn color(&self) -> ColorKey {
        match self {
            TpsBand::Excellent => ColorKey::Green,
            TpsBand::Good => ColorKey::Yellow,
            TpsBand::Fair => ColorKey::Gold,
            TpsBand::Poor => ColorKey::Red,
        }
    }
}

/// Map TPS to one of the discrete health bands {100, 80, 60, 40}
pub fn health_score(tps: f64) -> u8 {
    if tps >= health::EXCELLENT_TPS {
        100
    } else if tps >= health::GOOD_TPS {
        80
    } else if tps >= health::FAIR_TPS {
        60
    } else {
        40
    }
}

/// Color for a health score
pub fn health_color(score: u8) -> ColorKey {
    match score {
        80.. => ColorKey::Green,
        60..=79 => ColorKey::Yellow,
        40..=59 => ColorKey::Gold,
        _ => ColorKey::Red,
    }
}

/// Current health score plus a rolling history of past scores
#[derive(Debug)]
pub struct HealthScorer {
    score: u8,
    history: SampleWindow<u8>,
}

impl HealthScorer {
    pub fn new() -> Self {
        Self {
            score: 100,
            history: SampleWindow::new(health::HISTORY),
        }
    }

    /// Score the given TPS and append it to the history
    pub fn update(&mut self, tps: f64) -> u8 {
        self.score = health_score(tps);
        self.history.push(self.score);
        self.score
    }

    pub fn score(&self) -> u8 {
        self.score
    }

    pub fn history(&self) -> &SampleWindow<u8> {
        &self.history
    }
}

impl Default for HealthScorer {
    fn default() -> Self {
        Self::new()
    }
}
