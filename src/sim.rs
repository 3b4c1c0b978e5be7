//! Simulated game server
//!
//! Stands in for a real host when running the binary: players join and
//! leave at random, tick time grows with load and occasional lag spikes
//! stall the server for a while. The clock is virtual so lag shows up in
//! the TPS estimate even though the driver ticks at a steady 20 Hz.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use crate::host::{Host, Player, PlayerRef};

/// Simulation knobs
#[derive(Debug, Clone)]
pub struct SimConfig {
    pub max_players: usize,
    /// Chance per tick that a player joins
    pub join_chance: f64,
    /// Chance per tick that a random player leaves
    pub quit_chance: f64,
    /// Chance per tick that a lag spike starts
    pub spike_chance: f64,
    /// Every n-th player is an admin
    pub admin_every: usize,
    pub seed: Option<u64>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            max_players: 120,
            join_chance: 0.02,
            quit_chance: 0.01,
            spike_chance: 0.0005,
            admin_every: 10,
            seed: None,
        }
    }
}

impl SimConfig {
    /// Read `SIM_MAX_PLAYERS` and `SIM_SEED`, keeping defaults otherwise
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(max) = std::env::var("SIM_MAX_PLAYERS").ok().and_then(|s| s.parse().ok()) {
            config.max_players = max;
        }
        config.seed = std::env::var("SIM_SEED").ok().and_then(|s| s.parse().ok());
        config
    }
}

/// A simulated player; chat and popups go to the log
#[derive(Debug)]
pub struct SimPlayer {
    name: String,
    admin: bool,
}

impl Player for SimPlayer {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_admin(&self) -> bool {
        self.admin
    }

    fn send_message(&self, message: &str) -> anyhow::Result<()> {
        info!("[chat -> {}] {}", self.name, strip_color_codes(message));
        Ok(())
    }

    fn send_popup(&self, text: &str) -> anyhow::Result<()> {
        debug!("[popup -> {}] {}", self.name, strip_color_codes(text));
        Ok(())
    }
}

/// Remove `§x` tags so log output stays readable
pub fn strip_color_codes(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c == '§' {
            chars.next();
        } else {
            out.push(c);
        }
    }
    out
}

/// Player lifecycle changes produced by one simulation step
#[derive(Clone)]
pub enum SimEvent {
    Joined(PlayerRef),
    Left(String),
}

#[derive(Debug)]
struct SimState {
    now: Instant,
    players: Vec<Arc<SimPlayer>>,
    joined_total: usize,
    /// Remaining ticks of the current lag spike
    spike_ticks: u32,
    memory_percent: f32,
    rng: StdRng,
}

#[derive(Debug)]
pub struct SimulatedHost {
    config: SimConfig,
    state: Mutex<SimState>,
}

impl SimulatedHost {
    pub fn new(config: SimConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Self {
            config,
            state: Mutex::new(SimState {
                now: Instant::now(),
                players: Vec::new(),
                joined_total: 0,
                spike_ticks: 0,
                memory_percent: 35.0,
                rng,
            }),
        }
    }

    /// Simulate one server tick: move players in and out and advance the
    /// virtual clock by however long the tick took
    pub fn step(&self) -> Vec<SimEvent> {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let mut events = Vec::new();

        let has_room = state.players.len() < self.config.max_players;
        if has_room && state.rng.gen_bool(self.config.join_chance) {
            state.joined_total += 1;
            let id = state.joined_total;
            let player = Arc::new(SimPlayer {
                name: format!("Player{}", id),
                admin: self.config.admin_every > 0 && id % self.config.admin_every == 1,
            });
            debug!("{} joined", player.name);
            state.players.push(player.clone());
            events.push(SimEvent::Joined(player));
        }

        if !state.players.is_empty() && state.rng.gen_bool(self.config.quit_chance) {
            let idx = state.rng.gen_range(0..state.players.len());
            let player = state.players.swap_remove(idx);
            debug!("{} left", player.name);
            events.push(SimEvent::Left(player.name.clone()));
        }

        if state.spike_ticks == 0 && state.rng.gen_bool(self.config.spike_chance) {
            state.spike_ticks = state.rng.gen_range(200..600);
            info!("Simulated lag spike for {} ticks", state.spike_ticks);
        }

        let tick = Self::tick_duration(state);
        state.now += tick;

        let target = 35.0 + state.players.len() as f32 * 0.4;
        let drift = state.rng.gen_range(-0.5..0.5);
        let memory = state.memory_percent + (target - state.memory_percent) * 0.01 + drift;
        state.memory_percent = memory.clamp(0.0, 100.0);

        events
    }

    /// Work time grows with the player count; a tick never finishes early
    fn tick_duration(state: &mut SimState) -> Duration {
        let mut work_ms = 20.0 + state.players.len() as f64 * 0.25 + state.rng.gen_range(0.0..5.0);
        if state.spike_ticks > 0 {
            state.spike_ticks -= 1;
            work_ms += 60.0;
        }
        Duration::from_secs_f64(work_ms.max(50.0) / 1000.0)
    }
}

impl Host for SimulatedHost {
    fn now(&self) -> Instant {
        self.state.lock().now
    }

    fn online_players(&self) -> Vec<PlayerRef> {
        self.state
            .lock()
            .players
            .iter()
            .map(|p| p.clone() as PlayerRef)
            .collect()
    }

    fn online_player_count(&self) -> usize {
        self.state.lock().players.len()
    }

    fn reclaim_memory(&self) -> anyhow::Result<()> {
        let mut state = self.state.lock();
        state.memory_percent = (state.memory_percent - 5.0).max(20.0);
        Ok(())
    }

    fn memory_usage_percent(&self) -> Option<f32> {
        Some(self.state.lock().memory_percent)
    }
}
