//! The optimizer
//!
//! `ServerOptimizer` owns every piece of control state and the tick
//! scheduler that drives it. The host calls [`ServerOptimizer::tick`] once
//! per server tick; due tasks run one after another, each isolated by
//! [`run_guarded`] so a failing task never affects the others.

mod commands;
mod periodic;

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::OptimizerConfig;
use crate::host::{Host, Player};
use crate::messages;
use crate::metrics::Metrics;
use crate::monitor::alert::AlertCooldown;
use crate::monitor::emergency::{EmergencyController, EmergencyTrigger};
use crate::monitor::health::{HealthScorer, TpsBand};
use crate::monitor::memory::MemoryMonitor;
use crate::monitor::optimize::{OptimizationCounters, Optimizations};
use crate::monitor::overload::OverloadThresholds;
use crate::monitor::tps::TpsEstimator;
use crate::monitor::view_distance::{ViewDistanceController, ViewDistanceError};
use crate::monitor::viewers::PerformanceViewers;
use crate::tasks::{run_guarded, PeriodicTask, Task, TaskHandle, TaskProfiler, TickScheduler};

/// Snapshot behind `/optimize status`
#[derive(Debug, Clone, Serialize)]
pub struct OptimizerStatus {
    pub tps: f64,
    pub average_tps: f64,
    pub band: TpsBand,
    pub health_score: u8,
    pub online_players: usize,
    pub view_distance: u32,
    pub auto_view_distance: bool,
    pub aggressive_mode: bool,
    pub emergency_active: bool,
    pub estimated_chunks: u64,
    pub counters: OptimizationCounters,
    pub viewers: usize,
    pub tick: u64,
}

/// Snapshot behind `/lag`
#[derive(Debug, Clone, Serialize)]
pub struct LagReport {
    pub tps: f64,
    pub average_tps: f64,
    pub target_tps: f64,
    /// Milliseconds per tick
    pub mspt_avg: f64,
    pub mspt_p95: f64,
    pub online_players: usize,
    pub estimated_chunks: u64,
    pub health_score: u8,
    pub memory_percent: Option<f32>,
    pub memory_average_percent: Option<f32>,
    pub slow_tasks: Vec<&'static str>,
    pub slowest_task: Option<TaskTiming>,
}

/// Average run time of one periodic task
#[derive(Debug, Clone, Serialize)]
pub struct TaskTiming {
    pub name: &'static str,
    pub avg_ms: f64,
}

pub struct ServerOptimizer<H: Host> {
    config: OptimizerConfig,
    host: H,
    metrics: Arc<Metrics>,
    scheduler: TickScheduler<Task>,
    estimator: TpsEstimator,
    health: HealthScorer,
    view_distance: ViewDistanceController,
    overload: OverloadThresholds,
    emergency: EmergencyController,
    optimizations: Optimizations,
    lag_alert: AlertCooldown,
    viewers: PerformanceViewers,
    memory: MemoryMonitor,
    profiler: TaskProfiler,
    running: bool,
}

impl<H: Host> ServerOptimizer<H> {
    /// An invalid `config` is logged and replaced by the defaults
    pub fn new(config: OptimizerConfig, host: H, metrics: Arc<Metrics>) -> Self {
        let config = match config.validate() {
            Ok(()) => config,
            Err(e) => {
                warn!("Invalid optimizer configuration ({}); using defaults", e);
                OptimizerConfig::default()
            }
        };
        let estimator = TpsEstimator::new(host.now());
        let view_distance = ViewDistanceController::new(
            config.base_view_distance,
            config.min_view_distance,
            config.max_view_distance,
            config.view_distance_bands(),
        );

        Self {
            estimator,
            health: HealthScorer::new(),
            view_distance,
            overload: config.overload_thresholds(),
            emergency: EmergencyController::new(),
            optimizations: Optimizations::new(config.cleanup_thresholds()),
            lag_alert: AlertCooldown::new(config.lag_alert_cooldown),
            viewers: PerformanceViewers::new(),
            memory: MemoryMonitor::new(
                config.memory_warning_percent,
                config.memory_critical_percent,
            ),
            profiler: TaskProfiler::new(config.max_task_duration),
            scheduler: TickScheduler::new(),
            running: false,
            config,
            host,
            metrics,
        }
    }

    /// Register the periodic tasks. Calling it twice is a no-op.
    pub fn init(&mut self) {
        if self.running {
            return;
        }

        info!("=== Server Optimizer Enabled ===");
        info!(
            "Auto-optimize: {}, view distance {} (range {}-{})",
            self.config.auto_optimize,
            self.view_distance.current(),
            self.view_distance.min(),
            self.view_distance.max()
        );

        for task in PeriodicTask::ALL {
            let (delay, period) = task.schedule();
            self.scheduler.schedule_repeating(delay, period, Task::Periodic(task));
        }
        self.running = true;
        self.publish_metrics();

        info!("All optimization tasks started! ({} tasks)", PeriodicTask::ALL.len());
        info!("Crash protection: ENABLED");
    }

    /// Cancel everything still scheduled, including a pending restoration
    pub fn shutdown(&mut self) {
        if !self.running {
            return;
        }

        self.running = false;
        self.scheduler.cancel_all();

        let counters = self.optimizations.counters();
        info!("=== Server Optimizer Disabled ===");
        info!(
            "Total Optimizations: {} (chunks cleared: {}, entities removed: {})",
            counters.total_optimizations,
            counters.chunks_cleared_total,
            counters.entities_removed_total
        );
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Advance one server tick and run everything due on it
    pub fn tick(&mut self) {
        if !self.running {
            return;
        }

        for (handle, task) in self.scheduler.advance() {
            // A task may have shut the optimizer down mid-tick
            if !self.running {
                break;
            }
            self.run_task(handle, task);
        }

        self.publish_metrics();
    }

    fn run_task(&mut self, handle: TaskHandle, task: Task) {
        let name = task.name();
        let started = Instant::now();

        let result = run_guarded(name, || self.dispatch(handle, task));

        self.profiler.record_duration(name, started.elapsed());
        self.profiler.record_outcome(name, result.is_ok());
        if result.is_err() {
            self.metrics.task_failures_total.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn dispatch(&mut self, handle: TaskHandle, task: Task) -> anyhow::Result<()> {
        match task {
            Task::Periodic(task) => self.run_periodic(task),
            Task::RestoreNormal => {
                self.restore_normal(handle);
                Ok(())
            }
            Task::GreetAdmin(name) => self.greet_admin(&name),
        }
    }

    /// Current TPS estimate
    pub fn tps(&self) -> f64 {
        self.estimator.calculate_tps()
    }

    pub fn average_tps(&self) -> f64 {
        self.estimator.average_tps()
    }

    /// Enter emergency mode: minimum view distance, aggressive cleanup,
    /// immediate optimization and an admin notice, then schedule the
    /// restoration. Re-entering while active reschedules the restoration.
    pub fn emergency_recovery(&mut self, trigger: EmergencyTrigger) {
        warn!("=== EMERGENCY CRASH RECOVERY ACTIVATED ({}) ===", trigger.describe());

        let previous = self.view_distance.force_min();
        self.optimizations.set_aggressive(true);

        // Every step runs even if an earlier one failed
        let outcomes = [
            run_guarded("emergency_optimize_chunks", || {
                let cleared = self.optimizations.optimize_chunks();
                debug!("Emergency chunk cleanup: {} cleared (estimated)", cleared);
                Ok(())
            }),
            run_guarded("emergency_optimize_entities", || {
                let removed = self.optimizations.optimize_entities();
                debug!("Emergency entity cleanup: {} removed (estimated)", removed);
                Ok(())
            }),
            run_guarded("emergency_optimize_memory", || self.optimize_memory()),
            run_guarded("emergency_notify_admins", || {
                self.notify_admins(&messages::emergency_notice()).map(|_| ())
            }),
        ];
        let failed = outcomes.iter().filter(|outcome| outcome.is_err()).count();

        let handle = self
            .scheduler
            .schedule_once(self.config.emergency_restore_delay_ticks, Task::RestoreNormal);
        let now = self.host.now();
        if let Some(superseded) = self.emergency.activate(now, previous, trigger, handle) {
            self.scheduler.cancel(superseded);
            info!("Emergency re-triggered; restoration rescheduled");
        }

        if failed > 0 {
            warn!(
                "=== EMERGENCY RECOVERY COMPLETE with {} failed step(s). \
                 Restoration scheduled. ===",
                failed
            );
        } else {
            warn!("=== EMERGENCY RECOVERY COMPLETE. Restoration scheduled. ===");
        }
    }

    /// Leave emergency mode if `handle` is the pending restoration
    fn restore_normal(&mut self, handle: TaskHandle) {
        let Some(state) = self.emergency.restore(handle) else {
            debug!("Ignoring superseded restoration {:?}", handle);
            return;
        };

        self.view_distance.reset_to_base();
        self.optimizations.set_aggressive(false);

        let lasted = self.host.now().saturating_duration_since(state.activated_at);
        info!(
            "Normal optimization settings restored. View distance {} \
             (was {} before the emergency), lasted {:.0}s over {} trigger(s)",
            self.view_distance.current(),
            state.previous_view_distance,
            lasted.as_secs_f64(),
            state.entries
        );

        let notice = messages::restored_notice(self.view_distance.current());
        if let Err(e) = self.notify_admins(&notice) {
            warn!("Restoration notice incomplete: {:#}", e);
        }
    }

    /// Process-wide memory reclaim hint
    fn optimize_memory(&self) -> anyhow::Result<()> {
        self.host
            .reclaim_memory()
            .map_err(|e| e.context("memory reclaim failed"))?;
        info!("Memory reclaim executed.");
        Ok(())
    }

    /// Send `message` to every admin. Every admin is tried; the error lists
    /// the ones that could not be reached.
    fn notify_admins(&self, message: &str) -> anyhow::Result<usize> {
        let mut sent = 0;
        let mut failures = Vec::new();

        for player in self.host.online_players().iter().filter(|p| p.is_admin()) {
            match player.send_message(message) {
                Ok(()) => sent += 1,
                Err(e) => failures.push(format!("{} ({:#})", player.name(), e)),
            }
        }

        if !failures.is_empty() {
            anyhow::bail!("could not notify {}", failures.join(", "));
        }
        Ok(sent)
    }

    /// Cooldown-gated low TPS alert to admins. Returns whether it fired.
    pub fn notify_admins_lag(&mut self, tps: f64) -> bool {
        if !self.lag_alert.try_fire(self.host.now()) {
            return false;
        }

        self.metrics.lag_alerts_total.fetch_add(1, Ordering::Relaxed);
        match self.notify_admins(&messages::lag_alert(tps)) {
            Ok(sent) => debug!("Lag alert ({:.2} TPS) sent to {} admin(s)", tps, sent),
            Err(e) => warn!("Lag alert incomplete: {:#}", e),
        }
        true
    }

    /// Schedule the TPS greeting for an admin who just joined
    pub fn on_player_join(&mut self, player: &dyn Player) {
        if !player.is_admin() {
            return;
        }
        self.scheduler.schedule_once(
            self.config.admin_greeting_delay_ticks,
            Task::GreetAdmin(player.name().to_string()),
        );
    }

    pub fn on_player_quit(&mut self, name: &str) {
        if self.viewers.remove(name) {
            debug!("{} left; removed from performance viewers", name);
        }
    }

    fn greet_admin(&self, name: &str) -> anyhow::Result<()> {
        let Some(player) = self.host.find_player(name) else {
            debug!("{} left before the greeting", name);
            return Ok(());
        };

        // Admin rights may have been revoked in the meantime
        if !player.is_admin() {
            return Ok(());
        }

        for line in messages::admin_greeting(self.tps()) {
            player.send_message(&line)?;
        }
        Ok(())
    }

    /// Manual view distance override; disables automatic adjustment
    pub fn set_view_distance(&mut self, value: u32) -> Result<(), ViewDistanceError> {
        self.view_distance.set(value)?;
        info!("View distance manually set to {} (auto adjust off)", value);
        Ok(())
    }

    /// Chunks, entities and memory in one pass. Not counted as an
    /// auto-optimization.
    pub fn run_full_optimization(&mut self) -> (u64, u64) {
        let chunks = self.optimizations.optimize_chunks();
        let entities = self.optimizations.optimize_entities();
        let _ = run_guarded("full_optimize_memory", || self.optimize_memory());
        info!("Full optimization complete. Chunks: {}, Entities: {}", chunks, entities);
        (chunks, entities)
    }

    pub fn status(&self) -> OptimizerStatus {
        let tps = self.tps();
        OptimizerStatus {
            tps,
            average_tps: self.average_tps(),
            band: TpsBand::from_tps(tps),
            health_score: self.health.score(),
            online_players: self.host.online_player_count(),
            view_distance: self.view_distance.current(),
            auto_view_distance: self.view_distance.is_auto(),
            aggressive_mode: self.optimizations.is_aggressive(),
            emergency_active: self.emergency.is_active(),
            estimated_chunks: self.optimizations.estimated_chunks(),
            counters: self.optimizations.counters(),
            viewers: self.viewers.len(),
            tick: self.scheduler.current_tick(),
        }
    }

    pub fn lag_report(&self) -> LagReport {
        LagReport {
            tps: self.tps(),
            average_tps: self.average_tps(),
            target_tps: self.config.tps_target,
            mspt_avg: self.estimator.average_tick_duration().as_secs_f64() * 1000.0,
            mspt_p95: self.estimator.p95_tick_duration().as_secs_f64() * 1000.0,
            online_players: self.host.online_player_count(),
            estimated_chunks: self.optimizations.estimated_chunks(),
            health_score: self.health.score(),
            memory_percent: self.memory.latest(),
            memory_average_percent: self.memory.average(),
            slow_tasks: self.profiler.slow_tasks(),
            slowest_task: self.profiler.slowest_task().map(|(name, avg)| TaskTiming {
                name,
                avg_ms: avg.as_secs_f64() * 1000.0,
            }),
        }
    }

    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn view_distance(&self) -> &ViewDistanceController {
        &self.view_distance
    }

    pub fn emergency(&self) -> &EmergencyController {
        &self.emergency
    }

    pub fn optimizations(&self) -> &Optimizations {
        &self.optimizations
    }

    pub fn viewers(&self) -> &PerformanceViewers {
        &self.viewers
    }

    pub fn profiler(&self) -> &TaskProfiler {
        &self.profiler
    }

    pub fn health(&self) -> &HealthScorer {
        &self.health
    }

    pub fn current_tick(&self) -> u64 {
        self.scheduler.current_tick()
    }

    pub fn pending_tasks(&self) -> usize {
        self.scheduler.pending_count()
    }

    fn publish_metrics(&self) {
        let m = &self.metrics;
        let tps = self.tps();
        let counters = self.optimizations.counters();

        m.tick_count.store(self.scheduler.current_tick(), Ordering::Relaxed);
        m.tps_x100.store((tps * 100.0).round() as u64, Ordering::Relaxed);
        m.average_tps_x100
            .store((self.average_tps() * 100.0).round() as u64, Ordering::Relaxed);
        m.tick_time_avg_us.store(
            self.estimator.average_tick_duration().as_micros() as u64,
            Ordering::Relaxed,
        );
        m.tick_time_p95_us.store(
            self.estimator.p95_tick_duration().as_micros() as u64,
            Ordering::Relaxed,
        );
        m.health_score.store(self.health.score() as u64, Ordering::Relaxed);
        m.view_distance.store(self.view_distance.current() as u64, Ordering::Relaxed);
        m.auto_view_distance
            .store(self.view_distance.is_auto() as u64, Ordering::Relaxed);
        m.aggressive_mode
            .store(self.optimizations.is_aggressive() as u64, Ordering::Relaxed);
        m.emergency_active
            .store(self.emergency.is_active() as u64, Ordering::Relaxed);
        m.emergency_activations
            .store(self.emergency.activations(), Ordering::Relaxed);
        m.online_players
            .store(self.host.online_player_count() as u64, Ordering::Relaxed);
        m.estimated_chunks
            .store(self.optimizations.estimated_chunks(), Ordering::Relaxed);
        m.memory_percent_x10.store(
            self.memory.latest().map_or(0, |pct| (pct * 10.0).round() as u64),
            Ordering::Relaxed,
        );
        m.performance_viewers.store(self.viewers.len() as u64, Ordering::Relaxed);
        m.optimizations_total
            .store(counters.total_optimizations, Ordering::Relaxed);
        m.chunks_cleared_total
            .store(counters.chunks_cleared_total, Ordering::Relaxed);
        m.entities_removed_total
            .store(counters.entities_removed_total, Ordering::Relaxed);
    }
}
