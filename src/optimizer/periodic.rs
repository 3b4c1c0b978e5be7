//! Bodies of the periodic tasks

use tracing::{debug, error, info, warn};

use super::ServerOptimizer;
use crate::host::Host;
use crate::messages;
use crate::monitor::emergency::EmergencyTrigger;
use crate::monitor::memory::MemoryPressure;
use crate::monitor::overload::describe;
use crate::tasks::{run_guarded, PeriodicTask};

impl<H: Host> ServerOptimizer<H> {
    pub(super) fn run_periodic(&mut self, task: PeriodicTask) -> anyhow::Result<()> {
        match task {
            PeriodicTask::MonitorPerformance => self.monitor_performance(),
            PeriodicTask::FastOptimizationCheck => self.fast_optimization_check(),
            PeriodicTask::AutoOptimize => self.auto_optimize(),
            PeriodicTask::CleanupChunks => self.cleanup_chunks(),
            PeriodicTask::AdjustViewDistance => self.adjust_view_distance(),
            PeriodicTask::PeriodicMemoryCleanup => self.periodic_memory_cleanup(),
            PeriodicTask::UpdatePerformanceDisplay => self.update_performance_display(),
            PeriodicTask::MonitorOverload => self.monitor_overload(),
            PeriodicTask::CheckServerHealth => self.check_server_health(),
            PeriodicTask::MonitorMemory => self.monitor_memory(),
        }
    }

    fn monitor_performance(&mut self) -> anyhow::Result<()> {
        self.estimator.record_tick(self.host.now());
        let tps = self.estimator.sample();
        self.optimizations.update_estimate(self.host.online_player_count());

        if tps < self.config.tps_critical {
            self.notify_admins_lag(tps);
        }
        Ok(())
    }

    fn fast_optimization_check(&mut self) -> anyhow::Result<()> {
        if !self.config.auto_optimize {
            return Ok(());
        }

        let tps = self.tps();
        if tps < self.config.tps_critical {
            warn!("Critical TPS detected: {:.2}. Initiating emergency recovery.", tps);
            self.emergency_recovery(EmergencyTrigger::CriticalTps(tps));
        }
        Ok(())
    }

    fn auto_optimize(&mut self) -> anyhow::Result<()> {
        if !self.config.auto_optimize {
            return Ok(());
        }

        let now = self.host.now();
        let tps = self.tps();
        if !self.optimizations.auto_optimize_due(now, tps, self.config.tps_warning) {
            return Ok(());
        }

        info!("Auto-optimization triggered (TPS: {:.2})", tps);
        let chunks = self.optimizations.optimize_chunks();
        let entities = self.optimizations.optimize_entities();
        self.optimizations.record_auto_run(now);
        // Reclaim failure is logged; the pass above stands
        let _ = run_guarded("auto_optimize_memory", || self.optimize_memory());
        info!(
            "Auto-optimization complete. Chunks cleared: {}, Entities removed: {}",
            chunks, entities
        );
        Ok(())
    }

    fn cleanup_chunks(&mut self) -> anyhow::Result<()> {
        if !self.config.auto_optimize {
            return Ok(());
        }

        let cleared = self.optimizations.cleanup_chunks();
        if cleared > 0 {
            info!("Chunk cleanup: {} chunks cleared (estimated)", cleared);
        }
        Ok(())
    }

    fn adjust_view_distance(&mut self) -> anyhow::Result<()> {
        let tps = self.tps();
        if let Some(distance) = self.view_distance.adjust(tps) {
            info!("Adjusted view distance to {} due to TPS of {:.2}", distance, tps);
        }
        Ok(())
    }

    fn periodic_memory_cleanup(&mut self) -> anyhow::Result<()> {
        if !self.config.auto_optimize {
            return Ok(());
        }
        self.optimize_memory()
    }

    fn update_performance_display(&mut self) -> anyhow::Result<()> {
        if self.viewers.is_empty() {
            return Ok(());
        }

        let popup = messages::performance_popup(
            self.tps(),
            self.host.online_player_count(),
            self.view_distance.current(),
        );

        for name in self.viewers.names() {
            let Some(player) = self.host.find_player(&name) else {
                self.viewers.remove(&name);
                debug!("Viewer {} is offline; removed", name);
                continue;
            };

            if let Err(e) = player.send_popup(&popup) {
                self.viewers.remove(&name);
                debug!("Viewer {} is unreachable ({:#}); removed", name, e);
            }
        }
        Ok(())
    }

    fn monitor_overload(&mut self) -> anyhow::Result<()> {
        let check = self.overload.evaluate(
            self.host.online_player_count(),
            self.optimizations.estimated_chunks(),
            self.memory.latest(),
        );

        if !check.warnings.is_empty() {
            warn!("Approaching overload: {}", describe(&check.warnings));
        }

        if check.is_overloaded() {
            error!("=== OVERLOAD DETECTED: {} ===", describe(&check.critical));
            self.emergency_recovery(EmergencyTrigger::Overload(check.critical));
        }
        Ok(())
    }

    fn check_server_health(&mut self) -> anyhow::Result<()> {
        let previous = self.health.score();
        let score = self.health.update(self.tps());
        if score != previous {
            info!("Server health changed: {} -> {}", previous, score);
        }
        Ok(())
    }

    fn monitor_memory(&mut self) -> anyhow::Result<()> {
        let Some(percent) = self.host.memory_usage_percent() else {
            return Ok(());
        };

        match self.memory.record(percent) {
            MemoryPressure::Critical => error!("Critical memory usage: {:.1}%", percent),
            MemoryPressure::Warning => warn!("High memory usage: {:.1}%", percent),
            MemoryPressure::Normal => {}
        }
        Ok(())
    }
}
