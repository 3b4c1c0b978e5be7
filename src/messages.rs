//! Player-facing text
//!
//! The control loop only picks semantic bands; this module turns them into
//! formatted chat lines. `§` followed by a code is the client's color tag.

use crate::monitor::health::{health_color, ColorKey, TpsBand};
use crate::optimizer::{LagReport, OptimizerStatus};

const RESET: &str = "§r";
const BOLD: &str = "§l";

pub fn color(key: ColorKey) -> String {
    format!("§{}", key.code())
}

fn tps_color(tps: f64) -> String {
    color(TpsBand::from_tps(tps).color())
}

/// `[TPS]` reply
pub fn tps_line(tps: f64) -> String {
    format!(
        "§e{}[TPS] {}{:.2} TPS §7(Target: 20.0) {}",
        BOLD,
        tps_color(tps),
        tps,
        TpsBand::from_tps(tps).label()
    )
}

pub fn lag_alert(tps: f64) -> String {
    format!(
        "§c[Optimizer] WARNING: Low TPS: {}{:.2}§c/20.0",
        tps_color(tps),
        tps
    )
}

pub fn emergency_notice() -> String {
    format!("§c{}[EMERGENCY] §cEmergency optimization activated! View distance lowered.", BOLD)
}

pub fn restored_notice(view_distance: u32) -> String {
    format!("§a[Optimizer] Normal settings restored. View distance: {}", view_distance)
}

pub fn admin_greeting(tps: f64) -> Vec<String> {
    vec![
        format!("§e{}[Server Optimizer]", BOLD),
        format!("§7Current TPS: {}{:.2}§7/20.0", tps_color(tps), tps),
    ]
}

/// One-line HUD popup
pub fn performance_popup(tps: f64, players: usize, view_distance: u32) -> String {
    format!(
        "§e{}[OPT] {}TPS: {:.1}{}/20.0 §ePlayers: {} §eVD: {}",
        BOLD,
        tps_color(tps),
        tps,
        RESET,
        players,
        view_distance
    )
}

pub fn optimize_help() -> Vec<String> {
    vec![
        "§e=== Optimize Commands ===".to_string(),
        "§7/optimize status §f- View server status".to_string(),
        "§7/optimize full §f- Run full optimization".to_string(),
        "§7/optimize view <player> §f- Toggle TPS display for a player".to_string(),
    ]
}

pub fn status(status: &OptimizerStatus) -> Vec<String> {
    let rule = format!("§e{}═══════════════════", BOLD);
    let mut lines = vec![
        rule.clone(),
        format!("§e{}   Server Status", BOLD),
        rule.clone(),
        format!(
            "§eTPS: {}{:.2}§e/20.0 ({})",
            tps_color(status.tps),
            status.tps,
            status.band.label()
        ),
        format!(
            "§eHealth: {}{}§e/100",
            color(health_color(status.health_score)),
            status.health_score
        ),
        format!("§ePlayers: §f{}", status.online_players),
        format!(
            "§eView Distance: §f{}{}",
            status.view_distance,
            if status.auto_view_distance { " (auto)" } else { "" }
        ),
        format!("§eOptimization Total: §f{}", status.counters.total_optimizations),
    ];
    if status.emergency_active {
        lines.push("§c§lEmergency recovery active".to_string());
    }
    lines.push(rule);
    lines
}

pub fn lag_report(report: &LagReport) -> Vec<String> {
    let mut lines = vec![
        format!("§e{}=== LAG Report ===", BOLD),
        format!(
            "§eTPS: §f{:.2}§e/20.0 (avg §f{:.2}§e, target §f{:.1}§e)",
            report.tps, report.average_tps, report.target_tps
        ),
        format!("§eTick time: §f{:.1}ms §eavg, §f{:.1}ms §ep95", report.mspt_avg, report.mspt_p95),
        format!("§ePlayers: §f{}", report.online_players),
        format!("§eEstimated chunks: §f{}", report.estimated_chunks),
        format!("§eHealth: §f{}§e/100", report.health_score),
    ];
    if let Some(pct) = report.memory_percent {
        let avg = report.memory_average_percent.unwrap_or(pct);
        lines.push(format!("§eMemory: §f{:.1}% §e(avg §f{:.1}%§e)", pct, avg));
    }
    if let Some(slowest) = &report.slowest_task {
        lines.push(format!("§eSlowest task: §f{} §e({:.2}ms avg)", slowest.name, slowest.avg_ms));
    }
    if !report.slow_tasks.is_empty() {
        lines.push(format!("§6Slow tasks: §f{}", report.slow_tasks.join(", ")));
    }
    lines
}

pub fn view_distance_info(current: u32, auto: bool) -> Vec<String> {
    vec![
        format!("§e[View Distance] Current: §f{} chunks", current),
        format!("§7Auto Adjust: {}", if auto { "§aON" } else { "§cOFF" }),
    ]
}

pub fn view_distance_set(value: u32) -> String {
    format!("§a✓ Set view distance to {} chunks", value)
}

pub fn auto_view_distance(auto: bool) -> String {
    format!("§a✓ Auto View Distance set to: {}", if auto { "ON" } else { "OFF" })
}

pub fn full_optimization_done(chunks: u64, entities: u64) -> Vec<String> {
    vec![
        "§e[Optimizer] Running full optimization...".to_string(),
        format!("§a✓ Optimization Complete! Chunks: {}, Entities: {}", chunks, entities),
    ]
}

pub fn viewer_list(names: &[String]) -> Vec<String> {
    if names.is_empty() {
        return vec![
            "§e[Performance View] §7No players are currently viewing performance.".to_string(),
        ];
    }
    let mut lines = vec!["§e[Performance View] §7Players viewing:".to_string()];
    lines.extend(names.iter().map(|n| format!("§7- §f{}", n)));
    lines
}

/// Reply to the sender after toggling a viewer
pub fn viewer_toggled(name: &str, enabled: bool) -> String {
    if enabled {
        format!("§a✓ Enabled performance display for §f{}", name)
    } else {
        format!("§a✓ Disabled performance display for §f{}", name)
    }
}

/// Notice to the player whose display was toggled
pub fn viewer_notice(enabled: bool) -> String {
    if enabled {
        "§e[Performance View] §aPerformance display enabled.".to_string()
    } else {
        "§e[Performance View] §7Performance display disabled.".to_string()
    }
}
