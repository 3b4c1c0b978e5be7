//! Prometheus-compatible metrics endpoint
//!
//! Exposes optimizer state in Prometheus format for Grafana dashboards.
//! Default endpoint: http://localhost:9090/metrics

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tracing::{debug, info};

/// Metrics registry for the optimizer
#[derive(Debug)]
pub struct Metrics {
    // Tick timing
    pub tick_count: AtomicU64,
    pub tps_x100: AtomicU64,
    pub average_tps_x100: AtomicU64,
    pub tick_time_avg_us: AtomicU64,
    pub tick_time_p95_us: AtomicU64,

    // Control state
    pub health_score: AtomicU64,
    pub view_distance: AtomicU64,
    pub auto_view_distance: AtomicU64, // 0 or 1
    pub aggressive_mode: AtomicU64,    // 0 or 1
    pub emergency_active: AtomicU64,   // 0 or 1
    pub emergency_activations: AtomicU64,

    // Load
    pub online_players: AtomicU64,
    pub estimated_chunks: AtomicU64,
    pub memory_percent_x10: AtomicU64,
    pub performance_viewers: AtomicU64,

    // Optimization totals
    pub optimizations_total: AtomicU64,
    pub chunks_cleared_total: AtomicU64,
    pub entities_removed_total: AtomicU64,

    // Alerting and task health
    pub lag_alerts_total: AtomicU64,
    pub task_failures_total: AtomicU64,

    start_time: Instant,
}

/// Point-in-time copy of the registry for JSON output
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub tick_count: u64,
    pub tps: f64,
    pub average_tps: f64,
    pub tick_time_avg_us: u64,
    pub tick_time_p95_us: u64,
    pub health_score: u64,
    pub view_distance: u64,
    pub auto_view_distance: bool,
    pub aggressive_mode: bool,
    pub emergency_active: bool,
    pub emergency_activations: u64,
    pub online_players: u64,
    pub estimated_chunks: u64,
    pub memory_percent: Option<f64>,
    pub performance_viewers: u64,
    pub optimizations_total: u64,
    pub chunks_cleared_total: u64,
    pub entities_removed_total: u64,
    pub lag_alerts_total: u64,
    pub task_failures_total: u64,
    pub uptime_seconds: u64,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            tick_count: AtomicU64::new(0),
            tps_x100: AtomicU64::new(2000),
            average_tps_x100: AtomicU64::new(2000),
            tick_time_avg_us: AtomicU64::new(0),
            tick_time_p95_us: AtomicU64::new(0),
            health_score: AtomicU64::new(100),
            view_distance: AtomicU64::new(0),
            auto_view_distance: AtomicU64::new(1),
            aggressive_mode: AtomicU64::new(0),
            emergency_active: AtomicU64::new(0),
            emergency_activations: AtomicU64::new(0),
            online_players: AtomicU64::new(0),
            estimated_chunks: AtomicU64::new(0),
            memory_percent_x10: AtomicU64::new(0),
            performance_viewers: AtomicU64::new(0),
            optimizations_total: AtomicU64::new(0),
            chunks_cleared_total: AtomicU64::new(0),
            entities_removed_total: AtomicU64::new(0),
            lag_alerts_total: AtomicU64::new(0),
            task_failures_total: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    /// Get uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let memory = self.memory_percent_x10.load(Ordering::Relaxed);
        MetricsSnapshot {
            tick_count: self.tick_count.load(Ordering::Relaxed),
            tps: self.tps_x100.load(Ordering::Relaxed) as f64 / 100.0,
            average_tps: self.average_tps_x100.load(Ordering::Relaxed) as f64 / 100.0,
            tick_time_avg_us: self.tick_time_avg_us.load(Ordering::Relaxed),
            tick_time_p95_us: self.tick_time_p95_us.load(Ordering::Relaxed),
            health_score: self.health_score.load(Ordering::Relaxed),
            view_distance: self.view_distance.load(Ordering::Relaxed),
            auto_view_distance: self.auto_view_distance.load(Ordering::Relaxed) == 1,
            aggressive_mode: self.aggressive_mode.load(Ordering::Relaxed) == 1,
            emergency_active: self.emergency_active.load(Ordering::Relaxed) == 1,
            emergency_activations: self.emergency_activations.load(Ordering::Relaxed),
            online_players: self.online_players.load(Ordering::Relaxed),
            estimated_chunks: self.estimated_chunks.load(Ordering::Relaxed),
            // 0 means the host never reported memory
            memory_percent: (memory > 0).then(|| memory as f64 / 10.0),
            performance_viewers: self.performance_viewers.load(Ordering::Relaxed),
            optimizations_total: self.optimizations_total.load(Ordering::Relaxed),
            chunks_cleared_total: self.chunks_cleared_total.load(Ordering::Relaxed),
            entities_removed_total: self.entities_removed_total.load(Ordering::Relaxed),
            lag_alerts_total: self.lag_alerts_total.load(Ordering::Relaxed),
            task_failures_total: self.task_failures_total.load(Ordering::Relaxed),
            uptime_seconds: self.uptime_seconds(),
        }
    }

    /// Generate Prometheus-format metrics output
    pub fn to_prometheus(&self) -> String {
        let s = self.snapshot();
        let mut output = String::with_capacity(4096);

        // Helper macro for metrics
        macro_rules! metric {
            ($name:expr, $help:expr, $type:expr, $value:expr) => {
                output.push_str(&format!(
                    "# HELP {} {}\n# TYPE {} {}\n{} {}\n",
                    $name, $help, $name, $type, $name, $value
                ));
            };
        }

        // Tick metrics
        metric!("server_optimizer_tick_count", "Total ticks observed", "counter", s.tick_count);
        metric!("server_optimizer_tps", "Current ticks per second", "gauge", s.tps);
        metric!("server_optimizer_tps_average", "Rolling average ticks per second", "gauge",
            s.average_tps);
        metric!("server_optimizer_tick_time_microseconds", "Average tick time in microseconds",
            "gauge", s.tick_time_avg_us);
        metric!("server_optimizer_tick_time_p95_microseconds", "95th percentile tick time", "gauge",
            s.tick_time_p95_us);

        // Control state
        metric!("server_optimizer_health_score", "Server health score (40-100)", "gauge",
            s.health_score);
        metric!("server_optimizer_view_distance", "Current view distance in chunks", "gauge",
            s.view_distance);
        metric!("server_optimizer_view_distance_auto", "Automatic view distance enabled (0/1)",
            "gauge", s.auto_view_distance as u8);
        metric!("server_optimizer_aggressive_mode", "Aggressive cleanup enabled (0/1)", "gauge",
            s.aggressive_mode as u8);
        metric!("server_optimizer_emergency_active", "Emergency recovery active (0/1)", "gauge",
            s.emergency_active as u8);
        metric!("server_optimizer_emergency_activations_total", "Emergency recovery episodes",
            "counter", s.emergency_activations);

        // Load
        metric!("server_optimizer_players_online", "Online players", "gauge", s.online_players);
        metric!("server_optimizer_chunks_estimated", "Estimated loaded chunks", "gauge",
            s.estimated_chunks);
        metric!("server_optimizer_performance_viewers", "Players viewing the performance HUD",
            "gauge", s.performance_viewers);
        if let Some(pct) = s.memory_percent {
            metric!("server_optimizer_memory_percent", "Memory usage percent", "gauge", pct);
        }

        // Totals
        metric!("server_optimizer_optimizations_total", "Auto-optimization passes", "counter",
            s.optimizations_total);
        metric!("server_optimizer_chunks_cleared_total", "Chunks cleared (estimated)", "counter",
            s.chunks_cleared_total);
        metric!("server_optimizer_entities_removed_total", "Entities removed (estimated)",
            "counter", s.entities_removed_total);
        metric!("server_optimizer_lag_alerts_total", "Lag alert bursts sent to admins", "counter",
            s.lag_alerts_total);
        metric!("server_optimizer_task_failures_total", "Periodic task runs that failed", "counter",
            s.task_failures_total);
        metric!("server_optimizer_uptime_seconds", "Optimizer uptime in seconds", "counter",
            s.uptime_seconds);

        output
    }

    /// Generate JSON format metrics (alternative for direct API access)
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(&self.snapshot()).unwrap_or_else(|e| {
            format!(r#"{{"error": "{}"}}"#, e)
        })
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Start the metrics HTTP server
pub async fn start_metrics_server(metrics: Arc<Metrics>, port: u16) -> anyhow::Result<()> {
    let addr = format!("0.0.0.0:{}", port);
    let listener = TcpListener::bind(&addr).await?;

    info!("Metrics server listening on http://{}/metrics", addr);

    loop {
        let (mut socket, peer) = listener.accept().await?;
        let metrics = metrics.clone();

        tokio::spawn(async move {
            let mut buffer = [0u8; 1024];

            match socket.read(&mut buffer).await {
                Ok(n) if n > 0 => {
                    let request = String::from_utf8_lossy(&buffer[..n]);
                    let response = route(&metrics, &request);

                    if let Err(e) = socket.write_all(response.as_bytes()).await {
                        debug!("Failed to write metrics response to {}: {}", peer, e);
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    debug!("Failed to read from metrics socket {}: {}", peer, e);
                }
            }
        });
    }
}

/// Build the HTTP response for a raw request
fn route(metrics: &Metrics, request: &str) -> String {
    let respond = |content_type: &str, body: &str| {
        format!(
            "HTTP/1.1 200 OK\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            content_type,
            body.len(),
            body
        )
    };

    // The JSON route shares the /metrics prefix, so it is matched first
    if request.starts_with("GET /metrics/json") || request.starts_with("GET /json") {
        respond("application/json", &metrics.to_json())
    } else if request.starts_with("GET /metrics") {
        respond("text/plain; version=0.0.4", &metrics.to_prometheus())
    } else if request.starts_with("GET /health") || request.starts_with("GET / ") {
        respond("text/plain", "OK")
    } else {
        "HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n".to_string()
    }
}
