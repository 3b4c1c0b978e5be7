use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use server_optimizer::command::ConsoleSender;
use server_optimizer::config::OptimizerConfig;
use server_optimizer::metrics::{self, Metrics};
use server_optimizer::monitor::constants::tick;
use server_optimizer::optimizer::ServerOptimizer;
use server_optimizer::sim::{strip_color_codes, SimConfig, SimEvent, SimulatedHost};

type SharedOptimizer = Arc<Mutex<ServerOptimizer<SimulatedHost>>>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    info!("Server Optimizer v{}", env!("CARGO_PKG_VERSION"));
    info!("=== Server Optimizer Loading ===");

    // Load configuration
    let config = OptimizerConfig::load_or_default();
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("invalid configuration: {}", e))?;
    info!(
        "Configuration loaded: auto_optimize={}, view distance {} ({}-{}), tps critical {:.1}",
        config.auto_optimize,
        config.base_view_distance,
        config.min_view_distance,
        config.max_view_distance,
        config.tps_critical
    );

    // Initialize metrics
    let metrics = Arc::new(Metrics::new());

    // Start metrics server on port 9090 (configurable via METRICS_PORT)
    let metrics_port: u16 = std::env::var("METRICS_PORT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(9090);

    let metrics_clone = metrics.clone();
    tokio::spawn(async move {
        if let Err(e) = metrics::start_metrics_server(metrics_clone, metrics_port).await {
            error!("Metrics server error: {}", e);
        }
    });

    let host = SimulatedHost::new(SimConfig::from_env());
    let mut optimizer = ServerOptimizer::new(config, host, metrics);
    optimizer.init();
    let optimizer: SharedOptimizer = Arc::new(Mutex::new(optimizer));

    info!("Server loaded - Optimizer ready! Type commands (e.g. `tps`, `lag`) on stdin");

    // Shutdown signal handler
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Shutdown signal received");
    };

    tokio::select! {
        _ = run_ticks(optimizer.clone()) => {}
        _ = run_console(optimizer.clone()) => {
            info!("Console closed");
        }
        _ = shutdown => {
            info!("Shutting down...");
        }
    }

    optimizer.lock().shutdown();
    info!("Server stopped");

    Ok(())
}

/// Drive the simulated server at the nominal tick rate
async fn run_ticks(optimizer: SharedOptimizer) {
    let mut interval = tokio::time::interval(Duration::from_secs_f64(1.0 / tick::RATE as f64));
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        interval.tick().await;

        let mut optimizer = optimizer.lock();
        let events = optimizer.host().step();
        for event in events {
            match event {
                SimEvent::Joined(player) => optimizer.on_player_join(player.as_ref()),
                SimEvent::Left(name) => optimizer.on_player_quit(&name),
            }
        }
        optimizer.tick();
    }
}

/// Execute stdin lines as console commands
async fn run_console(optimizer: SharedOptimizer) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => {
                // No console attached; keep the server running
                std::future::pending::<()>().await;
                return;
            }
            Err(e) => {
                warn!("Console read failed: {}", e);
                return;
            }
        };

        let mut parts = line.split_whitespace();
        let Some(label) = parts.next() else {
            continue;
        };
        let label = label.trim_start_matches('/');
        let args: Vec<&str> = parts.collect();

        match optimizer.lock().dispatch_command(&ConsoleSender, label, &args) {
            Ok(reply) => {
                for line in reply {
                    println!("{}", strip_color_codes(&line));
                }
            }
            Err(e) => println!("{}", e),
        }
    }
}
