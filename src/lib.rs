//! Server Optimizer Library
//!
//! Tick-driven performance watchdog for a multiplayer game server.
//!
//! # Overview
//!
//! - `monitor` - TPS estimation, health scoring, view distance hysteresis,
//!   overload detection and emergency recovery state
//! - `tasks` - tick scheduler, failure isolation and task profiling
//! - `optimizer` - [`optimizer::ServerOptimizer`], the single owner of all state
//! - `host` - traits the surrounding game server implements
//! - `sim` - simulated host used by the binary

pub mod command;
pub mod config;
pub mod host;
pub mod messages;
pub mod metrics;
pub mod monitor;
pub mod optimizer;
pub mod sim;
pub mod tasks;
