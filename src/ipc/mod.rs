//! # IPC Module
//!
//! Communication between the foreground app and the scheduler daemon over a
//! Unix socket. The daemon is the server; the app connects, pushes alarm
//! snapshots, and receives fired-reminder events.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.4.0
//! - **Toggleable**: false

pub mod client;
pub mod protocol;
pub mod server;

pub use client::{connect_with_retry, IpcClient};
pub use protocol::{AppCommand, ArmedInfo, SchedulerEvent};
pub use server::SchedulerServer;
