//! # Core Module
//!
//! Core domain types and configuration for ZenInterval.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.1.0: Move reminder/routine entities into core::types
//! - 1.0.0: Initial creation with config module

pub mod config;
pub mod types;

// Re-export commonly used items
pub use config::Config;
pub use types::{default_configs, MeditationSession, Reminder, RoutineConfig, SoundType};
