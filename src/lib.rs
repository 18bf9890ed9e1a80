// Core layer - shared domain types and configuration
pub mod core;

// Scheduling layer - occurrence math, armed timers, notification delivery
pub mod scheduler;

// Storage layer - JSON-file store owned by the foreground app
pub mod store;

// IPC layer - communication between the app and the scheduler daemon
pub mod ipc;

// Re-export core items for convenience
pub use crate::core::{
    default_configs, Config, MeditationSession, Reminder, RoutineConfig, SoundType,
};

// Re-export scheduler items
pub use scheduler::{
    next_occurrence, AlarmScheduler, DesktopNotifier, EventNotifier, FanoutNotifier, Notifier,
};

// Re-export IPC items
pub use ipc::{connect_with_retry, AppCommand, ArmedInfo, IpcClient, SchedulerEvent, SchedulerServer};

// Re-export the store
pub use store::ReminderStore;
