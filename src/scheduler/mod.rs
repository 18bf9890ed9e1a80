//! # Scheduler Module
//!
//! Alarm scheduling and delivery: next-occurrence math, the armed-timer set,
//! and the notification backends that fire when a timer elapses.
//!
//! - **Version**: 1.2.0
//! - **Since**: 0.3.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.2.0: Self-perpetuating timers re-arm from max(now, target) to resist drift
//! - 1.1.0: Full-week forward search for day-filtered reminders
//! - 1.0.0: Initial cancel-all-and-rearm scheduler

pub mod alarm;
pub mod delivery;
pub mod occurrence;

pub use alarm::AlarmScheduler;
pub use delivery::{DesktopNotifier, EventNotifier, FanoutNotifier, Notifier};
pub use occurrence::next_occurrence;
