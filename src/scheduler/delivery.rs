//! Notification delivery backends.
//!
//! The scheduler fires through the [`Notifier`] trait so the daemon can fan
//! out to a desktop notification and an IPC event, and tests can capture
//! fires on a channel. A failed delivery is never a scheduler error: the
//! timer still counts as fired and re-arms its next occurrence.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Local;
use log::debug;
use tokio::sync::broadcast;

use crate::ipc::protocol::SchedulerEvent;

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver a fired reminder. `reminder_id` is the stable tag: a second
    /// fire for the same reminder replaces the previous notification, while
    /// different reminders coexist.
    async fn notify(&self, reminder_id: &str, routine_name: &str);
}

/// Desktop notification backend.
pub struct DesktopNotifier;

impl DesktopNotifier {
    /// Stable per-reminder notification id, so refires replace in place.
    fn tag(reminder_id: &str) -> u32 {
        let mut hasher = DefaultHasher::new();
        reminder_id.hash(&mut hasher);
        hasher.finish() as u32
    }
}

#[async_trait]
impl Notifier for DesktopNotifier {
    async fn notify(&self, reminder_id: &str, routine_name: &str) {
        let id = Self::tag(reminder_id);
        let body = format!("Time for your \"{}\" session", routine_name);

        // show() talks to the notification daemon synchronously; keep it off
        // the scheduler's runtime threads. Denied permission or a missing
        // daemon degrades to a debug log, not an error.
        let result = tokio::task::spawn_blocking(move || {
            notify_rust::Notification::new()
                .summary("ZenInterval Meditation")
                .body(&body)
                .appname("zeninterval")
                .icon("alarm-clock")
                .id(id)
                .show()
                .map(|_| ())
        })
        .await;

        match result {
            Ok(Ok(())) => {}
            Ok(Err(e)) => debug!("Desktop notification failed: {}", e),
            Err(e) => debug!("Notification task failed: {}", e),
        }
    }
}

/// Broadcasts a `ReminderFired` event to connected foreground clients so the
/// app can show its in-app alarm surface.
pub struct EventNotifier {
    event_tx: broadcast::Sender<SchedulerEvent>,
}

impl EventNotifier {
    pub fn new(event_tx: broadcast::Sender<SchedulerEvent>) -> Self {
        EventNotifier { event_tx }
    }
}

#[async_trait]
impl Notifier for EventNotifier {
    async fn notify(&self, reminder_id: &str, routine_name: &str) {
        // No subscribers is fine; the foreground may not be running
        let _ = self.event_tx.send(SchedulerEvent::ReminderFired {
            reminder_id: reminder_id.to_string(),
            routine_name: routine_name.to_string(),
            fired_at: Local::now().naive_local(),
        });
    }
}

/// Delivers through every backend in order.
pub struct FanoutNotifier {
    targets: Vec<Arc<dyn Notifier>>,
}

impl FanoutNotifier {
    pub fn new(targets: Vec<Arc<dyn Notifier>>) -> Self {
        FanoutNotifier { targets }
    }
}

#[async_trait]
impl Notifier for FanoutNotifier {
    async fn notify(&self, reminder_id: &str, routine_name: &str) {
        for target in &self.targets {
            target.notify(reminder_id, routine_name).await;
        }
    }
}
