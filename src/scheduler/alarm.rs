//! The armed-timer set.
//!
//! One `AlarmScheduler` instance lives in the scheduler daemon. Every
//! `rearm` call derives the armed set from scratch out of the pushed
//! snapshot: cancel everything, then arm one delayed task per enabled,
//! resolvable reminder. Diffing against the previous set would save a little
//! timer churn but opens the door to stale timers; the snapshot is cheap and
//! the full rebuild keeps the armed set exactly equal to what the latest
//! push describes.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, NaiveDateTime};
use log::{debug, info, warn};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::core::types::{Reminder, RoutineConfig};
use crate::scheduler::delivery::Notifier;
use crate::scheduler::occurrence::next_occurrence;

/// A pending fire for one reminder. Ephemeral: nothing here survives a
/// daemon restart; the foreground repopulates the set with a fresh snapshot.
struct ArmedTimer {
    fire_at: NaiveDateTime,
    handle: JoinHandle<()>,
    /// Arming generation this timer belongs to; see `rearm`
    epoch: u64,
}

pub struct AlarmScheduler {
    /// At most one armed timer per reminder id
    armed: Arc<Mutex<HashMap<String, ArmedTimer>>>,
    notifier: Arc<dyn Notifier>,
    /// Bumped on every rearm. A timer task may only rewrite its own map
    /// entry while its epoch is current, so a full rearm that raced a fire
    /// always wins.
    epoch: Arc<AtomicU64>,
}

impl AlarmScheduler {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        AlarmScheduler {
            armed: Arc::new(Mutex::new(HashMap::new())),
            notifier,
            epoch: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Cancel every armed timer, then arm fresh ones from the snapshot.
    ///
    /// Idempotent: the same snapshot always yields the same armed set (same
    /// ids, same target fire times). A reminder that is disabled, points at
    /// a deleted config, or fails occurrence calculation is skipped with a
    /// log line; it never aborts the rest of the snapshot.
    pub async fn rearm(&self, reminders: &[Reminder], configs: &[RoutineConfig]) {
        let epoch = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;

        let mut armed = self.armed.lock().await;
        for (_, timer) in armed.drain() {
            timer.handle.abort();
        }

        let configs_by_id: HashMap<&str, &RoutineConfig> =
            configs.iter().map(|c| (c.id.as_str(), c)).collect();

        let now = Local::now().naive_local();
        for reminder in reminders {
            if !reminder.enabled {
                debug!("Skipping disabled reminder {}", reminder.id);
                continue;
            }

            let config = match configs_by_id.get(reminder.config_id.as_str()) {
                Some(c) => *c,
                None => {
                    warn!(
                        "Reminder {} references missing config {}, not arming",
                        reminder.id, reminder.config_id
                    );
                    continue;
                }
            };

            let fire_at = match next_occurrence(reminder, now) {
                Some(t) => t,
                None => {
                    warn!(
                        "Reminder {} has no computable occurrence (time {:?}, days {:?}), not arming",
                        reminder.id, reminder.time, reminder.days
                    );
                    continue;
                }
            };

            let delay = match (fire_at - now).to_std() {
                Ok(d) if !d.is_zero() => d,
                _ => {
                    warn!(
                        "Reminder {} resolved to a non-positive delay, not arming",
                        reminder.id
                    );
                    continue;
                }
            };

            debug!(
                "Arming reminder {} (\"{}\") for {} ({}s out)",
                reminder.id,
                config.name,
                fire_at,
                delay.as_secs()
            );
            let handle = self.spawn_timer(reminder.clone(), config.name.clone(), fire_at, delay, epoch);
            armed.insert(
                reminder.id.clone(),
                ArmedTimer {
                    fire_at,
                    handle,
                    epoch,
                },
            );
        }

        info!("Armed {} reminder(s)", armed.len());
    }

    /// One persistent task per reminder: sleep until the target, re-arm the
    /// following occurrence, then deliver. The loop replaces the nested
    /// reschedule-from-inside-the-callback shape so long-lived reminders
    /// never grow a call stack.
    fn spawn_timer(
        &self,
        reminder: Reminder,
        routine_name: String,
        fire_at: NaiveDateTime,
        delay: Duration,
        epoch: u64,
    ) -> JoinHandle<()> {
        let armed = Arc::clone(&self.armed);
        let notifier = Arc::clone(&self.notifier);

        tokio::spawn(async move {
            let mut fire_at = fire_at;
            let mut delay = delay;

            loop {
                tokio::time::sleep(delay).await;

                // The following occurrence is computed strictly after the
                // target just fired, so firing marginally early can never
                // re-arm the same minute.
                let reference = fire_at.max(Local::now().naive_local());
                let next = next_occurrence(&reminder, reference);

                let superseded = {
                    let mut map = armed.lock().await;
                    match map.get_mut(&reminder.id) {
                        Some(timer) if timer.epoch == epoch => {
                            match next {
                                Some(n) => timer.fire_at = n,
                                None => {
                                    map.remove(&reminder.id);
                                }
                            }
                            false
                        }
                        // A full rearm replaced this timer while it was
                        // firing; its rebuild wins
                        _ => true,
                    }
                };

                notifier.notify(&reminder.id, &routine_name).await;

                if superseded {
                    return;
                }
                match next {
                    Some(n) => {
                        delay = (n - Local::now().naive_local())
                            .to_std()
                            .unwrap_or(Duration::from_secs(1));
                        fire_at = n;
                    }
                    None => return,
                }
            }
        })
    }

    /// Snapshot of reminder id -> target fire time for every armed timer.
    pub async fn armed_times(&self) -> HashMap<String, NaiveDateTime> {
        self.armed
            .lock()
            .await
            .iter()
            .map(|(id, timer)| (id.clone(), timer.fire_at))
            .collect()
    }

    pub async fn armed_count(&self) -> usize {
        self.armed.lock().await.len()
    }

    /// Teardown: cancel every pending timer.
    pub async fn cancel_all(&self) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        let mut armed = self.armed.lock().await;
        for (_, timer) in armed.drain() {
            timer.handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Duration as ChronoDuration;
    use tokio::sync::mpsc;

    struct MockNotifier {
        fired: mpsc::UnboundedSender<String>,
    }

    #[async_trait]
    impl Notifier for MockNotifier {
        async fn notify(&self, reminder_id: &str, _routine_name: &str) {
            let _ = self.fired.send(reminder_id.to_string());
        }
    }

    fn scheduler() -> (AlarmScheduler, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (AlarmScheduler::new(Arc::new(MockNotifier { fired: tx })), rx)
    }

    fn config(id: &str, name: &str) -> RoutineConfig {
        RoutineConfig {
            id: id.to_string(),
            name: name.to_string(),
            total_duration: 600,
            interval_duration: 0,
            prep_duration: 0,
            start_sound: crate::core::types::SoundType::Bell,
            interval_sound: crate::core::types::SoundType::None,
            finish_sound: crate::core::types::SoundType::Gong,
            background_sound: crate::core::types::SoundType::None,
        }
    }

    fn reminder(id: &str, time: &str, enabled: bool, config_id: &str) -> Reminder {
        Reminder {
            id: id.to_string(),
            time: time.to_string(),
            days: vec![],
            enabled,
            config_id: config_id.to_string(),
        }
    }

    /// "HH:MM" a given number of minutes from the current local time.
    fn time_from_now(minutes: i64) -> String {
        (Local::now().naive_local() + ChronoDuration::minutes(minutes))
            .format("%H:%M")
            .to_string()
    }

    #[tokio::test]
    async fn test_rearm_is_idempotent() {
        let (sched, _rx) = scheduler();
        let configs = vec![config("c-1", "Morning Focus")];
        let reminders = vec![
            reminder("r-1", &time_from_now(90), true, "c-1"),
            reminder("r-2", &time_from_now(240), true, "c-1"),
        ];

        sched.rearm(&reminders, &configs).await;
        let first = sched.armed_times().await;

        sched.rearm(&reminders, &configs).await;
        let second = sched.armed_times().await;

        assert_eq!(first.len(), 2);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_disabled_reminders_are_never_armed() {
        let (sched, _rx) = scheduler();
        let configs = vec![config("c-1", "Morning Focus")];
        let reminders = vec![
            reminder("r-on", &time_from_now(90), true, "c-1"),
            reminder("r-off", &time_from_now(90), false, "c-1"),
        ];

        sched.rearm(&reminders, &configs).await;

        let armed = sched.armed_times().await;
        assert!(armed.contains_key("r-on"));
        assert!(!armed.contains_key("r-off"));
    }

    #[tokio::test]
    async fn test_dangling_config_arms_nothing_and_does_not_panic() {
        let (sched, _rx) = scheduler();
        // Two reminders pointing at a deleted config
        let reminders = vec![
            reminder("r-1", &time_from_now(90), true, "gone"),
            reminder("r-2", &time_from_now(120), true, "gone"),
        ];

        sched.rearm(&reminders, &[]).await;

        assert_eq!(sched.armed_count().await, 0);
    }

    #[tokio::test]
    async fn test_malformed_reminder_does_not_abort_the_rest() {
        let (sched, _rx) = scheduler();
        let configs = vec![config("c-1", "Morning Focus")];
        let reminders = vec![
            reminder("r-bad", "25:99", true, "c-1"),
            reminder("r-good", &time_from_now(90), true, "c-1"),
        ];

        sched.rearm(&reminders, &configs).await;

        let armed = sched.armed_times().await;
        assert_eq!(armed.len(), 1);
        assert!(armed.contains_key("r-good"));
    }

    #[tokio::test]
    async fn test_rearm_drops_reminders_removed_from_snapshot() {
        let (sched, _rx) = scheduler();
        let configs = vec![config("c-1", "Morning Focus")];

        sched
            .rearm(
                &[
                    reminder("r-1", &time_from_now(90), true, "c-1"),
                    reminder("r-2", &time_from_now(90), true, "c-1"),
                ],
                &configs,
            )
            .await;
        assert_eq!(sched.armed_count().await, 2);

        sched
            .rearm(&[reminder("r-1", &time_from_now(90), true, "c-1")], &configs)
            .await;

        let armed = sched.armed_times().await;
        assert_eq!(armed.len(), 1);
        assert!(armed.contains_key("r-1"));
    }

    #[tokio::test]
    async fn test_cancel_all_empties_the_set() {
        let (sched, _rx) = scheduler();
        let configs = vec![config("c-1", "Morning Focus")];
        sched
            .rearm(&[reminder("r-1", &time_from_now(90), true, "c-1")], &configs)
            .await;

        sched.cancel_all().await;

        assert_eq!(sched.armed_count().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fired_reminder_rearms_strictly_later() {
        let (sched, mut rx) = scheduler();
        let configs = vec![config("c-1", "Morning Focus")];
        let reminders = vec![reminder("r-1", &time_from_now(2), true, "c-1")];

        sched.rearm(&reminders, &configs).await;
        let before = sched.armed_times().await["r-1"];

        // Paused time auto-advances through the sleep
        let fired = rx.recv().await.unwrap();
        assert_eq!(fired, "r-1");

        // The timer re-armed itself before delivering, so the map already
        // points at the following occurrence
        let after = sched.armed_times().await;
        let next = after.get("r-1").copied().expect("reminder stays armed");
        assert!(
            next > before,
            "expected self-reschedule strictly later: {} -> {}",
            before,
            next
        );
    }
}
