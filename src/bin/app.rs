//! # ZenInterval App
//!
//! Foreground CLI for the meditation app's reminder data. Owns the store;
//! every mutation rewrites the data file and pushes a fresh snapshot to the
//! scheduler daemon (fire-and-hope: if the daemon is down, it will request
//! one when it next sees a client).
//!
//! Usage:
//!   zen configs
//!   zen reminders
//!   zen add <HH:MM> <config-id> [days]     days e.g. "1,3,5" (0=Sun..6=Sat)
//!   zen remove <reminder-id>
//!   zen toggle <reminder-id>
//!   zen push
//!   zen status
//!   zen watch

use anyhow::{anyhow, Result};
use log::{info, warn};
use tokio::time::Duration;

use zeninterval::core::config;
use zeninterval::ipc::{connect_with_retry, IpcClient, SchedulerEvent};
use zeninterval::store::ReminderStore;
use zeninterval::{Config, Reminder};

/// Attempts made when pushing after a mutation; the daemon gets a short
/// allowance to come up, then the push is dropped
const PUSH_ATTEMPTS: u32 = 3;
const PUSH_RETRY_DELAY: Duration = Duration::from_millis(500);

#[tokio::main]
async fn main() -> Result<()> {
    config::load_dotenv();
    let config = Config::from_env();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let store = ReminderStore::new(config.data_file.clone());
    let args: Vec<String> = std::env::args().skip(1).collect();

    match args.first().map(String::as_str) {
        Some("configs") => {
            for c in store.get_configs()? {
                println!(
                    "{}  {} ({}s total, {}s intervals)",
                    c.id, c.name, c.total_duration, c.interval_duration
                );
            }
        }
        Some("reminders") => {
            for r in store.get_reminders()? {
                let days = if r.days.is_empty() {
                    "every day".to_string()
                } else {
                    format!("days {:?}", r.days)
                };
                println!(
                    "{}  {} {} -> {} [{}]",
                    r.id,
                    r.time,
                    days,
                    r.config_id,
                    if r.enabled { "on" } else { "off" }
                );
            }
        }
        Some("add") => {
            let time = args.get(1).ok_or_else(|| anyhow!("missing HH:MM"))?;
            let config_id = args.get(2).ok_or_else(|| anyhow!("missing config id"))?;
            let days = match args.get(3) {
                Some(list) => parse_days(list)?,
                None => vec![],
            };

            if !store.get_configs()?.iter().any(|c| &c.id == config_id) {
                warn!("Config {} does not exist; the reminder will stay inert", config_id);
            }

            let reminder = Reminder {
                id: uuid::Uuid::new_v4().to_string(),
                time: time.clone(),
                days,
                enabled: true,
                config_id: config_id.clone(),
            };
            println!("Added reminder {}", reminder.id);
            store.save_reminder(reminder)?;
            push_snapshot(&config, &store).await;
        }
        Some("remove") => {
            let id = args.get(1).ok_or_else(|| anyhow!("missing reminder id"))?;
            store.delete_reminder(id)?;
            println!("Removed reminder {}", id);
            push_snapshot(&config, &store).await;
        }
        Some("toggle") => {
            let id = args.get(1).ok_or_else(|| anyhow!("missing reminder id"))?;
            match store.toggle_reminder(id)? {
                Some(enabled) => {
                    println!("Reminder {} is now {}", id, if enabled { "on" } else { "off" })
                }
                None => println!("No reminder with id {}", id),
            }
            push_snapshot(&config, &store).await;
        }
        Some("push") => {
            push_snapshot(&config, &store).await;
        }
        Some("status") => {
            let mut client = connect(&config).await?;
            client.request_status().await?;
            while let Some(event) = client.recv().await {
                match event {
                    SchedulerEvent::GetReminders => answer_snapshot(&client, &store).await,
                    SchedulerEvent::ArmedStatus { armed } => {
                        if armed.is_empty() {
                            println!("No reminders armed");
                        }
                        for info in armed {
                            println!("{}  fires at {}", info.reminder_id, info.fire_at);
                        }
                        break;
                    }
                    _ => {}
                }
            }
        }
        Some("watch") => {
            // Stay connected: answer the daemon's snapshot requests and
            // surface fired reminders in the foreground
            let mut client = connect(&config).await?;
            info!("Watching scheduler events (ctrl-c to quit)");
            while let Some(event) = client.recv().await {
                match event {
                    SchedulerEvent::GetReminders => answer_snapshot(&client, &store).await,
                    SchedulerEvent::ReminderFired {
                        routine_name,
                        fired_at,
                        ..
                    } => {
                        println!("[{}] Time to practice: \"{}\"", fired_at, routine_name);
                    }
                    _ => {}
                }
            }
            println!("Scheduler daemon disconnected");
        }
        _ => {
            eprintln!(
                "Usage: zen <configs|reminders|add|remove|toggle|push|status|watch> [args]"
            );
        }
    }

    Ok(())
}

fn parse_days(list: &str) -> Result<Vec<u8>> {
    list.split(',')
        .map(|part| {
            let day: u8 = part
                .trim()
                .parse()
                .map_err(|_| anyhow!("bad day index {:?}", part))?;
            if day > 6 {
                return Err(anyhow!("day index {} out of range 0..6", day));
            }
            Ok(day)
        })
        .collect()
}

async fn connect(config: &Config) -> Result<IpcClient> {
    connect_with_retry(&config.socket_path, PUSH_ATTEMPTS, PUSH_RETRY_DELAY).await
}

/// Push the current snapshot; failure is logged, never fatal. The daemon
/// rearms idempotently, so a missed push is recovered by the next one or by
/// its own GetReminders request.
async fn push_snapshot(config: &Config, store: &ReminderStore) {
    let snapshot = match store.snapshot() {
        Ok(s) => s,
        Err(e) => {
            warn!("Could not read store for push: {}", e);
            return;
        }
    };

    match connect(config).await {
        Ok(client) => {
            let (reminders, configs) = snapshot;
            if let Err(e) = client.push_snapshot(reminders, configs).await {
                warn!("Snapshot push failed: {}", e);
            } else {
                info!("Pushed snapshot to scheduler daemon");
                // Give the writer task a moment to flush before exit
                tokio::time::sleep(Duration::from_millis(100)).await;
            }
        }
        Err(e) => {
            warn!(
                "Scheduler daemon unreachable, skipping push: {}. It will request a snapshot when it connects.",
                e
            );
        }
    }
}

async fn answer_snapshot(client: &IpcClient, store: &ReminderStore) {
    match store.snapshot() {
        Ok((reminders, configs)) => {
            if let Err(e) = client.push_snapshot(reminders, configs).await {
                warn!("Failed to answer snapshot request: {}", e);
            }
        }
        Err(e) => warn!("Could not read store: {}", e),
    }
}
