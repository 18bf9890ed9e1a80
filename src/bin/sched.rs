//! ZenInterval scheduler daemon.
//!
//! Background process that owns the armed-timer set. It cannot read the
//! app's data file: it learns about reminders exclusively through
//! `ScheduleAlarms` pushes over the IPC socket, asks every connecting
//! client for a snapshot, and delivers notifications when timers elapse.

use anyhow::Result;
use log::info;
use std::sync::Arc;
use tokio::signal;

use zeninterval::core::config;
use zeninterval::ipc::SchedulerServer;
use zeninterval::scheduler::{AlarmScheduler, DesktopNotifier, EventNotifier, FanoutNotifier, Notifier};
use zeninterval::Config;

#[tokio::main]
async fn main() -> Result<()> {
    config::load_dotenv();
    let config = Config::from_env();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.log_level))
        .init();

    info!("Starting ZenInterval scheduler daemon...");

    // Fired reminders go to the desktop and, when a foreground is connected,
    // over the IPC event stream as well
    let (event_tx, _) = tokio::sync::broadcast::channel(256);
    let mut targets: Vec<Arc<dyn Notifier>> = vec![Arc::new(EventNotifier::new(event_tx.clone()))];
    if config.desktop_notifications {
        targets.push(Arc::new(DesktopNotifier));
    } else {
        info!("Desktop notifications disabled");
    }
    let notifier = Arc::new(FanoutNotifier::new(targets));

    let scheduler = Arc::new(AlarmScheduler::new(notifier));

    let server = Arc::new(SchedulerServer::new(
        scheduler.clone(),
        event_tx,
        config.socket_path.clone(),
    ));
    server.clone().start().await?;

    let processor = tokio::spawn(server.clone().run_command_processor());

    info!("Scheduler daemon ready on {}", config.socket_path);

    // Run until interrupted
    signal::ctrl_c().await?;
    info!("Shutting down scheduler daemon...");

    processor.abort();
    scheduler.cancel_all().await;
    server.cleanup();

    info!("Scheduler daemon stopped");
    Ok(())
}
