//! # IPC Server
//!
//! Unix socket server hosted by the scheduler daemon.
//!
//! The daemon cannot read the app's data file; it only ever learns about
//! reminders through `ScheduleAlarms` pushes. To cover a daemon restart, the
//! server asks every newly connected client for a snapshot (`GetReminders`),
//! which the app answers with a fresh push.

use anyhow::Result;
use log::{debug, error, info, warn};
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::{broadcast, mpsc, Mutex};

use crate::ipc::protocol::{check_frame_len, encode_message, AppCommand, ArmedInfo, SchedulerEvent};
use crate::scheduler::AlarmScheduler;

/// Broadcast channel capacity for events
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Command channel capacity
const COMMAND_CHANNEL_CAPACITY: usize = 64;

/// IPC server handle for the scheduler daemon
pub struct SchedulerServer {
    /// Broadcast sender for events to all connected app clients
    event_tx: broadcast::Sender<SchedulerEvent>,
    /// Receiver for commands from app clients
    command_rx: Arc<Mutex<mpsc::Receiver<AppCommand>>>,
    /// Sender for commands (used by client handlers)
    command_tx: mpsc::Sender<AppCommand>,
    /// The armed-timer set this server drives
    scheduler: Arc<AlarmScheduler>,
    socket_path: String,
}

impl SchedulerServer {
    /// Create a new server (does not start listening yet). `event_tx` is
    /// shared with the daemon's `EventNotifier` so fired reminders reach
    /// connected clients through the same stream.
    pub fn new(
        scheduler: Arc<AlarmScheduler>,
        event_tx: broadcast::Sender<SchedulerEvent>,
        socket_path: String,
    ) -> Self {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);

        SchedulerServer {
            event_tx,
            command_rx: Arc::new(Mutex::new(command_rx)),
            command_tx,
            scheduler,
            socket_path,
        }
    }

    /// Convenience constructor that owns its event channel.
    pub fn with_event_channel(
        scheduler: Arc<AlarmScheduler>,
        socket_path: String,
    ) -> (Self, broadcast::Sender<SchedulerEvent>) {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let server = Self::new(scheduler, event_tx.clone(), socket_path);
        (server, event_tx)
    }

    /// Start listening in a background task
    pub async fn start(self: Arc<Self>) -> Result<()> {
        // Remove existing socket file if it exists
        if std::path::Path::new(&self.socket_path).exists() {
            std::fs::remove_file(&self.socket_path)?;
        }

        let listener = UnixListener::bind(&self.socket_path)?;
        info!("IPC server listening on {}", self.socket_path);

        let server = self.clone();
        tokio::spawn(async move {
            loop {
                match listener.accept().await {
                    Ok((stream, _addr)) => {
                        info!("App client connected");
                        let server = server.clone();
                        tokio::spawn(async move {
                            if let Err(e) = server.handle_client(stream).await {
                                debug!("Client handler ended: {}", e);
                            }
                            info!("App client disconnected");
                        });
                    }
                    Err(e) => {
                        error!("Failed to accept IPC connection: {}", e);
                    }
                }
            }
        });

        Ok(())
    }

    /// Handle a connected app client
    async fn handle_client(self: Arc<Self>, stream: UnixStream) -> Result<()> {
        let (mut reader, mut writer) = stream.into_split();

        // Subscribe before the snapshot request so no event is missed
        let mut event_rx = self.event_tx.subscribe();

        // Ask this client for a snapshot straight away; if the daemon just
        // restarted this is how it repopulates its armed set
        let request = encode_message(&SchedulerEvent::GetReminders)?;
        writer.write_all(&request).await?;
        writer.flush().await?;

        // Writer task forwards broadcast events to this client
        let write_handle = tokio::spawn(async move {
            loop {
                match event_rx.recv().await {
                    Ok(event) => match encode_message(&event) {
                        Ok(data) => {
                            if writer.write_all(&data).await.is_err() {
                                break;
                            }
                            if writer.flush().await.is_err() {
                                break;
                            }
                        }
                        Err(e) => {
                            error!("Failed to encode event: {}", e);
                        }
                    },
                    Err(broadcast::error::RecvError::Closed) => break,
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!("Client lagged behind by {} events", n);
                    }
                }
            }
        });

        // Read commands from the client
        let command_tx = self.command_tx.clone();
        loop {
            let mut len_buf = [0u8; 4];
            if reader.read_exact(&mut len_buf).await.is_err() {
                break;
            }
            let len = u32::from_be_bytes(len_buf) as usize;
            if let Err(e) = check_frame_len(len) {
                error!("Bad frame from client: {}", e);
                break;
            }

            let mut buf = vec![0u8; len];
            if reader.read_exact(&mut buf).await.is_err() {
                break;
            }

            match serde_json::from_slice::<AppCommand>(&buf) {
                Ok(cmd) => {
                    if let Err(e) = command_tx.send(cmd).await {
                        error!("Failed to forward command: {}", e);
                        break;
                    }
                }
                Err(e) => {
                    warn!("Failed to parse command from client: {}", e);
                }
            }
        }

        write_handle.abort();
        Ok(())
    }

    /// Broadcast an event to all connected clients
    pub fn broadcast(&self, event: SchedulerEvent) {
        // No subscribers is fine; the foreground may not be running
        let _ = self.event_tx.send(event);
    }

    /// Receive the next client command
    pub async fn recv_command(&self) -> Option<AppCommand> {
        self.command_rx.lock().await.recv().await
    }

    /// Apply a single client command
    pub async fn process_command(&self, cmd: AppCommand) {
        match cmd {
            AppCommand::ScheduleAlarms { reminders, configs } => {
                debug!(
                    "Snapshot push: {} reminder(s), {} config(s)",
                    reminders.len(),
                    configs.len()
                );
                // The push is the source of truth; rearm unconditionally
                self.scheduler.rearm(&reminders, &configs).await;
            }
            AppCommand::GetStatus => {
                let armed = self
                    .scheduler
                    .armed_times()
                    .await
                    .into_iter()
                    .map(|(reminder_id, fire_at)| ArmedInfo {
                        reminder_id,
                        fire_at,
                    })
                    .collect();
                self.broadcast(SchedulerEvent::ArmedStatus { armed });
            }
            AppCommand::Ping { timestamp } => {
                self.broadcast(SchedulerEvent::Pong { timestamp });
            }
        }
    }

    /// Drive the command loop until the channel closes
    pub async fn run_command_processor(self: Arc<Self>) {
        info!("IPC command processor started");
        while let Some(cmd) = self.recv_command().await {
            self.process_command(cmd).await;
        }
    }

    /// Remove the socket file on shutdown
    pub fn cleanup(&self) {
        let _ = std::fs::remove_file(&self.socket_path);
    }
}
