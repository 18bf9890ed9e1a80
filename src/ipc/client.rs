//! # IPC Client
//!
//! Unix socket client used by the foreground app to talk to the scheduler
//! daemon: it pushes `ScheduleAlarms` snapshots after every mutation and
//! answers the daemon's `GetReminders` requests.

use anyhow::{anyhow, Result};
use log::{debug, error, info, warn};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixStream;
use tokio::sync::mpsc;
use tokio::time::{timeout, Duration};

use crate::core::types::{Reminder, RoutineConfig};
use crate::ipc::protocol::{check_frame_len, encode_message, AppCommand, SchedulerEvent};

/// Connection timeout
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// IPC client for the foreground app
pub struct IpcClient {
    /// Event receiver channel
    event_rx: mpsc::Receiver<SchedulerEvent>,
    /// Command sender channel
    command_tx: mpsc::Sender<AppCommand>,
}

impl IpcClient {
    /// Connect to the scheduler daemon's socket
    pub async fn connect(socket_path: &str) -> Result<Self> {
        debug!("Connecting to scheduler daemon at {}", socket_path);

        let stream = timeout(CONNECT_TIMEOUT, UnixStream::connect(socket_path))
            .await
            .map_err(|_| anyhow!("Connection timeout"))?
            .map_err(|e| anyhow!("Failed to connect: {}", e))?;

        debug!("Connected to scheduler daemon");

        let (event_tx, event_rx) = mpsc::channel(256);
        let (command_tx, command_rx) = mpsc::channel(64);

        tokio::spawn(async move {
            Self::connection_loop(stream, event_tx, command_rx).await;
        });

        Ok(IpcClient {
            event_rx,
            command_tx,
        })
    }

    /// Main connection loop - reads events and writes commands
    async fn connection_loop(
        stream: UnixStream,
        event_tx: mpsc::Sender<SchedulerEvent>,
        mut command_rx: mpsc::Receiver<AppCommand>,
    ) {
        let (mut reader, mut writer) = stream.into_split();

        // Writer task drains outgoing commands
        let write_handle = tokio::spawn(async move {
            while let Some(cmd) = command_rx.recv().await {
                match encode_message(&cmd) {
                    Ok(data) => {
                        if let Err(e) = writer.write_all(&data).await {
                            error!("Failed to write command: {}", e);
                            break;
                        }
                        if let Err(e) = writer.flush().await {
                            error!("Failed to flush command: {}", e);
                            break;
                        }
                    }
                    Err(e) => {
                        error!("Failed to encode command: {}", e);
                    }
                }
            }
        });

        // Event reader loop
        loop {
            let mut len_buf = [0u8; 4];
            match reader.read_exact(&mut len_buf).await {
                Ok(_) => {}
                Err(e) => {
                    if e.kind() != std::io::ErrorKind::UnexpectedEof {
                        error!("Read error: {}", e);
                    }
                    break;
                }
            }

            let len = u32::from_be_bytes(len_buf) as usize;
            if let Err(e) = check_frame_len(len) {
                error!("Bad frame from daemon: {}", e);
                break;
            }

            let mut buf = vec![0u8; len];
            if let Err(e) = reader.read_exact(&mut buf).await {
                error!("Failed to read message body: {}", e);
                break;
            }

            match serde_json::from_slice::<SchedulerEvent>(&buf) {
                Ok(event) => {
                    if event_tx.send(event).await.is_err() {
                        debug!("Event receiver closed");
                        break;
                    }
                }
                Err(e) => {
                    warn!("Failed to parse event: {}", e);
                }
            }
        }

        write_handle.abort();
        info!("IPC connection closed");
    }

    /// Receive an event (blocking)
    pub async fn recv(&mut self) -> Option<SchedulerEvent> {
        self.event_rx.recv().await
    }

    /// Send a command to the daemon
    pub async fn send(&self, cmd: AppCommand) -> Result<()> {
        self.command_tx
            .send(cmd)
            .await
            .map_err(|e| anyhow!("Failed to send command: {}", e))
    }

    /// Push a full reminder/config snapshot
    pub async fn push_snapshot(
        &self,
        reminders: Vec<Reminder>,
        configs: Vec<RoutineConfig>,
    ) -> Result<()> {
        self.send(AppCommand::ScheduleAlarms { reminders, configs })
            .await
    }

    /// Request the armed-timer status
    pub async fn request_status(&self) -> Result<()> {
        self.send(AppCommand::GetStatus).await
    }
}

/// Try to connect with retries. Mutation pushes use this to give a freshly
/// started daemon a short allowance to come up; if it never does, the push
/// is dropped (the daemon will ask for a snapshot on its next connection).
pub async fn connect_with_retry(
    socket_path: &str,
    max_attempts: u32,
    delay: Duration,
) -> Result<IpcClient> {
    for attempt in 1..=max_attempts {
        match IpcClient::connect(socket_path).await {
            Ok(client) => return Ok(client),
            Err(e) => {
                if attempt < max_attempts {
                    warn!(
                        "Connection attempt {} failed: {}. Retrying in {:?}...",
                        attempt, e, delay
                    );
                    tokio::time::sleep(delay).await;
                } else {
                    return Err(anyhow!(
                        "Failed to connect after {} attempts: {}",
                        max_attempts,
                        e
                    ));
                }
            }
        }
    }
    unreachable!()
}
