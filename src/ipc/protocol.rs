//! # IPC Protocol
//!
//! Message types for app <-> scheduler-daemon communication over Unix
//! socket.
//!
//! Every message is a `{type, payload}` envelope. Framing is
//! length-prefixed JSON:
//! - 4 bytes: message length (big-endian u32)
//! - N bytes: JSON payload

use anyhow::{anyhow, Result};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

use crate::core::types::{Reminder, RoutineConfig};

/// Snapshot pushes stay tiny; anything bigger is a broken frame
const MAX_MESSAGE_SIZE: usize = 1024 * 1024;

// ============================================================================
// App -> Daemon Commands
// ============================================================================

/// Commands sent from the foreground app to the scheduler daemon
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum AppCommand {
    /// Full reminder/config snapshot; triggers an unconditional rearm.
    /// The push itself is the source of truth: no merging, and a duplicate
    /// or out-of-order push is harmless because rearm is idempotent.
    ScheduleAlarms {
        reminders: Vec<Reminder>,
        configs: Vec<RoutineConfig>,
    },
    /// Request the currently armed timer set
    GetStatus,
    /// Liveness probe
    Ping { timestamp: i64 },
}

// ============================================================================
// Daemon -> App Events
// ============================================================================

/// One armed timer, for status display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArmedInfo {
    pub reminder_id: String,
    pub fire_at: NaiveDateTime,
}

/// Events sent from the scheduler daemon to connected app clients
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum SchedulerEvent {
    /// The daemon has no snapshot (fresh start); the app must respond with
    /// a fresh `ScheduleAlarms` push
    GetReminders,
    /// A reminder's timer elapsed and its notification was delivered
    ReminderFired {
        #[serde(rename = "reminderId")]
        reminder_id: String,
        #[serde(rename = "routineName")]
        routine_name: String,
        #[serde(rename = "firedAt")]
        fired_at: NaiveDateTime,
    },
    /// Response to `GetStatus`
    ArmedStatus { armed: Vec<ArmedInfo> },
    /// Response to `Ping`
    Pong { timestamp: i64 },
}

// ============================================================================
// Framing - Length-prefixed JSON messages
// ============================================================================

/// Encode a message with length prefix
pub fn encode_message<T: Serialize>(msg: &T) -> Result<Vec<u8>> {
    let json = serde_json::to_vec(msg)?;
    let len = json.len() as u32;
    let mut buf = Vec::with_capacity(4 + json.len());
    buf.extend_from_slice(&len.to_be_bytes());
    buf.extend_from_slice(&json);
    Ok(buf)
}

/// Read a length-prefixed message from a reader
pub fn decode_message<T: for<'de> Deserialize<'de>, R: Read>(reader: &mut R) -> Result<T> {
    let mut len_buf = [0u8; 4];
    reader.read_exact(&mut len_buf)?;
    let len = u32::from_be_bytes(len_buf) as usize;

    if len > MAX_MESSAGE_SIZE {
        return Err(anyhow!("Message too large: {} bytes", len));
    }

    let mut buf = vec![0u8; len];
    reader.read_exact(&mut buf)?;

    Ok(serde_json::from_slice(&buf)?)
}

/// Write a framed message to a writer
pub fn write_message<T: Serialize, W: Write>(writer: &mut W, msg: &T) -> Result<()> {
    let encoded = encode_message(msg)?;
    writer.write_all(&encoded)?;
    writer.flush()?;
    Ok(())
}

/// Frame size guard shared with the async read paths
pub fn check_frame_len(len: usize) -> Result<()> {
    if len > MAX_MESSAGE_SIZE {
        return Err(anyhow!("Message too large: {} bytes", len));
    }
    Ok(())
}
