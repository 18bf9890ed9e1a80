//! Runtime configuration collected from environment variables.
//!
//! Both binaries call [`Config::from_env`] after loading `.env` via dotenvy.
//! Every knob has a working default so a bare `zen-sched` starts without
//! any environment setup.

use std::path::PathBuf;

/// Default socket path for IPC between the app and the scheduler daemon
pub const DEFAULT_SOCKET_PATH: &str = "/tmp/zeninterval-sched.sock";

/// Default data file name (placed under `$HOME/.zeninterval/`)
const DEFAULT_DATA_FILE: &str = "data.json";

#[derive(Debug, Clone)]
pub struct Config {
    /// Unix socket the scheduler daemon listens on
    pub socket_path: String,
    /// JSON file holding configs, reminders, and session logs
    pub data_file: PathBuf,
    /// Default log filter when RUST_LOG is unset
    pub log_level: String,
    /// Whether the daemon shows desktop notifications (off in headless setups)
    pub desktop_notifications: bool,
}

impl Config {
    pub fn from_env() -> Self {
        let socket_path =
            std::env::var("ZEN_IPC_SOCKET").unwrap_or_else(|_| DEFAULT_SOCKET_PATH.to_string());

        let data_file = std::env::var("ZEN_DATA_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_data_file());

        let log_level = std::env::var("ZEN_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let desktop_notifications = std::env::var("ZEN_DESKTOP_NOTIFICATIONS")
            .map(|v| v != "0" && v.to_lowercase() != "false")
            .unwrap_or(true);

        Config {
            socket_path,
            data_file,
            log_level,
            desktop_notifications,
        }
    }
}

fn default_data_file() -> PathBuf {
    match std::env::var("HOME") {
        Ok(home) => PathBuf::from(home).join(".zeninterval").join(DEFAULT_DATA_FILE),
        Err(_) => PathBuf::from(DEFAULT_DATA_FILE),
    }
}

/// Load a `.env` file if present; missing files are fine.
pub fn load_dotenv() {
    let _ = dotenvy::dotenv();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_env() {
        // Not touching the real env here; just exercise the fallback path
        let config = Config {
            socket_path: DEFAULT_SOCKET_PATH.to_string(),
            data_file: default_data_file(),
            log_level: "info".to_string(),
            desktop_notifications: true,
        };
        assert!(config.socket_path.ends_with(".sock"));
        assert!(config
            .data_file
            .to_string_lossy()
            .ends_with(DEFAULT_DATA_FILE));
    }
}
