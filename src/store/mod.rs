//! # Store Module
//!
//! JSON-file persistence for routine configs, reminders, and session logs.
//! Owned by the foreground app; the scheduler daemon never touches it and
//! only sees the data through pushed snapshots.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.2.0
//! - **Toggleable**: false

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::core::types::{default_configs, MeditationSession, Reminder, RoutineConfig};

/// Session log entries kept (newest first)
const MAX_SESSIONS: usize = 100;

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreData {
    configs: Vec<RoutineConfig>,
    reminders: Vec<Reminder>,
    sessions: Vec<MeditationSession>,
}

/// File-backed store. Every mutation rewrites the whole file; the data is a
/// handful of kilobytes at most.
pub struct ReminderStore {
    path: PathBuf,
}

impl ReminderStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        ReminderStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<StoreData> {
        if !self.path.exists() {
            return Ok(StoreData {
                configs: default_configs(),
                ..Default::default()
            });
        }
        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", self.path.display()))
    }

    fn save(&self, data: &StoreData) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let content = serde_json::to_string_pretty(data)?;
        std::fs::write(&self.path, content)
            .with_context(|| format!("Failed to write {}", self.path.display()))
    }

    pub fn get_configs(&self) -> Result<Vec<RoutineConfig>> {
        Ok(self.load()?.configs)
    }

    pub fn get_reminders(&self) -> Result<Vec<Reminder>> {
        Ok(self.load()?.reminders)
    }

    pub fn get_sessions(&self) -> Result<Vec<MeditationSession>> {
        Ok(self.load()?.sessions)
    }

    /// Insert or replace a routine config by id
    pub fn save_config(&self, config: RoutineConfig) -> Result<()> {
        let mut data = self.load()?;
        match data.configs.iter_mut().find(|c| c.id == config.id) {
            Some(existing) => *existing = config,
            None => data.configs.push(config),
        }
        self.save(&data)
    }

    /// Delete a routine config. Reminders referencing it are left in place;
    /// they simply stop arming until repointed.
    pub fn delete_config(&self, id: &str) -> Result<()> {
        let mut data = self.load()?;
        data.configs.retain(|c| c.id != id);
        self.save(&data)
    }

    /// Insert or replace a reminder by id
    pub fn save_reminder(&self, reminder: Reminder) -> Result<()> {
        let mut data = self.load()?;
        match data.reminders.iter_mut().find(|r| r.id == reminder.id) {
            Some(existing) => *existing = reminder,
            None => data.reminders.push(reminder),
        }
        self.save(&data)
    }

    pub fn delete_reminder(&self, id: &str) -> Result<()> {
        let mut data = self.load()?;
        data.reminders.retain(|r| r.id != id);
        self.save(&data)
    }

    /// Flip a reminder's enabled flag; returns the new state, or None if the
    /// id is unknown
    pub fn toggle_reminder(&self, id: &str) -> Result<Option<bool>> {
        let mut data = self.load()?;
        let toggled = match data.reminders.iter_mut().find(|r| r.id == id) {
            Some(reminder) => {
                reminder.enabled = !reminder.enabled;
                Some(reminder.enabled)
            }
            None => None,
        };
        if toggled.is_some() {
            self.save(&data)?;
        }
        Ok(toggled)
    }

    /// Prepend a session log entry, keeping the newest MAX_SESSIONS
    pub fn save_session(&self, session: MeditationSession) -> Result<()> {
        let mut data = self.load()?;
        data.sessions.insert(0, session);
        data.sessions.truncate(MAX_SESSIONS);
        self.save(&data)
    }

    pub fn delete_session(&self, id: &str) -> Result<()> {
        let mut data = self.load()?;
        data.sessions.retain(|s| s.id != id);
        self.save(&data)
    }

    /// The full snapshot pushed to the scheduler daemon
    pub fn snapshot(&self) -> Result<(Vec<Reminder>, Vec<RoutineConfig>)> {
        let data = self.load()?;
        Ok((data.reminders, data.configs))
    }
}
