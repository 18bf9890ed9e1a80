//! Domain entities shared by the store, the IPC protocol, and the scheduler.
//!
//! Field names serialize as camelCase and sounds as kebab-case strings, so
//! a data file written by earlier builds of the app stays readable.

use serde::{Deserialize, Serialize};

/// Sound choices for the routine phases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SoundType {
    Bell,
    SingingBowl,
    Gong,
    Chime,
    Nature,
    Rain,
    WhiteNoise,
    None,
}

/// A meditation practice definition. The scheduler only reads `id` and
/// `name`; the rest belongs to the timer/audio side of the app.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutineConfig {
    pub id: String,
    pub name: String,
    /// Total practice length, seconds
    pub total_duration: u32,
    /// Interval chime period, seconds; 0 disables interval chimes
    pub interval_duration: u32,
    /// Prep countdown before the session starts, seconds
    pub prep_duration: u32,
    pub start_sound: SoundType,
    pub interval_sound: SoundType,
    pub finish_sound: SoundType,
    pub background_sound: SoundType,
}

/// A recurring alarm bound to a routine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reminder {
    /// Opaque unique id, assigned at creation, immutable
    pub id: String,
    /// Local time of day, "HH:MM", 24-hour
    pub time: String,
    /// Weekday indices, 0=Sunday..6=Saturday; empty means every day
    pub days: Vec<u8>,
    pub enabled: bool,
    /// References a RoutineConfig by id; a dangling reference makes the
    /// reminder inert, it is never an error
    pub config_id: String,
}

/// A logged practice session (completed or partial).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeditationSession {
    pub id: String,
    pub config_id: String,
    pub config_name: String,
    /// ISO-8601 date of the session
    pub date: String,
    /// Seconds actually practiced
    pub duration_completed: u32,
    /// Seconds the routine called for
    pub total_duration_goal: u32,
    pub completed: bool,
}

/// Routines seeded into an empty store.
pub fn default_configs() -> Vec<RoutineConfig> {
    vec![
        RoutineConfig {
            id: "default-1".to_string(),
            name: "Morning Focus".to_string(),
            total_duration: 600,
            interval_duration: 120,
            prep_duration: 10,
            start_sound: SoundType::Bell,
            interval_sound: SoundType::Chime,
            finish_sound: SoundType::Gong,
            background_sound: SoundType::Nature,
        },
        RoutineConfig {
            id: "default-2".to_string(),
            name: "Quick Reset".to_string(),
            total_duration: 300,
            interval_duration: 0,
            prep_duration: 5,
            start_sound: SoundType::SingingBowl,
            interval_sound: SoundType::None,
            finish_sound: SoundType::Bell,
            background_sound: SoundType::WhiteNoise,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reminder_wire_format() {
        let reminder = Reminder {
            id: "r-1".to_string(),
            time: "08:00".to_string(),
            days: vec![1, 3, 5],
            enabled: true,
            config_id: "default-1".to_string(),
        };

        let json = serde_json::to_string(&reminder).unwrap();
        assert!(json.contains("\"configId\":\"default-1\""));
        assert!(json.contains("\"time\":\"08:00\""));

        let back: Reminder = serde_json::from_str(&json).unwrap();
        assert_eq!(back, reminder);
    }

    #[test]
    fn test_sound_type_kebab_case() {
        let json = serde_json::to_string(&SoundType::SingingBowl).unwrap();
        assert_eq!(json, "\"singing-bowl\"");
        let back: SoundType = serde_json::from_str("\"white-noise\"").unwrap();
        assert_eq!(back, SoundType::WhiteNoise);
    }

    #[test]
    fn test_default_configs_have_distinct_ids() {
        let configs = default_configs();
        assert_eq!(configs.len(), 2);
        assert_ne!(configs[0].id, configs[1].id);
    }
}
