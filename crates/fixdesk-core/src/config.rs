//! Configuration loading.
//!
//! Fixdesk reads an optional `fixdesk.yml` from the working directory.
//! Every field has a default, so a missing file yields a fully working
//! configuration; a present file only needs to override what it cares
//! about.

use std::path::Path;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct FixdeskConfig {
    /// Intake wizard settings.
    #[serde(default)]
    pub intake: IntakeConfig,
}

/// Settings for the intake wizard and its stores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IntakeConfig {
    /// Hours of inactivity after which an abandoned wizard session expires.
    #[serde(default = "default_session_ttl_hours")]
    pub session_ttl_hours: i64,

    /// How many times a conflicted read-modify-write is retried before the
    /// conflict is surfaced to the caller.
    #[serde(default = "default_max_conflict_retries")]
    pub max_conflict_retries: u32,

    /// Categories offered as structured choices. Manual entry is always
    /// offered in addition.
    #[serde(default = "default_categories")]
    pub categories: Vec<String>,

    /// Buildings offered for the structured location triple.
    #[serde(default = "default_buildings")]
    pub buildings: Vec<String>,

    /// Number of floors offered per building, numbered from 1.
    #[serde(default = "default_floors_per_building")]
    pub floors_per_building: u8,

    /// Number of room slots offered per floor. Room numbers are derived
    /// deterministically from the floor: slot `n` on floor `f` is `f0n`.
    #[serde(default = "default_room_slots_per_floor")]
    pub room_slots_per_floor: u8,
}

fn default_session_ttl_hours() -> i64 {
    24
}

fn default_max_conflict_retries() -> u32 {
    3
}

fn default_categories() -> Vec<String> {
    ["electrical", "plumbing", "hvac", "carpentry", "cleaning"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_buildings() -> Vec<String> {
    ["A", "B", "C"].into_iter().map(String::from).collect()
}

fn default_floors_per_building() -> u8 {
    4
}

fn default_room_slots_per_floor() -> u8 {
    3
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            session_ttl_hours: default_session_ttl_hours(),
            max_conflict_retries: default_max_conflict_retries(),
            categories: default_categories(),
            buildings: default_buildings(),
            floors_per_building: default_floors_per_building(),
            room_slots_per_floor: default_room_slots_per_floor(),
        }
    }
}

impl IntakeConfig {
    /// The session TTL as a duration.
    pub fn session_ttl(&self) -> Duration {
        Duration::hours(self.session_ttl_hours)
    }

    /// Room numbers offered on the given floor: `room_slots_per_floor`
    /// slots numbered `<floor>0<n>`, e.g. floor 2 yields 201, 202, 203.
    pub fn rooms_on_floor(&self, floor: u8) -> Vec<String> {
        (1..=self.room_slots_per_floor)
            .map(|slot| format!("{floor}0{slot}"))
            .collect()
    }

    /// Floors offered in any building, numbered from 1.
    pub fn floors(&self) -> Vec<u8> {
        (1..=self.floors_per_building).collect()
    }
}

impl FixdeskConfig {
    /// Loads configuration from a YAML file.
    ///
    /// A missing file is not an error: defaults are returned. A present
    /// but malformed file is an error, so typos do not silently fall back
    /// to defaults.
    pub fn load(path: impl AsRef<Path>) -> CoreResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .map_err(|e| CoreError::Config(format!("failed to read {}: {e}", path.display())))?;
        serde_yaml::from_str(&content)
            .map_err(|e| CoreError::Config(format!("failed to parse {}: {e}", path.display())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_yields_defaults() {
        let tmp = TempDir::new().unwrap();
        let config = FixdeskConfig::load(tmp.path().join("fixdesk.yml")).unwrap();
        assert_eq!(config, FixdeskConfig::default());
        assert_eq!(config.intake.session_ttl_hours, 24);
        assert_eq!(config.intake.categories.len(), 5);
    }

    #[test]
    fn test_partial_file_overrides_only_named_fields() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("fixdesk.yml");
        std::fs::write(
            &path,
            "intake:\n  session_ttl_hours: 6\n  buildings: [\"North\", \"South\"]\n",
        )
        .unwrap();

        let config = FixdeskConfig::load(&path).unwrap();
        assert_eq!(config.intake.session_ttl_hours, 6);
        assert_eq!(config.intake.buildings, vec!["North", "South"]);
        // Untouched fields keep defaults.
        assert_eq!(config.intake.room_slots_per_floor, 3);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("fixdesk.yml");
        std::fs::write(&path, "intake:\n  session_ttl_hors: 6\n").unwrap();

        let err = FixdeskConfig::load(&path).unwrap_err();
        assert!(matches!(err, CoreError::Config(_)));
    }

    #[test]
    fn test_rooms_are_derived_from_floor() {
        let config = IntakeConfig::default();
        assert_eq!(config.rooms_on_floor(2), vec!["201", "202", "203"]);
        assert_eq!(config.rooms_on_floor(4), vec!["401", "402", "403"]);
    }

    #[test]
    fn test_floor_list() {
        let config = IntakeConfig::default();
        assert_eq!(config.floors(), vec![1, 2, 3, 4]);
    }
}
