// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Configuration management for the file sorter
//!
//! Keys mirror the plugin settings blob (`searchFolders`, `ignoreFiles`, ...),
//! so an existing settings file can be used as-is.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    /// Vault root directory
    #[serde(default = "default_vault_path")]
    pub vault_path: String,

    /// Folders whose top-level notes get sorted
    #[serde(default = "default_blank_list")]
    pub search_folders: Vec<String>,

    /// Create the daily note when it does not exist yet
    #[serde(default = "default_true")]
    pub create_daily_note: bool,

    /// Allow a per-day folder when a day has more than one note
    #[serde(default = "default_true")]
    pub create_nested_daily_folders: bool,

    /// Link moved notes from the daily note
    #[serde(default = "default_true")]
    pub add_note_links: bool,

    /// Only paths matching this regex are moved (ignore list still wins)
    #[serde(default, rename = "addFilesRegexVal")]
    pub add_files_regex: Option<String>,

    /// Paths never moved; entries ending in `/` exclude a whole folder
    #[serde(default = "default_blank_list")]
    pub ignore_files: Vec<String>,

    /// Schedule used by watch mode
    #[serde(default)]
    pub run_frequency: RunFrequency,

    /// Append history entries to the daily note
    #[serde(default = "default_true")]
    pub create_history_notes: bool,

    #[serde(default, rename = "history_notes")]
    pub history_notes: HistoryNotesConfig,

    #[serde(default)]
    pub daily_notes: DailyNotesConfig,

    /// Extensions considered notes
    #[serde(default = "default_note_extensions")]
    pub note_extensions: Vec<String>,

    /// JSONL journal of performed moves (used by undo)
    #[serde(default = "default_journal_path")]
    pub journal_path: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct HistoryNotesConfig {
    #[serde(default = "default_history_heading")]
    pub history_section_template: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct DailyNotesConfig {
    /// Folder holding daily notes (vault-relative, "" = vault root)
    #[serde(default)]
    pub folder: String,
    /// chrono format string for the daily note file stem
    #[serde(default = "default_daily_format")]
    pub format: String,
}

/// How often watch mode runs a scheduled pass
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum RunFrequency {
    Manual,
    Hourly,
    #[default]
    Daily,
    Weekly,
}

impl RunFrequency {
    /// Interval between scheduled passes; `None` for manual
    pub fn interval(self) -> Option<Duration> {
        match self {
            RunFrequency::Manual => None,
            RunFrequency::Hourly => Some(Duration::from_secs(60 * 60)),
            RunFrequency::Daily => Some(Duration::from_secs(24 * 60 * 60)),
            RunFrequency::Weekly => Some(Duration::from_secs(7 * 24 * 60 * 60)),
        }
    }
}

// Default value functions
fn default_vault_path() -> String { ".".to_string() }
fn default_blank_list() -> Vec<String> { vec![String::new()] }
fn default_true() -> bool { true }
fn default_history_heading() -> String { "### Modified Notes".to_string() }
fn default_daily_format() -> String { "%Y-%m-%d".to_string() }
fn default_note_extensions() -> Vec<String> { vec!["md".to_string()] }
fn default_journal_path() -> String { "file_sorter_journal.jsonl".to_string() }

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            vault_path: default_vault_path(),
            search_folders: default_blank_list(),
            create_daily_note: true,
            create_nested_daily_folders: true,
            add_note_links: true,
            add_files_regex: None,
            ignore_files: default_blank_list(),
            run_frequency: RunFrequency::default(),
            create_history_notes: true,
            history_notes: HistoryNotesConfig::default(),
            daily_notes: DailyNotesConfig::default(),
            note_extensions: default_note_extensions(),
            journal_path: default_journal_path(),
        }
    }
}

impl Default for HistoryNotesConfig {
    fn default() -> Self {
        Self {
            history_section_template: default_history_heading(),
        }
    }
}

impl Default for DailyNotesConfig {
    fn default() -> Self {
        Self {
            folder: String::new(),
            format: default_daily_format(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a JSON file
    pub fn load(path: &Path) -> crate::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Self = serde_json::from_str(&content)
                .map_err(|e| crate::SorterError::Config(format!("Failed to parse config: {}", e)))?;
            Ok(config)
        } else {
            tracing::info!("Config file not found at {:?}, using defaults", path);
            Ok(Self::default())
        }
    }

    /// Save configuration to a JSON file
    pub fn save(&self, path: &Path) -> crate::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_plugin_settings_blob_loads() {
        let blob = r####"{
            "searchFolders": ["Inbox"],
            "createDailyNote": false,
            "createNestedDailyFolders": true,
            "addNoteLinks": true,
            "addFilesRegex": {},
            "addFilesRegexVal": "^Inbox/draft-",
            "ignoreFiles": ["Inbox/keep.md"],
            "runFrequency": "hourly",
            "createHistoryNotes": true,
            "history_notes": { "historySectionTemplate": "## Moved" }
        }"####;

        let config: AppConfig = serde_json::from_str(blob).unwrap();
        assert_eq!(config.search_folders, vec!["Inbox"]);
        assert!(!config.create_daily_note);
        assert_eq!(config.add_files_regex.as_deref(), Some("^Inbox/draft-"));
        assert_eq!(config.run_frequency, RunFrequency::Hourly);
        assert_eq!(config.history_notes.history_section_template, "## Moved");
        assert_eq!(config.daily_notes.format, "%Y-%m-%d");
        assert_eq!(config.vault_path, ".");
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let config = AppConfig::load(&dir.path().join("nope.json")).unwrap();
        assert_eq!(config.search_folders, vec![""]);
        assert_eq!(config.history_notes.history_section_template, "### Modified Notes");
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        let mut config = AppConfig::default();
        config.search_folders = vec!["Inbox".into(), "Scratch".into()];
        config.save(&path).unwrap();

        let loaded = AppConfig::load(&path).unwrap();
        assert_eq!(loaded.search_folders, config.search_folders);
        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"searchFolders\""));
        assert!(raw.contains("\"history_notes\""));
    }

    #[test]
    fn test_invalid_json_is_config_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(AppConfig::load(&path), Err(crate::SorterError::Config(_))));
    }

    #[test]
    fn test_run_frequency_intervals() {
        assert_eq!(RunFrequency::Manual.interval(), None);
        assert_eq!(RunFrequency::Hourly.interval(), Some(Duration::from_secs(3600)));
    }
}
