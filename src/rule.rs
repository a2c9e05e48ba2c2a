// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Immutable sorting rule compiled from [`AppConfig`] once per run

use chrono::format::{Item, StrftimeItems};
use chrono::NaiveDate;
use regex::Regex;
use std::fmt::Write;

use crate::config::AppConfig;
use crate::{Result, SorterError};

/// Everything the engine needs to decide where a note goes.
///
/// Built with [`SortRule::from_config`], which is the only place settings are
/// validated: a rule that exists is known to be usable.
#[derive(Debug, Clone)]
pub struct SortRule {
    pub search_roots: Vec<String>,
    pub ignore_files: Vec<String>,
    pub include: Option<Regex>,
    pub create_nested_daily_folders: bool,
    pub create_daily_note: bool,
    pub add_note_links: bool,
    pub create_history_notes: bool,
    pub history_heading: String,
    pub daily_folder: String,
    pub daily_format: String,
    pub note_extensions: Vec<String>,
}

impl SortRule {
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let mut search_roots: Vec<String> = Vec::new();
        for folder in &config.search_folders {
            let folder = normalize_path(folder);
            if !search_roots.contains(&folder) {
                search_roots.push(folder);
            }
        }
        // The host default is `[""]`, which means "the vault root"; only a
        // list with no entries at all is unusable.
        if search_roots.is_empty() {
            return Err(SorterError::Config("no search folders configured".to_string()));
        }

        let ignore_files = config
            .ignore_files
            .iter()
            .filter(|entry| !entry.trim().is_empty())
            .map(|entry| {
                let trimmed = entry.trim().replace('\\', "/");
                if trimmed.ends_with('/') {
                    format!("{}/", normalize_path(&trimmed))
                } else {
                    normalize_path(&trimmed)
                }
            })
            .collect();

        let include = match config.add_files_regex.as_deref().map(str::trim) {
            Some(pattern) if !pattern.is_empty() => Some(Regex::new(pattern)?),
            _ => None,
        };

        let history_heading = config.history_notes.history_section_template.trim().to_string();
        if config.create_history_notes && history_heading.is_empty() {
            return Err(SorterError::Config("history section heading is empty".to_string()));
        }

        let daily_format = config.daily_notes.format.trim().to_string();
        validate_date_format(&daily_format)?;

        let note_extensions = config
            .note_extensions
            .iter()
            .map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
            .filter(|e| !e.is_empty())
            .collect::<Vec<_>>();
        if note_extensions.is_empty() {
            return Err(SorterError::Config("no note extensions configured".to_string()));
        }

        Ok(Self {
            search_roots,
            ignore_files,
            include,
            create_nested_daily_folders: config.create_nested_daily_folders,
            create_daily_note: config.create_daily_note,
            add_note_links: config.add_note_links,
            create_history_notes: config.create_history_notes,
            history_heading,
            daily_folder: normalize_path(&config.daily_notes.folder),
            daily_format,
            note_extensions,
        })
    }

    /// Whether the rule asks for any daily-note edits at all
    pub fn touches_daily_notes(&self) -> bool {
        self.add_note_links || self.create_history_notes
    }

    pub fn is_note_extension(&self, extension: &str) -> bool {
        self.note_extensions.iter().any(|e| e.eq_ignore_ascii_case(extension))
    }
}

/// Vault-relative form: forward slashes, no leading or trailing slash
pub fn normalize_path(path: &str) -> String {
    path.trim()
        .replace('\\', "/")
        .split('/')
        .filter(|part| !part.is_empty() && *part != ".")
        .collect::<Vec<_>>()
        .join("/")
}

/// Join vault-relative segments, treating "" as the vault root
pub fn join_path(base: &str, child: &str) -> String {
    if base.is_empty() {
        child.to_string()
    } else if child.is_empty() {
        base.to_string()
    } else {
        format!("{}/{}", base, child)
    }
}

fn validate_date_format(format: &str) -> Result<()> {
    if format.is_empty() {
        return Err(SorterError::Config("daily note format is empty".to_string()));
    }
    if format.contains('/') {
        return Err(SorterError::Config(format!(
            "daily note format {:?} must not contain '/'",
            format
        )));
    }
    if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
        return Err(SorterError::Config(format!("invalid daily note format {:?}", format)));
    }
    // Time fields cannot be rendered from a bare date
    let probe = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap_or_default();
    let mut rendered = String::new();
    if write!(rendered, "{}", probe.format(format)).is_err() || rendered.is_empty() {
        return Err(SorterError::Config(format!(
            "daily note format {:?} needs date fields only",
            format
        )));
    }
    Ok(())
}
