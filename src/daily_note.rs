// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Daily note lookup, creation and write-back
//!
//! The locator opens each day's note at most once per run and keeps it in
//! memory; edits accumulate there and are written back by [`DailyNoteLocator::flush`].

use chrono::NaiveDate;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use crate::rule::{join_path, SortRule};
use crate::vault::{file_name, parent, EntryKind, Vault};
use crate::{ErrorKind, Result, SorterError};

/// A day's note, held in memory for the duration of a run
#[derive(Debug, Clone)]
pub struct DailyNote {
    pub date: NaiveDate,
    pub path: String,
    content: String,
    created: bool,
    dirty: bool,
}

impl DailyNote {
    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn set_content(&mut self, content: String) {
        if content != self.content {
            self.content = content;
            self.dirty = true;
        }
    }

    /// Created during this run
    pub fn was_created(&self) -> bool {
        self.created
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Wikilink target of this note (path without the `.md` extension)
    pub fn link_target(&self) -> &str {
        self.path.strip_suffix(".md").unwrap_or(&self.path)
    }
}

/// What [`DailyNoteLocator::get_or_create`] hands out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DailyNoteHandle {
    /// A real note is open for this date
    Note(NaiveDate),
    /// No note for this date; linking is skipped
    Missing(NaiveDate),
}

impl DailyNoteHandle {
    pub fn date(self) -> NaiveDate {
        match self {
            DailyNoteHandle::Note(date) | DailyNoteHandle::Missing(date) => date,
        }
    }
}

#[derive(Debug)]
enum Slot {
    Open(DailyNote),
    Absent,
    Failed,
}

/// Finds or creates daily notes, once per date
#[derive(Debug, Default)]
pub struct DailyNoteLocator {
    slots: BTreeMap<NaiveDate, Slot>,
}

/// Conventional path of the daily note for `date`
pub fn daily_note_path(date: NaiveDate, rule: &SortRule) -> String {
    let name = format!("{}.md", date.format(&rule.daily_format));
    join_path(&rule.daily_folder, &name)
}

/// True when `path` is where some day's note lives
pub fn is_daily_note_path(path: &str, rule: &SortRule) -> bool {
    if parent(path) != rule.daily_folder {
        return false;
    }
    let Some(stem) = file_name(path).strip_suffix(".md") else {
        return false;
    };
    match NaiveDate::parse_from_str(stem, &rule.daily_format) {
        Ok(date) => date.format(&rule.daily_format).to_string() == stem,
        Err(_) => false,
    }
}

impl DailyNoteLocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open the note for `date`, creating it when the rule allows.
    ///
    /// Idempotent: later calls for the same date return the same handle
    /// without touching the vault. A failure is reported once; afterwards the
    /// date behaves as if it had no note.
    pub fn get_or_create<V: Vault + ?Sized>(
        &mut self,
        vault: &V,
        date: NaiveDate,
        rule: &SortRule,
    ) -> Result<DailyNoteHandle> {
        if let Some(slot) = self.slots.get(&date) {
            return Ok(match slot {
                Slot::Open(_) => DailyNoteHandle::Note(date),
                Slot::Absent | Slot::Failed => DailyNoteHandle::Missing(date),
            });
        }

        match self.open(vault, date, rule) {
            Ok(slot) => {
                let handle = match slot {
                    Slot::Open(_) => DailyNoteHandle::Note(date),
                    _ => DailyNoteHandle::Missing(date),
                };
                self.slots.insert(date, slot);
                Ok(handle)
            }
            Err(err) => {
                if err.kind() != ErrorKind::Fatal {
                    self.slots.insert(date, Slot::Failed);
                }
                Err(err)
            }
        }
    }

    fn open<V: Vault + ?Sized>(&self, vault: &V, date: NaiveDate, rule: &SortRule) -> Result<Slot> {
        let path = daily_note_path(date, rule);

        match vault.entry_kind(&path) {
            Some(EntryKind::File) => {
                let content = vault.read(&path).map_err(|e| lift(&path, e))?;
                debug!("Opened daily note {}", path);
                Ok(Slot::Open(DailyNote {
                    date,
                    path,
                    content,
                    created: false,
                    dirty: false,
                }))
            }
            Some(EntryKind::Folder) => {
                if rule.create_daily_note {
                    Err(SorterError::note_io(&path, "path is occupied by a folder"))
                } else {
                    Ok(Slot::Absent)
                }
            }
            None if rule.create_daily_note => {
                vault.create(&path, "").map_err(|e| lift(&path, e))?;
                info!("Created daily note {}", path);
                Ok(Slot::Open(DailyNote {
                    date,
                    path,
                    content: String::new(),
                    created: true,
                    dirty: false,
                }))
            }
            None => {
                debug!("No daily note for {} and creation is disabled", date);
                Ok(Slot::Absent)
            }
        }
    }

    pub fn note(&self, handle: DailyNoteHandle) -> Option<&DailyNote> {
        match (handle, self.slots.get(&handle.date())) {
            (DailyNoteHandle::Note(_), Some(Slot::Open(note))) => Some(note),
            _ => None,
        }
    }

    pub fn note_mut(&mut self, handle: DailyNoteHandle) -> Option<&mut DailyNote> {
        match (handle, self.slots.get_mut(&handle.date())) {
            (DailyNoteHandle::Note(_), Some(Slot::Open(note))) => Some(note),
            _ => None,
        }
    }

    /// Number of notes created so far in this run
    pub fn created_count(&self) -> usize {
        self.slots
            .values()
            .filter(|slot| matches!(slot, Slot::Open(note) if note.created))
            .count()
    }

    /// Write every edited note back to the vault.
    ///
    /// Each note is written independently; failures are returned, not raised.
    pub fn flush<V: Vault + ?Sized>(&mut self, vault: &V) -> Vec<SorterError> {
        let mut errors = Vec::new();
        for slot in self.slots.values_mut() {
            if let Slot::Open(note) = slot {
                if !note.dirty {
                    continue;
                }
                match vault.write(&note.path, &note.content) {
                    Ok(()) => {
                        note.dirty = false;
                        debug!("Wrote daily note {}", note.path);
                    }
                    Err(e) => {
                        warn!("Failed to write daily note {}: {}", note.path, e);
                        errors.push(lift(&note.path, e));
                    }
                }
            }
        }
        errors
    }
}

/// Daily-note failures are NoteIo unless the whole vault is gone
fn lift(path: &str, err: SorterError) -> SorterError {
    match err.kind() {
        ErrorKind::Fatal | ErrorKind::NoteIo => err,
        _ => SorterError::note_io(path, err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::vault::MemoryVault;
    use chrono::{Local, TimeZone};

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 5).unwrap()
    }

    fn rule(create: bool) -> SortRule {
        let mut config = AppConfig::default();
        config.create_daily_note = create;
        config.daily_notes.folder = "Daily".into();
        SortRule::from_config(&config).unwrap()
    }

    #[test]
    fn test_daily_note_path_convention() {
        assert_eq!(daily_note_path(day(), &rule(true)), "Daily/2024-01-05.md");
        let root_rule = SortRule::from_config(&AppConfig::default()).unwrap();
        assert_eq!(daily_note_path(day(), &root_rule), "2024-01-05.md");
    }

    #[test]
    fn test_is_daily_note_path() {
        let rule = rule(true);
        assert!(is_daily_note_path("Daily/2024-01-05.md", &rule));
        assert!(!is_daily_note_path("2024-01-05.md", &rule));
        assert!(!is_daily_note_path("Daily/2024-1-5.md", &rule));
        assert!(!is_daily_note_path("Daily/meeting.md", &rule));
    }

    #[test]
    fn test_get_or_create_is_idempotent() {
        let vault = MemoryVault::new();
        let mut locator = DailyNoteLocator::new();
        let rule = rule(true);

        let first = locator.get_or_create(&vault, day(), &rule).unwrap();
        let second = locator.get_or_create(&vault, day(), &rule).unwrap();
        assert_eq!(first, second);
        assert_eq!(first, DailyNoteHandle::Note(day()));
        assert_eq!(locator.created_count(), 1);
        assert!(vault.contains("Daily/2024-01-05.md"));
    }

    #[test]
    fn test_existing_note_is_read_not_recreated() {
        let vault = MemoryVault::new();
        let t = Local.with_ymd_and_hms(2024, 1, 5, 8, 0, 0).unwrap();
        vault.add_file("Daily/2024-01-05.md", "# Friday\n", t, t).unwrap();

        let mut locator = DailyNoteLocator::new();
        let handle = locator.get_or_create(&vault, day(), &rule(false)).unwrap();
        let note = locator.note(handle).unwrap();
        assert_eq!(note.content(), "# Friday\n");
        assert!(!note.was_created());
        assert_eq!(locator.created_count(), 0);
    }

    #[test]
    fn test_missing_note_without_creation_is_sentinel() {
        let vault = MemoryVault::new();
        let mut locator = DailyNoteLocator::new();
        let handle = locator.get_or_create(&vault, day(), &rule(false)).unwrap();
        assert_eq!(handle, DailyNoteHandle::Missing(day()));
        assert!(locator.note_mut(handle).is_none());
        assert!(vault.paths().is_empty());
    }

    #[test]
    fn test_folder_collision_is_reported_once() {
        let vault = MemoryVault::new();
        vault.add_folder("Daily/2024-01-05.md").unwrap();
        let mut locator = DailyNoteLocator::new();
        let rule = rule(true);

        let err = locator.get_or_create(&vault, day(), &rule).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NoteIo);
        let again = locator.get_or_create(&vault, day(), &rule).unwrap();
        assert_eq!(again, DailyNoteHandle::Missing(day()));
    }

    #[test]
    fn test_flush_writes_only_dirty_notes() {
        let vault = MemoryVault::new();
        let mut locator = DailyNoteLocator::new();
        let rule = rule(true);
        let handle = locator.get_or_create(&vault, day(), &rule).unwrap();

        locator.note_mut(handle).unwrap().set_content("- [[Inbox/2024/01/a]]\n".into());
        assert!(locator.note(handle).unwrap().is_dirty());
        assert!(locator.flush(&vault).is_empty());
        assert_eq!(vault.read("Daily/2024-01-05.md").unwrap(), "- [[Inbox/2024/01/a]]\n");
        assert!(!locator.note(handle).unwrap().is_dirty());
    }

    #[test]
    fn test_offline_vault_is_fatal_not_note_io() {
        let vault = MemoryVault::new();
        vault.set_available(false);
        let mut locator = DailyNoteLocator::new();
        let err = locator.get_or_create(&vault, day(), &rule(true)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Fatal);
    }
}
