// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Move journal for undo support

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::vault::{EntryKind, Vault};
use crate::Result;

/// A single move performed by the sorter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalEntry {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    /// Vault the paths are relative to
    pub vault: PathBuf,
    pub original_path: String,
    pub new_path: String,
    /// Daily note the moved file was linked from
    #[serde(default)]
    pub daily_note: Option<String>,
    pub file_hash: String,
    #[serde(default)]
    pub undone: bool,
}

/// JSONL log of moves, one entry per line.
///
/// Entries are only ever appended, except for the `undone` flag, which is
/// set by rewriting the log into a sibling file and renaming it over the
/// original so a crash never leaves a half-written journal behind.
pub struct Journal {
    path: PathBuf,
}

impl Journal {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Record one move
    pub fn append(&self, entry: &JournalEntry) -> Result<()> {
        let mut line = serde_json::to_string(entry)?;
        line.push('\n');
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?
            .write_all(line.as_bytes())?;
        Ok(())
    }

    /// Every readable entry, oldest first. Lines that do not parse are
    /// logged and dropped.
    pub fn read_all(&self) -> Result<Vec<JournalEntry>> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut entries = Vec::new();
        for (index, line) in BufReader::new(file).lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str(&line) {
                Ok(entry) => entries.push(entry),
                Err(e) => warn!("Skipping line {} of {:?}: {}", index + 1, self.path, e),
            }
        }
        Ok(entries)
    }

    /// The last `count` entries, newest first
    pub fn get_recent(&self, count: usize) -> Result<Vec<JournalEntry>> {
        Ok(self.read_all()?.into_iter().rev().take(count).collect())
    }

    /// Entries still eligible for undo, oldest first
    pub fn get_undoable(&self) -> Result<Vec<JournalEntry>> {
        Ok(self.read_all()?.into_iter().filter(|e| !e.undone).collect())
    }

    /// Flag entry `id` as undone. Returns false, leaving the log alone, when
    /// no entry has that id.
    pub fn mark_undone(&self, id: &str) -> Result<bool> {
        let mut entries = self.read_all()?;
        let Some(entry) = entries.iter_mut().find(|e| e.id == id) else {
            return Ok(false);
        };
        entry.undone = true;
        self.replace_with(&entries)?;
        Ok(true)
    }

    fn replace_with(&self, entries: &[JournalEntry]) -> Result<()> {
        let staging = self.path.with_extension("jsonl.tmp");
        let file = File::create(&staging)?;
        let mut writer = BufWriter::new(file);
        for entry in entries {
            serde_json::to_writer(&mut writer, entry)?;
            writer.write_all(b"\n")?;
        }
        let file = writer.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()?;
        fs::rename(&staging, &self.path)?;
        Ok(())
    }

    /// Forget every recorded move
    pub fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

/// Create a new journal entry
pub fn create_entry(
    vault: PathBuf,
    original_path: String,
    new_path: String,
    daily_note: Option<String>,
    file_hash: String,
) -> JournalEntry {
    JournalEntry {
        id: uuid::Uuid::new_v4().to_string(),
        timestamp: Utc::now(),
        vault,
        original_path,
        new_path,
        daily_note,
        file_hash,
        undone: false,
    }
}

/// What undoing one journal entry did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UndoOutcome {
    Undone,
    /// Dry run; nothing was touched
    WouldUndo,
    /// The moved file is no longer where the journal says
    Missing,
    /// Something already sits at the original path
    OriginalOccupied,
}

/// Move a journaled file back to where it came from.
///
/// Daily notes are left as they are. A content change since the move is
/// logged but does not block the undo.
pub fn undo_entry<V: Vault + ?Sized>(
    vault: &V,
    journal: &Journal,
    entry: &JournalEntry,
    dry_run: bool,
) -> Result<UndoOutcome> {
    if vault.entry_kind(&entry.new_path) != Some(EntryKind::File) {
        warn!("File not found (may have been moved/deleted): {}", entry.new_path);
        return Ok(UndoOutcome::Missing);
    }
    if vault.entry_kind(&entry.original_path).is_some() {
        warn!("Original path already exists: {}", entry.original_path);
        return Ok(UndoOutcome::OriginalOccupied);
    }
    if !entry.file_hash.is_empty() {
        match vault.content_hash(&entry.new_path) {
            Ok(hash) if hash != entry.file_hash => {
                warn!("{} changed since it was moved", entry.new_path);
            }
            Ok(_) => {}
            Err(e) => debug!("Could not hash {}: {}", entry.new_path, e),
        }
    }
    if dry_run {
        return Ok(UndoOutcome::WouldUndo);
    }

    vault.move_file(&entry.new_path, &entry.original_path)?;
    if !journal.mark_undone(&entry.id)? {
        warn!("Entry {} is not in {:?}", entry.id, journal.path());
    }
    info!("Undone: {} -> {}", entry.new_path, entry.original_path);
    Ok(UndoOutcome::Undone)
}
