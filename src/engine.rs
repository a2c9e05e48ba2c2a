// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! The sorting pass: scan, count, move, link
//!
//! A run walks `Idle -> Scanning -> PrePass -> Processing -> Done`. Files are
//! handled one at a time in ascending path order. A failure on one file is
//! recorded and the run moves on; only configuration problems and an
//! unreachable vault stop it. Nothing is rolled back.

use chrono::Local;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use crate::config::AppConfig;
use crate::daily_note::{daily_note_path, is_daily_note_path, DailyNoteLocator};
use crate::filter::is_eligible;
use crate::journal::{create_entry, Journal};
use crate::links::LinkWriter;
use crate::notifier::{Notice, Notifier};
use crate::resolver::{governing_date, resolve_destination, Destination, SameDayCounts};
use crate::rule::SortRule;
use crate::vault::{CandidateFile, Vault};
use crate::{ErrorKind, Result, SorterError};

/// Where a run currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Idle,
    Scanning,
    PrePass,
    Processing,
    Done,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Resolve destinations without touching the vault
    pub dry_run: bool,
}

/// One performed (or, in a dry run, planned) move
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MoveRecord {
    pub from: String,
    pub to: String,
    pub nested: bool,
    pub daily_note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Failure {
    pub path: String,
    pub error: String,
}

/// Outcome of a completed run
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub dry_run: bool,
    pub moved: usize,
    pub skipped: usize,
    pub failed: usize,
    pub daily_notes_created: usize,
    pub links_added: usize,
    pub history_entries_added: usize,
    pub moves: Vec<MoveRecord>,
    pub failures: Vec<Failure>,
    /// Daily notes that could not be read, created or written
    pub note_errors: Vec<Failure>,
}

impl RunSummary {
    pub fn message(&self) -> String {
        let verb = if self.dry_run { "Would move" } else { "Moved" };
        let mut msg = format!(
            "{} {} note(s), skipped {}, failed {}",
            verb, self.moved, self.skipped, self.failed
        );
        if self.daily_notes_created > 0 {
            msg.push_str(&format!(", created {} daily note(s)", self.daily_notes_created));
        }
        if !self.note_errors.is_empty() {
            msg.push_str(&format!(", {} daily note error(s)", self.note_errors.len()));
        }
        msg
    }
}

/// Runs sorting passes over a vault
pub struct SortEngine<'a, V: Vault + ?Sized> {
    vault: &'a V,
    rule: SortRule,
    notifier: &'a dyn Notifier,
    journal: Option<&'a Journal>,
    state: EngineState,
}

impl<'a, V: Vault + ?Sized> SortEngine<'a, V> {
    pub fn new(vault: &'a V, rule: SortRule, notifier: &'a dyn Notifier) -> Self {
        Self {
            vault,
            rule,
            notifier,
            journal: None,
            state: EngineState::Idle,
        }
    }

    /// Compile the rule from settings; a bad setting is reported and returned
    pub fn from_config(vault: &'a V, config: &AppConfig, notifier: &'a dyn Notifier) -> Result<Self> {
        match SortRule::from_config(config) {
            Ok(rule) => Ok(Self::new(vault, rule, notifier)),
            Err(e) => {
                notifier.notify(Notice::error(e.to_string()));
                Err(e)
            }
        }
    }

    /// Record every move in `journal` so it can be undone
    pub fn with_journal(mut self, journal: &'a Journal) -> Self {
        self.journal = Some(journal);
        self
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn rule(&self) -> &SortRule {
        &self.rule
    }

    fn transition(&mut self, next: EngineState) {
        debug!("Engine state {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    /// Run one sorting pass
    pub fn run(&mut self, options: RunOptions) -> Result<RunSummary> {
        self.state = EngineState::Idle;
        if !self.vault.is_available() {
            return Err(self.abort(SorterError::Fatal(format!(
                "vault at {:?} is not reachable",
                self.vault.location()
            ))));
        }

        self.transition(EngineState::Scanning);
        let candidates = match self.scan() {
            Ok(files) => files,
            Err(e) => return Err(self.abort(e)),
        };

        self.transition(EngineState::PrePass);
        let mut summary = RunSummary {
            dry_run: options.dry_run,
            ..RunSummary::default()
        };
        let eligible: Vec<CandidateFile> = candidates
            .into_iter()
            .filter(|file| {
                let keep = self.is_candidate(file);
                if !keep {
                    summary.skipped += 1;
                }
                keep
            })
            .collect();
        let counts = SameDayCounts::from_files(&eligible);
        debug!("{} eligible file(s)", eligible.len());

        self.transition(EngineState::Processing);
        let mut locator = DailyNoteLocator::new();
        let writer = LinkWriter::new(&self.rule);

        for file in &eligible {
            let destination = resolve_destination(file, &self.rule, counts.get(file));

            if options.dry_run {
                info!("DRY RUN: Would move {} -> {}", file.path, destination.path);
                summary.moved += 1;
                summary.moves.push(MoveRecord {
                    from: file.path.clone(),
                    to: destination.path.clone(),
                    nested: destination.nested,
                    daily_note: self
                        .rule
                        .touches_daily_notes()
                        .then(|| daily_note_path(governing_date(file), &self.rule)),
                });
                continue;
            }

            if let Err(e) = self.process_file(file, &destination, &mut locator, &writer, &mut summary) {
                if e.kind() == ErrorKind::Fatal || !self.vault.is_available() {
                    return Err(self.abort(as_fatal(e)));
                }
                warn!("Failed to move {}: {}", file.path, e);
                summary.failed += 1;
                summary.failures.push(Failure {
                    path: file.path.clone(),
                    error: e.to_string(),
                });
            }
        }

        for e in locator.flush(self.vault) {
            if e.kind() == ErrorKind::Fatal || !self.vault.is_available() {
                return Err(self.abort(as_fatal(e)));
            }
            summary.note_errors.push(failure_for_note(&e));
        }
        summary.daily_notes_created = locator.created_count();

        self.transition(EngineState::Done);
        self.notifier.notify(Notice::info(summary.message()));
        Ok(summary)
    }

    /// Collect files from every search root, once per path, in path order
    fn scan(&self) -> Result<Vec<CandidateFile>> {
        let mut by_path: BTreeMap<String, CandidateFile> = BTreeMap::new();
        for root in &self.rule.search_roots {
            let files = self.vault.list_files(root).map_err(|e| match e.kind() {
                ErrorKind::Config | ErrorKind::Fatal => e,
                _ => SorterError::Config(format!("cannot read search folder {:?}: {}", root, e)),
            })?;
            debug!("Found {} file(s) in {:?}", files.len(), root);
            for file in files {
                by_path.entry(file.path.clone()).or_insert(file);
            }
        }
        Ok(by_path.into_values().collect())
    }

    fn is_candidate(&self, file: &CandidateFile) -> bool {
        if !self.rule.is_note_extension(&file.extension) {
            debug!("Skipping {} (not a note)", file.path);
            return false;
        }
        if is_daily_note_path(&file.path, &self.rule) {
            debug!("Skipping {} (daily note)", file.path);
            return false;
        }
        if !is_eligible(file, &self.rule) {
            debug!("Skipping {} (filtered out)", file.path);
            return false;
        }
        true
    }

    /// Move one file, then link it from its daily note.
    ///
    /// Errors returned here mean the move itself failed; daily-note problems
    /// are recorded in `summary` and do not fail the file.
    fn process_file(
        &self,
        file: &CandidateFile,
        destination: &Destination,
        locator: &mut DailyNoteLocator,
        writer: &LinkWriter,
        summary: &mut RunSummary,
    ) -> Result<()> {
        let hash = match self.journal {
            Some(_) => self.vault.content_hash(&file.path).ok(),
            None => None,
        };

        self.vault.move_file(&file.path, &destination.path)?;
        info!("Moved {} -> {}", file.path, destination.path);
        summary.moved += 1;

        let mut record = MoveRecord {
            from: file.path.clone(),
            to: destination.path.clone(),
            nested: destination.nested,
            daily_note: None,
        };

        if self.rule.touches_daily_notes() {
            let date = governing_date(file);
            match locator.get_or_create(self.vault, date, &self.rule) {
                Ok(handle) => {
                    if let Some(note) = locator.note_mut(handle) {
                        let outcome = writer.record_move(note, file, destination, Local::now());
                        summary.links_added += usize::from(outcome.link_added);
                        summary.history_entries_added += usize::from(outcome.history_added);
                        record.daily_note = Some(note.path.clone());
                    } else {
                        debug!("No daily note for {}, {} stays unlinked", date, destination.path);
                    }
                }
                Err(e) if e.kind() == ErrorKind::Fatal => return Err(e),
                Err(e) => {
                    warn!("Daily note for {} unavailable: {}", date, e);
                    summary.note_errors.push(failure_for_note(&e));
                }
            }
        }

        if let Some(journal) = self.journal {
            let entry = create_entry(
                self.vault.location(),
                record.from.clone(),
                record.to.clone(),
                record.daily_note.clone(),
                hash.unwrap_or_default(),
            );
            if let Err(e) = journal.append(&entry) {
                warn!("Failed to journal move of {}: {}", file.path, e);
            }
        }

        summary.moves.push(record);
        Ok(())
    }

    fn abort(&mut self, err: SorterError) -> SorterError {
        self.transition(EngineState::Done);
        self.notifier.notify(Notice::error(err.to_string()));
        err
    }
}

fn as_fatal(err: SorterError) -> SorterError {
    match err {
        SorterError::Fatal(_) => err,
        other => SorterError::Fatal(other.to_string()),
    }
}

fn failure_for_note(err: &SorterError) -> Failure {
    match err {
        SorterError::NoteIo { path, reason } => Failure {
            path: path.clone(),
            error: reason.clone(),
        },
        other => Failure {
            path: String::new(),
            error: other.to_string(),
        },
    }
}
