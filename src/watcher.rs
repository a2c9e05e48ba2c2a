// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Search-folder watching for `file-sorter watch`
//!
//! The watcher only reports that notes appeared; deciding when to sort is up
//! to [`TriggerState`], which waits for a quiet period so a note still being
//! written is left alone, and fires the scheduled pass for `runFrequency`.

use notify::event::{ModifyKind, RenameMode};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver};
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::rule::SortRule;
use crate::vault::should_process;
use crate::{Result, SorterError};

/// How long a search folder must stay quiet before a pass runs
pub const QUIET_PERIOD: Duration = Duration::from_secs(2);

/// Events emitted by the watcher
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    /// A file showed up (created, or renamed into the folder)
    Appeared(PathBuf),
    /// A file's content changed
    Changed(PathBuf),
    /// A file went away
    Removed(PathBuf),
    /// Watcher error
    Error(String),
}

/// Watches search folders, non-recursively
pub struct FileWatcher {
    watcher: RecommendedWatcher,
    watched_paths: Vec<PathBuf>,
    event_rx: Receiver<notify::Result<Event>>,
}

impl FileWatcher {
    pub fn new() -> Result<Self> {
        let (tx, rx) = channel();

        let config = Config::default().with_poll_interval(Duration::from_secs(2));
        let watcher = RecommendedWatcher::new(tx, config)?;

        Ok(Self {
            watcher,
            watched_paths: Vec::new(),
            event_rx: rx,
        })
    }

    /// Add a search folder; it must already exist
    pub fn watch(&mut self, path: &Path) -> Result<()> {
        if !path.is_dir() {
            return Err(SorterError::Config(format!(
                "search folder {:?} does not exist",
                path
            )));
        }

        self.watcher.watch(path, RecursiveMode::NonRecursive)?;
        self.watched_paths.push(path.to_path_buf());
        info!("Watching: {:?}", path);

        Ok(())
    }

    pub fn unwatch(&mut self, path: &Path) -> Result<()> {
        self.watcher.unwatch(path)?;
        self.watched_paths.retain(|p| p != path);
        info!("Stopped watching: {:?}", path);
        Ok(())
    }

    /// Get the next event (blocking with timeout)
    pub fn next_event(&self, timeout: Duration) -> Option<WatchEvent> {
        match self.event_rx.recv_timeout(timeout) {
            Ok(Ok(event)) => convert_event(event),
            Ok(Err(e)) => Some(WatchEvent::Error(e.to_string())),
            Err(std::sync::mpsc::RecvTimeoutError::Timeout) => None,
            Err(std::sync::mpsc::RecvTimeoutError::Disconnected) => {
                Some(WatchEvent::Error("Watcher disconnected".to_string()))
            }
        }
    }

    pub fn watched_paths(&self) -> &[PathBuf] {
        &self.watched_paths
    }
}

/// Map a raw notify event onto the few cases the sorter cares about
pub fn convert_event(event: Event) -> Option<WatchEvent> {
    match event.kind {
        EventKind::Create(_) => event.paths.first().cloned().map(WatchEvent::Appeared),
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
            event.paths.get(1).cloned().map(WatchEvent::Appeared)
        }
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => {
            event.paths.first().cloned().map(WatchEvent::Appeared)
        }
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => {
            event.paths.first().cloned().map(WatchEvent::Removed)
        }
        EventKind::Modify(_) => event.paths.first().cloned().map(WatchEvent::Changed),
        EventKind::Remove(_) => event.paths.first().cloned().map(WatchEvent::Removed),
        _ => None,
    }
}

/// True when `path` names a note the rule would consider
pub fn is_note_path(path: &Path, rule: &SortRule) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    if !should_process(name) {
        return false;
    }
    path.extension()
        .and_then(|e| e.to_str())
        .map(|ext| rule.is_note_extension(&ext.to_lowercase()))
        .unwrap_or(false)
}

/// Why a pass is due
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// New notes appeared and the folders have gone quiet
    Changes,
    /// The `runFrequency` interval elapsed
    Schedule,
}

/// Decides when the watch loop should run a pass
#[derive(Debug, Clone)]
pub struct TriggerState {
    quiet: Duration,
    interval: Option<Duration>,
    last_activity: Option<Instant>,
    next_scheduled: Option<Instant>,
}

impl TriggerState {
    pub fn new(quiet: Duration, interval: Option<Duration>, now: Instant) -> Self {
        Self {
            quiet,
            interval,
            last_activity: None,
            next_scheduled: interval.map(|i| now + i),
        }
    }

    /// Feed one watcher event in
    pub fn observe(&mut self, event: &WatchEvent, rule: &SortRule, now: Instant) {
        match event {
            WatchEvent::Appeared(path) if is_note_path(path, rule) => {
                debug!("Note appeared: {:?}", path);
                self.last_activity = Some(now);
            }
            // Writes to a pending note push the pass back
            WatchEvent::Changed(path) if self.is_pending() && is_note_path(path, rule) => {
                self.last_activity = Some(now);
            }
            _ => {}
        }
    }

    pub fn is_pending(&self) -> bool {
        self.last_activity.is_some()
    }

    pub fn due(&self, now: Instant) -> Option<Trigger> {
        if let Some(last) = self.last_activity {
            if now.saturating_duration_since(last) >= self.quiet {
                return Some(Trigger::Changes);
            }
        }
        match self.next_scheduled {
            Some(at) if now >= at => Some(Trigger::Schedule),
            _ => None,
        }
    }

    /// A pass just finished; clear pending changes and restart the schedule
    pub fn ran(&mut self, now: Instant) {
        self.last_activity = None;
        self.next_scheduled = self.interval.map(|i| now + i);
    }
}
