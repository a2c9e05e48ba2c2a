// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! In-memory vault with explicit timestamps (thread-safe wrapper)

use chrono::{DateTime, Local};
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use super::{file_name, parent, should_process, CandidateFile, EntryKind, Vault};
use crate::{Result, SorterError};

#[derive(Debug, Clone)]
struct MemoryFile {
    content: String,
    created: DateTime<Local>,
    modified: DateTime<Local>,
}

#[derive(Debug, Default)]
struct Tree {
    files: BTreeMap<String, MemoryFile>,
    folders: BTreeSet<String>,
}

impl Tree {
    fn add_parents(&mut self, path: &str) {
        let mut dir = parent(path);
        while !dir.is_empty() {
            self.folders.insert(dir.to_string());
            dir = parent(dir);
        }
    }

    fn occupied(&self, path: &str) -> bool {
        self.files.contains_key(path) || self.folders.contains(path)
    }
}

/// A vault that lives entirely in memory
#[derive(Debug)]
pub struct MemoryVault {
    tree: Mutex<Tree>,
    available: AtomicBool,
}

impl Default for MemoryVault {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryVault {
    pub fn new() -> Self {
        Self {
            tree: Mutex::new(Tree::default()),
            available: AtomicBool::new(true),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tree>> {
        self.tree
            .lock()
            .map_err(|_| SorterError::Fatal("memory vault lock poisoned".to_string()))
    }

    fn ensure_available(&self) -> Result<()> {
        if self.is_available() {
            Ok(())
        } else {
            Err(SorterError::Fatal("memory vault is offline".to_string()))
        }
    }

    /// Add (or replace) a file with the given timestamps
    pub fn add_file(
        &self,
        path: &str,
        content: &str,
        created: DateTime<Local>,
        modified: DateTime<Local>,
    ) -> Result<()> {
        let mut tree = self.lock()?;
        tree.add_parents(path);
        tree.files.insert(
            path.to_string(),
            MemoryFile {
                content: content.to_string(),
                created,
                modified,
            },
        );
        Ok(())
    }

    pub fn add_folder(&self, path: &str) -> Result<()> {
        let mut tree = self.lock()?;
        tree.add_parents(path);
        tree.folders.insert(path.to_string());
        Ok(())
    }

    /// Simulate the store going away (or coming back)
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Sorted list of every file path
    pub fn paths(&self) -> Vec<String> {
        self.lock()
            .map(|tree| tree.files.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.lock().map(|tree| tree.files.contains_key(path)).unwrap_or(false)
    }
}

impl Vault for MemoryVault {
    fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    fn location(&self) -> PathBuf {
        PathBuf::from("memory:")
    }

    fn list_files(&self, folder: &str) -> Result<Vec<CandidateFile>> {
        self.ensure_available()?;
        let tree = self.lock()?;
        if !folder.is_empty() && !tree.folders.contains(folder) {
            return Err(SorterError::Config(format!("search folder {:?} does not exist", folder)));
        }
        Ok(tree
            .files
            .iter()
            .filter(|(path, _)| parent(path) == folder && should_process(file_name(path)))
            .map(|(path, f)| CandidateFile::new(path.clone(), folder, f.created, f.modified))
            .collect())
    }

    fn entry_kind(&self, path: &str) -> Option<EntryKind> {
        let tree = self.lock().ok()?;
        if tree.files.contains_key(path) {
            Some(EntryKind::File)
        } else if tree.folders.contains(path) {
            Some(EntryKind::Folder)
        } else {
            None
        }
    }

    fn move_file(&self, from: &str, to: &str) -> Result<()> {
        self.ensure_available()?;
        let mut tree = self.lock()?;
        if tree.occupied(to) {
            return Err(SorterError::MoveConflict {
                from: from.to_string(),
                to: to.to_string(),
            });
        }
        let file = tree
            .files
            .remove(from)
            .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::NotFound, from.to_string()))?;
        tree.add_parents(to);
        tree.files.insert(to.to_string(), file);
        Ok(())
    }

    fn read(&self, path: &str) -> Result<String> {
        self.ensure_available()?;
        let tree = self.lock()?;
        tree.files
            .get(path)
            .map(|f| f.content.clone())
            .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::NotFound, path.to_string()).into())
    }

    fn write(&self, path: &str, text: &str) -> Result<()> {
        self.ensure_available()?;
        let mut tree = self.lock()?;
        let file = tree
            .files
            .get_mut(path)
            .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::NotFound, path.to_string()))?;
        file.content = text.to_string();
        file.modified = Local::now();
        Ok(())
    }

    fn create(&self, path: &str, text: &str) -> Result<()> {
        self.ensure_available()?;
        let mut tree = self.lock()?;
        if tree.occupied(path) {
            return Err(std::io::Error::new(
                std::io::ErrorKind::AlreadyExists,
                path.to_string(),
            )
            .into());
        }
        let now = Local::now();
        tree.add_parents(path);
        tree.files.insert(
            path.to_string(),
            MemoryFile {
                content: text.to_string(),
                created: now,
                modified: now,
            },
        );
        Ok(())
    }
}
