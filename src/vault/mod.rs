// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Vault access: the file store the engine sorts
//!
//! All paths crossing this seam are vault-relative and forward-slash
//! separated; "" is the vault root.

pub mod fs;
pub mod memory;

pub use fs::FsVault;
pub use memory::MemoryVault;

use chrono::{DateTime, Local};
use serde::Serialize;
use std::path::PathBuf;

use crate::Result;

/// Snapshot of a note taken at scan time
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CandidateFile {
    /// Vault-relative path
    pub path: String,
    /// Search root the file was found in
    pub search_root: String,
    pub created: DateTime<Local>,
    pub modified: DateTime<Local>,
    /// Lowercased extension without the dot ("" if none)
    pub extension: String,
}

impl CandidateFile {
    pub fn new(
        path: impl Into<String>,
        search_root: impl Into<String>,
        created: DateTime<Local>,
        modified: DateTime<Local>,
    ) -> Self {
        let path = path.into();
        let extension = file_name(&path)
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        Self {
            path,
            search_root: search_root.into(),
            created,
            modified,
            extension,
        }
    }

    pub fn file_name(&self) -> &str {
        file_name(&self.path)
    }
}

/// Last path segment of a vault-relative path
pub fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Parent folder of a vault-relative path ("" for top-level entries)
pub fn parent(path: &str) -> &str {
    path.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("")
}

/// What occupies a path in the vault
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Folder,
}

/// The file store the engine operates on
pub trait Vault: Send + Sync {
    /// False when the store as a whole cannot be reached
    fn is_available(&self) -> bool;

    /// Where this vault lives, recorded in the move journal
    fn location(&self) -> PathBuf;

    /// Files directly inside `folder` (not recursive), in no particular order
    fn list_files(&self, folder: &str) -> Result<Vec<CandidateFile>>;

    fn entry_kind(&self, path: &str) -> Option<EntryKind>;

    /// Rename `from` to `to`, creating missing parent folders.
    /// Fails with `MoveConflict` when `to` is occupied.
    fn move_file(&self, from: &str, to: &str) -> Result<()>;

    fn read(&self, path: &str) -> Result<String>;

    fn write(&self, path: &str, text: &str) -> Result<()>;

    /// Create a new file; fails when anything already occupies `path`
    fn create(&self, path: &str, text: &str) -> Result<()>;

    /// blake3 hex digest of the file content
    fn content_hash(&self, path: &str) -> Result<String> {
        let text = self.read(path)?;
        Ok(blake3::hash(text.as_bytes()).to_hex().to_string())
    }
}

/// Check if a file name looks like a user note rather than an artifact
pub fn should_process(name: &str) -> bool {
    // Skip hidden files
    if name.is_empty() || name.starts_with('.') {
        return false;
    }

    // Skip temporary files
    let temp_suffixes = [".tmp", ".part", ".swp", ".crdownload", "~"];
    if temp_suffixes.iter().any(|s| name.ends_with(s)) {
        return false;
    }

    // Skip system files
    let skip_names = ["desktop.ini", "thumbs.db", ".ds_store"];
    !skip_names.iter().any(|n| name.eq_ignore_ascii_case(n))
}
