// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Vault backed by a directory on disk

use chrono::{DateTime, Local};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::{should_process, CandidateFile, EntryKind, Vault};
use crate::rule::join_path;
use crate::{Result, SorterError};

/// A vault rooted at a local directory
#[derive(Debug, Clone)]
pub struct FsVault {
    root: PathBuf,
}

impl FsVault {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a vault-relative path onto disk, refusing anything that escapes the root
    fn resolve(&self, path: &str) -> Result<PathBuf> {
        let mut full = self.root.clone();
        for part in path.split('/').filter(|p| !p.is_empty()) {
            if part == ".." || part == "." {
                return Err(SorterError::Config(format!(
                    "path {:?} is not a plain vault-relative path",
                    path
                )));
            }
            full.push(part);
        }
        Ok(full)
    }
}

impl Vault for FsVault {
    fn is_available(&self) -> bool {
        self.root.is_dir()
    }

    fn location(&self) -> PathBuf {
        self.root.clone()
    }

    fn list_files(&self, folder: &str) -> Result<Vec<CandidateFile>> {
        let dir = self.resolve(folder)?;
        if !dir.is_dir() {
            return Err(SorterError::Config(format!(
                "search folder {:?} does not exist in {:?}",
                folder, self.root
            )));
        }

        let mut files = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            let metadata = entry.metadata()?;
            if !metadata.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            if !should_process(&name) {
                debug!("Skipping {:?}", entry.path());
                continue;
            }

            let modified: DateTime<Local> = metadata.modified()?.into();
            // Birth time is not reported everywhere; fall back to mtime.
            let created: DateTime<Local> = metadata
                .created()
                .map(DateTime::<Local>::from)
                .unwrap_or(modified);

            files.push(CandidateFile::new(join_path(folder, &name), folder, created, modified));
        }
        Ok(files)
    }

    fn entry_kind(&self, path: &str) -> Option<EntryKind> {
        let full = self.resolve(path).ok()?;
        let metadata = fs::symlink_metadata(full).ok()?;
        if metadata.is_dir() {
            Some(EntryKind::Folder)
        } else {
            Some(EntryKind::File)
        }
    }

    fn move_file(&self, from: &str, to: &str) -> Result<()> {
        let source = self.resolve(from)?;
        let target = self.resolve(to)?;

        if fs::symlink_metadata(&target).is_ok() {
            return Err(SorterError::MoveConflict {
                from: from.to_string(),
                to: to.to_string(),
            });
        }
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::rename(&source, &target)?;
        Ok(())
    }

    fn read(&self, path: &str) -> Result<String> {
        Ok(fs::read_to_string(self.resolve(path)?)?)
    }

    fn write(&self, path: &str, text: &str) -> Result<()> {
        fs::write(self.resolve(path)?, text)?;
        Ok(())
    }

    fn create(&self, path: &str, text: &str) -> Result<()> {
        let full = self.resolve(path)?;
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new().write(true).create_new(true).open(&full)?;
        file.write_all(text.as_bytes())?;
        Ok(())
    }

    fn content_hash(&self, path: &str) -> Result<String> {
        let data = fs::read(self.resolve(path)?)?;
        Ok(blake3::hash(&data).to_hex().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn vault_with(files: &[&str]) -> (TempDir, FsVault) {
        let dir = TempDir::new().unwrap();
        for f in files {
            let path = dir.path().join(f);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(&path, format!("# {}\n", f)).unwrap();
        }
        let vault = FsVault::new(dir.path());
        (dir, vault)
    }

    #[test]
    fn test_list_files_is_shallow_and_skips_hidden() {
        let (_dir, vault) = vault_with(&[
            "Inbox/a.md",
            "Inbox/.hidden.md",
            "Inbox/b.md.tmp",
            "Inbox/2024/01/old.md",
        ]);

        let mut files = vault.list_files("Inbox").unwrap();
        files.sort_by(|a, b| a.path.cmp(&b.path));
        let paths: Vec<_> = files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["Inbox/a.md"]);
        assert_eq!(files[0].search_root, "Inbox");
        assert_eq!(files[0].extension, "md");
    }

    #[test]
    fn test_list_vault_root() {
        let (_dir, vault) = vault_with(&["top.md", "Inbox/a.md"]);
        let files = vault.list_files("").unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].path, "top.md");
    }

    #[test]
    fn test_missing_search_folder_is_config_error() {
        let (_dir, vault) = vault_with(&[]);
        let err = vault.list_files("Nope").unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Config);
    }

    #[test]
    fn test_move_creates_parents_and_detects_conflicts() {
        let (dir, vault) = vault_with(&["Inbox/a.md", "Inbox/b.md", "Inbox/2024/01/b.md"]);

        vault.move_file("Inbox/a.md", "Inbox/2024/01/05/a.md").unwrap();
        assert!(dir.path().join("Inbox/2024/01/05/a.md").is_file());
        assert!(!dir.path().join("Inbox/a.md").exists());

        let err = vault.move_file("Inbox/b.md", "Inbox/2024/01/b.md").unwrap_err();
        assert!(matches!(err, SorterError::MoveConflict { .. }));
        assert!(dir.path().join("Inbox/b.md").exists());
    }

    #[test]
    fn test_create_refuses_existing_entries() {
        let (dir, vault) = vault_with(&[]);
        vault.create("Daily/2024-01-05.md", "").unwrap();
        assert_eq!(vault.entry_kind("Daily/2024-01-05.md"), Some(EntryKind::File));
        assert!(vault.create("Daily/2024-01-05.md", "").is_err());

        fs::create_dir_all(dir.path().join("Daily/2024-01-06.md")).unwrap();
        assert_eq!(vault.entry_kind("Daily/2024-01-06.md"), Some(EntryKind::Folder));
        assert!(vault.create("Daily/2024-01-06.md", "").is_err());
    }

    #[test]
    fn test_rejects_parent_segments() {
        let (_dir, vault) = vault_with(&[]);
        assert!(vault.read("../etc/passwd").is_err());
    }

    #[test]
    fn test_content_hash_is_stable() {
        let (_dir, vault) = vault_with(&["a.md"]);
        let first = vault.content_hash("a.md").unwrap();
        assert_eq!(first, vault.content_hash("a.md").unwrap());
        vault.write("a.md", "changed").unwrap();
        assert_ne!(first, vault.content_hash("a.md").unwrap());
    }

    #[test]
    fn test_unavailable_when_root_missing() {
        let vault = FsVault::new("/definitely/not/a/vault/root");
        assert!(!vault.is_available());
    }
}
