// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Error types for the file sorter

use thiserror::Error;

/// Result type alias for sorter operations
pub type Result<T> = std::result::Result<T, SorterError>;

/// File sorter error types
#[derive(Error, Debug)]
pub enum SorterError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid inclusion regex: {0}")]
    Regex(#[from] regex::Error),

    #[error("Move conflict: {to} is already occupied (moving {from})")]
    MoveConflict { from: String, to: String },

    #[error("Daily note error at {path}: {reason}")]
    NoteIo { path: String, reason: String },

    #[error("Vault unavailable: {0}")]
    Fatal(String),

    #[error("File system error: {0}")]
    FileSystem(#[from] std::io::Error),

    #[error("Watch error: {0}")]
    Watch(#[from] notify::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Coarse classification used by the engine's propagation policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Config,
    MoveConflict,
    NoteIo,
    Fatal,
    Io,
}

impl SorterError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SorterError::Config(_) | SorterError::Regex(_) => ErrorKind::Config,
            SorterError::MoveConflict { .. } => ErrorKind::MoveConflict,
            SorterError::NoteIo { .. } => ErrorKind::NoteIo,
            SorterError::Fatal(_) => ErrorKind::Fatal,
            SorterError::FileSystem(_) | SorterError::Watch(_) | SorterError::Json(_) => {
                ErrorKind::Io
            }
        }
    }

    /// Recoverable errors are caught per file and never stop a run
    pub fn is_recoverable(&self) -> bool {
        !matches!(self.kind(), ErrorKind::Config | ErrorKind::Fatal)
    }

    pub(crate) fn note_io(path: &str, err: impl std::fmt::Display) -> Self {
        SorterError::NoteIo {
            path: path.to_string(),
            reason: err.to_string(),
        }
    }
}
