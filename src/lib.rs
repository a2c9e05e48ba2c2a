// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! file-sorter: date-based filing for a notes vault
//!
//! Notes that land in the configured search folders are moved into
//! `YYYY/MM` (or `YYYY/MM/DD` on busy days) folders, linked from that day's
//! daily note, and recorded in the daily note's history section.

pub mod config;
pub mod daily_note;
pub mod engine;
pub mod error;
pub mod filter;
pub mod journal;
pub mod links;
pub mod markdown;
pub mod notifier;
pub mod resolver;
pub mod rule;
pub mod vault;
pub mod watcher;

pub use config::AppConfig;
pub use engine::{EngineState, RunOptions, RunSummary, SortEngine};
pub use error::{ErrorKind, Result, SorterError};
pub use rule::SortRule;
pub use vault::{FsVault, MemoryVault, Vault};
