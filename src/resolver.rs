// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Date resolution: which day a note belongs to and which folder that maps to

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::rule::{join_path, SortRule};
use crate::vault::CandidateFile;

/// Timestamp a note is filed by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateSource {
    Created,
    Modified,
}

/// Notes are filed by the day they were created. Fixed policy, not a setting.
pub const GOVERNING_DATE: DateSource = DateSource::Created;

/// Calendar day (local time) that governs where `file` goes
pub fn governing_date(file: &CandidateFile) -> NaiveDate {
    match GOVERNING_DATE {
        DateSource::Created => file.created.date_naive(),
        DateSource::Modified => file.modified.date_naive(),
    }
}

/// Where a note is moved to
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Destination {
    /// Target folder, vault-relative
    pub folder: String,
    /// Full target path including the file name
    pub path: String,
    /// True when the per-day subfolder is used
    pub nested: bool,
}

/// Number of eligible notes per (search root, day), counted before any move
#[derive(Debug, Clone, Default)]
pub struct SameDayCounts {
    counts: BTreeMap<(String, NaiveDate), usize>,
}

impl SameDayCounts {
    pub fn from_files<'a>(files: impl IntoIterator<Item = &'a CandidateFile>) -> Self {
        let mut counts = BTreeMap::new();
        for file in files {
            *counts
                .entry((file.search_root.clone(), governing_date(file)))
                .or_insert(0) += 1;
        }
        Self { counts }
    }

    pub fn get(&self, file: &CandidateFile) -> usize {
        self.counts
            .get(&(file.search_root.clone(), governing_date(file)))
            .copied()
            .unwrap_or(0)
    }
}

/// Compute the destination of `file`.
///
/// `<root>/<YYYY>/<MM>/<DD>` when nesting is enabled and the day has more
/// than one note in this run, `<root>/<YYYY>/<MM>` otherwise.
pub fn resolve_destination(file: &CandidateFile, rule: &SortRule, same_day_count: usize) -> Destination {
    let date = governing_date(file);
    let nested = rule.create_nested_daily_folders && same_day_count > 1;

    let month = format!("{:04}/{:02}", date.year(), date.month());
    let relative = if nested {
        format!("{}/{:02}", month, date.day())
    } else {
        month
    };

    let folder = join_path(&file.search_root, &relative);
    let path = join_path(&folder, file.file_name());
    Destination { folder, path, nested }
}
