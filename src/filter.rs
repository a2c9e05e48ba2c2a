// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Eligibility filter: ignore list first, then the optional inclusion regex

use crate::rule::SortRule;
use crate::vault::CandidateFile;

/// True when `file` may be sorted under `rule`.
///
/// The ignore list always wins over the inclusion regex. Filtering is a pure
/// predicate; the regex was validated when the rule was built.
pub fn is_eligible(file: &CandidateFile, rule: &SortRule) -> bool {
    if is_ignored(&file.path, &rule.ignore_files) {
        return false;
    }
    match &rule.include {
        Some(regex) => regex.is_match(&file.path),
        None => true,
    }
}

/// Exact path match, or a folder entry (trailing `/`) that prefixes the path
pub fn is_ignored(path: &str, ignore_files: &[String]) -> bool {
    ignore_files.iter().any(|entry| {
        if entry.ends_with('/') {
            path.starts_with(entry.as_str())
        } else {
            path == entry
        }
    })
}
