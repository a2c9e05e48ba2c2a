// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Link and history insertion into daily notes

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::daily_note::DailyNote;
use crate::markdown;
use crate::resolver::Destination;
use crate::rule::SortRule;
use crate::vault::CandidateFile;

/// A history line recording one moved note
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryEntry {
    pub timestamp: DateTime<Local>,
    pub from: String,
    pub to: String,
}

impl HistoryEntry {
    pub fn render(&self) -> String {
        format!(
            "- {} {} (moved from `{}`)",
            self.timestamp.format("%H:%M"),
            wikilink(&self.to),
            self.from
        )
    }
}

/// What a single [`LinkWriter::record_move`] call changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkOutcome {
    pub link_added: bool,
    pub history_added: bool,
}

/// Writes note links and history entries into a daily note
#[derive(Debug, Clone)]
pub struct LinkWriter {
    add_note_links: bool,
    create_history_notes: bool,
    heading: String,
}

/// Obsidian-style link to a vault-relative note path
pub fn wikilink(path: &str) -> String {
    format!("[[{}]]", path.strip_suffix(".md").unwrap_or(path))
}

impl LinkWriter {
    pub fn new(rule: &SortRule) -> Self {
        Self {
            add_note_links: rule.add_note_links,
            create_history_notes: rule.create_history_notes,
            heading: rule.history_heading.clone(),
        }
    }

    /// Record that `file` now lives at `destination`.
    ///
    /// The link goes at the end of the note body, ahead of the history
    /// section; the history entry goes at the end of the history section,
    /// which is created when missing. Both are skipped when already present,
    /// so retrying a move never duplicates anything.
    pub fn record_move(
        &self,
        note: &mut DailyNote,
        file: &CandidateFile,
        destination: &Destination,
        at: DateTime<Local>,
    ) -> LinkOutcome {
        let link = wikilink(&destination.path);
        let mut content = note.content().to_string();
        let mut outcome = LinkOutcome::default();

        if self.add_note_links && !markdown::contains_outside_section(&content, &self.heading, &link) {
            content = markdown::append_before_section(&content, &self.heading, &format!("- {}", link));
            outcome.link_added = true;
        }

        if self.create_history_notes && !markdown::section_contains(&content, &self.heading, &link) {
            let entry = HistoryEntry {
                timestamp: at,
                from: file.path.clone(),
                to: destination.path.clone(),
            };
            content = markdown::append_to_section(&content, &self.heading, &entry.render());
            outcome.history_added = true;
        }

        note.set_content(content);
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::daily_note::{DailyNoteHandle, DailyNoteLocator};
    use crate::vault::MemoryVault;
    use chrono::{NaiveDate, TimeZone};

    fn at(h: u32, m: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 1, 5, h, m, 0).unwrap()
    }

    fn moved(name: &str) -> (CandidateFile, Destination) {
        let file = CandidateFile::new(format!("Inbox/{}", name), "Inbox", at(9, 0), at(9, 0));
        let dest = Destination {
            folder: "Inbox/2024/01/05".into(),
            path: format!("Inbox/2024/01/05/{}", name),
            nested: true,
        };
        (file, dest)
    }

    fn open_note(config: &AppConfig, existing: Option<&str>) -> (MemoryVault, DailyNoteLocator, DailyNoteHandle, SortRule) {
        let vault = MemoryVault::new();
        if let Some(text) = existing {
            vault.add_file("2024-01-05.md", text, at(7, 0), at(7, 0)).unwrap();
        }
        let rule = SortRule::from_config(config).unwrap();
        let mut locator = DailyNoteLocator::new();
        let date = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        let handle = locator.get_or_create(&vault, date, &rule).unwrap();
        (vault, locator, handle, rule)
    }

    #[test]
    fn test_link_and_history_in_fresh_note() {
        let (_vault, mut locator, handle, rule) = open_note(&AppConfig::default(), None);
        let writer = LinkWriter::new(&rule);
        let note = locator.note_mut(handle).unwrap();

        let (file, dest) = moved("note1.md");
        let outcome = writer.record_move(note, &file, &dest, at(10, 15));
        assert_eq!(outcome, LinkOutcome { link_added: true, history_added: true });
        assert_eq!(
            note.content(),
            "- [[Inbox/2024/01/05/note1]]\n\n### Modified Notes\n\
             - 10:15 [[Inbox/2024/01/05/note1]] (moved from `Inbox/note1.md`)\n"
        );
    }

    #[test]
    fn test_second_move_appends_in_order() {
        let (_vault, mut locator, handle, rule) = open_note(&AppConfig::default(), None);
        let writer = LinkWriter::new(&rule);
        let note = locator.note_mut(handle).unwrap();

        let (f1, d1) = moved("note1.md");
        let (f2, d2) = moved("note2.md");
        writer.record_move(note, &f1, &d1, at(10, 0));
        writer.record_move(note, &f2, &d2, at(10, 1));

        assert_eq!(
            note.content(),
            "- [[Inbox/2024/01/05/note1]]\n- [[Inbox/2024/01/05/note2]]\n\n### Modified Notes\n\
             - 10:00 [[Inbox/2024/01/05/note1]] (moved from `Inbox/note1.md`)\n\
             - 10:01 [[Inbox/2024/01/05/note2]] (moved from `Inbox/note2.md`)\n"
        );
    }

    #[test]
    fn test_retry_does_not_duplicate() {
        let (_vault, mut locator, handle, rule) = open_note(&AppConfig::default(), None);
        let writer = LinkWriter::new(&rule);
        let note = locator.note_mut(handle).unwrap();
        let (file, dest) = moved("note1.md");

        writer.record_move(note, &file, &dest, at(10, 0));
        let after_first = note.content().to_string();
        let outcome = writer.record_move(note, &file, &dest, at(11, 30));

        assert_eq!(outcome, LinkOutcome::default());
        assert_eq!(note.content(), after_first);
    }

    #[test]
    fn test_existing_note_body_is_preserved() {
        let existing = "# Friday\n\nStandup at 9.\n\n### Modified Notes\n- 08:00 [[Old/thing]] (moved from `Inbox/thing.md`)\n\n## Evening\nDinner\n";
        let (_vault, mut locator, handle, rule) = open_note(&AppConfig::default(), Some(existing));
        let writer = LinkWriter::new(&rule);
        let note = locator.note_mut(handle).unwrap();
        let (file, dest) = moved("note1.md");

        writer.record_move(note, &file, &dest, at(10, 0));
        assert_eq!(
            note.content(),
            "# Friday\n\nStandup at 9.\n- [[Inbox/2024/01/05/note1]]\n\n### Modified Notes\n\
             - 08:00 [[Old/thing]] (moved from `Inbox/thing.md`)\n\
             - 10:00 [[Inbox/2024/01/05/note1]] (moved from `Inbox/note1.md`)\n\n## Evening\nDinner\n"
        );
    }

    #[test]
    fn test_links_only() {
        let mut config = AppConfig::default();
        config.create_history_notes = false;
        let (_vault, mut locator, handle, rule) = open_note(&config, None);
        let writer = LinkWriter::new(&rule);
        let note = locator.note_mut(handle).unwrap();
        let (file, dest) = moved("note1.md");

        let outcome = writer.record_move(note, &file, &dest, at(10, 0));
        assert_eq!(outcome, LinkOutcome { link_added: true, history_added: false });
        assert_eq!(note.content(), "- [[Inbox/2024/01/05/note1]]\n");
    }

    #[test]
    fn test_history_entry_does_not_count_as_link() {
        let mut config = AppConfig::default();
        config.add_note_links = false;
        let (_vault, mut locator, handle, _) = open_note(&config, None);
        let note = locator.note_mut(handle).unwrap();
        let (file, dest) = moved("note1.md");

        let history_only = LinkWriter::new(&SortRule::from_config(&config).unwrap());
        history_only.record_move(note, &file, &dest, at(10, 0));

        // Turning links on later still adds the body link once
        let both = LinkWriter::new(&SortRule::from_config(&AppConfig::default()).unwrap());
        let outcome = both.record_move(note, &file, &dest, at(10, 5));
        assert_eq!(outcome, LinkOutcome { link_added: true, history_added: false });
        assert!(note.content().starts_with("- [[Inbox/2024/01/05/note1]]\n\n### Modified Notes\n"));
    }

    #[test]
    fn test_wikilink_strips_markdown_extension() {
        assert_eq!(wikilink("Inbox/2024/01/a.md"), "[[Inbox/2024/01/a]]");
        assert_eq!(wikilink("Inbox/2024/01/scan.pdf"), "[[Inbox/2024/01/scan.pdf]]");
    }

    #[test]
    fn test_marked_up_heading_is_found_again() {
        for heading in ["### Modified *Notes*", "### Notes C#", "### Notes &amp; Links"] {
            let mut config = AppConfig::default();
            config.history_notes.history_section_template = heading.to_string();
            let (_vault, mut locator, handle, rule) = open_note(&config, None);
            let writer = LinkWriter::new(&rule);
            let note = locator.note_mut(handle).unwrap();
            let (fa, da) = moved("a.md");
            let (fb, db) = moved("b.md");

            writer.record_move(note, &fa, &da, at(10, 0));
            writer.record_move(note, &fb, &db, at(10, 1));
            let retry = writer.record_move(note, &fa, &da, at(10, 2));

            assert_eq!(retry, LinkOutcome::default(), "heading {:?}", heading);
            assert_eq!(note.content().matches(heading).count(), 1, "heading {:?}", heading);
            assert_eq!(note.content().matches("[[Inbox/2024/01/05/a]]").count(), 2);
            assert!(note.content().starts_with("- [[Inbox/2024/01/05/a]]\n- [[Inbox/2024/01/05/b]]\n\n"));
        }
    }
}
