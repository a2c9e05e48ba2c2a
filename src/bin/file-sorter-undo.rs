// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! file-sorter undo utility
//!
//! Moves notes back to the search folder they were sorted out of, newest
//! first, using the move journal.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use file_sorter::journal::{undo_entry, Journal, UndoOutcome};
use file_sorter::FsVault;

#[derive(Parser, Debug)]
#[command(name = "file-sorter-undo")]
#[command(version)]
#[command(about = "Undo file-sorter moves")]
struct Args {
    /// Path to the move journal
    #[arg(short, long, default_value = "file_sorter_journal.jsonl")]
    journal: PathBuf,

    /// Number of moves to undo (default: 1, use 0 for all)
    #[arg(short, long, default_value = "1")]
    count: usize,

    /// Dry run - show what would be undone without doing it
    #[arg(long)]
    dry_run: bool,

    /// List all entries in the journal
    #[arg(long)]
    list: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter("warn")
        .with_target(false)
        .init();

    if !args.journal.exists() {
        eprintln!("Journal not found: {:?}", args.journal);
        eprintln!("No moves to undo.");
        return Ok(());
    }

    let journal = Journal::new(args.journal.clone());
    let entries = journal
        .read_all()
        .with_context(|| format!("reading journal {:?}", args.journal))?;

    if entries.is_empty() {
        println!("No journal entries found.");
        return Ok(());
    }

    if args.list {
        println!("Move journal ({} entries):", entries.len());
        println!("{:-<80}", "");
        for (i, entry) in entries.iter().rev().enumerate() {
            println!(
                "{:3}. [{}] {} -> {}{}",
                i + 1,
                entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
                entry.original_path,
                entry.new_path,
                if entry.undone { " [UNDONE]" } else { "" }
            );
            if let Some(note) = &entry.daily_note {
                println!("     linked from: {}", note);
            }
        }
        return Ok(());
    }

    let mut undoable = journal.get_undoable()?;
    undoable.reverse();
    let count = if args.count == 0 {
        undoable.len()
    } else {
        args.count.min(undoable.len())
    };

    println!(
        "{}Undoing {} move(s)...",
        if args.dry_run { "[DRY RUN] " } else { "" },
        count
    );

    let mut undone = 0;
    let mut skipped = 0;

    for entry in undoable.iter().take(count) {
        let vault = FsVault::new(&entry.vault);
        match undo_entry(&vault, &journal, entry, args.dry_run) {
            Ok(UndoOutcome::Undone) => {
                println!("  Undone: {} -> {}", entry.new_path, entry.original_path);
                undone += 1;
            }
            Ok(UndoOutcome::WouldUndo) => {
                println!("  Would move: {} -> {}", entry.new_path, entry.original_path);
                undone += 1;
            }
            Ok(UndoOutcome::Missing) => {
                eprintln!("  Skip: {} (file not found, may have been moved/deleted)", entry.new_path);
                skipped += 1;
            }
            Ok(UndoOutcome::OriginalOccupied) => {
                eprintln!("  Skip: {} (original path already exists)", entry.original_path);
                skipped += 1;
            }
            Err(e) => {
                eprintln!("  Failed: {} ({})", entry.new_path, e);
                skipped += 1;
            }
        }
    }

    println!();
    if args.dry_run {
        println!("Dry run complete. {} move(s) would be undone.", undone);
    } else {
        println!("Done. {} undone, {} failed/skipped.", undone, skipped);
        if undone > 0 {
            println!("Daily notes still link the old locations.");
        }
    }

    Ok(())
}
