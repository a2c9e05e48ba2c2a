// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! file-sorter: files new notes into dated folders and links them from the
//! day's daily note.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::signal;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use file_sorter::config::AppConfig;
use file_sorter::engine::RunSummary;
use file_sorter::journal::{undo_entry, Journal, UndoOutcome};
use file_sorter::notifier::TracingNotifier;
use file_sorter::watcher::{FileWatcher, TriggerState, WatchEvent, QUIET_PERIOD};
use file_sorter::{ErrorKind, FsVault, Result, RunOptions, SortEngine, SortRule, SorterError};

/// file-sorter CLI
#[derive(Parser, Debug)]
#[command(name = "file-sorter")]
#[command(author = "Jonathan D. A. Jewell <hyperpolymath>")]
#[command(version)]
#[command(about = "Date-based filing for a notes vault", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (JSON format)
    #[arg(short, long, default_value = "config.json", global = true)]
    config: PathBuf,

    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable trace logging (most verbose)
    #[arg(long, global = true)]
    trace: bool,

    /// Output format for results
    #[arg(long, global = true, default_value = "text", value_parser = ["text", "json", "jsonl"])]
    format: String,

    /// Suppress non-essential output (quiet mode)
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run one sorting pass
    Run {
        /// Vault directory (overrides config)
        #[arg(long)]
        vault: Option<PathBuf>,

        /// Show planned moves without touching the vault
        #[arg(long)]
        dry_run: bool,
    },

    /// Watch the search folders and sort on change and on schedule
    Watch {
        /// Vault directory (overrides config)
        #[arg(long)]
        vault: Option<PathBuf>,

        /// Show planned moves without touching the vault
        #[arg(long)]
        dry_run: bool,

        /// Sort what is already in the search folders on startup
        #[arg(long)]
        process_existing: bool,
    },

    /// Move journal and undo operations
    #[command(visible_alias = "history")]
    Journal {
        #[command(subcommand)]
        action: JournalCommands,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },

    /// Initialize a new file-sorter setup
    Init {
        /// Directory to initialize (default: current)
        #[arg(short, long)]
        dir: Option<PathBuf>,

        /// Force overwrite existing configuration
        #[arg(long)]
        force: bool,
    },
}

#[derive(Subcommand, Debug)]
enum JournalCommands {
    /// List recent moves
    List {
        /// Number of entries to show
        #[arg(short, long, default_value = "10")]
        count: usize,
    },

    /// Move recently sorted notes back
    Undo {
        /// Number of moves to undo
        #[arg(short, long, default_value = "1")]
        count: usize,

        /// Dry run (show what would be undone)
        #[arg(long)]
        dry_run: bool,
    },

    /// Clear the whole journal
    Clear {
        /// Skip confirmation prompt
        #[arg(long)]
        force: bool,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Generate default configuration file
    Generate {
        /// Output file path
        #[arg(short, long, default_value = "config.json")]
        output: PathBuf,
    },

    /// Validate configuration file
    Validate,

    /// Edit configuration in $EDITOR
    Edit,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.trace {
        "trace"
    } else if cli.verbose {
        "debug"
    } else if cli.quiet {
        "warn"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    debug!("file-sorter v{}", env!("CARGO_PKG_VERSION"));

    let config = AppConfig::load(&cli.config)?;

    match cli.command {
        Some(Commands::Run { vault, dry_run }) => run_once(&config, vault, dry_run, &cli.format),
        Some(Commands::Watch { vault, dry_run, process_existing }) => {
            run_watch(config, vault, dry_run, process_existing, &cli.format).await
        }
        Some(Commands::Journal { action }) => run_journal_command(&config, action),
        Some(Commands::Config { action }) => run_config_command(config, action, &cli.config),
        Some(Commands::Init { dir, force }) => run_init(dir, force),
        None => run_once(&config, None, false, &cli.format),
    }
}

fn vault_for(config: &AppConfig, vault_override: Option<PathBuf>) -> FsVault {
    FsVault::new(vault_override.unwrap_or_else(|| PathBuf::from(&config.vault_path)))
}

/// One pass, then print the summary
fn run_once(config: &AppConfig, vault_override: Option<PathBuf>, dry_run: bool, format: &str) -> Result<()> {
    let vault = vault_for(config, vault_override);
    let journal = Journal::new(PathBuf::from(&config.journal_path));
    let notifier = TracingNotifier;

    if dry_run {
        warn!("DRY RUN MODE - nothing will be moved");
    }

    let mut engine = SortEngine::from_config(&vault, config, &notifier)?.with_journal(&journal);
    let summary = engine.run(RunOptions { dry_run })?;
    print_summary(&summary, format)
}

fn sort_pass(vault: &FsVault, rule: &SortRule, journal: &Journal, dry_run: bool) -> Result<RunSummary> {
    let notifier = TracingNotifier;
    let mut engine = SortEngine::new(vault, rule.clone(), &notifier).with_journal(journal);
    engine.run(RunOptions { dry_run })
}

/// Watch mode: sort when notes appear and on the configured schedule
async fn run_watch(
    config: AppConfig,
    vault_override: Option<PathBuf>,
    dry_run: bool,
    process_existing: bool,
    format: &str,
) -> Result<()> {
    let vault = vault_for(&config, vault_override);
    let rule = SortRule::from_config(&config)?;
    let journal = Journal::new(PathBuf::from(&config.journal_path));

    if dry_run {
        warn!("DRY RUN MODE - nothing will be moved");
    }

    let mut watcher = FileWatcher::new()?;
    for root in &rule.search_roots {
        watcher.watch(&vault.root().join(root))?;
    }

    let interval = config.run_frequency.interval();
    match interval {
        Some(every) => info!("Scheduled pass every {:?} ({:?})", every, config.run_frequency),
        None => info!("No scheduled passes (manual); sorting on change only"),
    }

    if process_existing {
        info!("Sorting existing notes...");
        run_pass(&vault, &rule, &journal, dry_run, format)?;
    }

    // Setup graceful shutdown
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    tokio::spawn(async move {
        let ctrl_c = async {
            if let Err(e) = signal::ctrl_c().await {
                error!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        };

        #[cfg(unix)]
        let terminate = async {
            match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                Ok(mut sig) => {
                    sig.recv().await;
                }
                Err(e) => {
                    error!("Failed to install SIGTERM handler: {}", e);
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
            _ = terminate => info!("Received SIGTERM, shutting down..."),
        }

        let _ = shutdown_tx.send(true);
    });

    info!("Watching {} search folder(s). Press Ctrl+C to stop.", watcher.watched_paths().len());

    let mut trigger = TriggerState::new(QUIET_PERIOD, interval, Instant::now());

    // Main event loop; passes run here, one at a time
    loop {
        if *shutdown_rx.borrow() {
            break;
        }

        if let Some(event) = watcher.next_event(Duration::from_millis(100)) {
            match event {
                WatchEvent::Error(e) => warn!("Watch error: {}", e),
                other => trigger.observe(&other, &rule, Instant::now()),
            }
        }

        if let Some(reason) = trigger.due(Instant::now()) {
            debug!("Pass triggered: {:?}", reason);
            run_pass(&vault, &rule, &journal, dry_run, format)?;
            trigger.ran(Instant::now());
        }
    }

    info!("file-sorter stopped.");
    Ok(())
}

/// A pass inside the watch loop; only configuration errors end the loop
fn run_pass(vault: &FsVault, rule: &SortRule, journal: &Journal, dry_run: bool, format: &str) -> Result<()> {
    match sort_pass(vault, rule, journal, dry_run) {
        Ok(summary) => print_summary(&summary, format),
        Err(e) if e.kind() == ErrorKind::Config => Err(e),
        Err(e) => {
            error!("Sorting pass failed: {}", e);
            Ok(())
        }
    }
}

fn print_summary(summary: &RunSummary, format: &str) -> Result<()> {
    match format {
        "json" => println!("{}", serde_json::to_string_pretty(summary)?),
        "jsonl" => {
            for record in &summary.moves {
                println!("{}", serde_json::to_string(record)?);
            }
        }
        _ => {
            if summary.moves.is_empty() && summary.failures.is_empty() {
                return Ok(());
            }
            let arrow = if summary.dry_run { "would move" } else { "->" };
            for record in &summary.moves {
                println!("  {} {} {}", record.from, arrow, record.to);
            }
            for failure in &summary.failures {
                println!("  FAILED {}: {}", failure.path, failure.error);
            }
            for failure in &summary.note_errors {
                println!("  DAILY NOTE {}: {}", failure.path, failure.error);
            }
            println!("\n{}", summary.message());
        }
    }
    Ok(())
}

fn run_journal_command(config: &AppConfig, action: JournalCommands) -> Result<()> {
    let journal = Journal::new(PathBuf::from(&config.journal_path));

    match action {
        JournalCommands::List { count } => {
            let entries = journal.get_recent(count)?;
            println!("Recent moves ({} entries):", entries.len());
            for entry in entries {
                let status = if entry.undone { "[UNDONE]" } else { "" };
                println!(
                    "  {} {} -> {} {}",
                    entry.timestamp.format("%Y-%m-%d %H:%M"),
                    entry.original_path,
                    entry.new_path,
                    status
                );
            }
        }
        JournalCommands::Undo { count, dry_run } => {
            let entries = journal.get_undoable()?;
            let to_undo: Vec<_> = entries.into_iter().rev().take(count).collect();

            if to_undo.is_empty() {
                println!("No moves to undo");
                return Ok(());
            }

            for entry in to_undo {
                let vault = FsVault::new(&entry.vault);
                match undo_entry(&vault, &journal, &entry, dry_run)? {
                    UndoOutcome::Undone => {
                        println!("Undone: {} -> {}", entry.new_path, entry.original_path)
                    }
                    UndoOutcome::WouldUndo => {
                        println!("Would undo: {} -> {}", entry.new_path, entry.original_path)
                    }
                    UndoOutcome::Missing | UndoOutcome::OriginalOccupied => {}
                }
            }
        }
        JournalCommands::Clear { force } => {
            if !force {
                eprintln!("Use --force to confirm clearing the journal");
                return Ok(());
            }
            journal.clear()?;
            println!("Journal cleared");
        }
    }

    Ok(())
}

fn run_config_command(config: AppConfig, action: ConfigCommands, config_path: &Path) -> Result<()> {
    match action {
        ConfigCommands::Show => {
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        ConfigCommands::Generate { output } => {
            AppConfig::default().save(&output)?;
            println!("Generated config at {:?}", output);
        }
        ConfigCommands::Validate => {
            let rule = SortRule::from_config(&config)?;
            println!("Configuration at {:?} is valid", config_path);
            println!("  Vault: {}", config.vault_path);
            println!("  Search folders: {:?}", rule.search_roots);
            println!("  Ignored: {:?}", rule.ignore_files);
            println!("  Daily notes: {}/{}.md", rule.daily_folder, rule.daily_format);
            println!("  Run frequency: {:?}", config.run_frequency);
        }
        ConfigCommands::Edit => {
            let editor = std::env::var("EDITOR").unwrap_or_else(|_| "vi".to_string());
            std::process::Command::new(editor).arg(config_path).status()?;
        }
    }

    Ok(())
}

/// Write a default config next to a fresh vault folder
fn run_init(dir: Option<PathBuf>, force: bool) -> Result<()> {
    let target = dir.unwrap_or_else(|| PathBuf::from("."));
    let config_path = target.join("config.json");

    if config_path.exists() && !force {
        return Err(SorterError::Config(
            "config.json already exists. Use --force to overwrite".to_string(),
        ));
    }

    let vault_dir = target.join("vault");
    std::fs::create_dir_all(&vault_dir)?;

    let mut config = AppConfig::default();
    config.vault_path = vault_dir.to_string_lossy().to_string();
    config.journal_path = target.join("file_sorter_journal.jsonl").to_string_lossy().to_string();
    config.save(&config_path)?;

    println!("file-sorter initialized in {:?}", target);
    println!("\nCreated:");
    println!("  - config.json");
    println!("  - vault/");
    println!("\nNext steps:");
    println!("  1. Point vaultPath and searchFolders at your notes");
    println!("  2. Preview: file-sorter run --dry-run");

    Ok(())
}
