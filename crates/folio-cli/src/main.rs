//! Folio CLI
//!
//! Command-line front end for Folio - highlights, bookmarks, notes, reading
//! position, copy budget and reader preferences for one book at a time.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use folio_core::{Config, DataSource, ReaderPreferences, ReaderSession};

mod commands;
mod editor;
mod output;

use output::{Output, OutputFormat};

/// Environment variable holding the log level
const LOG_ENV: &str = "FOLIO_LOG";

#[derive(Parser)]
#[command(name = "folio")]
#[command(about = "Folio - reading state for e-books, synced when the server is reachable")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Book identifier (ISBN, remote id, or any local name)
    #[arg(short, long, global = true)]
    book: Option<String>,

    /// Cache namespace for the book (defaults to the book identifier)
    #[arg(long, global = true)]
    locator: Option<String>,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage highlights
    Highlight {
        #[command(subcommand)]
        command: HighlightCommands,
    },
    /// Manage bookmarks
    Bookmark {
        #[command(subcommand)]
        command: BookmarkCommands,
    },
    /// Manage notes
    Note {
        #[command(subcommand)]
        command: NoteCommands,
    },
    /// Show or save the reading position
    Location {
        #[command(subcommand)]
        command: Option<LocationCommands>,
    },
    /// Show or spend the copy budget
    Budget {
        #[command(subcommand)]
        command: Option<BudgetCommands>,
    },
    /// Show or change reader preferences
    Prefs {
        #[command(subcommand)]
        command: Option<PrefsCommands>,
    },
    /// Show how a book identifier is classified
    Identify {
        /// Book identifier
        id: String,
    },
    /// Show status (sync settings, cache, selected book)
    Status,
    /// Show or set configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand)]
enum HighlightCommands {
    /// List highlights
    #[command(alias = "ls")]
    List,
    /// Highlight a passage
    Add {
        /// Position (epubcfi)
        cfi: String,
        /// Highlighted text
        text: String,
        /// Highlight color
        #[arg(short, long)]
        color: Option<String>,
        /// Underline instead of highlight
        #[arg(short, long)]
        underline: bool,
    },
    /// Remove a highlight
    #[command(name = "rm", alias = "remove")]
    Remove {
        /// Position (epubcfi)
        cfi: String,
    },
    /// Change a highlight's color
    Color {
        /// Position (epubcfi)
        cfi: String,
        /// New color
        color: String,
    },
}

#[derive(Subcommand)]
enum BookmarkCommands {
    /// List bookmarks
    #[command(alias = "ls")]
    List,
    /// Bookmark a position
    Add {
        /// Position (epubcfi)
        cfi: String,
        /// Label
        #[arg(short, long)]
        label: Option<String>,
        /// Chapter title
        #[arg(long)]
        chapter: Option<String>,
        /// Page number
        #[arg(short, long)]
        page: Option<u32>,
    },
    /// Remove a bookmark
    #[command(name = "rm", alias = "remove")]
    Remove {
        /// Position (epubcfi)
        cfi: String,
    },
}

#[derive(Subcommand)]
enum NoteCommands {
    /// List notes
    #[command(alias = "ls")]
    List,
    /// Add a note to a passage
    Add {
        /// Position (epubcfi)
        cfi: String,
        /// Passage the note is about
        text: String,
        /// Note content (opens editor if not provided)
        #[arg(short, long)]
        note: Option<String>,
    },
    /// Replace a note's content
    Edit {
        /// Position (epubcfi)
        cfi: String,
        /// New content (opens editor if not provided)
        #[arg(short, long)]
        note: Option<String>,
    },
    /// Remove a note
    #[command(name = "rm", alias = "remove")]
    Remove {
        /// Position (epubcfi)
        cfi: String,
    },
}

#[derive(Subcommand)]
enum LocationCommands {
    /// Show the saved position
    Show,
    /// Save the position
    Set {
        /// Position (epubcfi)
        cfi: String,
        /// Fraction of the book read (0 to 1)
        #[arg(default_value_t = 0.0)]
        progress: f64,
    },
}

#[derive(Subcommand)]
enum BudgetCommands {
    /// Show the copy budget
    Show,
    /// Record the book's total character count
    Total {
        /// Characters in the book
        chars: u64,
    },
    /// Count a copy against the budget
    Copy {
        /// Characters copied
        chars: u64,
    },
}

#[derive(Subcommand)]
enum PrefsCommands {
    /// Show saved preferences
    Show,
    /// Change preferences (unspecified ones are kept)
    Set {
        #[arg(long)]
        theme: Option<String>,
        #[arg(long)]
        font_family: Option<String>,
        #[arg(long)]
        font_size: Option<u32>,
        #[arg(long)]
        line_height: Option<f32>,
        #[arg(long)]
        margin: Option<u32>,
        /// Page flow (paginated or scrolled)
        #[arg(long)]
        flow: Option<String>,
    },
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (data_dir, sync_enabled, remote_url, book_ids.<book>, ...)
        key: String,
        /// Configuration value
        value: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));

    // Commands that don't need a book
    match &cli.command {
        Commands::Config { command } => {
            return handle_config_command(command.clone(), &output);
        }
        Commands::Identify { id } => {
            let config = Config::load().context("Failed to load configuration")?;
            return commands::identify::show(&config, id, &output);
        }
        Commands::Status => {
            let config = Config::load().context("Failed to load configuration")?;
            return commands::status::show(
                &config,
                cli.book.as_deref(),
                cli.locator.as_deref(),
                &output,
            );
        }
        _ => {}
    }

    let config = Config::load().context("Failed to load configuration")?;
    let session = open_session(&config, cli.book.as_deref(), cli.locator.as_deref())?;
    let source = session.source();

    match cli.command {
        Commands::Highlight { command } => handle_highlight_command(command, source, &output).await,
        Commands::Bookmark { command } => handle_bookmark_command(command, source, &output).await,
        Commands::Note { command } => handle_note_command(command, source, &output).await,
        Commands::Location { command } => handle_location_command(command, source, &output).await,
        Commands::Budget { command } => handle_budget_command(command, source, &output).await,
        Commands::Prefs { command } => handle_prefs_command(command, source, &output).await,
        Commands::Identify { .. } => unreachable!(), // Handled above
        Commands::Status => unreachable!(),          // Handled above
        Commands::Config { .. } => unreachable!(),   // Handled above
    }
}

/// Log to stderr; `--verbose` wins over `FOLIO_LOG`
fn init_logging(verbose: bool) {
    let log_level = if verbose {
        "debug".to_string()
    } else {
        std::env::var(LOG_ENV).unwrap_or_else(|_| "warn".to_string())
    };

    let env_filter = EnvFilter::new(format!("folio_core={},folio_cli={}", log_level, log_level));

    // Ignore error if already initialized
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn open_session(
    config: &Config,
    book: Option<&str>,
    locator: Option<&str>,
) -> Result<ReaderSession> {
    let Some(book) = book.filter(|b| !b.trim().is_empty()) else {
        bail!("No book selected. Pass --book <id>.");
    };
    ReaderSession::open(config, book, locator)
}

async fn handle_highlight_command(
    command: HighlightCommands,
    source: &dyn DataSource,
    output: &Output,
) -> Result<()> {
    match command {
        HighlightCommands::List => commands::highlight::list(source, output).await,
        HighlightCommands::Add {
            cfi,
            text,
            color,
            underline,
        } => commands::highlight::add(source, cfi, text, color, underline, output).await,
        HighlightCommands::Remove { cfi } => commands::highlight::remove(source, cfi, output).await,
        HighlightCommands::Color { cfi, color } => {
            commands::highlight::color(source, cfi, color, output).await
        }
    }
}

async fn handle_bookmark_command(
    command: BookmarkCommands,
    source: &dyn DataSource,
    output: &Output,
) -> Result<()> {
    match command {
        BookmarkCommands::List => commands::bookmark::list(source, output).await,
        BookmarkCommands::Add {
            cfi,
            label,
            chapter,
            page,
        } => commands::bookmark::add(source, cfi, label, chapter, page, output).await,
        BookmarkCommands::Remove { cfi } => commands::bookmark::remove(source, cfi, output).await,
    }
}

async fn handle_note_command(
    command: NoteCommands,
    source: &dyn DataSource,
    output: &Output,
) -> Result<()> {
    match command {
        NoteCommands::List => commands::note::list(source, output).await,
        NoteCommands::Add { cfi, text, note } => {
            commands::note::add(source, cfi, text, note, output).await
        }
        NoteCommands::Edit { cfi, note } => commands::note::edit(source, cfi, note, output).await,
        NoteCommands::Remove { cfi } => commands::note::remove(source, cfi, output).await,
    }
}

async fn handle_location_command(
    command: Option<LocationCommands>,
    source: &dyn DataSource,
    output: &Output,
) -> Result<()> {
    match command {
        Some(LocationCommands::Show) | None => commands::location::show(source, output).await,
        Some(LocationCommands::Set { cfi, progress }) => {
            commands::location::set(source, cfi, progress, output).await
        }
    }
}

async fn handle_budget_command(
    command: Option<BudgetCommands>,
    source: &dyn DataSource,
    output: &Output,
) -> Result<()> {
    match command {
        Some(BudgetCommands::Show) | None => commands::budget::show(source, output).await,
        Some(BudgetCommands::Total { chars }) => {
            commands::budget::total(source, chars, output).await
        }
        Some(BudgetCommands::Copy { chars }) => commands::budget::copy(source, chars, output).await,
    }
}

async fn handle_prefs_command(
    command: Option<PrefsCommands>,
    source: &dyn DataSource,
    output: &Output,
) -> Result<()> {
    match command {
        Some(PrefsCommands::Show) | None => commands::prefs::show(source, output).await,
        Some(PrefsCommands::Set {
            theme,
            font_family,
            font_size,
            line_height,
            margin,
            flow,
        }) => {
            let changes = ReaderPreferences {
                theme,
                font_family,
                font_size,
                line_height,
                margin,
                flow,
            };
            commands::prefs::set(source, changes, output).await
        }
    }
}

fn handle_config_command(command: Option<ConfigCommands>, output: &Output) -> Result<()> {
    match command {
        Some(ConfigCommands::Show) | None => commands::config::show(output),
        Some(ConfigCommands::Set { key, value }) => commands::config::set(key, value, output),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_book_flag_after_subcommand() {
        let cli = Cli::try_parse_from([
            "folio",
            "highlight",
            "add",
            "epubcfi(/6/4)",
            "Call me Ishmael",
            "--color",
            "yellow",
            "--book",
            "9780142437247",
        ])
        .unwrap();

        assert_eq!(cli.book.as_deref(), Some("9780142437247"));
        assert!(matches!(
            cli.command,
            Commands::Highlight {
                command: HighlightCommands::Add { color: Some(ref c), underline: false, .. }
            } if c == "yellow"
        ));
    }

    #[test]
    fn test_rm_subcommand_name() {
        let cli = Cli::try_parse_from(["folio", "-b", "walden", "note", "rm", "epubcfi(/6/2)"])
            .unwrap();
        assert!(matches!(
            cli.command,
            Commands::Note {
                command: NoteCommands::Remove { .. }
            }
        ));
    }

    #[test]
    fn test_location_progress_defaults_to_zero() {
        let cli = Cli::try_parse_from(["folio", "location", "set", "epubcfi(/6/2)"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Location {
                command: Some(LocationCommands::Set { progress, .. })
            } if progress == 0.0
        ));
    }

    #[test]
    fn test_open_session_requires_book() {
        let config = Config::default();
        assert!(open_session(&config, None, None).is_err());
        assert!(open_session(&config, Some("  "), None).is_err());
    }
}
