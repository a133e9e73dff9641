//! Output formatting for CLI
//!
//! Provides consistent output formatting across all commands:
//! - Human-readable default output
//! - JSON output (--json flag)
//! - Quiet mode for scripting (--quiet flag)

use chrono::{DateTime, Utc};
use serde::Serialize;

use folio_core::{Bookmark, CopyBudget, Highlight, Location, Note, ReaderPreferences};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    Human,
    /// JSON output
    Json,
    /// Quiet mode - minimal output
    Quiet,
}

impl OutputFormat {
    /// Create format from CLI flags
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        if quiet {
            OutputFormat::Quiet
        } else if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

/// Output helper for consistent formatting
pub struct Output {
    /// The output format
    pub format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Print a list of highlights
    pub fn print_highlights(&self, highlights: &[Highlight]) {
        match self.format {
            OutputFormat::Human => {
                if highlights.is_empty() {
                    println!("No highlights.");
                    return;
                }
                for h in highlights {
                    println!(
                        "{} | {:<9} | {:<8} | {}{} | {}",
                        short_date(&h.created_at),
                        h.kind,
                        h.color.as_deref().unwrap_or("-"),
                        h.cfi,
                        synced_marker(h.id.as_deref()),
                        truncate_line(&h.text, 40)
                    );
                }
                println!("\n{} highlight(s)", highlights.len());
            }
            OutputFormat::Json => print_json(highlights),
            OutputFormat::Quiet => {
                for h in highlights {
                    println!("{}", h.cfi);
                }
            }
        }
    }

    /// Print a list of bookmarks
    pub fn print_bookmarks(&self, bookmarks: &[Bookmark]) {
        match self.format {
            OutputFormat::Human => {
                if bookmarks.is_empty() {
                    println!("No bookmarks.");
                    return;
                }
                for b in bookmarks {
                    let title = b
                        .label
                        .as_deref()
                        .or(b.chapter.as_deref())
                        .unwrap_or("-");
                    let page = b.page.map(|p| format!(" | p.{}", p)).unwrap_or_default();
                    println!(
                        "{} | {}{} | {}{}",
                        short_date(&b.created_at),
                        b.cfi,
                        synced_marker(b.id.as_deref()),
                        truncate(title, 40),
                        page
                    );
                }
                println!("\n{} bookmark(s)", bookmarks.len());
            }
            OutputFormat::Json => print_json(bookmarks),
            OutputFormat::Quiet => {
                for b in bookmarks {
                    println!("{}", b.cfi);
                }
            }
        }
    }

    /// Print notes with their anchor text
    pub fn print_notes(&self, notes: &[Note]) {
        match self.format {
            OutputFormat::Human => {
                if notes.is_empty() {
                    println!("No notes.");
                    return;
                }
                for note in notes {
                    println!("────────────────────────────────────────");
                    println!(
                        "{}{}  Created: {}",
                        note.cfi,
                        synced_marker(note.id.as_deref()),
                        note.created_at.format("%Y-%m-%d %H:%M")
                    );
                    if !note.text.is_empty() {
                        println!("> {}", truncate_line(&note.text, 70));
                    }
                    println!();
                    println!("{}", note.note);
                    println!();
                }
                println!("{} note(s)", notes.len());
            }
            OutputFormat::Json => print_json(notes),
            OutputFormat::Quiet => {
                for note in notes {
                    println!("{}", note.cfi);
                }
            }
        }
    }

    /// Print the saved reading position
    pub fn print_location(&self, location: Option<&Location>) {
        match self.format {
            OutputFormat::Human => match location {
                Some(location) => {
                    println!("Location: {}", location.cfi);
                    println!("Progress: {:.0}%", location.progress * 100.0);
                }
                None => println!("No saved location."),
            },
            OutputFormat::Json => print_json(&location),
            OutputFormat::Quiet => {
                if let Some(location) = location {
                    println!("{}", location.cfi);
                }
            }
        }
    }

    /// Print the copy-protection budget
    pub fn print_budget(&self, budget: &CopyBudget) {
        match self.format {
            OutputFormat::Human => {
                let unknown = || "(unknown)".to_string();
                println!(
                    "Total:     {}",
                    budget.total_chars.map(|t| t.to_string()).unwrap_or_else(unknown)
                );
                println!(
                    "Copied:    {}{}",
                    budget.copied_chars,
                    budget
                        .copied_percentage()
                        .map(|p| format!(" ({:.1}%)", p))
                        .unwrap_or_default()
                );
                println!("Allowance: {}%", budget.allowance_percentage);
                println!(
                    "Remaining: {}",
                    budget.remaining_chars().map(|r| r.to_string()).unwrap_or_else(unknown)
                );
            }
            OutputFormat::Json => print_json(&serde_json::json!({
                "totalChars": budget.total_chars,
                "copiedChars": budget.copied_chars,
                "allowancePercentage": budget.allowance_percentage,
                "copiedPercentage": budget.copied_percentage(),
                "remainingChars": budget.remaining_chars(),
            })),
            OutputFormat::Quiet => {
                if let Some(remaining) = budget.remaining_chars() {
                    println!("{}", remaining);
                }
            }
        }
    }

    /// Print reader preferences
    pub fn print_preferences(&self, preferences: Option<&ReaderPreferences>) {
        match self.format {
            OutputFormat::Human => {
                let Some(p) = preferences else {
                    println!("No saved preferences.");
                    return;
                };
                let unset = "(not set)".to_string();
                println!("theme:       {}", p.theme.clone().unwrap_or_else(|| unset.clone()));
                println!(
                    "font_family: {}",
                    p.font_family.clone().unwrap_or_else(|| unset.clone())
                );
                println!("font_size:   {}", display_or(p.font_size, &unset));
                println!("line_height: {}", display_or(p.line_height, &unset));
                println!("margin:      {}", display_or(p.margin, &unset));
                println!("flow:        {}", p.flow.clone().unwrap_or(unset));
            }
            OutputFormat::Json => print_json(&preferences),
            OutputFormat::Quiet => {}
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Human => println!("✓ {}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"status": "success", "message": message})
                );
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Check if we should prompt for confirmation
    pub fn should_prompt(&self) -> bool {
        self.format == OutputFormat::Human
    }

    /// Print an informational message
    pub fn message(&self, msg: &str) {
        match self.format {
            OutputFormat::Human => println!("{}", msg),
            OutputFormat::Json => {
                println!("{}", serde_json::json!({"message": msg}));
            }
            OutputFormat::Quiet => {}
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to encode output: {}", e),
    }
}

fn short_date(date: &DateTime<Utc>) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// `*` for records the remote service knows about
fn synced_marker(remote_id: Option<&str>) -> &'static str {
    if remote_id.is_some() {
        "*"
    } else {
        ""
    }
}

fn display_or<T: std::fmt::Display>(value: Option<T>, fallback: &str) -> String {
    value
        .map(|v| v.to_string())
        .unwrap_or_else(|| fallback.to_string())
}

/// Truncate a string to max characters, adding "..." if truncated
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Truncate to first line and max length
fn truncate_line(s: &str, max_len: usize) -> String {
    let first_line = s.lines().next().unwrap_or("");
    truncate(first_line, max_len)
}
