//! Interactive editing support
//!
//! Opens $EDITOR for writing note content and asks for confirmation
//! before removals.

use anyhow::{bail, Context, Result};
use std::env;
use std::fs;
use std::io::{self, IsTerminal, Write};
use std::process::Command;

/// Marker for lines the editor template adds and the result drops
const COMMENT_PREFIX: &str = "#";

/// Open content in the user's preferred editor
///
/// Uses $EDITOR, then $VISUAL, then the first common editor on PATH.
pub fn edit_text(initial_content: &str) -> Result<String> {
    let editor = find_editor()?;
    let temp_path = env::temp_dir().join(format!("folio_note_{}.md", std::process::id()));

    fs::write(&temp_path, initial_content)
        .with_context(|| format!("Failed to create temp file: {:?}", temp_path))?;

    let status = Command::new(&editor)
        .arg(&temp_path)
        .status()
        .with_context(|| format!("Failed to run editor: {}", editor));

    let content = match status {
        Ok(status) if status.success() => fs::read_to_string(&temp_path)
            .with_context(|| format!("Failed to read edited file: {:?}", temp_path)),
        Ok(_) => Err(anyhow::anyhow!(
            "Editor '{}' exited with non-zero status. Check that your editor is configured correctly.",
            editor
        )),
        Err(e) => Err(e),
    };

    let _ = fs::remove_file(&temp_path);
    content
}

/// Build an editor template: commented context lines, then the body
pub fn template(context: &[String], body: &str) -> String {
    let mut text = String::new();
    for line in context {
        text.push_str(COMMENT_PREFIX);
        text.push(' ');
        text.push_str(line);
        text.push('\n');
    }
    text.push('\n');
    text.push_str(body);
    text
}

/// Drop the template's leading comment block and surrounding whitespace
///
/// Only the block before the first body line is removed, so markdown
/// headings in the note survive.
pub fn strip_comments(text: &str) -> String {
    text.lines()
        .skip_while(|line| line.starts_with(COMMENT_PREFIX))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

fn find_editor() -> Result<String> {
    for var in ["EDITOR", "VISUAL"] {
        if let Ok(editor) = env::var(var) {
            if !editor.is_empty() {
                return Ok(editor);
            }
        }
    }

    for editor in ["nano", "vim", "vi", "emacs"] {
        if command_exists(editor) {
            return Ok(editor.to_string());
        }
    }

    bail!(
        "No editor found. Set $EDITOR environment variable.\n\
         Example: export EDITOR=nano"
    )
}

/// Check if a command exists in PATH
fn command_exists(cmd: &str) -> bool {
    Command::new("which")
        .arg(cmd)
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// Prompt for confirmation
///
/// Returns true if user confirms. Without a terminal on stdin the answer
/// is always no.
pub fn confirm(prompt: &str) -> Result<bool> {
    if !io::stdin().is_terminal() {
        return Ok(false);
    }

    print!("{} [y/N] ", prompt);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    let input = input.trim().to_lowercase();
    Ok(input == "y" || input == "yes")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_round_trip() {
        let text = template(
            &["Editing note at epubcfi(/6/4)".to_string(), "> Call me Ishmael".to_string()],
            "first thought",
        );
        assert!(text.starts_with("# Editing note"));
        assert_eq!(strip_comments(&text), "first thought");
    }

    #[test]
    fn test_strip_comments_keeps_body_lines() {
        let text = "# header\n\nline one\nline two\n\n";
        assert_eq!(strip_comments(text), "line one\nline two");
    }

    #[test]
    fn test_strip_comments_keeps_markdown_headings() {
        let text = template(&["Editing note at epubcfi(/6/4)".to_string()], "# Whales\n\nbody");
        assert_eq!(strip_comments(&text), "# Whales\n\nbody");
    }

    #[test]
    fn test_command_exists() {
        #[cfg(unix)]
        assert!(command_exists("ls"));

        assert!(!command_exists("definitely_not_a_real_command_12345"));
    }
}
