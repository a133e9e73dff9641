//! Config command handlers

use anyhow::{bail, Context, Result};

use folio_core::{Config, RemoteConfig};

use crate::output::{Output, OutputFormat};

/// Prefix for keys that edit the book id mapping table
const BOOK_ID_PREFIX: &str = "book_ids.";

const VALID_KEYS: &str = "data_dir, sync_enabled, remote_url, remote_username, remote_password, \
                          copy_allowance_percentage, isbn_prefixes, book_ids.<book>";

/// Show current configuration
pub fn show(output: &Output) -> Result<()> {
    let config = Config::load().context("Failed to load configuration")?;
    let remote = config.remote.as_ref();

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "data_dir": config.data_dir,
                    "sync_enabled": config.sync_enabled,
                    "remote_url": remote.map(|r| r.base_url.as_str()),
                    "remote_username": remote.map(|r| r.username.as_str()),
                    "copy_allowance_percentage": config.copy_allowance_percentage,
                    "isbn_prefixes": config.isbn_prefixes,
                    "book_ids": config.book_ids
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{}", config.data_dir.display());
        }
        OutputFormat::Human => {
            let not_set = || "(not set)".to_string();
            println!("Configuration:");
            println!("  data_dir:                  {}", config.data_dir.display());
            println!("  sync_enabled:              {}", config.sync_enabled);
            println!(
                "  remote_url:                {}",
                remote.map(|r| r.base_url.clone()).unwrap_or_else(not_set)
            );
            println!(
                "  remote_username:           {}",
                remote
                    .map(|r| r.username.clone())
                    .filter(|u| !u.is_empty())
                    .unwrap_or_else(not_set)
            );
            println!(
                "  remote_password:           {}",
                if remote.is_some_and(|r| !r.password.is_empty()) {
                    "********".to_string()
                } else {
                    not_set()
                }
            );
            println!(
                "  copy_allowance_percentage: {}",
                config.copy_allowance_percentage
            );
            println!(
                "  isbn_prefixes:             {}",
                config.isbn_prefixes.join(", ")
            );
            if !config.book_ids.is_empty() {
                println!("  book_ids:");
                for (book, remote_id) in &config.book_ids {
                    println!("    {} = {}", book, remote_id);
                }
            }
            println!();
            println!("Config file: {}", Config::config_file_path().display());
        }
    }

    Ok(())
}

/// Set a configuration value
pub fn set(key: String, value: String, output: &Output) -> Result<()> {
    let mut config = Config::load().context("Failed to load configuration")?;

    apply_setting(&mut config, &key, &value)?;

    config
        .save_to_path(&Config::config_file_path())
        .context("Failed to save configuration")?;

    let shown = if key == "remote_password" { "********" } else { value.as_str() };
    output.success(&format!("Set {} = {}", key, shown));

    Ok(())
}

/// Apply one `key = value` setting; an empty value or `none` clears optional keys
fn apply_setting(config: &mut Config, key: &str, value: &str) -> Result<()> {
    let cleared = value.is_empty() || value == "none";

    match key {
        "data_dir" => {
            config.data_dir = value.into();
        }
        "sync_enabled" => {
            config.sync_enabled = value
                .parse()
                .context("Invalid value for sync_enabled. Use 'true' or 'false'.")?;
        }
        "remote_url" => {
            if cleared {
                config.remote = None;
            } else {
                config.remote.get_or_insert_with(RemoteConfig::default).base_url =
                    value.to_string();
            }
        }
        "remote_username" | "remote_password" => {
            let Some(remote) = config.remote.as_mut() else {
                bail!("Set remote_url before {}", key);
            };
            let field = if key == "remote_username" {
                &mut remote.username
            } else {
                &mut remote.password
            };
            *field = if cleared { String::new() } else { value.to_string() };
        }
        "copy_allowance_percentage" => {
            let percentage: f64 = value
                .parse()
                .context("Invalid value for copy_allowance_percentage. Use a number.")?;
            if !(0.0..=100.0).contains(&percentage) {
                bail!("copy_allowance_percentage must be between 0 and 100");
            }
            config.copy_allowance_percentage = percentage;
        }
        "isbn_prefixes" => {
            config.isbn_prefixes = value
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string)
                .collect();
        }
        _ if key.starts_with(BOOK_ID_PREFIX) => {
            let book = key[BOOK_ID_PREFIX.len()..].trim();
            if book.is_empty() {
                bail!("Missing book in key '{}'. Example: book_ids.moby-dick", key);
            }
            if cleared {
                config.book_ids.remove(book);
            } else {
                config.book_ids.insert(book.to_string(), value.to_string());
            }
        }
        _ => {
            bail!(
                "Unknown configuration key: '{}'\n\
                 Valid keys: {}",
                key,
                VALID_KEYS
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_remote_fields() {
        let mut config = Config::default();
        assert!(apply_setting(&mut config, "remote_username", "reader").is_err());

        apply_setting(&mut config, "remote_url", "https://books.example.com").unwrap();
        apply_setting(&mut config, "remote_username", "reader").unwrap();
        apply_setting(&mut config, "remote_password", "secret").unwrap();

        let remote = config.remote.clone().unwrap();
        assert_eq!(remote.base_url, "https://books.example.com");
        assert_eq!(remote.username, "reader");
        assert_eq!(remote.password, "secret");

        apply_setting(&mut config, "remote_url", "none").unwrap();
        assert!(config.remote.is_none());
    }

    #[test]
    fn test_set_book_ids() {
        let mut config = Config::default();
        apply_setting(&mut config, "book_ids.moby-dick", "book-2701").unwrap();
        assert_eq!(
            config.book_ids.get("moby-dick").map(String::as_str),
            Some("book-2701")
        );

        apply_setting(&mut config, "book_ids.moby-dick", "").unwrap();
        assert!(config.book_ids.is_empty());
        assert!(apply_setting(&mut config, "book_ids.", "x").is_err());
    }

    #[test]
    fn test_set_validates_values() {
        let mut config = Config::default();
        assert!(apply_setting(&mut config, "sync_enabled", "maybe").is_err());
        assert!(apply_setting(&mut config, "copy_allowance_percentage", "150").is_err());
        assert!(apply_setting(&mut config, "favorite_color", "blue").is_err());

        apply_setting(&mut config, "isbn_prefixes", "978, 979,").unwrap();
        assert_eq!(config.isbn_prefixes, vec!["978", "979"]);
    }
}
