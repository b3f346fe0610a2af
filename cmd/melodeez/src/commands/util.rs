use std::path::PathBuf;

use anyhow::Context as _;
use serde::Serialize;

use crate::Cli;
use crate::config::{Config, load_config};

/// Loads the config file selected by `--config`.
pub fn get_config(cli: &Cli) -> anyhow::Result<Config> {
    load_config(cli.config.as_deref())
}

/// Picks the flag value, else the config value, else fails naming both.
pub fn resolve_path(
    flag: Option<&PathBuf>,
    configured: Option<&PathBuf>,
    what: &str,
) -> anyhow::Result<PathBuf> {
    flag.or(configured)
        .cloned()
        .with_context(|| format!("no {what} given: pass --{what} or set `{what}` in the config file"))
}

/// Prints a value as pretty JSON.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Prints a success message to stderr.
pub fn print_success(message: &str) {
    eprintln!("[ok] {message}");
}
