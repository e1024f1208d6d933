//! Loading and saving the `.env` configuration file.
//!
//! Reading goes through `dotenvy`. Writing quotes every value so `dotenvy` reads back exactly
//! what was saved.


use std::{fs, path::Path};

use anyhow::{Context as _, Result};

/// Location of the configuration file, relative to the working directory.
pub const ENV_FILE: &str = ".env";

/// Export every entry of the file at `path` that is not already present in the
/// process environment.
///
/// Returns `false` if the file does not exist. This must run before any other thread is
/// spawned.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load(path: &Path) -> Result<bool> {
    match dotenvy::from_path(path) {
        Ok(()) => Ok(true),
        Err(e) if e.not_found() => Ok(false),
        Err(e) => Err(e).with_context(|| format!("Failed to load {}", path.display())),
    }
}

/// Entries of the file at `path`, in file order, without touching the environment.
#[cfg(test)]
pub fn read(path: &Path) -> Result<Vec<(String, String)>> {
    dotenvy::from_path_iter(path)?
        .collect::<Result<_, _>>()
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Replace the file at `path` with the given entries.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn write<'a>(path: &Path, entries: impl IntoIterator<Item = (&'a str, &'a str)>) -> Result<()> {
    let contents: String = entries
        .into_iter()
        .map(|(key, value)| format!("{key}={}\n", quote(value)))
        .collect();
    fs::write(path, contents).with_context(|| format!("Failed to write {}", path.display()))
}

/// Double-quote `value`, escaping what `dotenvy` would otherwise interpret.
fn quote(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        match c {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            // Substitution
            '$' => quoted.push_str("\\$"),
            '\n' => quoted.push_str("\\n"),
            c => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}
