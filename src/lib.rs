pub mod config;
pub mod parts;

use std::env;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Command;
use clap_complete::Shell;
use colored::{ColoredString, Colorize};
use difference::{Changeset, Difference};
use unicode_normalization::UnicodeNormalization;

pub use parts::{
    BatchOperation, BatchReport, FileEntry, NameFilter, OverwritePrompt, PartSelection, RenameError, ReplayReport,
    Rule, Session,
};

/// Format bool value as a coloured string.
#[must_use]
pub fn colorize_bool(value: bool) -> ColoredString {
    if value { "true".green() } else { "false".red() }
}

/// File stem and extension composed to Unicode NFC.
///
/// The extension is returned without the leading dot.
pub fn get_normalized_file_name_and_extension(path: &Path) -> Result<(String, String)> {
    let stem = path.file_stem().context("Failed to get file stem")?;
    let extension = path.extension().unwrap_or_default();
    // Decomposed names from APFS would never equal a typed part
    Ok((nfc_string(stem), nfc_string(extension)))
}

fn nfc_string(name: &OsStr) -> String {
    os_str_to_string(name).nfc().collect()
}

/// Resolve the directory to scan to an absolute path.
///
/// A missing or blank path means the current working directory.
/// ```rust
/// use std::path::Path;
/// use part_rename::resolve_input_path;
///
/// let path = Path::new("src");
/// let absolute_path = resolve_input_path(Some(path)).unwrap();
/// assert!(absolute_path.is_absolute());
/// ```
pub fn resolve_input_path(path: Option<&Path>) -> Result<PathBuf> {
    let input = path.map(path_to_string).unwrap_or_default();
    let path = if input.trim().is_empty() {
        env::current_dir().context("Failed to get current working directory")?
    } else {
        PathBuf::from(input.trim())
    };
    if !path.exists() {
        anyhow::bail!("Input path does not exist or is not accessible: '{}'", path.display());
    }
    dunce::canonicalize(&path).with_context(|| format!("Failed to resolve path: {}", path.display()))
}

/// Resolve a user-typed directory path, expanding a leading `~` to the home directory.
///
/// Returns `None` for empty input, which callers treat as a cancelled selection.
#[must_use]
pub fn expand_directory_input(input: &str) -> Option<PathBuf> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }
    if let Some(rest) = input.strip_prefix("~")
        && let Some(home) = dirs::home_dir()
    {
        let rest = rest.trim_start_matches(['/', '\\']);
        return Some(if rest.is_empty() { home } else { home.join(rest) });
    }
    Some(dunce::simplified(Path::new(input)).to_path_buf())
}

/// Convert `OsStr` to String, dropping invalid Unicode.
pub fn os_str_to_string(name: &OsStr) -> String {
    name.to_str().map_or_else(
        || name.to_string_lossy().replace('\u{FFFD}', ""),
        ToString::to_string,
    )
}

/// Convert given path to string, dropping invalid Unicode.
pub fn path_to_string(path: &Path) -> String {
    os_str_to_string(path.as_os_str())
}

/// File name of the given path as a string, dropping invalid Unicode.
#[must_use]
pub fn path_to_filename_string(path: &Path) -> String {
    os_str_to_string(path.file_name().unwrap_or_default())
}

#[inline]
pub fn print_error(message: &str) {
    eprintln!("{}", format!("Error: {message}").red());
}

#[macro_export]
macro_rules! print_error {
    ($($arg:tt)*) => {
        $crate::print_error(&format!($($arg)*))
    };
}

#[inline]
pub fn print_warning(message: &str) {
    eprintln!("{}", message.yellow());
}

#[macro_export]
macro_rules! print_warning {
    ($($arg:tt)*) => {
        $crate::print_warning(&format!($($arg)*))
    };
}

#[inline]
pub fn print_bold(message: &str) {
    println!("{}", message.bold());
}

#[macro_export]
macro_rules! print_bold {
    ($($arg:tt)*) => {
        $crate::print_bold(&format!($($arg)*))
    };
}

/// Print a rename as two stacked lines with removed and added characters coloured.
pub fn show_diff(old: &str, new: &str) {
    let (old_diff, new_diff) = rename_diff(old, new);
    println!("{old_diff}");
    if old != new {
        println!("{new_diff}");
    }
}

/// Coloured old and new name, indented so that the first shared run of
/// three or more characters starts in the same column:
/// ```text
/// IMG_2024_01_beach.jpg
///     2024_01_holiday.jpg
/// ```
fn rename_diff(old: &str, new: &str) -> (String, String) {
    let changeset = Changeset::new(old, new, "");
    let anchor = changeset.diffs.iter().find_map(|diff| match diff {
        Difference::Same(same) if same.chars().count() >= 3 => {
            Some((old.find(same.as_str())?, new.find(same.as_str())?))
        }
        _ => None,
    });
    let (mut old_diff, mut new_diff) = anchor.map_or_else(
        || (String::new(), String::new()),
        |(old_index, new_index)| {
            (
                " ".repeat(new_index.saturating_sub(old_index)),
                " ".repeat(old_index.saturating_sub(new_index)),
            )
        },
    );

    for diff in &changeset.diffs {
        match diff {
            Difference::Same(same) => {
                old_diff.push_str(same);
                new_diff.push_str(same);
            }
            Difference::Add(added) => new_diff.push_str(&highlight(added, true).to_string()),
            Difference::Rem(removed) => old_diff.push_str(&highlight(removed, false).to_string()),
        }
    }

    (old_diff, new_diff)
}

/// Green for added and red for removed text, as background for whitespace.
fn highlight(text: &str, added: bool) -> ColoredString {
    let whitespace = text.chars().all(char::is_whitespace);
    match (added, whitespace) {
        (true, true) => text.on_green(),
        (true, false) => text.green(),
        (false, true) => text.on_red(),
        (false, false) => text.red(),
    }
}

/// Generate a shell completion script and install it for the given shell.
pub fn generate_shell_completion(shell: Shell, mut command: Command, command_name: &str) -> Result<()> {
    let out_dir = shell_completion_dir(shell, command_name)?;
    let path = clap_complete::generate_to(shell, &mut command, command_name, out_dir)?;
    println!("Completion file generated to: {}", path.display());
    Ok(())
}

/// Completion directory for the shell.
///
/// Prefers an existing user directory, then an existing system directory,
/// and otherwise creates the user directory.
fn shell_completion_dir(shell: Shell, name: &str) -> Result<PathBuf> {
    let home = dirs::home_dir().context("Failed to get home directory")?;

    if shell == Shell::Zsh {
        // oh-my-zsh picks completions up from a custom plugin directory
        let plugins = home.join(".oh-my-zsh/custom/plugins");
        if plugins.is_dir() {
            let plugin_dir = plugins.join(name);
            fs::create_dir_all(&plugin_dir)?;
            return Ok(plugin_dir);
        }
    }

    let (user_dir, system_dir) = match shell {
        Shell::Bash => (
            home.join(".bash_completion.d"),
            Some(PathBuf::from("/etc/bash_completion.d")),
        ),
        Shell::Fish => (
            home.join(".config/fish/completions"),
            Some(PathBuf::from("/usr/share/fish/completions")),
        ),
        Shell::Zsh => (
            home.join(".zsh/completions"),
            Some(PathBuf::from("/usr/share/zsh/site-functions")),
        ),
        Shell::Elvish => (home.join(".elvish"), None),
        Shell::PowerShell if cfg!(windows) => (home.join(r"Documents\PowerShell\completions"), None),
        Shell::PowerShell => (home.join(".config/powershell/completions"), None),
        _ => anyhow::bail!("Unsupported shell: {shell}"),
    };

    if user_dir.is_dir() {
        return Ok(user_dir);
    }
    if let Some(dir) = system_dir.filter(|dir| dir.is_dir()) {
        return Ok(dir);
    }
    fs::create_dir_all(&user_dir)?;
    Ok(user_dir)
}
