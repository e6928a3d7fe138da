mod config;
mod logger;
mod partren;
mod tui;

use std::path::PathBuf;

use clap::{CommandFactory, Parser};
use clap_complete::Shell;

use crate::partren::PartRename;

#[derive(Parser)]
#[command(
    author,
    version,
    name = env!("CARGO_BIN_NAME"),
    about = "Rename files by picking underscore-separated name parts",
    long_about = "Rename files by picking underscore-separated name parts.\n\n\
        Without a rule option an interactive terminal UI is started."
)]
pub(crate) struct Args {
    /// Optional input directory
    #[arg(value_hint = clap::ValueHint::DirPath)]
    path: Option<PathBuf>,

    /// Keep name parts at the given positions (1-based, comma separated)
    #[arg(short = 'k', long, num_args = 1, value_delimiter = ',', action = clap::ArgAction::Append, value_name = "POSITION", value_parser = parse_position)]
    keep: Vec<usize>,

    /// Append a custom part
    #[arg(short = 'a', long, num_args = 1, action = clap::ArgAction::Append, value_name = "TEXT")]
    add: Vec<String>,

    /// Derive the rule from an example rename of one file
    #[arg(short = 'x', long, num_args = 2, value_names = ["ORIGINAL", "NEW"], conflicts_with_all = ["keep", "add"])]
    example: Vec<String>,

    /// Copy renamed files to the given directory
    #[arg(short = 'c', long, value_hint = clap::ValueHint::DirPath, value_name = "DIR", conflicts_with = "move_to")]
    copy: Option<PathBuf>,

    /// Move renamed files to the given directory
    #[arg(short = 'm', long = "move", value_hint = clap::ValueHint::DirPath, value_name = "DIR")]
    move_to: Option<PathBuf>,

    /// Overwrite existing files without asking
    #[arg(short = 'f', long)]
    force: bool,

    /// Include files that match the given pattern
    #[arg(short = 'n', long, num_args = 1, action = clap::ArgAction::Append, name = "INCLUDE")]
    include: Vec<String>,

    /// Exclude files that match the given pattern
    #[arg(short = 'e', long, num_args = 1, action = clap::ArgAction::Append, name = "EXCLUDE")]
    exclude: Vec<String>,

    /// Write copy and move operations to a log file
    #[arg(short = 'L', long)]
    log: bool,

    /// Only print changes without copying or moving files
    #[arg(short = 'p', long)]
    print: bool,

    /// Print debug information
    #[arg(short = 'D', long)]
    debug: bool,

    /// Generate shell completion
    #[arg(short = 'l', long, name = "SHELL")]
    completion: Option<Shell>,

    /// Print verbose output
    #[arg(short = 'v', long)]
    verbose: bool,
}

/// Parse a 1-based part position.
fn parse_position(value: &str) -> Result<usize, String> {
    match value.trim().parse::<usize>() {
        Ok(0) => Err("positions start from 1".to_string()),
        Ok(position) => Ok(position),
        Err(error) => Err(format!("invalid position '{value}': {error}")),
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    if let Some(ref shell) = args.completion {
        part_rename::generate_shell_completion(*shell, Args::command(), env!("CARGO_BIN_NAME"))
    } else {
        PartRename::new(args)?.run()
    }
}
