use std::fmt;
use std::fs;
use std::path::PathBuf;

use anyhow::Result;
use itertools::Itertools;
use serde::Deserialize;

use part_rename::{BatchOperation, NameFilter, print_error};

use crate::Args;

/// How the renaming rule is given on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleInput {
    /// Explicit zero-based positions to keep and custom parts to append.
    Parts { positions: Vec<usize>, custom: Vec<String> },
    /// Example rename of one file in the directory.
    Example { original: String, new: String },
}

/// Final config combined from CLI arguments and user config file.
#[derive(Debug)]
pub struct Config {
    pub(crate) debug: bool,
    pub(crate) destination: Option<(BatchOperation, PathBuf)>,
    pub(crate) dryrun: bool,
    pub(crate) filter: NameFilter,
    pub(crate) log: bool,
    pub(crate) overwrite: bool,
    pub(crate) rule: Option<RuleInput>,
    pub(crate) verbose: bool,
}

/// Config from the user config file
#[derive(Debug, Default, Deserialize)]
struct PartRenameConfig {
    #[serde(default)]
    debug: bool,
    #[serde(default)]
    dryrun: bool,
    #[serde(default)]
    include: Vec<String>,
    #[serde(default)]
    exclude: Vec<String>,
    #[serde(default)]
    log: bool,
    #[serde(default)]
    overwrite: bool,
    #[serde(default)]
    verbose: bool,
}

/// Wrapper needed for parsing the user config file section.
#[derive(Debug, Default, Deserialize)]
struct UserConfig {
    #[serde(default)]
    partren: PartRenameConfig,
}

impl PartRenameConfig {
    /// Try to read user config from the file if it exists.
    /// Otherwise, fall back to default config.
    fn get_user_config() -> Self {
        part_rename::config::config_path()
            .filter(|path| path.exists())
            .and_then(|path| {
                fs::read_to_string(path)
                    .map_err(|e| {
                        print_error!("Error reading config file {}: {e}", path.display());
                    })
                    .ok()
            })
            .and_then(|config_string| {
                Self::from_toml_str(&config_string)
                    .map_err(|e| {
                        print_error!("{e}");
                    })
                    .ok()
            })
            .unwrap_or_default()
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    /// Returns an error if the TOML string is invalid.
    pub fn from_toml_str(toml_str: &str) -> Result<Self> {
        toml::from_str::<UserConfig>(toml_str)
            .map(|config| config.partren)
            .map_err(|e| anyhow::anyhow!("Failed to parse config: {e}"))
    }
}

impl Config {
    /// Create config from given command line args and user config file.
    pub fn from_args(args: Args) -> Self {
        Self::from_args_and_user_config(args, PartRenameConfig::get_user_config())
    }

    fn from_args_and_user_config(args: Args, user_config: PartRenameConfig) -> Self {
        let include: Vec<String> = user_config.include.into_iter().chain(args.include).unique().collect();
        let exclude: Vec<String> = user_config.exclude.into_iter().chain(args.exclude).unique().collect();

        let rule = match args.example.as_slice() {
            [original, new] => Some(RuleInput::Example {
                original: original.clone(),
                new: new.clone(),
            }),
            _ if !args.keep.is_empty() || !args.add.is_empty() => Some(RuleInput::Parts {
                positions: args.keep.iter().map(|position| position - 1).collect(),
                custom: args
                    .add
                    .iter()
                    .map(|text| text.trim().to_string())
                    .filter(|text| !text.is_empty())
                    .collect(),
            }),
            _ => None,
        };

        let destination = args
            .copy
            .map(|dir| (BatchOperation::Copy, dir))
            .or_else(|| args.move_to.map(|dir| (BatchOperation::Move, dir)));

        Self {
            debug: args.debug || user_config.debug,
            destination,
            dryrun: args.print || user_config.dryrun,
            filter: NameFilter::new(include, exclude),
            log: args.log || user_config.log,
            overwrite: args.force || user_config.overwrite,
            rule,
            verbose: args.verbose || user_config.verbose,
        }
    }

    /// Start the terminal UI when nothing was requested on the command line.
    pub(crate) const fn is_interactive(&self) -> bool {
        self.rule.is_none() && self.destination.is_none() && !self.dryrun
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Config:")?;
        writeln!(f, "  debug:     {}", part_rename::colorize_bool(self.debug))?;
        writeln!(f, "  dryrun:    {}", part_rename::colorize_bool(self.dryrun))?;
        writeln!(f, "  log:       {}", part_rename::colorize_bool(self.log))?;
        writeln!(f, "  overwrite: {}", part_rename::colorize_bool(self.overwrite))?;
        writeln!(f, "  verbose:   {}", part_rename::colorize_bool(self.verbose))?;
        writeln!(f, "  include:   [{}]", self.filter.include.join(", "))?;
        writeln!(f, "  exclude:   [{}]", self.filter.exclude.join(", "))?;
        match &self.rule {
            Some(RuleInput::Parts { positions, custom }) => writeln!(
                f,
                "  rule:      keep [{}] add [{}]",
                positions.iter().map(|index| (index + 1).to_string()).join(", "),
                custom.join(", ")
            )?,
            Some(RuleInput::Example { original, new }) => writeln!(f, "  rule:      {original} -> {new}")?,
            None => writeln!(f, "  rule:      none")?,
        }
        match &self.destination {
            Some((operation, dir)) => write!(f, "  {}:      {}", operation.verb(), dir.display()),
            None => write!(f, "  target:    none"),
        }
    }
}
