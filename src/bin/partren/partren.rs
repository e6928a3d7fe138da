use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use colored::Colorize;

use part_rename::parts::FixedAnswer;
use part_rename::{
    BatchOperation, OverwritePrompt, ReplayReport, Rule, Session, print_bold, print_error, print_warning,
};

use crate::Args;
use crate::config::{Config, RuleInput};
use crate::logger::FileLogger;
use crate::tui;

#[derive(Debug)]
pub struct PartRename {
    root: PathBuf,
    config: Config,
}

/// Asks on the terminal before replacing an existing file.
struct StdinPrompt;

impl OverwritePrompt for StdinPrompt {
    fn confirm_overwrite(&mut self, target: &Path) -> bool {
        print!(
            "{}",
            format!("File already exists: {}. Overwrite? (y/n): ", target.display()).magenta()
        );
        if io::stdout().flush().is_err() {
            return false;
        }
        let mut input = String::new();
        io::stdin().read_line(&mut input).is_ok() && input.trim().eq_ignore_ascii_case("y")
    }
}

impl PartRename {
    pub fn new(args: Args) -> Result<Self> {
        let root = part_rename::resolve_input_path(args.path.as_deref())?;
        let config = Config::from_args(args);
        if config.debug {
            eprintln!("{config}");
            eprintln!("Root: {}", root.display());
        }
        Ok(Self { root, config })
    }

    pub fn run(&self) -> Result<()> {
        let mut session = Session::new(self.config.filter.clone());
        session.open(&self.root)?;

        let mut logger = self.create_logger();
        if let Some(logger) = logger.as_mut() {
            logger.log_init(&self.root, &self.config);
        }

        if self.config.is_interactive() {
            return tui::run_interactive(&mut session, &self.config, logger.as_mut());
        }

        if session.files().is_empty() {
            if self.config.verbose {
                println!("No files found in {}", self.root.display());
            }
            return Ok(());
        }

        let Some(rule_input) = &self.config.rule else {
            if self.config.destination.is_some() {
                anyhow::bail!("Copy and move need a rule: use --keep, --add or --example");
            }
            self.list_files(&session);
            return Ok(());
        };

        let (template, rule, report) = Self::apply_rule_input(&mut session, rule_input)?;
        self.print_rule(&session, template, &rule, &report);
        if let Some(logger) = logger.as_mut() {
            logger.log_replay(template.map(|index| session.files()[index].original_name.as_str()), &rule, &report);
        }

        self.print_preview(&session);

        if let Some((operation, destination)) = &self.config.destination {
            self.run_batch(&mut session, *operation, destination, logger.as_mut())?;
        }

        Ok(())
    }

    fn create_logger(&self) -> Option<FileLogger> {
        if !self.config.log || self.config.dryrun {
            return None;
        }
        match FileLogger::new() {
            Ok(logger) => {
                if self.config.verbose {
                    println!("Logging to {}", logger.path().display());
                }
                Some(logger)
            }
            Err(error) => {
                print_error!("Failed to create log file: {error}");
                None
            }
        }
    }

    /// Build the rule from the command line and replay it over the files.
    ///
    /// Returns the template index when the rule was derived from an example.
    fn apply_rule_input(session: &mut Session, input: &RuleInput) -> Result<(Option<usize>, Rule, ReplayReport)> {
        match input {
            RuleInput::Parts { positions, custom } => {
                let rule = Rule::new(positions.iter().copied(), custom.clone());
                let report = session.apply_rule(&rule, None);
                Ok((None, rule, report))
            }
            RuleInput::Example { original, new } => {
                let (template, rule, report) = session
                    .apply_example(original, new)?
                    .context("The example does not change the file name")?;
                Ok((Some(template), rule, report))
            }
        }
    }

    fn print_rule(&self, session: &Session, template: Option<usize>, rule: &Rule, report: &ReplayReport) {
        let template_parts = template
            .and_then(|index| session.file(index))
            .map(part_rename::FileEntry::original_parts)
            .unwrap_or_default();

        if let Some(file) = template.and_then(|index| session.file(index)) {
            print_bold!("Rule from {}:", file.original_name);
            println!("{}", rule.describe(&template_parts));
        } else if self.config.verbose {
            print_bold!("Rule:");
            println!(
                "Positions: {}\nCustom parts: {}",
                rule.indices()
                    .iter()
                    .map(|index| (index + 1).to_string())
                    .collect::<Vec<_>>()
                    .join(", "),
                rule.literals().join(", ")
            );
        }

        println!("{}", report.summary());
        if self.config.verbose {
            for skipped in &report.skipped_files {
                print_warning!("Skipped: {skipped}");
            }
        }
        println!();
    }

    fn print_preview(&self, session: &Session) {
        let changes = session.preview();
        if changes.is_empty() {
            println!("No files to rename");
            return;
        }
        let heading = if self.config.dryrun {
            "Dryrun:".cyan().bold()
        } else {
            "Rename:".magenta().bold()
        };
        for (original, new) in changes {
            println!("{heading}");
            part_rename::show_diff(original, new);
        }
        println!();
    }

    fn list_files(&self, session: &Session) {
        print_bold!("{} file(s) in {}:", session.files().len(), self.root.display());
        for file in session.files() {
            println!("{}  {}", file.original_name, file.name_parts.join(" | ").cyan());
        }
    }

    fn run_batch(
        &self,
        session: &mut Session,
        operation: BatchOperation,
        destination: &Path,
        logger: Option<&mut FileLogger>,
    ) -> Result<()> {
        let pending = session.pending_count();
        if pending == 0 {
            println!("No files to {operation}");
            return Ok(());
        }
        if self.config.dryrun {
            println!(
                "{} would {operation} {pending} file(s) to {}",
                "Dryrun:".cyan().bold(),
                destination.display()
            );
            return Ok(());
        }

        let mut prompt: Box<dyn OverwritePrompt> = if self.config.overwrite {
            Box::new(FixedAnswer(true))
        } else {
            Box::new(StdinPrompt)
        };
        let report = session.run_batch(destination, operation, prompt.as_mut())?;

        if let Some(logger) = logger {
            logger.log_batch(&report);
        }

        if report.failed() > 0 || report.rescan_error.is_some() {
            print_warning!("{}", report.summary());
        } else {
            print_bold!("{}", report.summary());
        }

        Ok(())
    }
}
