use std::env::current_dir;
use std::path::Path;

use anyhow::{Context, Error};
use console::{style, Term};
use dialoguer::{Confirm, Input};

use ninegag_downloader::gag::io::ConfigManager;
use ninegag_downloader::gag::tui;
use ninegag_downloader::gag::{parse_export, CancelToken, GagError, Orchestrator};

/// The name of the cargo package.
const NAME: &str = env!("CARGO_PKG_NAME");

/// The version of the cargo package.
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// The authors who created the package.
const AUTHORS: &str = env!("CARGO_PKG_AUTHORS");

/// A program class that handles the flow of the downloader user experience and steps of execution.
pub(crate) struct Program {
    config_manager: ConfigManager,
}

impl Program {
    /// Creates a new instance of the program.
    pub(crate) fn new(config_manager: ConfigManager) -> Self {
        Self { config_manager }
    }

    /// Runs the downloader program.
    pub(crate) fn run(mut self) -> Result<(), Error> {
        Term::stdout().set_title("9GAG downloader");
        trace!("Starting 9GAG downloader...");
        trace!("Program Name: {}", NAME);
        trace!("Program Version: {}", VERSION);
        trace!("Program Authors: {}", AUTHORS);
        let working_dir = current_dir().context("Failed to get working directory")?;
        trace!("Program Working Directory: {}", working_dir.display());

        trace!("Checking if config file exists...");
        if !self.config_manager.config_exists() {
            info!("Creating config file...");
            self.config_manager
                .create_default_config()
                .context("Unable to create config file")?;
        }

        let mut config = self.config_manager.config().clone();

        let mut source_prompt = Input::<String>::new().with_prompt("Path to your 9GAG data export (.html)");
        if !config.paths.source_file.is_empty() {
            source_prompt = source_prompt.default(config.paths.source_file.clone());
        }
        let source_file = source_prompt
            .interact_text()
            .context("Terminal unable to read the export path...")?;

        let destination = Input::<String>::new()
            .with_prompt("Download folder")
            .default(config.paths.destination.clone())
            .interact_text()
            .context("Terminal unable to read the download folder...")?;

        let upvoted = Confirm::new()
            .with_prompt("Download upvoted gags?")
            .show_default(true)
            .default(config.selection.upvoted)
            .interact()
            .context("Terminal unable to set up confirmation prompt...")?;
        let saved = Confirm::new()
            .with_prompt("Download saved gags?")
            .show_default(true)
            .default(config.selection.saved)
            .interact()
            .context("Terminal unable to set up confirmation prompt...")?;

        if !upvoted && !saved {
            warn!("Select at least one of upvoted or saved gags to download.");
            return Ok(());
        }

        config.paths.source_file = source_file.trim().to_string();
        config.paths.destination = destination.trim().to_string();
        config.selection.upvoted = upvoted;
        config.selection.saved = saved;
        if let Err(e) = self.config_manager.save(config.clone()) {
            warn!("Unable to remember these choices in {}: {}", self.config_manager.config_path().display(), e);
        }

        let records = parse_export(&config.paths.source_file, upvoted, saved)
            .with_context(|| format!("Unable to read {}", config.paths.source_file))?;
        if records.is_empty() {
            warn!("{}", GagError::EmptySelection);
            return Ok(());
        }

        let orchestrator = Orchestrator::from_config(&config)?;
        let cancel = CancelToken::new();
        if let Err(e) = ctrlc::set_handler(interrupt_handler(cancel.clone())) {
            warn!("Unable to listen for Ctrl-C, the run cannot be stopped early: {}", e);
        }

        info!("Press Ctrl-C to stop after the current gag.");
        let bar = tui::download_bar(records.len() as u64);
        let stats = orchestrator.run(
            &records,
            Path::new(&config.paths.destination),
            |event| tui::advance(&bar, event),
            &cancel,
        )?;
        bar.finish_and_clear();

        let summary = stats.summary();
        if stats.failed == 0 && !stats.is_cancelled() {
            println!("{}", style(summary).green().bold());
        } else {
            println!("{}", style(summary).yellow().bold());
        }
        if stats.failed > 0 {
            println!(
                "Failed gags are listed in {}",
                style(&config.logging.log_file).color256(39).italic()
            );
        }

        Ok(())
    }
}

/// Ctrl-C handler for a run. The first press asks the run to stop after the
/// current gag, a second press exits right away.
fn interrupt_handler(cancel: CancelToken) -> impl FnMut() + Send + 'static {
    move || {
        if cancel.is_cancelled() {
            warn!("Interrupted again, exiting now.");
            std::process::exit(130);
        }
        warn!("Stopping after the current gag...");
        cancel.cancel();
    }
}
