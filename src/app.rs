//! Glue between the command line and the engine.

use std::io::{self, Write};
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::cli::{Cli, OutputFormat};
use crate::config::Settings;
use crate::duplicates::DuplicateFinder;
use crate::error::ExitCode;
use crate::logging::init_logging;
use crate::output::{write_json, write_text};
use crate::progress::Progress;
use crate::signal::install_handler;

/// Run a scan as described by `cli`, printing the report to stdout.
///
/// # Errors
///
/// Returns an error on invalid settings, a fatal scan error or a failure to
/// write the report.
pub fn run_app(cli: Cli) -> Result<ExitCode> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    run_app_with_writer(cli, &mut out)
}

/// Like [`run_app`], writing the report to `out`.
///
/// # Errors
///
/// See [`run_app`].
pub fn run_app_with_writer<W: Write>(cli: Cli, out: &mut W) -> Result<ExitCode> {
    if init_logging(cli.verbose, cli.quiet).is_err() {
        log::debug!("Logger already installed");
    }

    let mut settings =
        Settings::load(cli.config.as_deref()).context("Failed to load configuration")?;
    cli.apply_to(&mut settings);
    settings.validate().context("Invalid command-line settings")?;
    log::debug!("Effective settings: {:?}", settings);

    let handler = install_handler()?;
    let config = settings
        .to_finder_config()
        .with_shutdown_flag(handler.flag())
        .with_progress_callback(progress_for(&cli));

    let finder = DuplicateFinder::new(config);
    let (report, summary) = finder.find_duplicates(&cli.paths)?;

    match cli.output {
        OutputFormat::Text => write_text(out, &report, &summary),
        OutputFormat::Json => write_json(out, &report, &summary),
    }
    .context("Failed to write report")?;
    out.flush().context("Failed to write report")?;

    Ok(ExitCode::for_outcome(&report, &summary))
}

/// Progress reporter for this invocation, silent when bars are disabled.
fn progress_for(cli: &Cli) -> Arc<Progress> {
    Arc::new(Progress::new(!cli.show_progress()))
}
