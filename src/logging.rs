//! Logging setup for the command-line wrapper.
//!
//! The library only emits records through the `log` facade. The binary
//! installs `env_logger` once at startup with [`init_logging`].
//!
//! Level selection, highest priority first:
//!
//! 1. `RUST_LOG`, parsed with env_logger's directive syntax
//! 2. `--quiet` → errors only
//! 3. `-v` → debug, `-vv` → trace
//! 4. info
//!
//! Debug builds prefix every line with a timestamp and, from `-v` on, the
//! module path. Release builds print level and message only.

use std::env;
use std::io::Write;

use env_logger::Builder;
use log::{LevelFilter, SetLoggerError};

/// Environment variable that overrides CLI verbosity.
pub const LOG_ENV: &str = "RUST_LOG";

/// Install the global logger.
///
/// # Errors
///
/// Returns [`SetLoggerError`] if a logger was already installed in this
/// process.
///
/// # Example
///
/// ```rust,no_run
/// use duplicates::logging::init_logging;
///
/// init_logging(1, false).ok();
/// log::debug!("visible with -v");
/// ```
pub fn init_logging(verbose: u8, quiet: bool) -> Result<(), SetLoggerError> {
    let mut builder = Builder::new();
    let from_env = env::var(LOG_ENV).is_ok();

    if from_env {
        builder.parse_env(LOG_ENV);
    } else {
        builder.filter_level(level_for(verbose, quiet));
    }
    apply_format(&mut builder, verbose);
    builder.try_init()?;

    if from_env {
        log::debug!("Log filter taken from {}", LOG_ENV);
    } else {
        log::debug!("Log level set to {}", level_for(verbose, quiet));
    }
    Ok(())
}

/// Map CLI flags to a level filter. `quiet` beats `verbose`.
#[must_use]
pub fn level_for(verbose: u8, quiet: bool) -> LevelFilter {
    match (quiet, verbose) {
        (true, _) => LevelFilter::Error,
        (false, 0) => LevelFilter::Info,
        (false, 1) => LevelFilter::Debug,
        (false, _) => LevelFilter::Trace,
    }
}

#[cfg(debug_assertions)]
fn apply_format(builder: &mut Builder, verbose: u8) {
    builder.format(move |buf, record| {
        let style = buf.default_level_style(record.level());
        let ts = buf.timestamp_seconds();
        if verbose > 0 {
            writeln!(
                buf,
                "{ts} {style}{:<5}{style:#} [{}] {}",
                record.level(),
                record.module_path().unwrap_or("?"),
                record.args()
            )
        } else {
            writeln!(buf, "{ts} {style}{:<5}{style:#} {}", record.level(), record.args())
        }
    });
}

#[cfg(not(debug_assertions))]
fn apply_format(builder: &mut Builder, _verbose: u8) {
    builder.format(|buf, record| {
        let style = buf.default_level_style(record.level());
        writeln!(buf, "{style}{:<5}{style:#} {}", record.level(), record.args())
    });
}
