//! Cooperative cancellation and Ctrl+C handling.
//!
//! Every stage of the pipeline polls one shared `Arc<AtomicBool>`. The
//! [`ShutdownHandler`] owns that flag; [`install_handler`] additionally
//! hooks Ctrl+C (and SIGTERM through ctrlc's `termination` feature) so an
//! interactive user can stop a scan. A stopped scan ends with
//! [`FinderError::Interrupted`](crate::duplicates::FinderError::Interrupted)
//! and the binary exits with [`EXIT_CODE_INTERRUPTED`].
//!
//! ```rust,no_run
//! use duplicates::duplicates::FinderConfig;
//! use duplicates::signal::install_handler;
//!
//! let handler = install_handler().expect("signal handler");
//! let config = FinderConfig::default().with_shutdown_flag(handler.flag());
//! ```

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

/// Exit status after an interrupt: 128 + SIGINT.
pub const EXIT_CODE_INTERRUPTED: i32 = 130;

/// Owner of the shared shutdown flag.
#[derive(Debug, Clone, Default)]
pub struct ShutdownHandler {
    flag: Arc<AtomicBool>,
}

impl ShutdownHandler {
    /// Handler with the flag lowered.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether shutdown has been requested.
    #[must_use]
    pub fn is_shutdown_requested(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Raise the flag.
    pub fn request_shutdown(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Lower the flag again.
    pub fn reset(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }

    /// Shared flag to hand to the finder, walker or hasher.
    #[must_use]
    pub fn flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.flag)
    }
}

/// Error type for signal handler installation.
#[derive(Debug, thiserror::Error)]
pub enum SignalError {
    /// Failed to install the Ctrl+C handler.
    #[error("Failed to install signal handler: {0}")]
    InstallFailed(#[from] ctrlc::Error),
}

static GLOBAL_HANDLER: OnceLock<ShutdownHandler> = OnceLock::new();

/// Hook Ctrl+C to a process-wide [`ShutdownHandler`].
///
/// ctrlc allows one hook per process. Later calls return the same handler
/// with its flag lowered, so repeated scans in one process (and tests
/// calling `run_app`) keep working.
///
/// # Errors
///
/// Returns [`SignalError`] if the OS refuses the hook and no handler was
/// installed before.
pub fn install_handler() -> Result<ShutdownHandler, SignalError> {
    if let Some(existing) = GLOBAL_HANDLER.get() {
        existing.reset();
        return Ok(existing.clone());
    }

    let handler = GLOBAL_HANDLER.get_or_init(ShutdownHandler::new).clone();
    let flag = handler.flag();

    match ctrlc::set_handler(move || {
        flag.store(true, Ordering::SeqCst);
        let mut stderr = std::io::stderr();
        let _ = writeln!(stderr, "\nInterrupted, stopping scan...");
        let _ = stderr.flush();
        log::info!("Shutdown signal received");
    }) {
        Ok(()) => Ok(handler),
        Err(ctrlc::Error::MultipleHandlers) => {
            log::debug!("Ctrl+C already hooked elsewhere, flag only responds to request_shutdown");
            Ok(handler)
        }
        Err(e) => Err(SignalError::InstallFailed(e)),
    }
}
