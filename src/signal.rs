//! Ctrl+C handling.
//!
//! A single [`ShutdownHandler`] owns the `AtomicBool` that the walker and the
//! detector poll. The Ctrl+C hook only sets the flag; the scan stops at the
//! next entry (collection) or before the next comparison (detection), and
//! the binary exits with code 130.
//!
//! ```rust,no_run
//! use dupescan::duplicates::FinderConfig;
//! use dupescan::signal::install_handler;
//!
//! let handler = install_handler().unwrap();
//! let config = FinderConfig::default().with_shutdown_flag(handler.get_flag());
//! ```

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, OnceLock};

/// Shared cancellation flag.
#[derive(Debug, Clone, Default)]
pub struct ShutdownHandler {
    flag: Arc<AtomicBool>,
}

impl ShutdownHandler {
    /// Create a handler with no shutdown requested.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The flag to hand to [`FinderConfig::with_shutdown_flag`](crate::duplicates::FinderConfig::with_shutdown_flag).
    #[must_use]
    pub fn get_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.flag)
    }

    /// Clear the flag.
    pub fn reset(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

/// Error type for signal handler installation.
#[derive(Debug, thiserror::Error)]
pub enum SignalError {
    /// Failed to install the Ctrl+C handler, including when another
    /// handler already owns the signal.
    #[error("Failed to install signal handler: {0}")]
    InstallFailed(#[from] ctrlc::Error),
}

static GLOBAL_HANDLER: OnceLock<ShutdownHandler> = OnceLock::new();

/// Serializes installation so the hook is registered at most once.
static INSTALL_LOCK: Mutex<()> = Mutex::new(());

/// Install the Ctrl+C hook and return the process-wide handler.
///
/// Later calls in the same process return the same handler with the flag
/// cleared, so `run_app` can be called repeatedly from tests.
///
/// # Errors
///
/// Returns [`SignalError::InstallFailed`] if the hook cannot be registered,
/// for example because something else in the process already registered
/// one. The returned handler is always wired to Ctrl+C.
pub fn install_handler() -> Result<ShutdownHandler, SignalError> {
    let _guard = INSTALL_LOCK
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);

    if let Some(handler) = GLOBAL_HANDLER.get() {
        handler.reset();
        return Ok(handler.clone());
    }

    let handler = ShutdownHandler::new();
    let flag = handler.get_flag();

    ctrlc::set_handler(move || {
        flag.store(true, Ordering::SeqCst);
        let _ = writeln!(std::io::stderr(), "\nInterrupted. Stopping scan...");
        log::info!("Shutdown signal received");
    })
    .inspect_err(|e| log::warn!("Cannot register Ctrl+C handler: {}", e))?;

    log::debug!("Ctrl+C handler installed");
    Ok(GLOBAL_HANDLER.get_or_init(|| handler).clone())
}
