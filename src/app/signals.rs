//! Signal handling: SIGTERM/SIGINT graceful appliance shutdown.
//!
//! Uses the `signal-hook` crate for safe registration. The dispatch loop
//! polls the flag each iteration rather than blocking on signals.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use signal_hook::consts::{SIGINT, SIGTERM};

/// Thread-safe shutdown state shared between the OS signal handler and the
/// dispatch loop. `Relaxed` ordering suffices — the loop polls every
/// iteration and no cross-flag ordering is required.
#[derive(Clone)]
pub struct SignalHandler {
    shutdown_flag: Arc<AtomicBool>,
}

impl SignalHandler {
    /// Create a handler and register the OS hooks. Registration is
    /// best-effort; failures are logged to stderr but not fatal.
    #[must_use]
    pub fn new() -> Self {
        let handler = Self {
            shutdown_flag: Arc::new(AtomicBool::new(false)),
        };
        for signal in [SIGTERM, SIGINT] {
            if let Err(e) = signal_hook::flag::register(signal, Arc::clone(&handler.shutdown_flag))
            {
                eprintln!("[WVD-SIGNAL] failed to register signal {signal}: {e}");
            }
        }
        handler
    }

    /// Whether a shutdown has been requested.
    #[must_use]
    pub fn should_shutdown(&self) -> bool {
        self.shutdown_flag.load(Ordering::Relaxed)
    }

    /// Programmatically request shutdown (e.g. from a fatal runtime error).
    pub fn request_shutdown(&self) {
        self.shutdown_flag.store(true, Ordering::Relaxed);
    }
}

impl Default for SignalHandler {
    fn default() -> Self {
        Self::new()
    }
}
