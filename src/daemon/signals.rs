//! Cooperative stop for the monitor loop.
//!
//! SIGINT only sets a flag (via `signal-hook`); the loop polls it at the
//! top of every tick, so shutdown latency is bounded by one tick and an
//! in-flight device call or sleep is never interrupted. No other signal
//! disposition is touched.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Stop request shared between whoever asks for shutdown and the loop.
///
/// Clones observe the same flag. `Ordering::Relaxed` suffices: the loop polls
/// every tick and nothing else is published through the flag.
#[derive(Debug, Clone, Default)]
pub struct StopToken {
    flag: Arc<AtomicBool>,
}

impl StopToken {
    /// A fresh token with no stop requested and no signals attached.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A token that SIGINT (Ctrl-C) will trip.
    ///
    /// Registration is best-effort; a failure is reported on stderr and the
    /// token still works for programmatic stops.
    #[cfg(feature = "daemon")]
    #[must_use]
    pub fn with_interrupts() -> Self {
        let token = Self::new();
        token.register_interrupts();
        token
    }

    /// Whether a stop has been requested.
    #[must_use]
    pub fn is_stop_requested(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    /// Ask the loop to stop at its next poll.
    pub fn request_stop(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    #[cfg(feature = "daemon")]
    fn register_interrupts(&self) {
        let registered =
            signal_hook::flag::register(signal_hook::consts::SIGINT, Arc::clone(&self.flag));
        if let Err(e) = registered {
            eprintln!("[LCD-SIGNAL] failed to register SIGINT: {e}");
        }
    }
}
