//! Ctrl-C handling for cooperative shutdown.
//!
//! A single shared `AtomicBool` flips when the process is interrupted.
//! Long-running stages (hashing, sweeping) check the flag between items
//! and wind down cleanly instead of dying mid-move; the process then exits
//! with code 130.

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

/// Shared interrupt flag with convenience accessors.
///
/// Cloning shares the flag; the handler is `Send + Sync`.
#[derive(Debug, Clone, Default)]
pub struct ShutdownHandler {
    flag: Arc<AtomicBool>,
}

impl ShutdownHandler {
    /// Create a handler with the flag cleared.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// True once an interrupt was received or requested.
    #[must_use]
    pub fn is_interrupted(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Set the flag by hand; what the signal hook does, minus the signal.
    pub fn trigger(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Clear the flag so the handler can be reused.
    pub fn reset(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }

    /// The flag itself, for threading into batch options and sweep loops.
    #[must_use]
    pub fn flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.flag)
    }
}

static INSTALLED: OnceLock<ShutdownHandler> = OnceLock::new();

/// Install the process-wide Ctrl-C hook and return its handler.
///
/// Idempotent: later calls return the handler installed first, with its
/// flag cleared. If the hook cannot be registered (another handler already
/// owns the signal, as happens when tests drive the app in parallel), the
/// returned handler is unhooked; [`ShutdownHandler::trigger`] still works.
pub fn install_handler() -> ShutdownHandler {
    if let Some(handler) = INSTALLED.get() {
        handler.reset();
        return handler.clone();
    }

    let handler = ShutdownHandler::new();
    let flag = handler.flag();
    if let Err(err) = ctrlc::set_handler(move || {
        flag.store(true, Ordering::SeqCst);
        let mut stderr = std::io::stderr();
        let _ = writeln!(stderr, "\nInterrupted, finishing up...");
        let _ = stderr.flush();
    }) {
        log::debug!("Ctrl-C hook not installed ({err}), using detached flag");
    }

    match INSTALLED.set(handler.clone()) {
        Ok(()) => handler,
        // Lost an install race; share the first handler's flag.
        Err(_) => INSTALLED.get().cloned().unwrap_or(handler),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_handler_not_interrupted() {
        let handler = ShutdownHandler::new();
        assert!(!handler.is_interrupted());
    }

    #[test]
    fn test_trigger_and_reset() {
        let handler = ShutdownHandler::new();
        handler.trigger();
        assert!(handler.is_interrupted());

        handler.reset();
        assert!(!handler.is_interrupted());
    }

    #[test]
    fn test_flag_shares_state() {
        let handler = ShutdownHandler::new();
        let flag = handler.flag();

        flag.store(true, Ordering::SeqCst);
        assert!(handler.is_interrupted());
    }

    #[test]
    fn test_clone_shares_flag() {
        let handler = ShutdownHandler::new();
        let cloned = handler.clone();

        handler.trigger();
        assert!(cloned.is_interrupted());
    }

    #[test]
    fn test_handler_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ShutdownHandler>();
    }
}
