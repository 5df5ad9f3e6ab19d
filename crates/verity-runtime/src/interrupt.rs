//! Operator interrupts (Ctrl-C)
//!
//! The runner polls an [`InterruptFlag`] before every test. Raising it lets
//! the test in flight finish, including its teardown, then stops the run.
//! A second Ctrl-C while the flag is still raised exits the process, so a
//! test stuck in a loop or blocking I/O can always be aborted.

use crate::error::VerityResult;
use colored::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

/// Shared "stop the run" switch
#[derive(Debug, Clone, Default)]
pub struct InterruptFlag(Arc<AtomicBool>);

impl InterruptFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request the run to stop
    pub fn raise(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Clear a previous request
    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

static CTRL_C: OnceLock<InterruptFlag> = OnceLock::new();

/// Exit status of a process killed by SIGINT
pub const INTERRUPTED_EXIT_CODE: i32 = 130;

/// Connect Ctrl-C to a process-wide [`InterruptFlag`].
///
/// The handler is installed once; later calls return the same flag. The
/// first Ctrl-C raises the flag, a repeated one exits with status 130.
pub fn install_interrupt_handler() -> VerityResult<InterruptFlag> {
    if let Some(flag) = CTRL_C.get() {
        return Ok(flag.clone());
    }

    let flag = InterruptFlag::new();
    let handler_flag = flag.clone();
    ctrlc::set_handler(move || {
        if handler_flag.is_raised() {
            eprintln!("{}", "Interrupted again, aborting".red().bold());
            std::process::exit(INTERRUPTED_EXIT_CODE);
        }
        tracing::warn!("interrupt requested, stopping after the current test");
        handler_flag.raise();
    })?;
    tracing::debug!("interrupt handler installed");

    Ok(CTRL_C.get_or_init(|| flag).clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_is_shared_between_clones() {
        let flag = InterruptFlag::new();
        let other = flag.clone();
        assert!(!other.is_raised());

        flag.raise();
        assert!(other.is_raised());

        other.reset();
        assert!(!flag.is_raised());
    }
}
