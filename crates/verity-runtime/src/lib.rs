//! Verity Runtime - test definition and execution engine
//!
//! This library provides:
//! - Hierarchical test contexts with inherited setup and teardown
//! - A fresh execution context per test with assertion primitives
//! - Outcome classification (pass, pending, failure, error)
//! - A runner with line-based selection, fail-fast and interrupt handling
//! - An event protocol for pluggable reports
//!
//! # Example
//!
//! ```
//! use verity_runtime::{Registry, RunOptions, Runner, Summary};
//!
//! let mut registry = Registry::new();
//! registry.context("Arithmetic", |c| {
//!     c.test("adds", |ctx| ctx.assert_equal(4, 2 + 2));
//!     c.pending("divides by zero");
//! });
//!
//! let mut runner = Runner::new(Summary::new());
//! runner.run(&registry, &registry.ids(), &RunOptions::default());
//!
//! let summary = runner.into_report();
//! assert_eq!(summary.passes.len(), 1);
//! assert_eq!(summary.pendings.len(), 1);
//! assert!(summary.is_success());
//! ```
//!
//! Test cases defined through [`context`] land in a registry shared by the
//! defining thread; [`run_all_tests`] runs all of them.

/// Verity runtime version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod context;
pub mod error;
pub mod execution;
pub mod interrupt;
pub mod location;
pub mod outcome;
pub mod report;
pub mod runner;
pub mod selection;
pub mod signal;
pub mod test_case;

pub use context::Context;
pub use error::{VerityError, VerityResult};
pub use execution::execute_test;
pub use interrupt::{install_interrupt_handler, InterruptFlag, INTERRUPTED_EXIT_CODE};
pub use location::Location;
pub use outcome::{ErroredTest, FailedTest, Outcome, PassedTest, PendingTest, TestInfo};
pub use report::{Report, ReportRegistry, Silent, Summary};
pub use runner::{RunOptions, Runner};
pub use selection::{LineSelection, TestGroup};
pub use signal::{
    AssertionFailure, Interrupted, Panicked, PendingMarker, Signal, TestResult,
    UnexpectedCondition,
};
pub use test_case::{Definition, Registry, Test, TestCase, TestCaseId};
pub use verity_config::RunSettings;

use colored::*;
use std::cell::RefCell;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};

// ============================================================================
// Process-wide state
// ============================================================================

static FAIL_FAST: AtomicBool = AtomicBool::new(false);
static AUTORUN: AtomicBool = AtomicBool::new(true);

thread_local! {
    static REGISTRY: RefCell<Registry> = RefCell::new(Registry::new());
}

/// Terminate the process on the first failure or error
pub fn set_fail_fast(enabled: bool) {
    FAIL_FAST.store(enabled, Ordering::SeqCst);
}

pub fn fail_fast() -> bool {
    FAIL_FAST.load(Ordering::SeqCst)
}

/// Set to `false` to make [`main_with_settings`] skip running tests
pub fn set_autorun(enabled: bool) {
    AUTORUN.store(enabled, Ordering::SeqCst);
}

pub fn autorun() -> bool {
    AUTORUN.load(Ordering::SeqCst)
}

/// Define a top-level context in the shared registry.
///
/// The shared registry is per thread: [`run_all_tests`] and
/// [`main_with_settings`] only run contexts defined on the thread that calls
/// them. Contexts defined on any other thread are never run.
///
/// Must not be called from inside a context body or while tests run; nested
/// contexts are declared through the [`Definition`] handle instead.
#[track_caller]
pub fn context<F>(description: impl Into<String>, body: F) -> TestCaseId
where
    F: FnOnce(&mut Definition<'_>),
{
    let location = Location::caller();
    let description = description.into();
    REGISTRY.with(|registry| {
        registry
            .borrow_mut()
            .context_at(location, description, body)
    })
}

/// Borrow the shared registry
pub fn with_registry<T>(f: impl FnOnce(&Registry) -> T) -> T {
    REGISTRY.with(|registry| f(&registry.borrow()))
}

// ============================================================================
// Entry points
// ============================================================================

/// Run every test case of the shared registry, in definition order.
///
/// Returns `true` when no test failed or errored.
pub fn run_all_tests(report: &mut dyn Report, options: &RunOptions) -> bool {
    run_registered(report, options, None)
}

fn run_registered(
    report: &mut dyn Report,
    options: &RunOptions,
    interrupt: Option<InterruptFlag>,
) -> bool {
    let mut summary = Summary::new();
    with_registry(|registry| {
        let mut runner = Runner::new((report, &mut summary));
        if let Some(flag) = interrupt {
            runner = runner.with_interrupt(flag);
        }
        runner.run(registry, &registry.ids(), options);
    });

    tracing::info!(
        total = summary.total_tests,
        passes = summary.passes.len(),
        pendings = summary.pendings.len(),
        failures = summary.failures.len(),
        errors = summary.errors.len(),
        "run summary"
    );
    summary.is_success()
}

/// Explicit top-level entry point for a test binary.
///
/// Applies `settings`, builds the configured report, connects Ctrl-C and runs
/// every registered test case. Call it once all contexts are defined.
pub fn main_with_settings(
    settings: &RunSettings,
    reports: &ReportRegistry,
    options: &RunOptions,
) -> VerityResult<ExitCode> {
    if !autorun() {
        tracing::debug!("autorun disabled, skipping test run");
        return Ok(ExitCode::SUCCESS);
    }

    if settings.no_color {
        colored::control::set_override(false);
    }
    set_fail_fast(settings.fail_fast);

    let mut report = reports.report(&settings.report)?;
    let interrupt = install_interrupt_handler()?;
    // The flag outlives a single run
    interrupt.reset();

    let success = run_registered(report.as_mut(), options, Some(interrupt));
    if !success {
        eprintln!("{}", "Test run failed".red().bold());
    }

    Ok(if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
