//! Test runner - drives groups of tests through a report
//!
//! Fires `start`, then `enter`/per-test events/`exit` for every group, and
//! finally `end`. `end` is fired even when the run is interrupted or a report
//! handler panics.

use crate::execution::execute_test;
use crate::interrupt::InterruptFlag;
use crate::outcome::{Outcome, TestInfo};
use crate::report::Report;
use crate::selection::{all_groups, nearest_test_groups, LineSelection, TestGroup};
use crate::signal::Interrupted;
use crate::test_case::{Registry, Test, TestCaseId};
use colored::*;
use std::panic::{self, AssertUnwindSafe};

/// Options for a single run
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Narrow the run per file to the declaration nearest a line
    pub line_numbers: Option<LineSelection>,
}

impl RunOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Select the declaration nearest at or before `line` in `file`
    pub fn with_line_number(mut self, file: impl Into<String>, line: u32) -> Self {
        self.line_numbers
            .get_or_insert_with(LineSelection::new)
            .insert(file.into(), line);
        self
    }
}

/// Runs test cases and reports through `R`
pub struct Runner<R: Report> {
    report: R,
    /// Overrides the process-wide fail-fast flag when set
    fail_fast: Option<bool>,
    interrupt: Option<InterruptFlag>,
}

impl<R: Report> Runner<R> {
    /// Create a runner reporting through `report`
    pub fn new(report: R) -> Self {
        Self {
            report,
            fail_fast: None,
            interrupt: None,
        }
    }

    /// Stop the process on the first failure or error
    pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = Some(fail_fast);
        self
    }

    /// Poll `flag` before every test and stop the run once it is raised
    pub fn with_interrupt(mut self, flag: InterruptFlag) -> Self {
        self.interrupt = Some(flag);
        self
    }

    pub fn report(&self) -> &R {
        &self.report
    }

    pub fn report_mut(&mut self) -> &mut R {
        &mut self.report
    }

    /// Give back the report, e.g. to read its tallies
    pub fn into_report(self) -> R {
        self.report
    }

    /// Run the given test cases
    pub fn run(&mut self, registry: &Registry, test_cases: &[TestCaseId], options: &RunOptions) {
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            self.report.on_start();

            let groups = match &options.line_numbers {
                Some(line_numbers) => nearest_test_groups(registry, test_cases, line_numbers),
                None => all_groups(registry, test_cases),
            };
            tracing::info!(groups = groups.len(), "starting test run");

            self.run_groups(registry, &groups)
        }));

        match result {
            Ok(Ok(())) => {}
            Ok(Err(Interrupted)) => {
                tracing::warn!("test run interrupted");
                eprintln!("{}", "Interrupted!".yellow().bold());
            }
            Err(payload) => {
                self.report.on_end();
                panic::resume_unwind(payload);
            }
        }

        self.report.on_end();
        tracing::info!("test run finished");
    }

    fn run_groups(&mut self, registry: &Registry, groups: &[TestGroup]) -> Result<(), Interrupted> {
        for group in groups {
            let test_case = &registry[group.test_case];
            tracing::debug!(test_case = test_case.description(), "entering");
            self.report.on_enter(test_case);

            for &index in &group.tests {
                self.report_one_test(registry, &test_case.tests()[index])?;
            }

            self.report.on_exit(test_case);
            tracing::debug!(test_case = test_case.description(), "exiting");
        }
        Ok(())
    }

    /// Run one test and fire its events
    pub fn report_one_test(&mut self, registry: &Registry, test: &Test) -> Result<(), Interrupted> {
        if self.interrupt.as_ref().is_some_and(InterruptFlag::is_raised) {
            return Err(Interrupted);
        }

        self.report.on_test(&TestInfo::new(registry, test));
        let outcome = execute_test(registry, test, &mut self.report)?;
        tracing::debug!(
            test = test.name(),
            outcome = outcome.event_name(),
            "test finished"
        );

        match &outcome {
            Outcome::Pass(passed) => self.report.on_pass(passed),
            Outcome::Pending(pending) => self.report.on_pending(pending),
            Outcome::Failure(failure) => {
                self.report.on_failure(failure);
                self.stop_if_fail_fast(&outcome);
            }
            Outcome::Error(error) => {
                self.report.on_error(error);
                self.stop_if_fail_fast(&outcome);
            }
        }
        Ok(())
    }

    fn fail_fast(&self) -> bool {
        self.fail_fast.unwrap_or_else(crate::fail_fast)
    }

    fn stop_if_fail_fast(&self, outcome: &Outcome) {
        if !self.fail_fast() {
            return;
        }
        tracing::warn!(test = %outcome.test().full_name(), "fail-fast: terminating");
        eprintln!(
            "{} {} ({})",
            "Stopping after first".red().bold(),
            outcome.event_name().red().bold(),
            outcome.test().location()
        );
        std::process::exit(1);
    }
}
