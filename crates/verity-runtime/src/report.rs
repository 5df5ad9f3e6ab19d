//! Report protocol - lifecycle events fired by the runner
//!
//! Every handler has an empty default body, so a report implements only the
//! events it cares about. Within one run the events arrive in this order:
//!
//! ```text
//! start
//!   enter(test_case)
//!     test(info) assertion* (pass | pending | failure | error)
//!     ...
//!   exit(test_case)
//!   ...
//! end
//! ```

use crate::error::{VerityError, VerityResult};
use crate::outcome::{ErroredTest, FailedTest, PassedTest, PendingTest, TestInfo};
use crate::test_case::TestCase;
use std::collections::BTreeMap;

/// Receiver of runner events
#[allow(unused_variables)]
pub trait Report {
    /// Fired once before anything runs
    fn on_start(&mut self) {}

    /// Fired before the tests of a test case group run
    fn on_enter(&mut self, test_case: &TestCase) {}

    /// Fired before a test executes
    fn on_test(&mut self, test: &TestInfo) {}

    /// Fired for every assertion made by the running test
    fn on_assertion(&mut self) {}

    fn on_pass(&mut self, passed: &PassedTest) {}

    fn on_pending(&mut self, pending: &PendingTest) {}

    fn on_failure(&mut self, failure: &FailedTest) {}

    fn on_error(&mut self, error: &ErroredTest) {}

    /// Fired after the tests of a test case group ran
    fn on_exit(&mut self, test_case: &TestCase) {}

    /// Fired once at the end, even when the run was interrupted
    fn on_end(&mut self) {}
}

impl<R: Report + ?Sized> Report for &mut R {
    fn on_start(&mut self) {
        (**self).on_start()
    }

    fn on_enter(&mut self, test_case: &TestCase) {
        (**self).on_enter(test_case)
    }

    fn on_test(&mut self, test: &TestInfo) {
        (**self).on_test(test)
    }

    fn on_assertion(&mut self) {
        (**self).on_assertion()
    }

    fn on_pass(&mut self, passed: &PassedTest) {
        (**self).on_pass(passed)
    }

    fn on_pending(&mut self, pending: &PendingTest) {
        (**self).on_pending(pending)
    }

    fn on_failure(&mut self, failure: &FailedTest) {
        (**self).on_failure(failure)
    }

    fn on_error(&mut self, error: &ErroredTest) {
        (**self).on_error(error)
    }

    fn on_exit(&mut self, test_case: &TestCase) {
        (**self).on_exit(test_case)
    }

    fn on_end(&mut self) {
        (**self).on_end()
    }
}

impl<R: Report + ?Sized> Report for Box<R> {
    fn on_start(&mut self) {
        (**self).on_start()
    }

    fn on_enter(&mut self, test_case: &TestCase) {
        (**self).on_enter(test_case)
    }

    fn on_test(&mut self, test: &TestInfo) {
        (**self).on_test(test)
    }

    fn on_assertion(&mut self) {
        (**self).on_assertion()
    }

    fn on_pass(&mut self, passed: &PassedTest) {
        (**self).on_pass(passed)
    }

    fn on_pending(&mut self, pending: &PendingTest) {
        (**self).on_pending(pending)
    }

    fn on_failure(&mut self, failure: &FailedTest) {
        (**self).on_failure(failure)
    }

    fn on_error(&mut self, error: &ErroredTest) {
        (**self).on_error(error)
    }

    fn on_exit(&mut self, test_case: &TestCase) {
        (**self).on_exit(test_case)
    }

    fn on_end(&mut self) {
        (**self).on_end()
    }
}

/// Broadcast every event to both reports, first then second
impl<A: Report, B: Report> Report for (A, B) {
    fn on_start(&mut self) {
        self.0.on_start();
        self.1.on_start();
    }

    fn on_enter(&mut self, test_case: &TestCase) {
        self.0.on_enter(test_case);
        self.1.on_enter(test_case);
    }

    fn on_test(&mut self, test: &TestInfo) {
        self.0.on_test(test);
        self.1.on_test(test);
    }

    fn on_assertion(&mut self) {
        self.0.on_assertion();
        self.1.on_assertion();
    }

    fn on_pass(&mut self, passed: &PassedTest) {
        self.0.on_pass(passed);
        self.1.on_pass(passed);
    }

    fn on_pending(&mut self, pending: &PendingTest) {
        self.0.on_pending(pending);
        self.1.on_pending(pending);
    }

    fn on_failure(&mut self, failure: &FailedTest) {
        self.0.on_failure(failure);
        self.1.on_failure(failure);
    }

    fn on_error(&mut self, error: &ErroredTest) {
        self.0.on_error(error);
        self.1.on_error(error);
    }

    fn on_exit(&mut self, test_case: &TestCase) {
        self.0.on_exit(test_case);
        self.1.on_exit(test_case);
    }

    fn on_end(&mut self) {
        self.0.on_end();
        self.1.on_end();
    }
}

/// A report that ignores every event
#[derive(Debug, Default, Clone, Copy)]
pub struct Silent;

impl Report for Silent {}

/// Tally of a run: counts and copies of every outcome
#[derive(Debug, Default, Clone)]
pub struct Summary {
    pub total_tests: usize,
    pub assertions: usize,
    pub passes: Vec<PassedTest>,
    pub pendings: Vec<PendingTest>,
    pub failures: Vec<FailedTest>,
    pub errors: Vec<ErroredTest>,
}

impl Summary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tests that failed or errored, failures first
    pub fn failures_and_errors(&self) -> Vec<&TestInfo> {
        self.failures
            .iter()
            .map(|f| &f.test)
            .chain(self.errors.iter().map(|e| &e.test))
            .collect()
    }

    /// A run succeeds when nothing failed or errored
    pub fn is_success(&self) -> bool {
        self.failures.is_empty() && self.errors.is_empty()
    }
}

impl Report for Summary {
    fn on_test(&mut self, _test: &TestInfo) {
        self.total_tests += 1;
    }

    fn on_assertion(&mut self) {
        self.assertions += 1;
    }

    fn on_pass(&mut self, passed: &PassedTest) {
        self.passes.push(passed.clone());
    }

    fn on_pending(&mut self, pending: &PendingTest) {
        self.pendings.push(pending.clone());
    }

    fn on_failure(&mut self, failure: &FailedTest) {
        self.failures.push(failure.clone());
    }

    fn on_error(&mut self, error: &ErroredTest) {
        self.errors.push(error.clone());
    }
}

type ReportFactory = Box<dyn Fn() -> Box<dyn Report> + Send + Sync>;

/// Named report constructors, so configuration can select a report by name
pub struct ReportRegistry {
    factories: BTreeMap<String, ReportFactory>,
}

impl Default for ReportRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportRegistry {
    /// A registry with the built-in `summary` and `silent` reports
    pub fn new() -> Self {
        let mut registry = Self {
            factories: BTreeMap::new(),
        };
        registry.add_report("summary", || Box::new(Summary::new()));
        registry.add_report("silent", || Box::new(Silent));
        registry
    }

    /// Register (or replace) a report under `name`
    pub fn add_report<F>(&mut self, name: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn() -> Box<dyn Report> + Send + Sync + 'static,
    {
        self.factories.insert(name.into(), Box::new(factory));
        self
    }

    /// Build a fresh report registered under `name`
    pub fn report(&self, name: &str) -> VerityResult<Box<dyn Report>> {
        self.factories
            .get(name)
            .map(|factory| factory())
            .ok_or_else(|| VerityError::UnknownReport {
                name: name.to_string(),
                available: self.names().join(", "),
            })
    }

    /// Registered names in alphabetical order
    pub fn names(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }
}
