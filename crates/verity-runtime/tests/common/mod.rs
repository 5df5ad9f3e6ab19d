//! Shared helpers for runtime integration tests

#![allow(dead_code)]

use std::cell::RefCell;
use std::env;
use std::process::Command;
use std::rc::Rc;
use verity_runtime::{
    ErroredTest, FailedTest, PassedTest, PendingTest, Registry, Report, RunOptions, Runner,
    Summary, TestCase, TestInfo,
};

/// Records the name of every event it receives
#[derive(Debug, Default)]
pub struct Recorder {
    pub events: Vec<String>,
}

impl Report for Recorder {
    fn on_start(&mut self) {
        self.events.push("start".into());
    }
    fn on_enter(&mut self, _test_case: &TestCase) {
        self.events.push("enter".into());
    }
    fn on_test(&mut self, _test: &TestInfo) {
        self.events.push("test".into());
    }
    fn on_assertion(&mut self) {
        self.events.push("assertion".into());
    }
    fn on_pass(&mut self, _passed: &PassedTest) {
        self.events.push("pass".into());
    }
    fn on_pending(&mut self, _pending: &PendingTest) {
        self.events.push("pending".into());
    }
    fn on_failure(&mut self, _failure: &FailedTest) {
        self.events.push("failure".into());
    }
    fn on_error(&mut self, _error: &ErroredTest) {
        self.events.push("error".into());
    }
    fn on_exit(&mut self, _test_case: &TestCase) {
        self.events.push("exit".into());
    }
    fn on_end(&mut self) {
        self.events.push("end".into());
    }
}

/// Records entered test case descriptions and executed test names
#[derive(Debug, Default)]
pub struct Trail {
    pub entered: Vec<String>,
    pub tests: Vec<String>,
}

impl Report for Trail {
    fn on_enter(&mut self, test_case: &TestCase) {
        self.entered.push(test_case.description().to_string());
    }
    fn on_test(&mut self, test: &TestInfo) {
        self.tests.push(test.name().to_string());
    }
}

/// Shared, cloneable log that blocks can write to
pub type Log = Rc<RefCell<Vec<String>>>;

pub fn log() -> Log {
    Rc::new(RefCell::new(Vec::new()))
}

pub fn entries(log: &Log) -> Vec<String> {
    log.borrow().clone()
}

/// Run every test case of `registry` and return the tally
pub fn summarize(registry: &Registry) -> Summary {
    run_with(registry, Summary::new(), &RunOptions::default())
}

pub fn run_with<R: Report>(registry: &Registry, report: R, options: &RunOptions) -> R {
    let mut runner = Runner::new(report).with_fail_fast(false);
    runner.run(registry, &registry.ids(), options);
    runner.into_report()
}

/// One test case holding a passing, pending, failing and erroring test
pub fn four_outcomes() -> Registry {
    let mut registry = Registry::new();
    registry.context("", |c| {
        c.test("passing test", |ctx| ctx.assert(true));
        c.test("pending test", |ctx| ctx.pending());
        c.test("failing test", |ctx| ctx.assert(false));
        c.test("errored test", |_| Err(verity_runtime::Signal::error("foo")));
    });
    registry
}

// ============================================================================
// Child processes
// ============================================================================

/// Set when a test binary is re-executed to play one scenario
pub const CHILD_ENV: &str = "VERITY_TEST_CHILD";

/// Scenario this process was started for, if it is a child
pub fn child_mode() -> Option<String> {
    env::var(CHILD_ENV).ok()
}

/// Command re-running only `test_name` of the current test binary as `mode`
pub fn child_command(test_name: &str, mode: &str) -> Command {
    let exe = env::current_exe().expect("test binary path");
    let mut command = Command::new(exe);
    command
        .args([test_name, "--exact", "--nocapture", "--test-threads=1"])
        .env(CHILD_ENV, mode)
        .env("NO_COLOR", "1");
    command
}
