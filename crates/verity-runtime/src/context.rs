//! Execution context - the `self` of a running test
//!
//! A fresh [`Context`] is created for every test execution. Setup blocks, the
//! test body and teardown blocks all receive the same context, so they share
//! its state; nothing survives into the next test.
//!
//! # Assertions
//!
//! Every assertion notifies the report (`on_assertion`) before checking:
//! - `assert(condition)` / `assert_with(condition, message)`
//! - `assert_equal(expected, actual)` / `assert_equal_with(...)`
//! - `assert_not_equal(expected, actual)`
//! - `assert_raises(block)` / `assert_raises_kind::<E>(block)`
//!
//! `pending()` stops the test and marks it as pending.

use crate::location::Location;
use crate::report::Report;
use crate::signal::{
    AssertionFailure, PendingMarker, Signal, TestResult, DEFAULT_ASSERTION_MESSAGE,
    DEFAULT_PENDING_MESSAGE,
};
use std::any::{type_name, Any};
use std::collections::HashMap;
use std::error::Error as StdError;
use std::fmt::{self, Debug};
use std::panic::{self, AssertUnwindSafe};

/// Per-test execution state handed to setup, test and teardown blocks
pub struct Context<'a> {
    report: &'a mut dyn Report,
    location: Location,
    state: HashMap<String, Box<dyn Any>>,
}

impl<'a> Context<'a> {
    /// Create a pristine context for the test declared at `location`
    pub fn new(report: &'a mut dyn Report, location: Location) -> Self {
        Self {
            report,
            location,
            state: HashMap::new(),
        }
    }

    /// Declaration site of the running test
    pub fn location(&self) -> Location {
        self.location
    }

    // ========================================================================
    // State
    // ========================================================================

    /// Store a value under `key`, replacing whatever was there
    pub fn insert<T: 'static>(&mut self, key: impl Into<String>, value: T) {
        self.state.insert(key.into(), Box::new(value));
    }

    /// Borrow the value under `key` if it exists and has type `T`
    pub fn get<T: 'static>(&self, key: &str) -> Option<&T> {
        self.state.get(key).and_then(|v| v.downcast_ref::<T>())
    }

    pub fn get_mut<T: 'static>(&mut self, key: &str) -> Option<&mut T> {
        self.state.get_mut(key).and_then(|v| v.downcast_mut::<T>())
    }

    /// Take the value under `key` out of the context.
    ///
    /// A value of another type is left in place and `None` is returned.
    pub fn remove<T: 'static>(&mut self, key: &str) -> Option<T> {
        if !self.state.get(key).is_some_and(|v| v.is::<T>()) {
            return None;
        }
        self.state
            .remove(key)
            .and_then(|v| v.downcast::<T>().ok())
            .map(|v| *v)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.state.contains_key(key)
    }

    // ========================================================================
    // Assertions
    // ========================================================================

    /// Fail unless `condition` holds
    #[track_caller]
    pub fn assert(&mut self, condition: bool) -> TestResult {
        self.check(condition, DEFAULT_ASSERTION_MESSAGE.to_string(), Location::caller())
    }

    /// Fail with `message` unless `condition` holds
    #[track_caller]
    pub fn assert_with(&mut self, condition: bool, message: impl Into<String>) -> TestResult {
        self.check(condition, message.into(), Location::caller())
    }

    /// Fail unless `expected == actual`
    #[track_caller]
    pub fn assert_equal<T, U>(&mut self, expected: T, actual: U) -> TestResult
    where
        T: PartialEq<U> + Debug,
        U: Debug,
    {
        let message = format!("{:?} expected but was {:?}", expected, actual);
        self.check(expected == actual, message, Location::caller())
    }

    #[track_caller]
    pub fn assert_equal_with<T, U>(
        &mut self,
        expected: T,
        actual: U,
        message: impl Into<String>,
    ) -> TestResult
    where
        T: PartialEq<U>,
    {
        self.check(expected == actual, message.into(), Location::caller())
    }

    /// Fail if `unexpected == actual`
    #[track_caller]
    pub fn assert_not_equal<T, U>(&mut self, unexpected: T, actual: U) -> TestResult
    where
        T: PartialEq<U> + Debug,
        U: Debug,
    {
        let message = format!("{:?} expected to differ from {:?}", actual, unexpected);
        self.check(unexpected != actual, message, Location::caller())
    }

    /// Run `block` and fail unless it raises something.
    ///
    /// Returned errors, assertion failures, pending markers and panics all
    /// count. The raised condition is handed back on success. An interrupt
    /// is never swallowed: it propagates without counting as an assertion.
    #[track_caller]
    pub fn assert_raises<F>(&mut self, block: F) -> TestResult<Signal>
    where
        F: FnOnce(&mut Context<'a>) -> TestResult,
    {
        let location = Location::caller();
        self.raises(block, |_| true, "Expected an error to be raised".to_string(), location)
    }

    /// Run `block` and fail unless it raises an `E`
    #[track_caller]
    pub fn assert_raises_kind<E, F>(&mut self, block: F) -> TestResult<Signal>
    where
        E: StdError + 'static,
        F: FnOnce(&mut Context<'a>) -> TestResult,
    {
        let message = format!("Expected {} to be raised", short_type_name::<E>());
        let location = Location::caller();
        self.raises(block, Signal::is::<E>, message, location)
    }

    /// Like [`assert_raises_kind`](Self::assert_raises_kind) with a custom message
    #[track_caller]
    pub fn assert_raises_kind_with<E, F>(
        &mut self,
        message: impl Into<String>,
        block: F,
    ) -> TestResult<Signal>
    where
        E: StdError + 'static,
        F: FnOnce(&mut Context<'a>) -> TestResult,
    {
        let location = Location::caller();
        self.raises(block, Signal::is::<E>, message.into(), location)
    }

    fn raises<F, M>(
        &mut self,
        block: F,
        matches: M,
        message: String,
        location: Location,
    ) -> TestResult<Signal>
    where
        F: FnOnce(&mut Context<'a>) -> TestResult,
        M: Fn(&Signal) -> bool,
    {
        let raised = match panic::catch_unwind(AssertUnwindSafe(|| block(self))) {
            Ok(Ok(())) => None,
            Ok(Err(signal)) => Some(signal),
            Err(payload) => Some(Signal::from_panic(payload)),
        };

        match raised {
            Some(Signal::Interrupt) => Err(Signal::Interrupt),
            Some(signal) if matches(&signal) => {
                self.check(true, message, location)?;
                Ok(signal)
            }
            _ => {
                self.report.on_assertion();
                Err(Signal::Failure(AssertionFailure::new(message).at(location)))
            }
        }
    }

    /// Stop the test and mark it pending with the default message
    #[track_caller]
    pub fn pending(&self) -> TestResult {
        Err(Signal::Pending(self.pending_marker(
            DEFAULT_PENDING_MESSAGE.to_string(),
            Location::caller(),
        )))
    }

    /// Stop the test and mark it pending
    #[track_caller]
    pub fn pending_with(&self, message: impl Into<String>) -> TestResult {
        Err(Signal::Pending(
            self.pending_marker(message.into(), Location::caller()),
        ))
    }

    fn pending_marker(&self, message: String, marked_at: Location) -> PendingMarker {
        PendingMarker::new(message, [self.location, marked_at])
    }

    fn check(&mut self, condition: bool, message: String, location: Location) -> TestResult {
        self.report.on_assertion();
        if condition {
            Ok(())
        } else {
            Err(Signal::Failure(AssertionFailure::new(message).at(location)))
        }
    }
}

impl fmt::Debug for Context<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<_> = self.state.keys().collect();
        keys.sort();
        f.debug_struct("Context")
            .field("location", &self.location)
            .field("state", &keys)
            .finish()
    }
}

fn short_type_name<T: ?Sized>() -> &'static str {
    let full = type_name::<T>();
    full.rsplit("::").next().unwrap_or(full)
}
