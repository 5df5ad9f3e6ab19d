//! Conditions that unwind out of a running test
//!
//! Inside a test, setup or teardown block everything travels through
//! `Result<T, Signal>` and `?`. The runner classifies whatever reaches the
//! per-test boundary:
//!
//! | condition             | outcome            |
//! |-----------------------|--------------------|
//! | `PendingMarker`       | Pending            |
//! | `AssertionFailure`    | Failure            |
//! | any other error/panic | Error              |
//! | `Interrupted`         | aborts the run     |

use crate::location::Location;
use std::any::{Any, TypeId};
use std::error::Error as StdError;
use std::fmt;
use thiserror::Error;

/// Message used by `assert` when the caller does not give one
pub const DEFAULT_ASSERTION_MESSAGE: &str = "Expected condition to be satisfied";

/// Message used for pending tests when the caller does not give one
pub const DEFAULT_PENDING_MESSAGE: &str = "Not Yet Implemented";

/// Boxed error carried by [`Signal::Error`]
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Result of setup, teardown and test actions
pub type TestResult<T = ()> = Result<T, Signal>;

/// A declared expectation was not met
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct AssertionFailure {
    pub message: String,
    /// Where the failing assertion was called from
    pub location: Option<Location>,
}

impl AssertionFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            location: None,
        }
    }

    pub fn at(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }
}

/// The test is intentionally not implemented yet
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct PendingMarker {
    pub message: String,
    /// Declaration site of the test followed by the call sites that marked it,
    /// without duplicates
    pub locations: Vec<Location>,
}

impl PendingMarker {
    pub fn new(message: impl Into<String>, locations: impl IntoIterator<Item = Location>) -> Self {
        let mut unique: Vec<Location> = Vec::new();
        for location in locations {
            if !unique.contains(&location) {
                unique.push(location);
            }
        }
        Self {
            message: message.into(),
            locations: unique,
        }
    }
}

/// A plain error raised by test code with just a message
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct UnexpectedCondition {
    pub message: String,
}

/// A panic caught at the per-test boundary
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("panicked: {message}")]
pub struct Panicked {
    pub message: String,
}

/// Operator-initiated abort of the whole run
///
/// Can be returned as an error (`Err(Interrupted.into())`) or raised with
/// `std::panic::panic_any(Interrupted)` from deep inside test code.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("Interrupted!")]
pub struct Interrupted;

/// Condition unwinding out of a test body
///
/// Not an `std::error::Error` itself: every error type converts into it with `?`.
#[derive(Debug)]
pub enum Signal {
    /// Classified as a Failure
    Failure(AssertionFailure),
    /// Classified as Pending
    Pending(PendingMarker),
    /// Classified as an Error
    Error(BoxError),
    /// Not a test outcome; stops the run
    Interrupt,
}

impl<E> From<E> for Signal
where
    E: StdError + Send + Sync + 'static,
{
    fn from(error: E) -> Self {
        Signal::from_boxed(Box::new(error))
    }
}

impl Signal {
    /// Raise a plain error with the given message
    pub fn error(message: impl Into<String>) -> Self {
        Signal::Error(Box::new(UnexpectedCondition {
            message: message.into(),
        }))
    }

    /// Classify a boxed error, recognising the marker types
    pub fn from_boxed(error: BoxError) -> Self {
        let error = match error.downcast::<AssertionFailure>() {
            Ok(failure) => return Signal::Failure(*failure),
            Err(error) => error,
        };
        let error = match error.downcast::<PendingMarker>() {
            Ok(pending) => return Signal::Pending(*pending),
            Err(error) => error,
        };
        if error.is::<Interrupted>() {
            return Signal::Interrupt;
        }
        Signal::Error(error)
    }

    /// Classify a panic payload caught with `catch_unwind`
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        if payload.is::<Interrupted>() {
            return Signal::Interrupt;
        }
        let payload = match payload.downcast::<Signal>() {
            Ok(signal) => return *signal,
            Err(payload) => payload,
        };
        let payload = match payload.downcast::<AssertionFailure>() {
            Ok(failure) => return Signal::Failure(*failure),
            Err(payload) => payload,
        };
        Signal::Error(Box::new(Panicked {
            message: panic_message(payload.as_ref()),
        }))
    }

    /// Whether the raised condition is of type `E`
    pub fn is<E: StdError + 'static>(&self) -> bool {
        match self {
            Signal::Failure(failure) => (failure as &dyn Any).is::<E>(),
            Signal::Pending(pending) => (pending as &dyn Any).is::<E>(),
            Signal::Error(error) => error.is::<E>(),
            Signal::Interrupt => TypeId::of::<E>() == TypeId::of::<Interrupted>(),
        }
    }

    /// Borrow the raised condition as `E`
    pub fn downcast_ref<E: StdError + 'static>(&self) -> Option<&E> {
        match self {
            Signal::Failure(failure) => (failure as &dyn Any).downcast_ref::<E>(),
            Signal::Pending(pending) => (pending as &dyn Any).downcast_ref::<E>(),
            Signal::Error(error) => error.downcast_ref::<E>(),
            Signal::Interrupt => None,
        }
    }

    pub fn is_interrupt(&self) -> bool {
        matches!(self, Signal::Interrupt)
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::Failure(failure) => write!(f, "assertion failed: {}", failure),
            Signal::Pending(pending) => write!(f, "pending: {}", pending),
            Signal::Error(error) => write!(f, "{}", error),
            Signal::Interrupt => write!(f, "{}", Interrupted),
        }
    }
}

/// Best-effort text of a panic payload
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "Box<dyn Any>".to_string()
    }
}
