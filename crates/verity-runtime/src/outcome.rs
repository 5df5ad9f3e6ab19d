//! Outcome wrappers - the classified result of executing one test

use crate::location::Location;
use crate::signal::{AssertionFailure, PendingMarker};
use crate::test_case::{Registry, Test, TestCaseId};
use std::error::Error as StdError;
use std::sync::Arc;

/// Snapshot of a test handed to reports
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestInfo {
    name: String,
    location: Location,
    test_case: TestCaseId,
    description: String,
}

impl TestInfo {
    pub fn new(registry: &Registry, test: &Test) -> Self {
        Self {
            name: test.name().to_string(),
            location: test.location(),
            test_case: test.test_case(),
            description: registry[test.test_case()].description().to_string(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn location(&self) -> Location {
        self.location
    }

    /// Test case the test belongs to
    pub fn test_case(&self) -> TestCaseId {
        self.test_case
    }

    /// Resolved description of the owning test case
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Description of the owning test case followed by the test name
    pub fn full_name(&self) -> String {
        format!("{} {}", self.description, self.name)
            .trim()
            .to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassedTest {
    pub test: TestInfo,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingTest {
    pub test: TestInfo,
    pub message: String,
    /// Declaration site followed by where the test was marked pending
    pub locations: Vec<Location>,
}

impl PendingTest {
    pub fn new(test: TestInfo, marker: PendingMarker) -> Self {
        Self {
            test,
            message: marker.message,
            locations: marker.locations,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedTest {
    pub test: TestInfo,
    pub message: String,
    /// Where the failing assertion was made, when known
    pub location: Option<Location>,
}

impl FailedTest {
    pub fn new(test: TestInfo, failure: AssertionFailure) -> Self {
        Self {
            test,
            message: failure.message,
            location: failure.location,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ErroredTest {
    pub test: TestInfo,
    pub error: Arc<dyn StdError + Send + Sync + 'static>,
}

impl ErroredTest {
    pub fn message(&self) -> String {
        self.error.to_string()
    }
}

/// Classified result of one test execution
#[derive(Debug, Clone)]
pub enum Outcome {
    Pass(PassedTest),
    Pending(PendingTest),
    Failure(FailedTest),
    Error(ErroredTest),
}

impl Outcome {
    /// The test this outcome belongs to
    pub fn test(&self) -> &TestInfo {
        match self {
            Outcome::Pass(o) => &o.test,
            Outcome::Pending(o) => &o.test,
            Outcome::Failure(o) => &o.test,
            Outcome::Error(o) => &o.test,
        }
    }

    pub fn is_pass(&self) -> bool {
        matches!(self, Outcome::Pass(_))
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Outcome::Pending(_))
    }

    /// Failures and errors make a run unsuccessful
    pub fn is_failure_or_error(&self) -> bool {
        matches!(self, Outcome::Failure(_) | Outcome::Error(_))
    }

    /// Name of the event fired for this outcome
    pub fn event_name(&self) -> &'static str {
        match self {
            Outcome::Pass(_) => "pass",
            Outcome::Pending(_) => "pending",
            Outcome::Failure(_) => "failure",
            Outcome::Error(_) => "error",
        }
    }
}
