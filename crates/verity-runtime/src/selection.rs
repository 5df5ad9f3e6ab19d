//! Test selection by file and line
//!
//! Given `file -> line`, each named file runs only the declaration nearest at
//! or before that line:
//! - a test: its test case, restricted to that test;
//! - a test case: all of its tests, followed by every descendant declared in
//!   the same file with all of theirs.
//!
//! Files without an entry run unfiltered.

use crate::location::Location;
use crate::test_case::{Registry, TestCaseId};
use std::collections::HashMap;

/// Target line per file, as produced by a CLI or editor integration
pub type LineSelection = HashMap<String, u32>;

/// A test case together with the tests of it that should run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestGroup {
    pub test_case: TestCaseId,
    /// Indices into the test case's tests, in definition order
    pub tests: Vec<usize>,
}

impl TestGroup {
    /// Every test of `test_case`
    pub fn all(registry: &Registry, test_case: TestCaseId) -> Self {
        Self {
            test_case,
            tests: (0..registry[test_case].tests().len()).collect(),
        }
    }

    /// A single test of `test_case`
    pub fn single(test_case: TestCaseId, test: usize) -> Self {
        Self {
            test_case,
            tests: vec![test],
        }
    }
}

/// One group per test case with all of its tests, in the given order
pub fn all_groups(registry: &Registry, test_cases: &[TestCaseId]) -> Vec<TestGroup> {
    test_cases
        .iter()
        .map(|&id| TestGroup::all(registry, id))
        .collect()
}

#[derive(Debug, Clone, Copy)]
enum Candidate {
    TestCase(TestCaseId),
    Test(TestCaseId, usize),
}

/// Narrow `test_cases` to the declarations nearest the selected lines
pub fn nearest_test_groups(
    registry: &Registry,
    test_cases: &[TestCaseId],
    line_numbers: &LineSelection,
) -> Vec<TestGroup> {
    let mut groups = Vec::new();

    for (file, cases) in group_by_file(registry, test_cases) {
        let Some(&line) = line_numbers.get(file) else {
            groups.extend(all_groups(registry, &cases));
            continue;
        };

        match nearest_candidate(registry, &cases, line) {
            None => {
                tracing::debug!(file, line, "no declaration at or before selected line");
            }
            Some(Candidate::Test(test_case, index)) => {
                groups.push(TestGroup::single(test_case, index));
            }
            Some(Candidate::TestCase(selected)) => {
                groups.push(TestGroup::all(registry, selected));
                groups.extend(
                    cases
                        .iter()
                        .filter(|&&id| registry.is_descendant(id, selected))
                        .map(|&id| TestGroup::all(registry, id)),
                );
            }
        }
    }

    groups
}

/// Test cases grouped by declaring file, files in order of first appearance
fn group_by_file<'r>(
    registry: &'r Registry,
    test_cases: &[TestCaseId],
) -> Vec<(&'r str, Vec<TestCaseId>)> {
    let mut files: Vec<(&str, Vec<TestCaseId>)> = Vec::new();
    for &id in test_cases {
        let file = registry[id].location().map(|l| l.file()).unwrap_or("");
        match files.iter_mut().find(|(f, _)| *f == file) {
            Some((_, ids)) => ids.push(id),
            None => files.push((file, vec![id])),
        }
    }
    files
}

/// The declaration with the greatest line not past `line`.
///
/// On equal lines the later candidate wins, and tests are listed after test
/// cases, so a test declared on the same line as its context is preferred.
fn nearest_candidate(registry: &Registry, cases: &[TestCaseId], line: u32) -> Option<Candidate> {
    let mut candidates: Vec<(Location, Candidate)> = Vec::new();
    for &id in cases {
        if let Some(location) = registry[id].location() {
            candidates.push((location, Candidate::TestCase(id)));
        }
    }
    for &id in cases {
        for (index, test) in registry[id].tests().iter().enumerate() {
            candidates.push((test.location(), Candidate::Test(id, index)));
        }
    }

    // Stable, so equal lines keep their listing order
    candidates.sort_by_key(|(location, _)| location.line());

    candidates
        .into_iter()
        .rev()
        .find(|(location, _)| location.line() <= line)
        .map(|(_, candidate)| candidate)
}
