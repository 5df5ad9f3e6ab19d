//! Source locations of declared test cases and tests

use std::fmt;

/// A file and line where something was declared.
///
/// Captured with `#[track_caller]` at the point `context`/`test` is invoked,
/// so it names the caller's source line rather than anything inside this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Location {
    file: &'static str,
    line: u32,
}

impl Location {
    /// Create a location from an explicit file and line
    pub const fn new(file: &'static str, line: u32) -> Self {
        Self { file, line }
    }

    /// Location of the caller of the function this is invoked from
    #[track_caller]
    pub fn caller() -> Self {
        let caller = std::panic::Location::caller();
        Self {
            file: caller.file(),
            line: caller.line(),
        }
    }

    /// File the declaration lives in
    pub fn file(&self) -> &'static str {
        self.file
    }

    /// 1-based line number of the declaration
    pub fn line(&self) -> u32 {
        self.line
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}
