//! Error taxonomy and the non-fatal problem collector.
//!
//! Fatal failures surface as `Result<_, Error>`. Everything lenient (bad
//! coercions, unmatched records, unsupported gets) is recorded in a
//! `Problems` collector that is threaded by `&mut` through recursive calls;
//! the caller decides whether accumulated problems escalate the operation.

use thiserror::Error;

/// Ceiling on individually reported problems per call.
pub const MAX_REPORTED_PROBLEMS: usize = 100;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    /// The path string was empty or could not be compiled.
    #[error("malformed path {0:?}")]
    MalformedPath(String),

    /// No parent container or named array could be located.
    #[error("path not found: {0}")]
    PathNotFound(String),

    /// RecordMatcher exhausted the tree without a full match.
    #[error("no record matched values [{0}]")]
    RecordNotMatched(String),

    /// A value could not be coerced to the declared column type.
    #[error("cannot convert {kind} value {value:?} to {target}")]
    TypeConversionFailure {
        value: String,
        kind: &'static str,
        target: String,
    },

    /// The root of an ingestion was neither an object nor an array.
    #[error("root value must be an object or an array, got {0}")]
    MalformedInput(&'static str),

    /// Too many problems in one call; further ones are counted, not listed.
    #[error("problem limit of 100 reached; additional problems were counted but not reported")]
    ProblemCapExceeded,
}

/// Ordered, capped collector of non-fatal problems.
///
/// The first 99 problems are reported verbatim; the 100th reported entry is
/// the terminal `ProblemCapExceeded` notice. Every push past the cap still
/// increments the total count.
#[derive(Debug, Default)]
pub struct Problems {
    reported: Vec<Error>,
    total: usize,
}

impl Problems {
    pub fn new() -> Self {
        Problems::default()
    }

    /// Record one problem. Processing always continues after a push.
    pub fn push(&mut self, problem: Error) {
        self.total += 1;
        if self.reported.len() < MAX_REPORTED_PROBLEMS - 1 {
            self.reported.push(problem);
        } else if self.reported.len() == MAX_REPORTED_PROBLEMS - 1 {
            self.reported.push(Error::ProblemCapExceeded);
        }
    }

    /// The problems visible to the caller, in occurrence order.
    pub fn reported(&self) -> &[Error] {
        &self.reported
    }

    /// Total problems encountered, including any past the reporting cap.
    pub fn total(&self) -> usize {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conversion_problem(i: usize) -> Error {
        Error::TypeConversionFailure {
            value: format!("v{}", i),
            kind: "string",
            target: "integer".to_string(),
        }
    }

    #[test]
    fn test_under_cap_reports_everything() {
        let mut problems = Problems::new();
        for i in 0..5 {
            problems.push(conversion_problem(i));
        }
        assert_eq!(problems.reported().len(), 5);
        assert_eq!(problems.total(), 5);
    }

    #[test]
    fn test_cap_replaces_tail_with_terminal_notice() {
        let mut problems = Problems::new();
        for i in 0..150 {
            problems.push(conversion_problem(i));
        }
        assert_eq!(problems.reported().len(), MAX_REPORTED_PROBLEMS);
        assert_eq!(problems.total(), 150);
        assert_eq!(
            problems.reported().last(),
            Some(&Error::ProblemCapExceeded)
        );
        // Entries before the notice are real problems, in order.
        assert_eq!(problems.reported()[0], conversion_problem(0));
        assert_eq!(problems.reported()[98], conversion_problem(98));
    }

    #[test]
    fn test_empty_collector() {
        let problems = Problems::new();
        assert!(problems.is_empty());
        assert_eq!(problems.total(), 0);
        assert!(problems.reported().is_empty());
    }
}
