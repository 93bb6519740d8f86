/// Test Evaluator - classify one execution against its expectation
///
/// **Core Responsibility:**
/// Turn a raw ExecutionResult and the expected output into a PairOutcome.
///
/// **Critical Properties:**
/// - Knows nothing about processes or languages
/// - Pure function: (execution result, expected output) → outcome
///
/// **Classification Rules:**
/// - process_success: the program exited with code 0
/// - output_match: process_success AND stdout == expected, byte for byte
/// - No trimming, no case folding; line endings are normalized upstream
///   before the expectation reaches this module
use caserun_common::types::ExecutionResult;
use serde::Serialize;

/// Why a pair did not pass, for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Verdict {
    Passed,
    WrongAnswer,
    RuntimeError,
    TimeLimitExceeded,
}

/// Classified result of running one pair.
#[derive(Debug, Clone, Serialize)]
pub struct PairOutcome {
    /// Identifier of the pair this outcome belongs to.
    pub index: usize,
    /// Completion signal for the input half: did the program run cleanly.
    pub process_success: bool,
    /// Completion signal for the output half: did stdout match.
    pub output_match: bool,
    pub result: ExecutionResult,
}

impl PairOutcome {
    pub fn passed(&self) -> bool {
        self.output_match
    }

    pub fn verdict(&self) -> Verdict {
        if self.result.timed_out() {
            Verdict::TimeLimitExceeded
        } else if !self.process_success {
            Verdict::RuntimeError
        } else if !self.output_match {
            Verdict::WrongAnswer
        } else {
            Verdict::Passed
        }
    }
}

pub fn evaluate(index: usize, result: ExecutionResult, expected: &str) -> PairOutcome {
    let process_success = result.success();
    let output_match = process_success && result.stdout == expected;
    PairOutcome {
        index,
        process_success,
        output_match,
        result,
    }
}

/// Outcome for a pair whose process could not even be started.
pub fn launch_failure(index: usize, message: String) -> PairOutcome {
    PairOutcome {
        index,
        process_success: false,
        output_match: false,
        result: ExecutionResult {
            exit_code: Some(-1),
            stderr: message,
            ..Default::default()
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Helper to create a finished execution
    fn make_result(exit_code: Option<i32>, stdout: &str) -> ExecutionResult {
        ExecutionResult {
            exit_code,
            stdout: stdout.to_string(),
            stderr: String::new(),
            execution_time_ms: 12,
            input_error: None,
        }
    }

    #[test]
    fn test_exact_match_passes() {
        let outcome = evaluate(0, make_result(Some(0), "42\n"), "42\n");
        assert!(outcome.process_success);
        assert!(outcome.output_match);
        assert_eq!(outcome.verdict(), Verdict::Passed);
    }

    #[test]
    fn test_missing_trailing_newline_fails() {
        let outcome = evaluate(0, make_result(Some(0), "42\n"), "42");
        assert!(outcome.process_success);
        assert!(!outcome.output_match);
        assert_eq!(outcome.verdict(), Verdict::WrongAnswer);
    }

    #[test]
    fn test_whitespace_is_significant() {
        let outcome = evaluate(0, make_result(Some(0), "  hello  \n"), "hello\n");
        assert!(!outcome.output_match);
    }

    #[test]
    fn test_case_sensitivity() {
        let outcome = evaluate(0, make_result(Some(0), "YES\n"), "yes\n");
        assert!(!outcome.output_match);
    }

    #[test]
    fn test_nonzero_exit_never_matches() {
        // Right output, but the program crashed afterwards
        let outcome = evaluate(3, make_result(Some(1), "42\n"), "42\n");
        assert!(!outcome.process_success);
        assert!(!outcome.output_match);
        assert_eq!(outcome.index, 3);
        assert_eq!(outcome.verdict(), Verdict::RuntimeError);
    }

    #[test]
    fn test_timeout() {
        let outcome = evaluate(0, make_result(None, ""), "");
        assert!(!outcome.process_success);
        assert_eq!(outcome.verdict(), Verdict::TimeLimitExceeded);
    }

    #[test]
    fn test_empty_output() {
        let outcome = evaluate(0, make_result(Some(0), ""), "");
        assert!(outcome.passed());
    }

    #[test]
    fn test_launch_failure() {
        let outcome = launch_failure(2, "failed to start `py`".to_string());
        assert!(!outcome.passed());
        assert_eq!(outcome.verdict(), Verdict::RuntimeError);
        assert!(outcome.result.stderr.contains("py"));
    }
}
