// Console reporting for a run: live progress lines plus a final summary
use crate::evaluator::{PairOutcome, Verdict};
use crate::executor::OutcomeSink;
use caserun_common::cells::position_of_input_cell;
use caserun_common::types::Node;
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::debug;

/// Longest stdout/stderr excerpt shown for a failing test case.
const EXCERPT_CHARS: usize = 400;

/// Prints one progress line per pair once both of its halves have reported.
#[derive(Default)]
pub struct ConsoleReport {
    input_halves: Mutex<HashMap<usize, bool>>,
}

impl ConsoleReport {
    pub fn new() -> Self {
        Self::default()
    }
}

impl OutcomeSink for ConsoleReport {
    fn started(&self, index: usize) {
        debug!(test = %test_label(index), "Running");
    }

    fn input_finished(&self, index: usize, success: bool, stderr: &str) {
        if !success && !stderr.is_empty() {
            debug!(test = %test_label(index), stderr = %stderr.trim_end(), "Program failed");
        }
        let mut halves = self.input_halves.lock().unwrap_or_else(|e| e.into_inner());
        halves.insert(index, success);
    }

    fn output_finished(&self, index: usize, matched: bool, _stdout: &str) {
        let ran = {
            let mut halves = self.input_halves.lock().unwrap_or_else(|e| e.into_inner());
            halves.remove(&index).unwrap_or(false)
        };
        println!("{}", progress_line(index, ran, matched));
    }
}

/// "Test Case n" for a pair that starts at cell `index`.
pub fn test_label(index: usize) -> String {
    match position_of_input_cell(index) {
        Some(position) => Node::Test(position).label(),
        None => format!("Cell {}", index),
    }
}

fn mark(ok: bool) -> &'static str {
    if ok {
        "✅"
    } else {
        "❌"
    }
}

pub fn progress_line(index: usize, ran: bool, matched: bool) -> String {
    format!(
        "{:<14} {} {}  {} {}",
        test_label(index),
        Node::Input(0).label(),
        mark(ran),
        Node::Output(0).label(),
        mark(matched)
    )
}

pub fn verdict_text(verdict: Verdict) -> &'static str {
    match verdict {
        Verdict::Passed => "Passed",
        Verdict::WrongAnswer => "Wrong Answer",
        Verdict::RuntimeError => "Runtime Error",
        Verdict::TimeLimitExceeded => "Time Limit Exceeded",
    }
}

pub fn summary_line(outcomes: &[PairOutcome]) -> String {
    let passed = outcomes.iter().filter(|o| o.passed()).count();
    format!("{}/{} test case(s) passed", passed, outcomes.len())
}

fn excerpt(text: &str) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(EXCERPT_CHARS).collect();
    if chars.next().is_some() {
        format!("{}…", head)
    } else {
        head
    }
}

pub fn print_summary(outcomes: &[PairOutcome]) {
    println!();
    println!("{:<14} {:<20} {:>8}", "TEST", "VERDICT", "TIME");
    println!("{}", "─".repeat(44));

    for outcome in outcomes {
        let verdict = outcome.verdict();
        println!(
            "{:<14} {:<20} {:>6}ms",
            test_label(outcome.index),
            verdict_text(verdict),
            outcome.result.execution_time_ms
        );

        match verdict {
            Verdict::WrongAnswer => {
                println!("  stdout: {:?}", excerpt(&outcome.result.stdout));
            }
            Verdict::RuntimeError => {
                if let Some(code) = outcome.result.exit_code {
                    println!("  exit code: {}", code);
                }
                if !outcome.result.stderr.is_empty() {
                    println!("  stderr: {}", excerpt(outcome.result.stderr.trim_end()));
                }
            }
            Verdict::Passed | Verdict::TimeLimitExceeded => {}
        }
        if let Some(input_error) = &outcome.result.input_error {
            println!("  input: {}", input_error);
        }
    }

    println!("\n{}", summary_line(outcomes));
}
