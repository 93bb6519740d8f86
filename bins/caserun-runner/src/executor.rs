/// Execution Orchestrator - High-Level Orchestration
///
/// **Responsibility:**
/// Coordinate launcher, engine and evaluator to run a batch of pairs
/// against one solution.
///
/// **Architecture:**
/// 1. Prepare a RunPlan once per batch (launcher.rs)
/// 2. Run every pair through the bounded engine (engine.rs)
/// 3. Classify each run (evaluator.rs) and signal both halves to the sink
///
/// Pairs are independent runs of the same program. They run concurrently
/// on the current task; outcomes come back in input order.
use caserun_common::languages::LanguageRegistry;
use crate::engine;
use crate::evaluator::{self, PairOutcome};
use crate::launcher::{self, LaunchError};
use caserun_common::types::RunPlan;
use futures_util::future::join_all;
use std::path::Path;
use std::time::Instant;
use tracing::{info, warn};

/// One runnable input/expected-output pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pair {
    /// Pair identifier reported back with its outcome.
    pub index: usize,
    pub input: String,
    pub expected: String,
}

/// Receiver of per-pair completion signals.
///
/// The input half reports whether the program ran cleanly; the output half
/// reports whether its output matched. A crashed run therefore shows up as
/// a failed input half next to a failed output half.
pub trait OutcomeSink: Send + Sync {
    fn started(&self, _index: usize) {}
    fn input_finished(&self, index: usize, success: bool, stderr: &str);
    fn output_finished(&self, index: usize, matched: bool, stdout: &str);
}

/// Sink that drops every signal.
pub struct NullSink;

impl OutcomeSink for NullSink {
    fn input_finished(&self, _index: usize, _success: bool, _stderr: &str) {}
    fn output_finished(&self, _index: usize, _matched: bool, _stdout: &str) {}
}

/// Prepare the solution once, then run every pair against it.
///
/// Fails only when the solution cannot be prepared (unsupported language,
/// build failure); no pair runs in that case. Everything that goes wrong
/// inside a single pair is reported as that pair's outcome.
#[tracing::instrument(skip(registry, source, pairs, sink), fields(source = %source.display(), pairs = pairs.len()))]
pub async fn run_batch(
    registry: &LanguageRegistry,
    source: &Path,
    language_id: &str,
    pairs: &[Pair],
    timeout_ms: u64,
    sink: &dyn OutcomeSink,
) -> Result<Vec<PairOutcome>, LaunchError> {
    let plan = launcher::prepare(registry, source, language_id).await?;
    info!(plan = %plan, timeout_ms, "Prepared solution");

    let start = Instant::now();
    let outcomes = run_pairs(&plan, pairs, timeout_ms, sink).await;

    info!(
        passed = outcomes.iter().filter(|o| o.passed()).count(),
        total = outcomes.len(),
        batch_ms = start.elapsed().as_millis() as u64,
        "Batch completed"
    );
    Ok(outcomes)
}

/// Run pairs against an already prepared plan.
pub async fn run_pairs(
    plan: &RunPlan,
    pairs: &[Pair],
    timeout_ms: u64,
    sink: &dyn OutcomeSink,
) -> Vec<PairOutcome> {
    join_all(pairs.iter().map(|pair| run_pair(plan, pair, timeout_ms, sink))).await
}

async fn run_pair(
    plan: &RunPlan,
    pair: &Pair,
    timeout_ms: u64,
    sink: &dyn OutcomeSink,
) -> PairOutcome {
    sink.started(pair.index);

    let outcome = match engine::execute(plan, &pair.input, timeout_ms).await {
        Ok(result) => evaluator::evaluate(pair.index, result, &pair.expected),
        Err(e) => {
            warn!(pair = pair.index, error = %e, "Execution failed");
            evaluator::launch_failure(pair.index, e.to_string())
        }
    };

    if outcome.result.timed_out() {
        warn!(
            pair = pair.index,
            timeout_ms,
            "Execution timed out; test cannot pass"
        );
    }

    sink.input_finished(pair.index, outcome.process_success, &outcome.result.stderr);
    sink.output_finished(pair.index, outcome.output_match, &outcome.result.stdout);
    outcome
}
