mod engine;
mod evaluator;
mod executor;
mod launcher;
mod report;
mod session;

#[cfg(test)]
mod integration_tests;

use anyhow::{bail, Context};
use caserun_common::cells::input_cell_index;
use caserun_common::config::timeout_ms_from_env;
use caserun_common::languages::LanguageRegistry;
use clap::Parser;
use launcher::LaunchError;
use report::ConsoleReport;
use session::{SessionContext, SessionError, SessionState};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "caserun-runner")]
#[command(about = "Run a solution against the test cases stored next to it", long_about = None)]
struct Cli {
    /// Solution source file
    source: PathBuf,

    /// Language id (inferred from the file extension when omitted)
    #[arg(short, long)]
    language: Option<String>,

    /// Wall-clock limit per test case, in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Test case number to run, starting at 1 (repeatable; default: all)
    #[arg(short, long = "test")]
    tests: Vec<usize>,

    /// Print outcomes as JSON instead of a table
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_line_number(true)
        .with_writer(std::io::stderr)
        .init();

    let registry = LanguageRegistry::load_default().map_err(|e| {
        error!("Failed to load language configurations: {}", e);
        e
    })?;
    info!(languages = ?registry.list_languages(), "Loaded language registry");

    let language = match cli.language {
        Some(language) => language,
        None => registry
            .language_for_path(&cli.source)
            .map(str::to_string)
            .with_context(|| {
                format!(
                    "cannot infer the language of {}; pass --language",
                    cli.source.display()
                )
            })?,
    };
    let timeout_ms = cli.timeout_ms.unwrap_or_else(timeout_ms_from_env);

    let mut session = SessionContext::new(registry, timeout_ms);
    session.focus(&cli.source, &language)?;

    match session.state() {
        SessionState::Ready => {}
        SessionState::UnsupportedLanguage => bail!(
            "language '{}' is not supported (available: {})",
            language,
            session.registry().list_languages().join(", ")
        ),
        SessionState::CreateSolution => bail!(
            "no test cases for {}; create them with `caserun-cli init {}`",
            cli.source.display(),
            cli.source.display()
        ),
        SessionState::NoFileOpen => bail!("no solution is open"),
    }

    let total = session
        .active()
        .and_then(|a| a.suite.as_ref())
        .map(|s| s.len())
        .unwrap_or(0);
    if total == 0 {
        println!("No test cases to run.");
        return Ok(ExitCode::SUCCESS);
    }

    let selected = select_tests(&cli.tests, total)?;
    let cells = session.cells();

    let report = ConsoleReport::new();
    let outcomes = match session.execute_cells(&cells, &selected, &report).await {
        Ok(outcomes) => outcomes,
        Err(SessionError::Launch(LaunchError::BuildError { diagnostics })) => {
            println!("❌ Build failed, no test case was run:\n");
            println!("{}", diagnostics.trim_end());
            return Ok(ExitCode::FAILURE);
        }
        Err(e) => return Err(e.into()),
    };

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&outcomes)?);
    } else {
        report::print_summary(&outcomes);
    }

    if outcomes.iter().all(|o| o.passed()) {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

/// Map 1-based test numbers to the input cells of the rendered suite.
fn select_tests(numbers: &[usize], total: usize) -> anyhow::Result<Vec<usize>> {
    if numbers.is_empty() {
        return Ok((0..total).map(input_cell_index).collect());
    }
    numbers
        .iter()
        .map(|&n| {
            if n == 0 || n > total {
                bail!("test case {} does not exist (1..={})", n, total);
            }
            Ok(input_cell_index(n - 1))
        })
        .collect()
}
