/// Session context - the solution the user is currently working on
///
/// Focus is an explicit transition: `focus` loads the solution's tests,
/// `blur` drops them. Runs are resolved against whatever is focused.
///
/// **Re-trigger policy:** a pair that is still running is not started a
/// second time. The new trigger is ignored and logged; the pair becomes
/// runnable again as soon as its previous run finishes.
use caserun_common::languages::LanguageRegistry;
use crate::evaluator::PairOutcome;
use crate::executor::{self, OutcomeSink, Pair};
use crate::launcher::LaunchError;
use caserun_common::cells::{pair_at, render_cells, select_pairs};
use caserun_common::store;
use caserun_common::types::{Cell, TestSuite};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no solution is open")]
    NoActiveSolution,
    #[error("{0} is a solution document, not a solution")]
    NotASolution(PathBuf),
    #[error(transparent)]
    Launch(#[from] LaunchError),
}

#[derive(Debug)]
pub struct ActiveSolution {
    pub source: PathBuf,
    pub language_id: String,
    /// `None` until a solution document exists for the source.
    pub suite: Option<TestSuite>,
}

/// What the user can do next with the focused file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    NoFileOpen,
    UnsupportedLanguage,
    CreateSolution,
    Ready,
}

pub struct SessionContext {
    registry: LanguageRegistry,
    timeout_ms: u64,
    active: Option<ActiveSolution>,
    in_flight: Mutex<HashSet<usize>>,
}

/// Marks a pair as running until dropped
struct InFlightGuard<'a> {
    in_flight: &'a Mutex<HashSet<usize>>,
    index: usize,
}

impl<'a> InFlightGuard<'a> {
    fn try_claim(in_flight: &'a Mutex<HashSet<usize>>, index: usize) -> Option<Self> {
        let mut running = in_flight.lock().unwrap_or_else(|e| e.into_inner());
        if running.insert(index) {
            Some(Self { in_flight, index })
        } else {
            None
        }
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        let mut running = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
        running.remove(&self.index);
    }
}

impl SessionContext {
    pub fn new(registry: LanguageRegistry, timeout_ms: u64) -> Self {
        Self {
            registry,
            timeout_ms,
            active: None,
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    pub fn registry(&self) -> &LanguageRegistry {
        &self.registry
    }

    pub fn active(&self) -> Option<&ActiveSolution> {
        self.active.as_ref()
    }

    /// Make `source` the active solution and load its tests.
    ///
    /// Focusing a solution document itself is rejected and leaves the
    /// current focus unchanged.
    pub fn focus(&mut self, source: &Path, language_id: &str) -> Result<(), SessionError> {
        if store::is_document(source) {
            return Err(SessionError::NotASolution(source.to_path_buf()));
        }

        let suite = if self.registry.is_supported(language_id) {
            store::load(source)
        } else {
            None
        };
        info!(
            source = %source.display(),
            language = language_id,
            tests = suite.as_ref().map(|s| s.len()),
            "Focused solution"
        );
        self.active = Some(ActiveSolution {
            source: source.to_path_buf(),
            language_id: language_id.to_string(),
            suite,
        });
        Ok(())
    }

    pub fn blur(&mut self) {
        if let Some(active) = self.active.take() {
            debug!(source = %active.source.display(), "Cleared focus");
        }
    }

    pub fn state(&self) -> SessionState {
        match &self.active {
            None => SessionState::NoFileOpen,
            Some(a) if !self.registry.is_supported(&a.language_id) => {
                SessionState::UnsupportedLanguage
            }
            Some(a) if a.suite.is_none() => SessionState::CreateSolution,
            Some(_) => SessionState::Ready,
        }
    }

    /// Cells of the focused solution, empty when it has no tests yet.
    pub fn cells(&self) -> Vec<Cell> {
        self.active
            .as_ref()
            .and_then(|a| a.suite.as_ref())
            .map(render_cells)
            .unwrap_or_default()
    }

    /// Run the pairs the `selected` cells resolve to against the focused
    /// solution. Pairs already in flight are skipped.
    pub async fn execute_cells(
        &self,
        cells: &[Cell],
        selected: &[usize],
        sink: &dyn OutcomeSink,
    ) -> Result<Vec<PairOutcome>, SessionError> {
        let active = self.active.as_ref().ok_or(SessionError::NoActiveSolution)?;

        let mut guards = Vec::new();
        let mut pairs = Vec::new();
        for start in select_pairs(cells, selected) {
            let Some((input, expected)) = pair_at(cells, start) else {
                continue;
            };
            match InFlightGuard::try_claim(&self.in_flight, start) {
                Some(guard) => guards.push(guard),
                None => {
                    warn!(pair = start, "Pair is already running; ignoring trigger");
                    continue;
                }
            }
            pairs.push(Pair {
                index: start,
                input,
                expected,
            });
        }

        if pairs.is_empty() {
            debug!("Nothing to run");
            return Ok(Vec::new());
        }

        let outcomes = executor::run_batch(
            &self.registry,
            &active.source,
            &active.language_id,
            &pairs,
            self.timeout_ms,
            sink,
        )
        .await?;
        drop(guards);
        Ok(outcomes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use caserun_common::languages::{CommandTemplate, LanguageConfig};
    use crate::executor::NullSink;
    use caserun_common::types::{CellKind, TestCase};
    use tempfile::TempDir;

    fn shell_registry() -> LanguageRegistry {
        LanguageRegistry::from_configs(vec![LanguageConfig {
            name: "shell".to_string(),
            file_extensions: vec!["sh".to_string()],
            build: None,
            run: CommandTemplate {
                command: "sh".to_string(),
                args: vec!["{source}".to_string()],
            },
        }])
    }

    fn solution(dir: &TempDir, script: &str, tests: Vec<TestCase>) -> PathBuf {
        let source = dir.path().join("sol.sh");
        std::fs::write(&source, script).unwrap();
        store::save(&source, &TestSuite::from(tests)).unwrap();
        source
    }

    #[test]
    fn test_state_transitions() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("sol.sh");
        std::fs::write(&source, "cat").unwrap();
        let mut session = SessionContext::new(shell_registry(), 1000);
        assert_eq!(session.state(), SessionState::NoFileOpen);

        session.focus(&source, "shell").unwrap();
        assert_eq!(session.state(), SessionState::CreateSolution);

        store::create(&source).unwrap();
        session.focus(&source, "shell").unwrap();
        assert_eq!(session.state(), SessionState::Ready);

        session.focus(&dir.path().join("main.rs"), "rust").unwrap();
        assert_eq!(session.state(), SessionState::UnsupportedLanguage);

        session.blur();
        assert_eq!(session.state(), SessionState::NoFileOpen);
        assert!(session.cells().is_empty());
    }

    #[test]
    fn test_focusing_a_document_keeps_previous_focus() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("sol.sh");
        let mut session = SessionContext::new(shell_registry(), 1000);
        session.focus(&source, "shell").unwrap();

        let result = session.focus(&store::document_path(&source), "json");
        assert!(matches!(result, Err(SessionError::NotASolution(_))));
        assert_eq!(session.active().unwrap().source, source);
    }

    #[tokio::test]
    async fn test_execute_without_focus_fails() {
        let session = SessionContext::new(shell_registry(), 1000);
        let result = session.execute_cells(&[], &[0], &NullSink).await;
        assert!(matches!(result, Err(SessionError::NoActiveSolution)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_execute_cells_runs_selected_pairs() {
        let dir = TempDir::new().unwrap();
        let source = solution(
            &dir,
            "cat",
            vec![TestCase::new("a\r\n", "a\r\n"), TestCase::new("b\n", "c\n")],
        );
        let mut session = SessionContext::new(shell_registry(), 5000);
        session.focus(&source, "shell").unwrap();
        let cells = session.cells();

        // Output cell of the first pair, both cells of the second
        let outcomes = session
            .execute_cells(&cells, &[2, 4, 5], &NullSink)
            .await
            .unwrap();

        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[0].index, 1);
        // CRLF normalized on both sides before running and comparing
        assert!(outcomes[0].passed());
        assert_eq!(outcomes[0].result.stdout, "a\n");
        assert_eq!(outcomes[1].index, 4);
        assert!(!outcomes[1].passed());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_retrigger_while_running_is_ignored() {
        let dir = TempDir::new().unwrap();
        let source = solution(&dir, "sleep 1; cat", vec![TestCase::new("x\n", "x\n")]);
        let mut session = SessionContext::new(shell_registry(), 5000);
        session.focus(&source, "shell").unwrap();
        let cells = session.cells();

        let (first, second) = tokio::join!(
            session.execute_cells(&cells, &[1], &NullSink),
            session.execute_cells(&cells, &[2], &NullSink),
        );

        assert_eq!(first.unwrap().len(), 1);
        assert!(second.unwrap().is_empty());

        // Released once the first run finished
        let again = session.execute_cells(&cells, &[1], &NullSink).await.unwrap();
        assert_eq!(again.len(), 1);
        assert!(again[0].passed());
    }

    #[test]
    fn test_cells_render_focused_suite() {
        let dir = TempDir::new().unwrap();
        let source = solution(&dir, "cat", vec![TestCase::new("1", "2")]);
        let mut session = SessionContext::new(shell_registry(), 1000);
        session.focus(&source, "shell").unwrap();

        let cells = session.cells();
        assert_eq!(cells.len(), 3);
        assert_eq!(cells[0].kind, CellKind::Heading);
        assert_eq!(cells[1].kind, CellKind::Input);
        assert_eq!(cells[2].text, "2");
    }
}
