use serde::{Deserialize, Serialize};
use std::fmt;

/// The input half of a test case.
///
/// Owned by its [`TestCase`]; the parent is reached through [`Node::parent`]
/// rather than a stored pointer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TestInput {
    pub data: String,
}

/// The expected-output half of a test case.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TestOutput {
    pub data: String,
}

/// One input/expected-output pair. Identity is its position in the suite.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TestCase {
    pub input: TestInput,
    pub output: TestOutput,
}

impl TestCase {
    pub fn new(input: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            input: TestInput { data: input.into() },
            output: TestOutput { data: output.into() },
        }
    }
}

pub fn normalize_line_endings(text: &str) -> String {
    text.replace("\r\n", "\n")
}

/// Addressable element of a suite, used for navigation and labels.
///
/// Input and Output nodes carry their parent's position, so upward
/// navigation never needs a back-pointer into the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Node {
    Test(usize),
    Input(usize),
    Output(usize),
}

impl Node {
    pub fn position(&self) -> usize {
        match *self {
            Node::Test(i) | Node::Input(i) | Node::Output(i) => i,
        }
    }

    pub fn label(&self) -> String {
        match self {
            Node::Test(i) => format!("Test Case {}", i + 1),
            Node::Input(_) => "Input".to_string(),
            Node::Output(_) => "Output".to_string(),
        }
    }

    pub fn parent(&self) -> Option<Node> {
        match *self {
            Node::Test(_) => None,
            Node::Input(i) | Node::Output(i) => Some(Node::Test(i)),
        }
    }

    pub fn children(&self) -> Vec<Node> {
        match *self {
            Node::Test(i) => vec![Node::Input(i), Node::Output(i)],
            Node::Input(_) | Node::Output(_) => Vec::new(),
        }
    }
}

type ChangeListener = Box<dyn Fn(&TestSuite) + Send + Sync>;

/// Ordered collection of test cases belonging to one solution.
///
/// Every mutation notifies the registered listeners after it is applied.
#[derive(Default)]
pub struct TestSuite {
    tests: Vec<TestCase>,
    listeners: Vec<ChangeListener>,
}

impl fmt::Debug for TestSuite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestSuite")
            .field("tests", &self.tests)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl PartialEq for TestSuite {
    fn eq(&self, other: &Self) -> bool {
        self.tests == other.tests
    }
}

impl From<Vec<TestCase>> for TestSuite {
    fn from(tests: Vec<TestCase>) -> Self {
        Self {
            tests,
            listeners: Vec::new(),
        }
    }
}

impl TestSuite {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tests.is_empty()
    }

    pub fn get(&self, position: usize) -> Option<&TestCase> {
        self.tests.get(position)
    }

    pub fn tests(&self) -> &[TestCase] {
        &self.tests
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &TestCase)> {
        self.tests.iter().enumerate()
    }

    /// Top-level nodes, one per test case.
    pub fn roots(&self) -> Vec<Node> {
        (0..self.tests.len()).map(Node::Test).collect()
    }

    pub fn subscribe<F>(&mut self, listener: F)
    where
        F: Fn(&TestSuite) + Send + Sync + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    /// Append an empty test case and return its position.
    pub fn add_test(&mut self) -> usize {
        self.push(TestCase::default())
    }

    pub fn push(&mut self, test: TestCase) -> usize {
        self.tests.push(test);
        self.notify();
        self.tests.len() - 1
    }

    /// Remove the case at `position`; later cases shift down by one.
    pub fn remove_test(&mut self, position: usize) -> Option<TestCase> {
        if position >= self.tests.len() {
            return None;
        }
        let removed = self.tests.remove(position);
        self.notify();
        Some(removed)
    }

    pub fn set_input(&mut self, position: usize, data: impl Into<String>) -> bool {
        let Some(test) = self.tests.get_mut(position) else {
            return false;
        };
        test.input.data = data.into();
        self.notify();
        true
    }

    pub fn set_output(&mut self, position: usize, data: impl Into<String>) -> bool {
        let Some(test) = self.tests.get_mut(position) else {
            return false;
        };
        test.output.data = data.into();
        self.notify();
        true
    }

    fn notify(&self) {
        for listener in &self.listeners {
            listener(self);
        }
    }
}

/// Command plus arguments that launches a prepared solution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunPlan {
    pub command: String,
    pub args: Vec<String>,
}

impl RunPlan {
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            args,
        }
    }
}

impl fmt::Display for RunPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.command)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Raw outcome of one bounded process run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// `None` means the process was killed after the timeout expired.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub execution_time_ms: u64,
    /// Set when feeding stdin failed, e.g. the program exited without
    /// reading all of its input.
    pub input_error: Option<String>,
}

impl ExecutionResult {
    pub fn timed_out(&self) -> bool {
        self.exit_code.is_none()
    }

    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellKind {
    /// Non-data separator, e.g. a "Test Case n" title.
    Heading,
    Input,
    Output,
}

/// One entry of the flat editing surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub kind: CellKind,
    #[serde(rename = "languageId")]
    pub language_id: String,
    pub text: String,
}

impl Cell {
    pub fn new(kind: CellKind, language_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            kind,
            language_id: language_id.into(),
            text: text.into(),
        }
    }
}
