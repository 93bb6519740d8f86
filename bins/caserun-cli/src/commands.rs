// CLI commands for managing a solution's test cases
use anyhow::{bail, Context, Result};
use caserun_common::cells::render_cells;
use caserun_common::languages::LanguageRegistry;
use caserun_common::store::{self, StoreError};
use caserun_common::types::{TestCase, TestSuite};
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use tracing::debug;

/// Text for one half of a test case, given inline or read from a file.
#[derive(Debug, Clone, Default)]
pub struct DataArg {
    pub text: Option<String>,
    pub file: Option<String>,
}

impl DataArg {
    pub fn inline(text: &str) -> Self {
        Self {
            text: Some(text.to_string()),
            file: None,
        }
    }

    /// `None` when neither form was given.
    fn resolve(&self) -> Result<Option<String>> {
        match (&self.text, &self.file) {
            (Some(text), _) => Ok(Some(text.clone())),
            (None, Some(path)) => fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path))
                .map(Some),
            (None, None) => Ok(None),
        }
    }
}

/// Convert a 1-based test number from the command line to a position.
fn position_of(number: usize, suite: &TestSuite) -> Result<usize, StoreError> {
    if number == 0 || number > suite.len() {
        return Err(StoreError::NoSuchTest(number));
    }
    Ok(number - 1)
}

/// Create an empty solution document next to `source`
pub fn init_solution(source: &Path) -> Result<()> {
    store::create(source)?;
    println!("✅ Created: {}", store::document_path(source).display());
    println!("\n📋 Next steps:");
    println!("  1. Add a test case: caserun-cli add {} --input '...' --output '...'", source.display());
    println!("  2. Run it: caserun-runner {}", source.display());
    Ok(())
}

/// Append a test case; returns its 1-based number.
pub fn add_test(source: &Path, input: &DataArg, output: &DataArg) -> Result<usize> {
    let mut suite = store::open_existing(source)?;
    let test = TestCase::new(
        input.resolve()?.unwrap_or_default(),
        output.resolve()?.unwrap_or_default(),
    );
    let number = suite.push(test) + 1;
    store::save(source, &suite)?;

    println!("✅ Added Test Case {}", number);
    Ok(number)
}

/// Replace the input and/or expected output of an existing test case.
pub fn set_test(source: &Path, number: usize, input: &DataArg, output: &DataArg) -> Result<()> {
    let input = input.resolve()?;
    let output = output.resolve()?;
    if input.is_none() && output.is_none() {
        bail!("Nothing to change: pass --input/--input-file and/or --output/--output-file");
    }

    let mut suite = store::open_existing(source)?;
    let position = position_of(number, &suite)?;
    if let Some(input) = input {
        suite.set_input(position, input);
    }
    if let Some(output) = output {
        suite.set_output(position, output);
    }
    store::save(source, &suite)?;

    println!("✅ Updated Test Case {}", number);
    Ok(())
}

/// Remove a test case; later test cases are renumbered.
pub fn remove_test(source: &Path, number: usize, yes: bool) -> Result<()> {
    let mut suite = store::open_existing(source)?;
    let position = position_of(number, &suite)?;

    if !yes {
        print!("⚠️  Remove Test Case {} of {}? Later test cases shift down. (y/N): ", number, source.display());
        io::stdout().flush()?;

        let mut answer = String::new();
        io::stdin().read_line(&mut answer)?;
        if !answer.trim().eq_ignore_ascii_case("y") {
            println!("❌ Aborted");
            return Ok(());
        }
    }

    let removed = suite.remove_test(position);
    debug!(number, removed = ?removed, "Removing test case");
    store::save(source, &suite)?;
    println!("🗑️  Removed Test Case {} ({} left)", number, suite.len());
    Ok(())
}

/// Tree view of a solution's test cases
pub fn list_tests(source: &Path) -> Result<()> {
    let suite = store::open_existing(source)?;
    if suite.is_empty() {
        println!("No test cases yet.");
        println!("\n💡 Add one with: caserun-cli add {} --input '...' --output '...'", source.display());
        return Ok(());
    }

    for line in tree_lines(&suite) {
        println!("{}", line);
    }
    println!("\n✅ Total: {} test case(s)", suite.len());
    Ok(())
}

fn tree_lines(suite: &TestSuite) -> Vec<String> {
    let mut lines = Vec::new();
    for test in suite.roots() {
        lines.push(test.label());
        let Some(case) = suite.get(test.position()) else {
            continue;
        };
        let data = [case.input.data.as_str(), case.output.data.as_str()];
        for (child, text) in test.children().into_iter().zip(data) {
            lines.push(format!("  {:<7} {:?}", child.label(), text));
        }
    }
    lines
}

/// Print the flat cell view the runner selects pairs from
pub fn show_cells(source: &Path) -> Result<()> {
    let suite = store::open_existing(source)?;
    let cells = render_cells(&suite);
    println!("{}", serde_json::to_string_pretty(&cells)?);
    Ok(())
}

/// Name and extension columns of the languages table.
fn language_rows(registry: &LanguageRegistry) -> Vec<(String, String)> {
    registry
        .iter()
        .map(|config| (config.name.clone(), config.file_extensions.join(" ")))
        .collect()
}

/// List the languages solutions can be written in
pub fn list_languages() -> Result<()> {
    let registry = LanguageRegistry::load_default().context("Failed to load language configurations")?;
    let rows = language_rows(&registry);
    debug!(languages = rows.len(), "Loaded language registry");

    println!("📋 Supported Languages:\n");
    println!("{:<12} {:<30}", "Name", "Extensions");
    println!("{}", "─".repeat(42));
    for (name, exts) in &rows {
        println!("{:<12} {:<30}", name, exts);
    }
    println!("\n✅ Total: {} language(s)", rows.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn initialized(dir: &TempDir) -> std::path::PathBuf {
        let source = dir.path().join("sol.py");
        init_solution(&source).unwrap();
        source
    }

    #[test]
    fn test_init_refuses_to_overwrite() {
        let dir = TempDir::new().unwrap();
        let source = initialized(&dir);
        add_test(&source, &DataArg::inline("1\n"), &DataArg::inline("2\n")).unwrap();

        assert!(init_solution(&source).is_err());
        assert_eq!(store::open_existing(&source).unwrap().len(), 1);
    }

    #[test]
    fn test_add_set_remove() {
        let dir = TempDir::new().unwrap();
        let source = initialized(&dir);

        assert_eq!(add_test(&source, &DataArg::inline("1\n"), &DataArg::inline("2\n")).unwrap(), 1);
        assert_eq!(add_test(&source, &DataArg::default(), &DataArg::default()).unwrap(), 2);

        set_test(&source, 2, &DataArg::default(), &DataArg::inline("4\n")).unwrap();
        let suite = store::open_existing(&source).unwrap();
        assert_eq!(suite.get(1), Some(&TestCase::new("", "4\n")));

        remove_test(&source, 1, true).unwrap();
        let suite = store::open_existing(&source).unwrap();
        assert_eq!(suite.len(), 1);
        assert_eq!(suite.get(0).unwrap().output.data, "4\n");
    }

    #[test]
    fn test_data_from_file() {
        let dir = TempDir::new().unwrap();
        let source = initialized(&dir);
        let input_path = dir.path().join("in.txt");
        fs::write(&input_path, "3 4\r\n").unwrap();

        let input = DataArg {
            text: None,
            file: Some(input_path.to_string_lossy().into_owned()),
        };
        add_test(&source, &input, &DataArg::inline("7\n")).unwrap();

        // Stored verbatim, line endings included
        let suite = store::open_existing(&source).unwrap();
        assert_eq!(suite.get(0).unwrap().input.data, "3 4\r\n");
    }

    #[test]
    fn test_out_of_range_numbers() {
        let dir = TempDir::new().unwrap();
        let source = initialized(&dir);
        add_test(&source, &DataArg::default(), &DataArg::default()).unwrap();

        let err = set_test(&source, 2, &DataArg::inline("x"), &DataArg::default()).unwrap_err();
        assert!(matches!(err.downcast_ref::<StoreError>(), Some(StoreError::NoSuchTest(2))));
        assert!(remove_test(&source, 0, true).is_err());
    }

    #[test]
    fn test_set_requires_a_change() {
        let dir = TempDir::new().unwrap();
        let source = initialized(&dir);
        add_test(&source, &DataArg::default(), &DataArg::default()).unwrap();
        assert!(set_test(&source, 1, &DataArg::default(), &DataArg::default()).is_err());
    }

    #[test]
    fn test_commands_need_an_existing_document() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("sol.py");
        let err = add_test(&source, &DataArg::default(), &DataArg::default()).unwrap_err();
        assert!(matches!(err.downcast_ref::<StoreError>(), Some(StoreError::NotFound(_))));
    }

    #[test]
    fn test_tree_lines() {
        let suite = TestSuite::from(vec![TestCase::new("1\n", "2\n")]);
        assert_eq!(
            tree_lines(&suite),
            vec![
                "Test Case 1".to_string(),
                "  Input   \"1\\n\"".to_string(),
                "  Output  \"2\\n\"".to_string(),
            ]
        );
    }

    #[test]
    fn test_language_rows_follow_registry() {
        let rows = language_rows(&LanguageRegistry::builtin());
        assert_eq!(
            rows,
            vec![
                ("cpp".to_string(), "cpp cc cxx".to_string()),
                ("python".to_string(), "py".to_string()),
            ]
        );
    }

    #[test]
    fn test_language_file_is_shared_with_runner() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("languages.json");
        fs::write(
            &path,
            r#"{ "languages": [ { "name": "shell", "file_extensions": ["sh"],
                 "run": { "command": "sh", "args": ["{source}"] } } ] }"#,
        )
        .unwrap();
        let rows = language_rows(&LanguageRegistry::load(&path).unwrap());
        assert_eq!(rows, vec![("shell".to_string(), "sh".to_string())]);

        // An empty list is rejected here exactly as the runner rejects it
        fs::write(&path, r#"{ "languages": [] }"#).unwrap();
        assert!(LanguageRegistry::load(&path).is_err());
    }
}
