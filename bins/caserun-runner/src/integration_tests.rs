// End-to-end tests against the real toolchains of the built-in registry
//
// These run a solution through launcher, engine and evaluator exactly as
// the binary does. They need `python3` or `g++` on PATH and are ignored
// by default:
//
//     cargo test -p caserun-runner -- --ignored

#[cfg(test)]
mod builtin_languages {
    use caserun_common::languages::LanguageRegistry;
    use crate::evaluator::Verdict;
    use crate::executor::{run_batch, NullSink, Pair};
    use crate::launcher::LaunchError;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn write_source(dir: &TempDir, name: &str, code: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, code).unwrap();
        path
    }

    fn pair(index: usize, input: &str, expected: &str) -> Pair {
        Pair {
            index,
            input: input.to_string(),
            expected: expected.to_string(),
        }
    }

    #[tokio::test]
    #[ignore] // Requires python3
    async fn test_python_doubles_input() {
        let dir = TempDir::new().unwrap();
        let source = write_source(&dir, "double.py", "n = int(input())\nprint(n * 2)\n");

        let outcomes = run_batch(
            &LanguageRegistry::builtin(),
            &source,
            "python",
            &[pair(1, "5\n", "10\n"), pair(4, "7\n", "15\n")],
            5000,
            &NullSink,
        )
        .await
        .unwrap();

        assert_eq!(outcomes[0].verdict(), Verdict::Passed);
        assert_eq!(outcomes[1].verdict(), Verdict::WrongAnswer);
        assert_eq!(outcomes[1].result.stdout, "14\n");
    }

    #[tokio::test]
    #[ignore] // Requires python3
    async fn test_python_exception_is_runtime_error() {
        let dir = TempDir::new().unwrap();
        let source = write_source(&dir, "boom.py", "raise ValueError('boom')\n");

        let outcomes = run_batch(
            &LanguageRegistry::builtin(),
            &source,
            "python",
            &[pair(1, "", "")],
            5000,
            &NullSink,
        )
        .await
        .unwrap();

        assert_eq!(outcomes[0].verdict(), Verdict::RuntimeError);
        assert_eq!(outcomes[0].result.exit_code, Some(1));
        assert!(outcomes[0].result.stderr.contains("ValueError"));
    }

    #[tokio::test]
    #[ignore] // Requires python3
    async fn test_python_infinite_loop_times_out() {
        let dir = TempDir::new().unwrap();
        let source = write_source(&dir, "spin.py", "while True:\n    pass\n");

        let outcomes = run_batch(
            &LanguageRegistry::builtin(),
            &source,
            "python",
            &[pair(1, "", "")],
            300,
            &NullSink,
        )
        .await
        .unwrap();

        assert_eq!(outcomes[0].verdict(), Verdict::TimeLimitExceeded);
        assert!(outcomes[0].result.exit_code.is_none());
    }

    #[tokio::test]
    #[ignore] // Requires g++
    async fn test_cpp_builds_once_and_runs_every_pair() {
        let dir = TempDir::new().unwrap();
        let source = write_source(
            &dir,
            "double.cpp",
            "#include <iostream>\nint main(){long long n;std::cin>>n;std::cout<<n*2<<\"\\n\";}\n",
        );

        let outcomes = run_batch(
            &LanguageRegistry::builtin(),
            &source,
            "cpp",
            &[pair(1, "1\n", "2\n"), pair(4, "21\n", "42\n"), pair(7, "-3\n", "-6\n")],
            5000,
            &NullSink,
        )
        .await
        .unwrap();

        assert_eq!(outcomes.len(), 3);
        assert!(outcomes.iter().all(|o| o.passed()));
    }

    #[tokio::test]
    #[ignore] // Requires g++
    async fn test_cpp_compile_error_runs_nothing() {
        let dir = TempDir::new().unwrap();
        let source = write_source(&dir, "broken.cpp", "int main( { return 0; }\n");

        let result = run_batch(
            &LanguageRegistry::builtin(),
            &source,
            "cpp",
            &[pair(1, "", "")],
            5000,
            &NullSink,
        )
        .await;

        match result {
            Err(LaunchError::BuildError { diagnostics }) => assert!(!diagnostics.is_empty()),
            other => panic!("expected build error, got {:?}", other),
        }
    }
}
