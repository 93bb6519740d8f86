// Shared defaults for every caserun tool

/// Extension that replaces the source file's extension to locate its tests.
pub const DOCUMENT_EXTENSION: &str = "tests.json";

/// Wall-clock budget for one test case run.
pub const DEFAULT_TIMEOUT_MS: u64 = 1000;

/// Cell language ids that hold plain test data.
pub const DATA_LANGUAGES: &[&str] = &["plaintext"];

pub fn is_data_language(language_id: &str) -> bool {
    DATA_LANGUAGES.contains(&language_id)
}

/// Timeout from `CASERUN_TIMEOUT_MS`, falling back to the default.
pub fn timeout_ms_from_env() -> u64 {
    std::env::var("CASERUN_TIMEOUT_MS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_TIMEOUT_MS)
}
