// Language registry shared by the runner and the CLI
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Placeholder replaced by the solution source path.
pub const SOURCE_PLACEHOLDER: &str = "{source}";
/// Placeholder replaced by the build artifact path.
pub const ARTIFACT_PLACEHOLDER: &str = "{artifact}";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandTemplate {
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl CommandTemplate {
    fn new(command: &str, args: &[&str]) -> Self {
        Self {
            command: command.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }

    /// Substitute `{source}` and `{artifact}` in command and args.
    pub fn render(&self, source: &Path, artifact: &Path) -> (String, Vec<String>) {
        let source = source.to_string_lossy();
        let artifact = artifact.to_string_lossy();
        let fill = |s: &str| {
            s.replace(SOURCE_PLACEHOLDER, &source)
                .replace(ARTIFACT_PLACEHOLDER, &artifact)
        };
        (fill(&self.command), self.args.iter().map(|a| fill(a)).collect())
    }
}

/// Capability record for one language: an optional build step and the
/// command that runs the source (or the artifact the build produced).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageConfig {
    pub name: String,
    pub file_extensions: Vec<String>,
    #[serde(default)]
    pub build: Option<CommandTemplate>,
    pub run: CommandTemplate,
}

#[derive(Debug, Serialize, Deserialize)]
struct LanguagesJson {
    languages: Vec<LanguageConfig>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("no languages configured in {0}")]
    Empty(PathBuf),
}

/// Registry mapping a language id to its capability record.
/// Adding a language is adding an entry; dispatch never changes.
#[derive(Debug, Clone)]
pub struct LanguageRegistry {
    configs: BTreeMap<String, LanguageConfig>,
}

impl Default for LanguageRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl LanguageRegistry {
    /// The two supported solution languages: python and cpp.
    pub fn builtin() -> Self {
        let python = LanguageConfig {
            name: "python".to_string(),
            file_extensions: vec!["py".to_string()],
            build: None,
            run: CommandTemplate::new(python_command(), &[SOURCE_PLACEHOLDER]),
        };
        let cpp = LanguageConfig {
            name: "cpp".to_string(),
            file_extensions: vec!["cpp".to_string(), "cc".to_string(), "cxx".to_string()],
            build: Some(CommandTemplate::new(
                "g++",
                &["-std=c++17", "-O2", "-o", ARTIFACT_PLACEHOLDER, SOURCE_PLACEHOLDER],
            )),
            run: CommandTemplate::new(ARTIFACT_PLACEHOLDER, &[]),
        };
        Self::from_configs(vec![python, cpp])
    }

    pub fn from_configs(configs: Vec<LanguageConfig>) -> Self {
        Self {
            configs: configs.into_iter().map(|c| (c.name.clone(), c)).collect(),
        }
    }

    /// Load language configurations from a languages.json file
    pub fn load(config_path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(config_path).map_err(|e| ConfigError::Read {
            path: config_path.to_path_buf(),
            source: e,
        })?;

        let languages_json: LanguagesJson =
            serde_json::from_str(&content).map_err(|e| ConfigError::Parse {
                path: config_path.to_path_buf(),
                source: e,
            })?;

        if languages_json.languages.is_empty() {
            return Err(ConfigError::Empty(config_path.to_path_buf()));
        }

        Ok(Self::from_configs(languages_json.languages))
    }

    /// `CASERUN_LANGUAGES` if set, else `config/languages.json` if present,
    /// else the built-in registry.
    pub fn load_default() -> Result<Self, ConfigError> {
        if let Ok(path) = std::env::var("CASERUN_LANGUAGES") {
            return Self::load(Path::new(&path));
        }
        let default_path = Path::new("config/languages.json");
        if default_path.exists() {
            Self::load(default_path)
        } else {
            Ok(Self::builtin())
        }
    }

    pub fn get_config(&self, language_id: &str) -> Option<&LanguageConfig> {
        self.configs.get(language_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &LanguageConfig> {
        self.configs.values()
    }

    pub fn is_supported(&self, language_id: &str) -> bool {
        self.configs.contains_key(language_id)
    }

    /// Infer the language id of a source file from its extension.
    pub fn language_for_path(&self, path: &Path) -> Option<&str> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        self.configs
            .values()
            .find(|c| c.file_extensions.iter().any(|e| e.trim_start_matches('.') == ext))
            .map(|c| c.name.as_str())
    }

    pub fn list_languages(&self) -> Vec<String> {
        self.configs.keys().cloned().collect()
    }
}

fn python_command() -> &'static str {
    if cfg!(windows) {
        "py"
    } else {
        "python3"
    }
}
