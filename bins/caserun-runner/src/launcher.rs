/// Program Launcher - turns a solution source into a RunPlan
///
/// Interpreted languages wrap the source directly. Compiled languages run
/// their build step first and wrap the produced artifact. Nothing is
/// cached: every call rebuilds, so callers that need a fresh artifact just
/// call `prepare` again.
use caserun_common::languages::LanguageRegistry;
use caserun_common::types::RunPlan;
use std::path::{Path, PathBuf};
use std::time::Instant;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("unsupported solution language: {0}")]
    UnsupportedLanguage(String),
    #[error("build failed:\n{diagnostics}")]
    BuildError { diagnostics: String },
    #[error("solution source not found: {0}")]
    MissingSource(PathBuf),
    #[error("failed to run build tool `{command}`: {source}")]
    Io {
        command: String,
        source: std::io::Error,
    },
}

/// Path of the executable a build step produces for `source`.
pub fn artifact_path(source: &Path) -> PathBuf {
    source.with_extension(std::env::consts::EXE_EXTENSION)
}

#[tracing::instrument(skip(registry, source), fields(source = %source.display()))]
pub async fn prepare(
    registry: &LanguageRegistry,
    source: &Path,
    language_id: &str,
) -> Result<RunPlan, LaunchError> {
    let config = registry
        .get_config(language_id)
        .ok_or_else(|| LaunchError::UnsupportedLanguage(language_id.to_string()))?;

    let source = absolute(source);
    if !source.is_file() {
        return Err(LaunchError::MissingSource(source));
    }
    let artifact = artifact_path(&source);

    if let Some(build) = &config.build {
        let (command, args) = build.render(&source, &artifact);
        debug!(command = %command, ?args, "Building solution");

        let start = Instant::now();
        let output = Command::new(&command)
            .args(&args)
            .output()
            .await
            .map_err(|e| LaunchError::Io {
                command: command.clone(),
                source: e,
            })?;

        if !output.status.success() {
            let mut diagnostics = String::from_utf8_lossy(&output.stderr).into_owned();
            diagnostics.push_str(&String::from_utf8_lossy(&output.stdout));
            warn!(
                exit_code = ?output.status.code(),
                "Build failed"
            );
            return Err(LaunchError::BuildError { diagnostics });
        }

        info!(
            language = language_id,
            build_ms = start.elapsed().as_millis() as u64,
            artifact = %artifact.display(),
            "Build succeeded"
        );
    }

    let (command, args) = config.run.render(&source, &artifact);
    Ok(RunPlan::new(command, args))
}

fn absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    match std::env::current_dir() {
        Ok(cwd) => cwd.join(path),
        Err(_) => path.to_path_buf(),
    }
}
