//! Preflight checks module.

mod ffmpeg;
mod ffprobe;

use crate::models::config::ToolsConfig;
use crate::{Error, Result};
use colored::Colorize;

/// Result of a preflight check.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub success: bool,
    pub message: String,
    pub hint: Option<String>,
}

impl CheckResult {
    pub fn ok(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            success: true,
            message: message.to_string(),
            hint: None,
        }
    }

    pub fn fail(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            success: false,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }
}

/// Run all preflight checks.
pub async fn run_preflight_checks(tools: &ToolsConfig) -> Vec<CheckResult> {
    vec![
        ffmpeg::check(&tools.ffmpeg).await,
        ffprobe::check(&tools.ffprobe).await,
    ]
}

/// Print preflight check results.
pub fn print_results(results: &[CheckResult]) {
    for result in results {
        if result.success {
            println!(
                "{} {}: {}",
                "[OK]".green(),
                result.name.bold(),
                result.message
            );
        } else {
            println!(
                "{} {}: {}",
                "[FAIL]".red(),
                result.name.bold(),
                result.message
            );
            if let Some(ref hint) = result.hint {
                println!("  {} {}", "->".yellow(), hint);
            }
        }
    }
}

/// Check if all preflight checks passed.
pub fn all_passed(results: &[CheckResult]) -> bool {
    results.iter().all(|r| r.success)
}

/// Turn failed checks into a [`Error::DependencyMissing`].
pub fn ensure_passed(results: &[CheckResult]) -> Result<()> {
    let missing: Vec<&str> = results
        .iter()
        .filter(|r| !r.success)
        .map(|r| r.name.as_str())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(Error::DependencyMissing(missing.join(", ")))
    }
}
