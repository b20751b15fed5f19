//! Check command implementation.

use crate::models::config::Config;
use crate::preflight;
use crate::Result;
use colored::Colorize;

/// Report whether ffmpeg and ffprobe can be run.
pub async fn check(config: &Config) -> Result<()> {
    println!("{}", "Checking dependencies...".bold());
    println!();

    let results = preflight::run_preflight_checks(&config.tools).await;
    preflight::print_results(&results);
    println!();

    preflight::ensure_passed(&results)?;
    println!("{}", "[OK] All dependencies found".green());
    Ok(())
}
