//! Clear command implementation

use anyhow::{Context, Result};
use colored::Colorize;
use std::process::ExitCode;

use crate::project;

/// Deletes the project's thumbnail cache directory.
pub fn run(project_dir: &str) -> Result<ExitCode> {
    let project = project::project_dir(project_dir)?;
    let cache_dir = project::cache_dir(&project);

    println!("{}", "Clearing thumbnail cache...".cyan().bold());

    if !cache_dir.exists() {
        println!("  {}", "Cache is already empty".dimmed());
        return Ok(ExitCode::SUCCESS);
    }

    let count = std::fs::read_dir(&cache_dir)
        .map(|entries| entries.filter_map(|e| e.ok()).count())
        .unwrap_or(0);
    std::fs::remove_dir_all(&cache_dir)
        .with_context(|| format!("Failed to remove {}", cache_dir.display()))?;

    println!(
        "  {} Removed {} cache {}",
        "SUCCESS".green().bold(),
        count,
        if count == 1 { "file" } else { "files" }
    );

    Ok(ExitCode::SUCCESS)
}
