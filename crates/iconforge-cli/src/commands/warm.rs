//! Warm command implementation
//!
//! Drives the cache until every eligible asset has a current thumbnail.

use anyhow::Result;
use colored::Colorize;
use iconforge_cache::{CacheStats, TickOutcome};
use std::path::Path;
use std::process::ExitCode;
use std::time::Duration;

use crate::project;

/// Run the warm command
///
/// # Arguments
/// * `project_dir` - Project directory
/// * `config_path` - Optional config file overriding `<project>/iconforge.json`
/// * `max_jobs` - Stop after this many jobs (cache hits included)
/// * `json` - Print stats as JSON instead of colored text
///
/// # Returns
/// Exit code: 0 if every job succeeded, 1 if any thumbnail failed
pub fn run(
    project_dir: &str,
    config_path: Option<&str>,
    max_jobs: Option<usize>,
    json: bool,
) -> Result<ExitCode> {
    let project = project::project_dir(project_dir)?;
    let config = project::load_config(&project, config_path.map(Path::new))?;
    let mut renderer = project::renderer(&config);
    let mut cache = project::build_cache(&project, config);

    let pruned = cache.initialize(&project);

    if !json {
        println!(
            "{} {} ({} queued)",
            "Warming thumbnails in".cyan().bold(),
            project.display(),
            cache.stats().queue_length
        );
        if !pruned.is_empty() {
            println!("  {} pruned {} stale entries", "INFO".blue().bold(), pruned.len());
        }
    }

    let mut jobs = 0usize;
    loop {
        if max_jobs.is_some_and(|max| jobs >= max) {
            tracing::info!(jobs, "job limit reached, leaving the rest queued");
            break;
        }
        match cache.tick(&mut renderer) {
            TickOutcome::Idle => break,
            TickOutcome::Throttled => {
                let wait = cache.time_until_next_job().unwrap_or(Duration::ZERO);
                std::thread::sleep(wait.max(Duration::from_millis(1)));
            }
            outcome => {
                jobs += 1;
                if !json {
                    print_outcome(&outcome);
                }
            }
        }
    }

    let stats = cache.stats();
    tracing::debug!(
        generated = stats.total_generated,
        hits = stats.cache_hits,
        failed = stats.total_failed,
        "warm finished"
    );
    cache.shutdown();

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        print_stats(&stats);
    }

    if stats.total_failed > 0 {
        Ok(ExitCode::from(1))
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

fn print_outcome(outcome: &TickOutcome) {
    match outcome {
        TickOutcome::Generated(key) => println!("  {} {}", "generated".green(), key),
        TickOutcome::CacheHit(key) => println!("  {} {}", "cached".dimmed(), key),
        TickOutcome::Failed(key) => println!("  {} {}", "FAILED".red().bold(), key),
        TickOutcome::Idle | TickOutcome::Throttled => {}
    }
}

pub(crate) fn print_stats(stats: &CacheStats) {
    println!();
    println!("{}", "Summary".cyan().bold());
    println!("  {}: {}", "Generated".dimmed(), stats.total_generated);
    println!("  {}: {}", "Cache hits".dimmed(), stats.cache_hits);
    if stats.total_failed > 0 {
        println!("  {}: {}", "Failed".red(), stats.total_failed);
    } else {
        println!("  {}: 0", "Failed".dimmed());
    }
    println!("  {}: {}", "Still queued".dimmed(), stats.queue_length);
    if let Some(last) = stats.last_generation {
        println!(
            "  {}: {:.1} ms",
            "Last generation".dimmed(),
            last.as_secs_f64() * 1000.0
        );
    }
}
