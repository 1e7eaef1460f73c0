//! Regenerate command implementation

use anyhow::{bail, Result};
use colored::Colorize;
use iconforge_cache::{AssetKey, TickOutcome};
use std::path::Path;
use std::process::ExitCode;
use std::time::Duration;

use crate::project;

/// Re-renders the thumbnail for `key`, ignoring the manifest.
pub fn run(project_dir: &str, config_path: Option<&str>, key: &str) -> Result<ExitCode> {
    let project = project::project_dir(project_dir)?;
    let config = project::load_config(&project, config_path.map(Path::new))?;
    let mut renderer = project::renderer(&config);
    let mut cache = project::build_cache(&project, config);
    cache.initialize(&project);

    if !cache.regenerate_icon(key) {
        cache.shutdown();
        bail!("Not an eligible asset: {}", key);
    }
    let target = AssetKey::new(key);

    // Jobs queued by `initialize` ahead of the target run first; current
    // thumbnails among them resolve as cache hits.
    let outcome = loop {
        match cache.tick(&mut renderer) {
            TickOutcome::Throttled => {
                let wait = cache.time_until_next_job().unwrap_or(Duration::ZERO);
                std::thread::sleep(wait.max(Duration::from_millis(1)));
            }
            TickOutcome::Idle => break TickOutcome::Idle,
            outcome if outcome_key(&outcome) == Some(&target) => break outcome,
            other => tracing::debug!(?other, "job ahead of regenerate target"),
        }
    };
    cache.shutdown();

    match outcome {
        TickOutcome::Generated(key) => {
            println!("{} {}", "SUCCESS".green().bold(), key);
            Ok(ExitCode::SUCCESS)
        }
        TickOutcome::Failed(key) => {
            println!("{} {}", "FAILED".red().bold(), key);
            Ok(ExitCode::from(1))
        }
        other => bail!("Unexpected tick outcome: {:?}", other),
    }
}

fn outcome_key(outcome: &TickOutcome) -> Option<&AssetKey> {
    match outcome {
        TickOutcome::CacheHit(key)
        | TickOutcome::Generated(key)
        | TickOutcome::Failed(key) => Some(key),
        TickOutcome::Idle | TickOutcome::Throttled => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_key() {
        let key = AssetKey::new("models/ship.glb");
        assert_eq!(outcome_key(&TickOutcome::Generated(key.clone())), Some(&key));
        assert_eq!(outcome_key(&TickOutcome::Failed(key.clone())), Some(&key));
        assert_eq!(outcome_key(&TickOutcome::Throttled), None);
        assert_eq!(outcome_key(&TickOutcome::Idle), None);
    }
}
