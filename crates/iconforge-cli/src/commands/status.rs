//! Status command implementation

use anyhow::{bail, Result};
use colored::Colorize;
use iconforge_cache::{AssetKey, AssetType, Status};
use serde::Serialize;
use std::path::Path;
use std::process::ExitCode;

use crate::project;

#[derive(Debug, Serialize)]
struct StatusLine {
    key: String,
    asset_type: AssetType,
    status: Status,
}

/// Prints the thumbnail status of every eligible asset, or of `key` alone.
///
/// Thumbnails whose manifest entry is still current are loaded, so they
/// report `ready`; everything else reports `queued`.
pub fn run(
    project_dir: &str,
    config_path: Option<&str>,
    key: Option<&str>,
    json: bool,
) -> Result<ExitCode> {
    let project = project::project_dir(project_dir)?;
    let config = project::load_config(&project, config_path.map(Path::new))?;
    let mut cache = project::build_cache(&project, config);
    cache.initialize(&project);

    let wanted = key.map(AssetKey::new);
    let assets: Vec<(String, AssetType)> = cache
        .eligible_assets()
        .into_iter()
        .filter(|asset| wanted.as_ref().map_or(true, |k| &asset.key == k))
        .map(|asset| (asset.key.to_string(), asset.asset_type))
        .collect();

    if let Some(k) = key {
        if assets.is_empty() {
            cache.shutdown();
            bail!("Not an eligible asset: {}", k);
        }
    }

    let mut lines = Vec::with_capacity(assets.len());
    for (key, asset_type) in assets {
        cache.try_get_icon(&key);
        let status = cache.status(&key);
        lines.push(StatusLine {
            key,
            asset_type,
            status,
        });
    }
    cache.shutdown();

    if json {
        println!("{}", serde_json::to_string_pretty(&lines)?);
        return Ok(ExitCode::SUCCESS);
    }

    let ready = lines.iter().filter(|l| l.status == Status::Ready).count();
    println!("{}", "Thumbnail Status".cyan().bold());
    for line in &lines {
        let status = match line.status {
            Status::Ready => "ready".green(),
            Status::Queued => "stale".yellow(),
            Status::Generating => "generating".blue(),
            Status::Failed => "failed".red(),
            Status::None => "none".dimmed(),
        };
        println!("  {:<10} {:<8} {}", status, line.asset_type.as_str().dimmed(), line.key);
    }
    println!();
    println!("  {}/{} up to date", ready, lines.len());

    Ok(ExitCode::SUCCESS)
}
