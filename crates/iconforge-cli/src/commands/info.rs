//! Info command implementation

use anyhow::Result;
use colored::Colorize;
use iconforge_cache::{ManifestStore, CACHE_FORMAT_VERSION, MANIFEST_FILE};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::project;

/// Summary of a project's thumbnail cache directory.
#[derive(Debug, Serialize)]
pub struct CacheInfo {
    pub cache_dir: PathBuf,
    pub format_version: u32,
    pub manifest_entries: usize,
    pub thumbnail_count: usize,
    pub total_size_bytes: u64,
}

/// Reads the cache directory without indexing the project.
pub fn collect(project: &Path) -> Result<CacheInfo> {
    let cache_dir = project::cache_dir(project);
    let manifest = ManifestStore::load(cache_dir.join(MANIFEST_FILE));

    let mut thumbnail_count = 0;
    let mut total_size_bytes = 0;
    if cache_dir.is_dir() {
        for entry in std::fs::read_dir(&cache_dir)? {
            let entry = entry?;
            let metadata = entry.metadata()?;
            if !metadata.is_file() {
                continue;
            }
            total_size_bytes += metadata.len();
            if entry.path().extension().is_some_and(|ext| ext == "png") {
                thumbnail_count += 1;
            }
        }
    }

    Ok(CacheInfo {
        cache_dir,
        format_version: CACHE_FORMAT_VERSION,
        manifest_entries: manifest.len(),
        thumbnail_count,
        total_size_bytes,
    })
}

/// Show cache information
pub fn run(project_dir: &str, json: bool) -> Result<ExitCode> {
    let project = project::project_dir(project_dir)?;
    let info = collect(&project)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(ExitCode::SUCCESS);
    }

    println!("{}", "Thumbnail Cache".cyan().bold());
    println!(
        "  {}: {}",
        "Cache directory".dimmed(),
        info.cache_dir.display()
    );
    println!("  {}: {}", "Format version".dimmed(), info.format_version);
    println!("  {}: {}", "Manifest entries".dimmed(), info.manifest_entries);
    println!("  {}: {}", "Thumbnails".dimmed(), info.thumbnail_count);

    let size_mb = info.total_size_bytes as f64 / (1024.0 * 1024.0);
    if size_mb >= 1.0 {
        println!("  {}: {:.2} MB", "Total size".dimmed(), size_mb);
    } else {
        let size_kb = info.total_size_bytes as f64 / 1024.0;
        println!("  {}: {:.2} KB", "Total size".dimmed(), size_kb);
    }

    Ok(ExitCode::SUCCESS)
}
