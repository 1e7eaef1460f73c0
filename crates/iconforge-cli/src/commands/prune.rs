//! Prune command implementation

use anyhow::{Context, Result};
use colored::Colorize;
use iconforge_cache::MANIFEST_FILE;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::process::ExitCode;

use crate::project;

/// Drops thumbnails of assets that no longer exist, plus files in the cache
/// directory that no manifest entry refers to. Nothing is rendered.
pub fn run(project_dir: &str, config_path: Option<&str>, json: bool) -> Result<ExitCode> {
    let project = project::project_dir(project_dir)?;
    let config = project::load_config(&project, config_path.map(Path::new))?;
    let mut cache = project::build_cache(&project, config);

    let mut pruned = cache.initialize(&project);
    pruned.extend(cache.on_assets_changed(None));

    let mut orphans = 0usize;
    if let (Some(dir), Some(manifest)) = (cache.cache_dir(), cache.manifest()) {
        let referenced: HashSet<&str> = manifest
            .manifest()
            .entries
            .values()
            .map(|entry| entry.icon_file.as_str())
            .collect();
        orphans = remove_orphans(dir, &referenced)?;
    }
    cache.shutdown();

    if json {
        let keys: Vec<String> = pruned.iter().map(|k| k.to_string()).collect();
        let report = serde_json::json!({ "pruned": keys, "orphaned_files": orphans });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(ExitCode::SUCCESS);
    }

    println!("{}", "Pruning thumbnail cache...".cyan().bold());
    if pruned.is_empty() && orphans == 0 {
        println!("  {}", "Nothing to prune".dimmed());
    }
    for key in &pruned {
        println!("  {} {}", "removed".yellow(), key);
    }
    if orphans > 0 {
        println!(
            "  {} Deleted {} orphaned {}",
            "SUCCESS".green().bold(),
            orphans,
            if orphans == 1 { "file" } else { "files" }
        );
    }

    Ok(ExitCode::SUCCESS)
}

fn remove_orphans(dir: &Path, referenced: &HashSet<&str>) -> Result<usize> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to read cache directory: {}", dir.display()))
        }
    };

    let mut removed = 0;
    for entry in entries {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if name == MANIFEST_FILE || referenced.contains(name) {
            continue;
        }
        let thumbnail = name.ends_with(".png") || name.ends_with(".png.partial");
        if !thumbnail {
            continue;
        }
        fs::remove_file(entry.path())
            .with_context(|| format!("Failed to delete {}", entry.path().display()))?;
        removed += 1;
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_remove_orphans_keeps_referenced_and_foreign_files() {
        let dir = TempDir::new().unwrap();
        for name in ["keep.png", "orphan.png", "stale.png.partial", MANIFEST_FILE, "notes.txt"] {
            fs::write(dir.path().join(name), b"x").unwrap();
        }
        let referenced: HashSet<&str> = ["keep.png"].into_iter().collect();

        assert_eq!(remove_orphans(dir.path(), &referenced).unwrap(), 2);
        assert!(dir.path().join("keep.png").exists());
        assert!(dir.path().join(MANIFEST_FILE).exists());
        assert!(dir.path().join("notes.txt").exists());
        assert!(!dir.path().join("orphan.png").exists());
        assert!(!dir.path().join("stale.png.partial").exists());
    }

    #[test]
    fn test_remove_orphans_missing_dir() {
        let dir = TempDir::new().unwrap();
        let referenced = HashSet::new();
        assert_eq!(remove_orphans(&dir.path().join("nope"), &referenced).unwrap(), 0);
    }
}
