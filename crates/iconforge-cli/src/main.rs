//! iconforge CLI - thumbnail cache host for game projects
//!
//! Warms, inspects and maintains the asset preview cache under
//! `<project>/.cache/asset-icons`.

use clap::{Parser, Subcommand};
use std::process::ExitCode;

use iconforge_cli::{commands, logging};

/// iconforge - Incremental asset thumbnail cache
#[derive(Parser)]
#[command(name = "iconforge")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug). ICONFORGE_LOG overrides.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate every missing or stale thumbnail
    Warm {
        /// Project directory
        #[arg(short, long, default_value = ".")]
        project: String,

        /// Config file (default: <project>/iconforge.json if present)
        #[arg(short, long)]
        config: Option<String>,

        /// Stop after this many jobs
        #[arg(long)]
        max_jobs: Option<usize>,

        /// Output machine-readable JSON stats (no colored output)
        #[arg(long)]
        json: bool,
    },

    /// Show the thumbnail status of project assets
    Status {
        /// Project directory
        #[arg(short, long, default_value = ".")]
        project: String,

        /// Config file (default: <project>/iconforge.json if present)
        #[arg(short, long)]
        config: Option<String>,

        /// Only show this asset key
        #[arg(short, long)]
        key: Option<String>,

        /// Output machine-readable JSON (no colored output)
        #[arg(long)]
        json: bool,
    },

    /// Re-render one thumbnail even if it is up to date
    Regenerate {
        /// Project directory
        #[arg(short, long, default_value = ".")]
        project: String,

        /// Config file (default: <project>/iconforge.json if present)
        #[arg(short, long)]
        config: Option<String>,

        /// Asset key (project-relative path)
        #[arg(short, long)]
        key: String,
    },

    /// Remove thumbnails of deleted assets and orphaned cache files
    Prune {
        /// Project directory
        #[arg(short, long, default_value = ".")]
        project: String,

        /// Config file (default: <project>/iconforge.json if present)
        #[arg(short, long)]
        config: Option<String>,

        /// Output machine-readable JSON (no colored output)
        #[arg(long)]
        json: bool,
    },

    /// Show cache directory information
    Info {
        /// Project directory
        #[arg(short, long, default_value = ".")]
        project: String,

        /// Output machine-readable JSON (no colored output)
        #[arg(long)]
        json: bool,
    },

    /// Delete the thumbnail cache directory
    Clear {
        /// Project directory
        #[arg(short, long, default_value = ".")]
        project: String,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Warm {
            project,
            config,
            max_jobs,
            json,
        } => commands::warm::run(&project, config.as_deref(), max_jobs, json),
        Commands::Status {
            project,
            config,
            key,
            json,
        } => commands::status::run(&project, config.as_deref(), key.as_deref(), json),
        Commands::Regenerate {
            project,
            config,
            key,
        } => commands::regenerate::run(&project, config.as_deref(), &key),
        Commands::Prune {
            project,
            config,
            json,
        } => commands::prune::run(&project, config.as_deref(), json),
        Commands::Info { project, json } => commands::info::run(&project, json),
        Commands::Clear { project } => commands::clear::run(&project),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {:#}", colored::Colorize::red("error"), e);
            ExitCode::from(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_warm() {
        let cli = Cli::try_parse_from([
            "iconforge",
            "-vv",
            "warm",
            "--project",
            "game",
            "--max-jobs",
            "5",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Warm {
                project,
                config,
                max_jobs,
                json,
            } => {
                assert_eq!(project, "game");
                assert_eq!(config, None);
                assert_eq!(max_jobs, Some(5));
                assert!(!json);
            }
            _ => panic!("expected warm command"),
        }
    }

    #[test]
    fn test_cli_regenerate_requires_key() {
        assert!(Cli::try_parse_from(["iconforge", "regenerate"]).is_err());
        let cli = Cli::try_parse_from(["iconforge", "regenerate", "-k", "models/ship.glb"]).unwrap();
        match cli.command {
            Commands::Regenerate { project, key, .. } => {
                assert_eq!(project, ".");
                assert_eq!(key, "models/ship.glb");
            }
            _ => panic!("expected regenerate command"),
        }
    }

    #[test]
    fn test_cli_defaults_project_to_cwd() {
        let cli = Cli::try_parse_from(["iconforge", "info", "--json"]).unwrap();
        match cli.command {
            Commands::Info { project, json } => {
                assert_eq!(project, ".");
                assert!(json);
            }
            _ => panic!("expected info command"),
        }
    }

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
