//! meridian-workspace CLI.

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use meridian_workspace::config::{self, WorkspaceConfig};
use meridian_workspace::probe::{self, ProbeCategory};
use meridian_workspace::remote::RemoteMetadata;
use meridian_workspace::sync::{SyncEngine, SyncOptions};

#[derive(Parser, Debug)]
#[command(
    name = "meridian-workspace",
    version,
    about = "Version intelligence and manifest synchronization for the Meridian workspace"
)]
struct Cli {
    #[arg(
        long,
        global = true,
        help = "Workspace root (defaults to the nearest directory containing workspace.toml)"
    )]
    root: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Report installed-tool versions by category
    Probe {
        #[arg(long)]
        browsers: bool,
        #[arg(long)]
        managers: bool,
        #[arg(long)]
        runtimes: bool,
        #[arg(long)]
        node_tools: bool,
        #[arg(long)]
        system: bool,
        #[arg(long, help = "Output machine-readable JSON")]
        json: bool,
    },
    /// Pin every dependency specifier to an exact version
    PinVersions {
        #[command(flatten)]
        run: RunArgs,
    },
    /// Sync the runtime engines constraint to the active LTS lines
    SyncEngines {
        #[command(flatten)]
        run: RunArgs,
    },
    /// Sync dependency specifiers to resolved workspace/installed versions
    SyncVersions {
        #[command(flatten)]
        run: RunArgs,
    },
    /// Sync license, author, and repository metadata from the workspace root
    SyncMetadata {
        #[command(flatten)]
        run: RunArgs,
    },
}

#[derive(clap::Args, Debug)]
struct RunArgs {
    #[arg(long, help = "Report intended changes without writing files")]
    dry_run: bool,
    #[arg(long, help = "Write updated manifests back in place")]
    write: bool,
}

impl RunArgs {
    fn options(&self) -> SyncOptions {
        SyncOptions {
            dry_run: self.dry_run,
            replace_file: self.write,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            ExitCode::from(1)
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Probe {
            browsers,
            managers,
            runtimes,
            node_tools,
            system,
            json,
        } => {
            let mut selection = Vec::new();
            if browsers {
                selection.push(ProbeCategory::Browsers);
            }
            if managers {
                selection.push(ProbeCategory::Managers);
            }
            if runtimes {
                selection.push(ProbeCategory::Runtimes);
            }
            if node_tools {
                selection.push(ProbeCategory::NodeTools);
            }
            if system {
                selection.push(ProbeCategory::System);
            }
            if selection.is_empty() {
                selection.extend(ProbeCategory::ALL);
            }

            let results = probe::probe_all(&selection).await;
            if json {
                println!("{}", serde_json::to_string_pretty(&results)?);
            } else {
                for (category, versions) in &results {
                    println!("\n{}", category.as_str().bright_white().bold());
                    if versions.is_empty() {
                        println!("  {}", "(none detected)".dimmed());
                    }
                    for (tool, version) in versions {
                        println!("  {:<16} {}", tool, version.green());
                    }
                }
            }
            Ok(())
        }
        Commands::PinVersions { run } => {
            let (config, remote) = load_workspace(cli.root.as_deref())?;
            let engine = SyncEngine::new(&config, &remote);
            let options = run.options();
            let outcome = engine.pin_versions(&options).await?;
            outcome.print("Pin dependency versions", &options);
            Ok(())
        }
        Commands::SyncEngines { run } => {
            let (config, remote) = load_workspace(cli.root.as_deref())?;
            let engine = SyncEngine::new(&config, &remote);
            let options = run.options();
            let outcome = engine.sync_engines(&options).await?;
            outcome.print("Sync LTS engine constraints", &options);
            Ok(())
        }
        Commands::SyncVersions { run } => {
            let (config, remote) = load_workspace(cli.root.as_deref())?;
            let engine = SyncEngine::new(&config, &remote);
            let options = run.options();
            let outcome = engine.sync_versions(&options).await?;
            outcome.print("Sync dependency versions", &options);
            Ok(())
        }
        Commands::SyncMetadata { run } => {
            let (config, remote) = load_workspace(cli.root.as_deref())?;
            let engine = SyncEngine::new(&config, &remote);
            let options = run.options();
            let outcome = engine.sync_metadata(&options).await?;
            outcome.print("Sync manifest metadata", &options);
            Ok(())
        }
    }
}

fn load_workspace(root: Option<&Path>) -> Result<(WorkspaceConfig, RemoteMetadata)> {
    let config = load_config(root)?;
    let remote =
        RemoteMetadata::with_endpoints(config.schedule_url.clone(), config.license_url.clone());
    Ok((config, remote))
}

fn load_config(root: Option<&Path>) -> Result<WorkspaceConfig> {
    let root = match root {
        Some(dir) => dir.to_path_buf(),
        None => config::find_workspace_root(std::env::current_dir()?)?,
    };
    WorkspaceConfig::load(root)
}
