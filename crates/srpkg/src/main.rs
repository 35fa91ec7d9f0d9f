//! srpkg - DDS package management tool
//!
//! Creates, deletes and finds node packages. Create and delete act on
//! `<cwd>/<pkg_name>`, so run them from the directory that holds (or will
//! hold) the package.

use anyhow::{Context, Result};
use clap::{Args, Parser};
use dds_core::NodeRegistry;
use srpkg::{PackagePaths, create_package, delete_package, find_package, inspect_package};
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{Level, debug};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "srpkg")]
#[command(about = "DDS package management tool. \
To create and delete packages, you must be in the same directory as the package")]
struct Cli {
    /// Name of package to be created/deleted
    pkg_name: String,

    #[command(flatten)]
    action: Action,

    /// Path to node_registry.json (default: search upwards from the current directory)
    #[arg(long, env = "SRPKG_REGISTRY", value_name = "FILE")]
    registry: Option<PathBuf>,

    /// Skip the delete confirmation prompt
    #[arg(short, long)]
    yes: bool,

    /// Log debug output to stderr
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Args)]
#[group(required = true, multiple = false)]
struct Action {
    /// Create specified package
    #[arg(short, long)]
    create: bool,

    /// Remove specified package
    #[arg(short, long)]
    delete: bool,

    /// Find specified package
    #[arg(short, long)]
    find: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::WARN })
        .with_writer(std::io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            println!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let cwd = std::env::current_dir().context("Failed to read current directory")?;

    let registry_path = match cli.registry {
        Some(path) => path,
        None => NodeRegistry::discover(&cwd).await.context(
            "Could not find node_registry.json in this directory or any parent. \
            Pass --registry or set SRPKG_REGISTRY",
        )?,
    };
    debug!("Using registry {}", registry_path.display());

    let mut registry = NodeRegistry::load(&registry_path).await?;
    let paths = PackagePaths::new(&cwd, cli.pkg_name)?;

    if cli.action.create {
        let entry = create_package(&mut registry, &paths).await?;
        println!("Package: create success");
        println!("Package: '{}' created at '{}'", entry.name, entry.path);
        println!("Package: registered in node_registry");
    } else if cli.action.delete {
        let info = inspect_package(&registry, &paths).await?;
        println!("Found DDS package: {} at '{}'", paths.name, info.location);
        println!("Package size (bytes): {}", info.size_bytes);
        if let Some(created) = info.created {
            println!("Created: {}", created.format("%Y-%m-%d %H:%M:%S"));
        }

        if !cli.yes && !confirm(&format!("Do you really want to delete {} (y/n): ", paths.name)).await? {
            println!("-----");
            println!("Stopping delete...");
            return Ok(ExitCode::SUCCESS);
        }
        println!("-----");

        let entry = delete_package(&mut registry, &paths).await?;
        println!("Package: {} deleted", entry.name);
        println!("Package: {} removed from node registry", entry.name);
    } else if cli.action.find {
        let entry = find_package(&registry, &paths.name)?;
        println!("Package: {} found at '{}'", entry.name, entry.path);
    }

    Ok(ExitCode::SUCCESS)
}

/// Ask a yes/no question on stdin; only `y`/`Y` counts as yes
async fn confirm(prompt: &str) -> Result<bool> {
    let mut stdout = tokio::io::stdout();
    stdout.write_all(prompt.as_bytes()).await?;
    stdout.flush().await?;

    let mut answer = String::new();
    BufReader::new(tokio::io::stdin())
        .read_line(&mut answer)
        .await
        .context("Failed to read confirmation")?;

    Ok(answer.trim().eq_ignore_ascii_case("y"))
}
