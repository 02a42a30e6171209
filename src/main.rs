//! Zenload Installer - Main Entry Point
//!
//! Interactively deploys the Zenload Telegram bot: secrets, checkout,
//! virtual environment and systemd service.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use zenload_installer::config::InstallSettings;
use zenload_installer::install::{
    EnvOutcome, InstallError, InstallReport, Installer, RepoOutcome, ServiceOutcome, UnitOutcome,
};
use zenload_installer::system::{SystemRunner, TerminalPrompter, is_root};

/// Exit status used when the operator interrupts the run.
const EXIT_INTERRUPTED: i32 = 130;

/// Installs or updates the Zenload bot as a systemd service.
#[derive(Parser, Debug)]
#[command(name = "zenload_install")]
#[command(about = "Install or update the Zenload Telegram bot as a systemd service")]
#[command(version)]
struct Args {
    /// Directory holding the bot checkout (defaults to the current directory).
    #[arg(short, long)]
    dir: Option<PathBuf>,

    /// Repository to clone when no checkout exists yet.
    #[arg(long)]
    repo_url: Option<String>,

    /// Branch to clone or track.
    #[arg(long)]
    branch: Option<String>,

    /// systemd service name.
    #[arg(long)]
    service_name: Option<String>,

    /// User the service runs as (defaults to $USER).
    #[arg(long)]
    user: Option<String>,

    /// Directory the unit file is installed into.
    #[arg(long)]
    unit_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Keep going when an external tool fails instead of aborting.
    #[arg(long)]
    keep_going: bool,

    /// Start the service without asking.
    #[arg(short, long)]
    yes: bool,

    /// Never prefix privileged commands with sudo.
    #[arg(long)]
    no_sudo: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    // Initialize logging
    init_logging(&args.log_level);

    // Optional ZENLOAD_* overrides
    if let Err(e) = dotenvy::from_filename("installer.env") {
        debug!("Could not load installer.env: {}", e);
    }

    let settings = match build_settings(&args).await {
        Ok(settings) => settings,
        Err(e) => {
            error!("{e:#}");
            return ExitCode::FAILURE;
        }
    };

    let installer = Installer::new(settings, SystemRunner, TerminalPrompter);

    let result = tokio::select! {
        result = installer.run() => result,
        _ = tokio::signal::ctrl_c() => {
            error!("Interrupted, installation incomplete");
            // A prompt may still hold a blocking thread; dropping the runtime would wait for it.
            std::process::exit(EXIT_INTERRUPTED);
        }
    };

    match result {
        Ok(report) => {
            print_summary(&report, &installer.settings().service_name);
            ExitCode::SUCCESS
        }
        Err(InstallError::MissingPrerequisite { tool, hint }) => {
            eprintln!("✗ {tool} is not installed.");
            eprintln!("  {hint}");
            ExitCode::FAILURE
        }
        Err(e) => {
            error!("Installation failed: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Initializes the logging subsystem.
fn init_logging(level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Merges environment defaults with command-line overrides.
async fn build_settings(args: &Args) -> Result<InstallSettings> {
    let mut settings = InstallSettings::from_env_with_defaults()
        .context("Failed to load installer settings")?;

    if let Some(dir) = &args.dir {
        settings.app_dir = if dir.is_absolute() {
            dir.clone()
        } else {
            std::env::current_dir()
                .context("Failed to determine the current directory")?
                .join(dir)
        };
    }
    if let Some(url) = &args.repo_url {
        settings.repo_url = Some(url.clone());
    }
    if let Some(branch) = &args.branch {
        settings.branch.clone_from(branch);
    }
    if let Some(name) = &args.service_name {
        settings.service_name.clone_from(name);
    }
    if let Some(user) = &args.user {
        settings.run_as.clone_from(user);
    }
    if let Some(dir) = &args.unit_dir {
        settings.unit_dir.clone_from(dir);
    }
    settings.keep_going = args.keep_going;
    settings.assume_yes = args.yes;
    settings.use_sudo = !args.no_sudo && !is_root(&SystemRunner).await;

    settings.validate().context("Invalid installer settings")?;

    info!(
        "Installing into {} as service '{}' (user: {}, sudo: {})",
        settings.app_dir.display(),
        settings.service_name,
        settings.run_as,
        settings.use_sudo
    );

    Ok(settings)
}

fn print_summary(report: &InstallReport, service: &str) {
    println!();
    println!("✓ Installation finished");

    let env = match report.env {
        EnvOutcome::Kept => "kept existing file",
        EnvOutcome::Created { .. } => "created",
    };
    println!("  .env:        {env}");

    let repo = match report.repository {
        RepoOutcome::Cloned => "cloned",
        RepoOutcome::Updated => "updated",
        RepoOutcome::SyncFailed => "sync failed (continued)",
    };
    println!("  repository:  {repo}");

    println!(
        "  venv:        {}{}",
        if report.runtime.venv_created { "created" } else { "reused" },
        if report.runtime.dependencies_installed {
            ", dependencies installed"
        } else {
            ", dependencies NOT installed"
        }
    );

    match &report.unit {
        UnitOutcome::Created => println!("  unit:        created and enabled"),
        UnitOutcome::Updated { backup } => {
            println!("  unit:        updated (previous copy: {})", backup.display());
        }
        UnitOutcome::Unchanged => println!("  unit:        unchanged"),
    }

    let state = match report.service {
        ServiceOutcome::Restarted => "restarted",
        ServiceOutcome::Started => "started",
        ServiceOutcome::LeftStopped => "not started",
    };
    println!("  service:     {state}");

    println!("\nUseful commands:");
    println!("  sudo systemctl status {service}");
    println!("  sudo journalctl -u {service} -f");
    if report.service == ServiceOutcome::LeftStopped {
        println!("  sudo systemctl start {service}");
    }
}
