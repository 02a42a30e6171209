//! Standalone health check for a Zenload installation.
//!
//! Inspects the secrets file, checkout, virtual environment, systemd unit
//! and service state without changing anything.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use zenload_installer::config::InstallSettings;
use zenload_installer::install::{CheckStatus, InspectionReport, inspect_host, installed_unit_user};
use zenload_installer::system::SystemRunner;

/// Zenload installation checker.
#[derive(Parser, Debug)]
#[command(name = "check_install")]
#[command(about = "Checks a Zenload bot installation without modifying it")]
#[command(version)]
struct Args {
    /// Directory holding the bot checkout (defaults to the current directory).
    #[arg(short, long)]
    dir: Option<PathBuf>,

    /// systemd service name.
    #[arg(long)]
    service_name: Option<String>,

    /// User the service is expected to run as (defaults to the installed unit's `User=`).
    #[arg(long)]
    user: Option<String>,

    /// Directory the unit file is installed into.
    #[arg(long)]
    unit_dir: Option<PathBuf>,

    /// Print the report as JSON.
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    // Same ZENLOAD_* overrides the installer reads
    let _ = dotenvy::from_filename("installer.env");

    let mut settings = match InstallSettings::from_env_with_defaults() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("✗ Failed to load settings: {e}");
            return ExitCode::FAILURE;
        }
    };
    if let Some(dir) = args.dir {
        settings.app_dir = std::path::absolute(&dir).unwrap_or(dir);
    }
    if let Some(name) = args.service_name {
        settings.service_name = name;
    }
    if let Some(dir) = args.unit_dir {
        settings.unit_dir = dir;
    }
    if let Some(user) = args.user {
        settings.run_as = user;
    } else if std::env::var_os("ZENLOAD_USER").is_none() {
        if let Some(user) = installed_unit_user(&settings.unit_path()) {
            settings.run_as = user;
        }
    }

    let search_path = std::env::var_os("PATH").unwrap_or_default();
    let report = inspect_host(&settings, &SystemRunner, &search_path).await;

    if args.json {
        let output = serde_json::json!({ "settings": settings, "report": report });
        match serde_json::to_string_pretty(&output) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("✗ Failed to serialize report: {e}");
                return ExitCode::FAILURE;
            }
        }
    } else {
        println!("Checking: {}\n", settings.app_dir.display());
        print_report(&report);
    }

    if report.is_healthy() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn print_report(report: &InspectionReport) {
    for item in &report.items {
        let mark = match item.status {
            CheckStatus::Ok => "✓",
            CheckStatus::Warning => "⚠",
            CheckStatus::Error => "✗",
        };
        println!("{mark} {:<20} {}", item.name, item.detail);
    }

    println!();

    let errors = report.count(CheckStatus::Error);
    let warnings = report.count(CheckStatus::Warning);
    if errors == 0 {
        println!("✓ Installation looks healthy");
        if warnings > 0 {
            println!("  ({warnings} warning(s))");
        }
    } else {
        println!("✗ {errors} problem(s) found, {warnings} warning(s)");
        println!("  Run zenload_install to fix them.");
    }
}
