//! systemd unit rendering and installation.
//!
//! The installed unit is compared against the one rendered from the current
//! settings and rewritten when they differ, so path or user changes reach
//! systemd on the next run.

use std::io::Write as _;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info};

use super::{InstallError, run_tool};
use crate::config::InstallSettings;
use crate::system::{CommandRunner, Invocation};

/// Search path appended after the virtual environment's `bin`.
const SYSTEM_PATH: &str = "/usr/local/sbin:/usr/local/bin:/usr/sbin:/usr/bin:/sbin:/bin";

/// The fields of the generated unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceUnit {
    pub description: String,
    pub user: String,
    pub working_directory: PathBuf,
    pub search_path: String,
    pub exec_start: String,
    pub restart_sec: u64,
}

impl ServiceUnit {
    /// Builds the unit for the configured checkout and virtual environment.
    #[must_use]
    pub fn from_settings(settings: &InstallSettings) -> Self {
        let venv_bin = settings.venv_path().join("bin");
        Self {
            description: settings.description.clone(),
            user: settings.run_as.clone(),
            working_directory: settings.app_dir.clone(),
            search_path: format!("{}:{SYSTEM_PATH}", venv_bin.display()),
            exec_start: format!(
                "{} {}",
                quote_arg(&settings.venv_python()),
                quote_arg(&settings.entry_path())
            ),
            restart_sec: settings.restart_sec,
        }
    }

    /// Renders the unit file contents.
    #[must_use]
    pub fn render(&self) -> String {
        format!(
            r#"[Unit]
Description={description}
After=network.target

[Service]
Type=simple
User={user}
WorkingDirectory={working_directory}
Environment="PATH={search_path}"
ExecStart={exec_start}
Restart=always
RestartSec={restart_sec}

[Install]
WantedBy=multi-user.target
"#,
            description = self.description,
            user = self.user,
            working_directory = self.working_directory.display(),
            search_path = self.search_path,
            exec_start = self.exec_start,
            restart_sec = self.restart_sec,
        )
    }
}

/// Quotes an `ExecStart=` argument when it contains whitespace.
fn quote_arg(path: &Path) -> String {
    let s = path.display().to_string();
    if s.chars().any(char::is_whitespace) {
        format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
    } else {
        s
    }
}

/// How the installed unit compares to the rendered one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitState {
    Missing,
    Drifted,
    InSync,
}

/// Compares the installed unit file with `desired`.
pub fn inspect_unit(path: &Path, desired: &str) -> Result<UnitState, InstallError> {
    match std::fs::read_to_string(path) {
        Ok(current) if current.trim_end() == desired.trim_end() => Ok(UnitState::InSync),
        Ok(_) => Ok(UnitState::Drifted),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(UnitState::Missing),
        Err(e) => Err(InstallError::io(
            format!("Failed to read {}", path.display()),
            e,
        )),
    }
}

/// Reads the `User=` line of an installed unit.
#[must_use]
pub fn installed_unit_user(path: &Path) -> Option<String> {
    let contents = std::fs::read_to_string(path).ok()?;
    contents
        .lines()
        .find_map(|line| line.trim().strip_prefix("User="))
        .map(|user| user.trim().to_owned())
        .filter(|user| !user.is_empty())
}

/// What the installer did to the unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitOutcome {
    Created,
    Updated { backup: PathBuf },
    Unchanged,
}

/// Writes the unit when missing or drifted, then reloads and enables it.
///
/// An unchanged unit triggers no systemd calls at all.
pub async fn apply_unit<R: CommandRunner>(
    settings: &InstallSettings,
    runner: &R,
) -> Result<UnitOutcome, InstallError> {
    let unit_path = settings.unit_path();
    let desired = ServiceUnit::from_settings(settings).render();

    let outcome = match inspect_unit(&unit_path, &desired)? {
        UnitState::InSync => {
            info!("{} is up to date", unit_path.display());
            return Ok(UnitOutcome::Unchanged);
        }
        UnitState::Missing => {
            info!("Creating {}", unit_path.display());
            UnitOutcome::Created
        }
        UnitState::Drifted => {
            let backup = backup_path(&unit_path);
            info!(
                "{} differs from the expected unit, backing it up to {}",
                unit_path.display(),
                backup.display()
            );
            copy_file(settings, runner, &unit_path, &backup).await?;
            UnitOutcome::Updated { backup }
        }
    };

    write_unit(settings, runner, &unit_path, &desired).await?;

    let systemctl = |args: &[&str]| {
        Invocation::new("systemctl")
            .args(args.iter().copied())
            .elevated(settings.use_sudo)
    };
    run_tool(runner, systemctl(&["daemon-reload"]), settings.keep_going).await?;
    run_tool(
        runner,
        systemctl(&["enable", settings.service_name.as_str()]),
        settings.keep_going,
    )
    .await?;

    Ok(outcome)
}

fn backup_path(unit_path: &Path) -> PathBuf {
    let stamp = chrono::Local::now().format("%Y%m%d%H%M%S");
    let mut name = unit_path.as_os_str().to_owned();
    name.push(format!(".{stamp}.bak"));
    PathBuf::from(name)
}

/// Writes directly when we own the unit directory, otherwise through
/// a temporary file and `sudo install`.
async fn write_unit<R: CommandRunner>(
    settings: &InstallSettings,
    runner: &R,
    unit_path: &Path,
    contents: &str,
) -> Result<(), InstallError> {
    if !settings.use_sudo {
        return std::fs::write(unit_path, contents)
            .map_err(|e| InstallError::io(format!("Failed to write {}", unit_path.display()), e));
    }

    let staging = stage_unit(contents)?;
    debug!("Staged unit at {}", staging.path().display());

    run_tool(
        runner,
        Invocation::new("install")
            .args(["-m", "0644"])
            .arg(staging.path().display().to_string())
            .arg(unit_path.display().to_string())
            .elevated(true),
        settings.keep_going,
    )
    .await
    .map(|_| ())
}

/// Writes `contents` to a freshly created, randomly named `0600` file in the
/// temp directory. The file is removed when the handle drops.
fn stage_unit(contents: &str) -> Result<tempfile::NamedTempFile, InstallError> {
    let stage_err = |e| InstallError::io("Failed to stage unit file", e);

    let mut staging = tempfile::Builder::new()
        .prefix("zenload-unit-")
        .suffix(".tmp")
        .tempfile()
        .map_err(stage_err)?;
    staging.write_all(contents.as_bytes()).map_err(stage_err)?;
    staging.as_file().sync_all().map_err(stage_err)?;
    Ok(staging)
}

async fn copy_file<R: CommandRunner>(
    settings: &InstallSettings,
    runner: &R,
    from: &Path,
    to: &Path,
) -> Result<(), InstallError> {
    if !settings.use_sudo {
        return std::fs::copy(from, to)
            .map(|_| ())
            .map_err(|e| InstallError::io(format!("Failed to back up {}", from.display()), e));
    }

    run_tool(
        runner,
        Invocation::new("cp")
            .arg("-p")
            .arg(from.display().to_string())
            .arg(to.display().to_string())
            .elevated(true),
        settings.keep_going,
    )
    .await
    .map(|_| ())
}
