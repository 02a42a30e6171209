//! Python virtual environment provisioning.

use serde::Serialize;
use tracing::{info, warn};

use super::{InstallError, run_tool};
use crate::config::InstallSettings;
use crate::system::{CommandRunner, Invocation};

/// Result of the provisioning step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RuntimeOutcome {
    /// A new virtual environment was created.
    pub venv_created: bool,
    /// `pip install` ran and succeeded.
    pub dependencies_installed: bool,
}

/// Creates the virtual environment if needed, then installs dependencies.
pub async fn provision_runtime<R: CommandRunner>(
    settings: &InstallSettings,
    runner: &R,
) -> Result<RuntimeOutcome, InstallError> {
    let mut outcome = RuntimeOutcome::default();
    let venv = settings.venv_path();

    if settings.venv_python().exists() {
        info!("Reusing virtual environment at {}", venv.display());
    } else {
        info!("Creating virtual environment at {}", venv.display());
        outcome.venv_created = run_tool(
            runner,
            Invocation::new(settings.python.as_str())
                .args(["-m", "venv"])
                .arg(venv.display().to_string())
                .current_dir(&settings.app_dir),
            settings.keep_going,
        )
        .await?;
    }

    let requirements = settings.requirements_path();
    if !requirements.exists() {
        warn!(
            "{} not found, skipping dependency installation",
            requirements.display()
        );
        return Ok(outcome);
    }

    info!("Installing dependencies from {}", requirements.display());
    outcome.dependencies_installed = run_tool(
        runner,
        Invocation::new(settings.venv_pip().display().to_string())
            .args(["install", "-r"])
            .arg(requirements.display().to_string())
            .current_dir(&settings.app_dir),
        settings.keep_going,
    )
    .await?;

    Ok(outcome)
}
