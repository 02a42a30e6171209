//! Service start/restart after installation.

use serde::Serialize;
use tracing::info;

use super::{InstallError, run_tool};
use crate::config::InstallSettings;
use crate::system::{CommandRunner, Invocation, Prompter};

/// What happened to the running service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceOutcome {
    /// Service was running and got restarted to pick up the update.
    Restarted,
    /// Service was stopped and the operator chose to start it.
    Started,
    /// Service was stopped and the operator declined to start it.
    LeftStopped,
}

/// Asks systemd whether the service is running.
pub async fn is_active<R: CommandRunner>(runner: &R, service_name: &str) -> Result<bool, InstallError> {
    let output = runner
        .run(
            &Invocation::new("systemctl")
                .args(["is-active", "--quiet", service_name])
                .captured(),
        )
        .await?;
    Ok(output.success())
}

/// Restarts an active service, or offers to start an inactive one.
pub async fn drive_service<R: CommandRunner, P: Prompter>(
    settings: &InstallSettings,
    runner: &R,
    prompter: &P,
    fresh_install: bool,
) -> Result<ServiceOutcome, InstallError> {
    let name = settings.service_name.as_str();
    let systemctl = |action: &str| {
        Invocation::new("systemctl")
            .args([action, name])
            .elevated(settings.use_sudo)
    };

    if is_active(runner, name).await? {
        info!("Restarting {name}");
        run_tool(runner, systemctl("restart"), settings.keep_going).await?;
        return Ok(ServiceOutcome::Restarted);
    }

    let question = if fresh_install {
        format!("Installation complete. Start {name} now?")
    } else {
        format!("{name} is not running. Start it now?")
    };
    let start = settings.assume_yes || prompter.confirm(&question, false).await?;
    if !start {
        info!("Leaving {name} stopped");
        return Ok(ServiceOutcome::LeftStopped);
    }

    info!("Starting {name}");
    run_tool(runner, systemctl("start"), settings.keep_going).await?;
    Ok(ServiceOutcome::Started)
}
