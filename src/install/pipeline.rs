//! End-to-end installation pipeline.
//!
//! Steps always run in this order:
//! 1. Prerequisites (`python3`, `git` on `PATH`)
//! 2. `.env` secrets
//! 3. Repository clone/pull
//! 4. Virtual environment + dependencies
//! 5. systemd unit (declarative apply)
//! 6. Service restart or start

use std::ffi::OsString;

use serde::Serialize;
use tracing::info;

use super::{
    EnvOutcome, InstallError, RepoOutcome, RuntimeOutcome, ServiceOutcome, UnitOutcome,
    apply_unit, configure_env, drive_service, provision_runtime, sync_repository,
};
use crate::config::InstallSettings;
use crate::system::{CommandRunner, Prompter, first_missing_in, required_tools};

/// Summary of one installer run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstallReport {
    pub env: EnvOutcome,
    pub repository: RepoOutcome,
    pub runtime: RuntimeOutcome,
    pub unit: UnitOutcome,
    pub service: ServiceOutcome,
    /// The repository was cloned or the unit created on this run.
    pub fresh_install: bool,
}

/// Runs the installation steps against a host.
pub struct Installer<R, P> {
    settings: InstallSettings,
    runner: R,
    prompter: P,
    search_path: OsString,
}

impl<R: CommandRunner, P: Prompter> Installer<R, P> {
    /// Creates an installer that looks up prerequisites on the current `PATH`.
    #[must_use]
    pub fn new(settings: InstallSettings, runner: R, prompter: P) -> Self {
        Self {
            settings,
            runner,
            prompter,
            search_path: std::env::var_os("PATH").unwrap_or_default(),
        }
    }

    /// Overrides the `PATH` used for prerequisite checks.
    #[must_use]
    pub fn with_search_path(mut self, search_path: impl Into<OsString>) -> Self {
        self.search_path = search_path.into();
        self
    }

    #[must_use]
    pub const fn settings(&self) -> &InstallSettings {
        &self.settings
    }

    /// Runs every step. Stops at the first error.
    pub async fn run(&self) -> Result<InstallReport, InstallError> {
        let settings = &self.settings;
        settings.validate()?;
        self.check_prerequisites()?;

        info!("[1/5] Configuring environment");
        let env = configure_env(settings, &self.prompter).await?;

        info!("[2/5] Synchronising repository");
        let repository = sync_repository(settings, &self.runner).await?;

        info!("[3/5] Provisioning Python runtime");
        let runtime = provision_runtime(settings, &self.runner).await?;

        info!("[4/5] Installing service unit");
        let unit = apply_unit(settings, &self.runner).await?;

        let fresh_install = repository == RepoOutcome::Cloned || unit == UnitOutcome::Created;

        info!(
            "[5/5] Managing service ({})",
            if fresh_install { "fresh install" } else { "update" }
        );
        let service = drive_service(settings, &self.runner, &self.prompter, fresh_install).await?;

        Ok(InstallReport {
            env,
            repository,
            runtime,
            unit,
            service,
            fresh_install,
        })
    }

    fn check_prerequisites(&self) -> Result<(), InstallError> {
        let tools = required_tools(&self.settings.python);
        match first_missing_in(&tools, &self.search_path) {
            Some(missing) => Err(InstallError::MissingPrerequisite {
                tool: missing.program.clone(),
                hint: missing.hint.clone(),
            }),
            None => Ok(()),
        }
    }
}
