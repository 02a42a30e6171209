//! Installer errors.

use std::path::PathBuf;

use thiserror::Error;
use tracing::warn;

use crate::config::{ConfigError, EnvFileError};
use crate::system::{CommandRunner, Invocation, SystemError};

/// Errors that stop the installation.
#[derive(Debug, Error)]
pub enum InstallError {
    #[error("{tool} is not installed. {hint}")]
    MissingPrerequisite { tool: String, hint: String },

    #[error("No repository URL configured and no checkout found in {}", .app_dir.display())]
    MissingRepoUrl { app_dir: PathBuf },

    #[error("`{command}` failed with {}", describe_code(.code.as_ref().copied()))]
    ToolFailed { command: String, code: Option<i32> },

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    EnvFile(#[from] EnvFileError),

    #[error(transparent)]
    System(#[from] SystemError),
}

impl InstallError {
    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}

fn describe_code(code: Option<i32>) -> String {
    code.map_or_else(|| "a signal".to_owned(), |c| format!("exit code {c}"))
}

/// Runs an external tool and applies the failure policy.
///
/// Returns `Ok(true)` on success and `Ok(false)` when the tool failed but
/// `keep_going` allowed the run to continue.
pub(crate) async fn run_tool<R: CommandRunner>(
    runner: &R,
    invocation: Invocation,
    keep_going: bool,
) -> Result<bool, InstallError> {
    let output = runner.run(&invocation).await?;
    if output.success() {
        return Ok(true);
    }

    if keep_going {
        warn!(
            "`{}` failed with {}, continuing",
            invocation,
            describe_code(output.code)
        );
        Ok(false)
    } else {
        Err(InstallError::ToolFailed {
            command: invocation.to_string(),
            code: output.code,
        })
    }
}
