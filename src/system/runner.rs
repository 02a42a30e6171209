//! External command execution.
//!
//! Every tool the installer drives (`git`, `pip`, `systemctl`, ...) goes
//! through [`CommandRunner`], so the pipeline can be exercised without
//! touching the host.

use std::fmt;
use std::path::PathBuf;
use std::process::Stdio;

use tokio::process::Command;
use tracing::debug;

use super::SystemError;

/// Whether a command's output is shown to the operator or collected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Child shares the installer's terminal.
    Inherit,
    /// Stdout and stderr are captured into [`CommandOutput`].
    Capture,
}

/// A fully resolved command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    program: String,
    args: Vec<String>,
    cwd: Option<PathBuf>,
    mode: OutputMode,
}

impl Invocation {
    /// Creates an invocation of `program` with no arguments.
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            mode: OutputMode::Inherit,
        }
    }

    /// Appends one argument.
    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Appends several arguments.
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Runs the command from `dir`.
    #[must_use]
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    /// Collects output instead of forwarding it to the terminal.
    #[must_use]
    pub const fn captured(mut self) -> Self {
        self.mode = OutputMode::Capture;
        self
    }

    /// Wraps the command in `sudo` when `use_sudo` is set.
    #[must_use]
    pub fn elevated(self, use_sudo: bool) -> Self {
        if !use_sudo {
            return self;
        }
        let mut args = Vec::with_capacity(self.args.len() + 1);
        args.push(self.program);
        args.extend(self.args);
        Self {
            program: "sudo".to_owned(),
            args,
            cwd: self.cwd,
            mode: self.mode,
        }
    }

    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Result of a finished command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` when killed by a signal.
    pub code: Option<i32>,
    /// Captured stdout (empty for inherited output).
    pub stdout: String,
    /// Captured stderr (empty for inherited output).
    pub stderr: String,
}

impl CommandOutput {
    /// A successful, silent result.
    #[must_use]
    pub fn ok() -> Self {
        Self::with_code(0)
    }

    /// A silent result with the given exit code.
    #[must_use]
    pub fn with_code(code: i32) -> Self {
        Self {
            code: Some(code),
            ..Self::default()
        }
    }

    /// Whether the command exited with status 0.
    #[must_use]
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Something that can run external commands.
#[allow(async_fn_in_trait)]
pub trait CommandRunner {
    /// Runs the command to completion.
    ///
    /// A non-zero exit is not an error here; callers decide what it means.
    async fn run(&self, invocation: &Invocation) -> Result<CommandOutput, SystemError>;
}

/// Runs commands on the local host.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    async fn run(&self, invocation: &Invocation) -> Result<CommandOutput, SystemError> {
        debug!("Running: {invocation}");

        let mut command = Command::new(&invocation.program);
        command.args(&invocation.args).stdin(Stdio::inherit());
        if let Some(dir) = &invocation.cwd {
            command.current_dir(dir);
        }

        let spawn_err = |source| SystemError::Spawn {
            command: invocation.to_string(),
            source,
        };

        match invocation.mode {
            OutputMode::Inherit => {
                let status = command
                    .stdout(Stdio::inherit())
                    .stderr(Stdio::inherit())
                    .status()
                    .await
                    .map_err(spawn_err)?;
                Ok(CommandOutput {
                    code: status.code(),
                    ..CommandOutput::default()
                })
            }
            OutputMode::Capture => {
                let output = command.output().await.map_err(spawn_err)?;
                Ok(CommandOutput {
                    code: output.status.code(),
                    stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                    stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                })
            }
        }
    }
}

/// Checks whether the installer runs as root, by asking `id -u`.
///
/// Any failure to run `id` is treated as "not root".
pub async fn is_root<R: CommandRunner>(runner: &R) -> bool {
    match runner.run(&Invocation::new("id").arg("-u").captured()).await {
        Ok(output) if output.success() => output.stdout.trim() == "0",
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::testing::FakeRunner;

    #[test]
    fn test_display_joins_arguments() {
        let inv = Invocation::new("git").args(["pull", "--ff-only"]);
        assert_eq!(inv.to_string(), "git pull --ff-only");
    }

    #[test]
    fn test_elevated_prefixes_sudo() {
        let inv = Invocation::new("systemctl")
            .arg("daemon-reload")
            .elevated(true);
        assert_eq!(inv.program(), "sudo");
        assert_eq!(inv.to_string(), "sudo systemctl daemon-reload");
    }

    #[test]
    fn test_elevated_without_sudo_is_unchanged() {
        let inv = Invocation::new("systemctl").arg("daemon-reload");
        assert_eq!(inv.clone().elevated(false), inv);
    }

    #[tokio::test]
    async fn test_is_root_reads_uid() {
        let runner = FakeRunner::new().respond(
            "id -u",
            CommandOutput {
                code: Some(0),
                stdout: "0\n".to_owned(),
                stderr: String::new(),
            },
        );
        assert!(is_root(&runner).await);

        let runner = FakeRunner::new().respond(
            "id -u",
            CommandOutput {
                code: Some(0),
                stdout: "1000\n".to_owned(),
                stderr: String::new(),
            },
        );
        assert!(!is_root(&runner).await);
    }

    #[tokio::test]
    async fn test_system_runner_reports_exit_code() {
        let runner = SystemRunner;
        let output = runner
            .run(&Invocation::new("sh").args(["-c", "exit 3"]).captured())
            .await
            .unwrap();
        assert_eq!(output.code, Some(3));
        assert!(!output.success());
    }

    #[tokio::test]
    async fn test_system_runner_spawn_failure() {
        let runner = SystemRunner;
        let result = runner
            .run(&Invocation::new("definitely-not-a-real-tool-zenload"))
            .await;
        assert!(matches!(result, Err(SystemError::Spawn { .. })));
    }
}
