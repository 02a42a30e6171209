//! Host interaction module.
//!
//! Wraps everything that touches the machine outside the installer's own
//! files: child processes, terminal prompts and `PATH` lookups.

mod prerequisites;
mod prompt;
mod runner;

#[cfg(test)]
pub(crate) mod testing;

pub use prerequisites::{Prerequisite, find_in, first_missing_in, required_tools};
pub use prompt::{Prompter, TerminalPrompter};
pub use runner::{CommandOutput, CommandRunner, Invocation, OutputMode, SystemRunner, is_root};

/// Errors raised while talking to the host.
#[derive(Debug, thiserror::Error)]
pub enum SystemError {
    #[error("Failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Prompt failed: {0}")]
    Prompt(#[from] dialoguer::Error),

    #[error("Prompt task failed: {0}")]
    PromptTask(#[from] tokio::task::JoinError),
}
