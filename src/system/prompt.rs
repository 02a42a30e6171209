//! Operator prompts.
//!
//! dialoguer blocks on the terminal, so each prompt runs on tokio's blocking
//! pool and the installer's future stays cancellable while it waits.

use dialoguer::{Confirm, Password};

use super::SystemError;

/// Asks the operator for input.
#[allow(async_fn_in_trait)]
pub trait Prompter {
    /// Reads one line of hidden input. Empty answers are accepted.
    async fn secret(&self, prompt: &str) -> Result<String, SystemError>;

    /// Asks a yes/no question.
    async fn confirm(&self, prompt: &str, default: bool) -> Result<bool, SystemError>;
}

/// Prompts on the controlling terminal.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    async fn secret(&self, prompt: &str) -> Result<String, SystemError> {
        let prompt = prompt.to_owned();
        let answer = tokio::task::spawn_blocking(move || {
            Password::new()
                .with_prompt(prompt)
                .allow_empty_password(true)
                .interact()
        })
        .await??;
        Ok(answer)
    }

    async fn confirm(&self, prompt: &str, default: bool) -> Result<bool, SystemError> {
        let prompt = prompt.to_owned();
        let answer = tokio::task::spawn_blocking(move || {
            Confirm::new()
                .with_prompt(prompt)
                .default(default)
                .interact()
        })
        .await??;
        Ok(answer)
    }
}
