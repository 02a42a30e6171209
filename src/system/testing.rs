//! Test doubles for the host seams.

use std::collections::VecDeque;
use std::sync::Mutex;

use super::{CommandOutput, CommandRunner, Invocation, Prompter, SystemError};

/// Records every command and answers from a table of prefixes.
#[derive(Debug, Default)]
pub struct FakeRunner {
    calls: Mutex<Vec<String>>,
    responses: Vec<(String, CommandOutput)>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands starting with `prefix` return `output`. First match wins.
    pub fn respond(mut self, prefix: &str, output: CommandOutput) -> Self {
        self.responses.push((prefix.to_owned(), output));
        self
    }

    /// Commands starting with `prefix` exit with `code`.
    pub fn fail(self, prefix: &str, code: i32) -> Self {
        self.respond(prefix, CommandOutput::with_code(code))
    }

    /// Marks the service as running for `systemctl is-active`.
    pub fn service_active(self) -> Self {
        self.respond("systemctl is-active", CommandOutput::ok())
    }

    /// Marks the service as stopped for `systemctl is-active`.
    pub fn service_inactive(self) -> Self {
        self.fail("systemctl is-active", 3)
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn ran(&self, prefix: &str) -> bool {
        self.calls().iter().any(|c| c.starts_with(prefix))
    }
}

impl CommandRunner for FakeRunner {
    async fn run(&self, invocation: &Invocation) -> Result<CommandOutput, SystemError> {
        let line = invocation.to_string();
        self.calls.lock().unwrap().push(line.clone());
        Ok(self
            .responses
            .iter()
            .find(|(prefix, _)| line.starts_with(prefix.as_str()))
            .map_or_else(CommandOutput::ok, |(_, output)| output.clone()))
    }
}

/// Replays canned answers and records the questions asked.
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    secrets: Mutex<VecDeque<String>>,
    confirms: Mutex<VecDeque<bool>>,
    asked: Mutex<Vec<String>>,
}

impl ScriptedPrompter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_secret(self, answer: &str) -> Self {
        self.secrets.lock().unwrap().push_back(answer.to_owned());
        self
    }

    pub fn with_confirm(self, answer: bool) -> Self {
        self.confirms.lock().unwrap().push_back(answer);
        self
    }

    pub fn asked(&self) -> Vec<String> {
        self.asked.lock().unwrap().clone()
    }
}

impl Prompter for ScriptedPrompter {
    async fn secret(&self, prompt: &str) -> Result<String, SystemError> {
        self.asked.lock().unwrap().push(prompt.to_owned());
        Ok(self
            .secrets
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("unexpected prompt: {prompt}")))
    }

    async fn confirm(&self, prompt: &str, _default: bool) -> Result<bool, SystemError> {
        self.asked.lock().unwrap().push(prompt.to_owned());
        Ok(self
            .confirms
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("unexpected confirmation: {prompt}")))
    }
}

/// Never answers, like an operator who walked away from the terminal.
#[derive(Debug, Default)]
pub struct SilentPrompter;

impl Prompter for SilentPrompter {
    async fn secret(&self, _prompt: &str) -> Result<String, SystemError> {
        std::future::pending().await
    }

    async fn confirm(&self, _prompt: &str, _default: bool) -> Result<bool, SystemError> {
        std::future::pending().await
    }
}
