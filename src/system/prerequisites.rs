//! Host prerequisite checks.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// A tool that must be installed before anything else runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prerequisite {
    /// Program name looked up on `PATH`.
    pub program: String,
    /// Instruction shown when it is missing.
    pub hint: String,
}

impl Prerequisite {
    #[must_use]
    pub fn new(program: impl Into<String>, hint: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            hint: hint.into(),
        }
    }
}

/// The tools the installer needs: the interpreter and `git`.
#[must_use]
pub fn required_tools(python: &str) -> Vec<Prerequisite> {
    vec![
        Prerequisite::new(
            python,
            "Install it with: sudo apt install python3 python3-venv python3-pip",
        ),
        Prerequisite::new("git", "Install it with: sudo apt install git"),
    ]
}

/// Returns the first prerequisite not found on the given `PATH` value.
#[must_use]
pub fn first_missing_in<'a>(tools: &'a [Prerequisite], path_var: &OsStr) -> Option<&'a Prerequisite> {
    tools
        .iter()
        .find(|tool| find_in(&tool.program, path_var).is_none())
}

/// Locates an executable on the given `PATH` value.
///
/// Names containing a `/` are checked as paths directly.
#[must_use]
pub fn find_in(program: &str, path_var: &OsStr) -> Option<PathBuf> {
    if program.contains('/') {
        let candidate = PathBuf::from(program);
        return is_executable(&candidate).then_some(candidate);
    }

    std::env::split_paths(path_var)
        .map(|dir| dir.join(program))
        .find(|candidate| is_executable(candidate))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
