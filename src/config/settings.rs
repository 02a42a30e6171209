//! Installer settings.

use std::path::{Path, PathBuf};

use serde::Serialize;

use super::DEFAULT_SERVICE_NAME;

/// Everything the installer needs to know about the target host layout.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct InstallSettings {
    /// Directory holding the bot checkout. Becomes the unit's working directory.
    pub app_dir: PathBuf,

    /// Remote repository to clone when no checkout exists yet.
    pub repo_url: Option<String>,

    /// Branch to clone or track.
    pub branch: String,

    /// Secrets file, relative to `app_dir` unless absolute.
    pub env_file: PathBuf,

    /// Virtual environment directory, relative to `app_dir` unless absolute.
    pub venv_dir: PathBuf,

    /// Dependency manifest, relative to `app_dir`.
    pub requirements: PathBuf,

    /// Entry file started by the service, relative to `app_dir`.
    pub entry_file: PathBuf,

    /// Interpreter used to create the virtual environment.
    pub python: String,

    /// Name of the systemd service (without `.service`).
    pub service_name: String,

    /// `Description=` line of the unit.
    pub description: String,

    /// Directory the unit file is installed into.
    pub unit_dir: PathBuf,

    /// User the service runs as.
    pub run_as: String,

    /// Delay between restarts, in seconds.
    pub restart_sec: u64,

    /// Prefix privileged commands with `sudo`.
    pub use_sudo: bool,

    /// Log failed external tools and continue instead of aborting.
    pub keep_going: bool,

    /// Answer "yes" to the start confirmation.
    pub assume_yes: bool,
}

fn default_branch() -> String {
    "main".to_owned()
}

fn default_env_file() -> PathBuf {
    PathBuf::from(".env")
}

fn default_venv_dir() -> PathBuf {
    PathBuf::from("venv")
}

fn default_requirements() -> PathBuf {
    PathBuf::from("requirements.txt")
}

fn default_entry_file() -> PathBuf {
    PathBuf::from("main.py")
}

fn default_python() -> String {
    "python3".to_owned()
}

fn default_service_name() -> String {
    DEFAULT_SERVICE_NAME.to_owned()
}

fn default_description() -> String {
    "Zenload Telegram Bot".to_owned()
}

fn default_unit_dir() -> PathBuf {
    PathBuf::from("/etc/systemd/system")
}

fn default_restart_sec() -> u64 {
    10
}

fn default_run_as() -> String {
    std::env::var("USER")
        .ok()
        .filter(|u| !u.is_empty())
        .unwrap_or_else(|| "root".to_owned())
}

impl InstallSettings {
    /// Creates settings for the given application directory with defaults elsewhere.
    #[must_use]
    pub fn new(app_dir: impl Into<PathBuf>) -> Self {
        Self {
            app_dir: app_dir.into(),
            repo_url: None,
            branch: default_branch(),
            env_file: default_env_file(),
            venv_dir: default_venv_dir(),
            requirements: default_requirements(),
            entry_file: default_entry_file(),
            python: default_python(),
            service_name: default_service_name(),
            description: default_description(),
            unit_dir: default_unit_dir(),
            run_as: default_run_as(),
            restart_sec: default_restart_sec(),
            use_sudo: false,
            keep_going: false,
            assume_yes: false,
        }
    }

    /// Creates settings from `ZENLOAD_*` environment variables with defaults.
    ///
    /// The application directory falls back to the current directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the current directory cannot be determined.
    pub fn from_env_with_defaults() -> Result<Self, ConfigError> {
        let app_dir = match std::env::var("ZENLOAD_APP_DIR") {
            Ok(dir) => PathBuf::from(dir),
            Err(_) => std::env::current_dir().map_err(ConfigError::CurrentDir)?,
        };

        let mut settings = Self::new(app_dir);
        settings.repo_url = std::env::var("ZENLOAD_REPO_URL")
            .ok()
            .filter(|u| !u.is_empty());

        if let Ok(branch) = std::env::var("ZENLOAD_BRANCH") {
            settings.branch = branch;
        }
        if let Ok(path) = std::env::var("ZENLOAD_ENV_FILE") {
            settings.env_file = PathBuf::from(path);
        }
        if let Ok(path) = std::env::var("ZENLOAD_VENV_DIR") {
            settings.venv_dir = PathBuf::from(path);
        }
        if let Ok(path) = std::env::var("ZENLOAD_REQUIREMENTS") {
            settings.requirements = PathBuf::from(path);
        }
        if let Ok(path) = std::env::var("ZENLOAD_ENTRY") {
            settings.entry_file = PathBuf::from(path);
        }
        if let Ok(python) = std::env::var("ZENLOAD_PYTHON") {
            settings.python = python;
        }
        if let Ok(name) = std::env::var("ZENLOAD_SERVICE") {
            settings.service_name = name;
        }
        if let Ok(dir) = std::env::var("ZENLOAD_UNIT_DIR") {
            settings.unit_dir = PathBuf::from(dir);
        }
        if let Ok(user) = std::env::var("ZENLOAD_USER") {
            settings.run_as = user;
        }
        settings.restart_sec = std::env::var("ZENLOAD_RESTART_SEC")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or_else(default_restart_sec);

        Ok(settings)
    }

    /// Checks values that would produce a broken unit file.
    ///
    /// # Errors
    ///
    /// Returns the first invalid setting found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service_name.is_empty()
            || self
                .service_name
                .chars()
                .any(|c| c.is_whitespace() || c == '/')
        {
            return Err(ConfigError::InvalidServiceName(self.service_name.clone()));
        }
        if self.run_as.trim().is_empty() {
            return Err(ConfigError::EmptyUser);
        }
        if !self.app_dir.is_absolute() {
            return Err(ConfigError::RelativeAppDir(self.app_dir.clone()));
        }
        Ok(())
    }

    /// Absolute path of the secrets file.
    #[must_use]
    pub fn env_path(&self) -> PathBuf {
        self.resolve(&self.env_file)
    }

    /// Absolute path of the virtual environment.
    #[must_use]
    pub fn venv_path(&self) -> PathBuf {
        self.resolve(&self.venv_dir)
    }

    /// Interpreter inside the virtual environment.
    #[must_use]
    pub fn venv_python(&self) -> PathBuf {
        self.venv_path().join("bin").join("python")
    }

    /// `pip` inside the virtual environment.
    #[must_use]
    pub fn venv_pip(&self) -> PathBuf {
        self.venv_path().join("bin").join("pip")
    }

    /// Absolute path of the dependency manifest.
    #[must_use]
    pub fn requirements_path(&self) -> PathBuf {
        self.resolve(&self.requirements)
    }

    /// Absolute path of the entry file.
    #[must_use]
    pub fn entry_path(&self) -> PathBuf {
        self.resolve(&self.entry_file)
    }

    /// Marker whose presence means the repository is already cloned.
    #[must_use]
    pub fn git_marker(&self) -> PathBuf {
        self.app_dir.join(".git")
    }

    /// Unit file name, e.g. `zenload.service`.
    #[must_use]
    pub fn unit_name(&self) -> String {
        format!("{}.service", self.service_name)
    }

    /// Full path of the installed unit file.
    #[must_use]
    pub fn unit_path(&self) -> PathBuf {
        self.unit_dir.join(self.unit_name())
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.app_dir.join(path)
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine the current directory: {0}")]
    CurrentDir(#[source] std::io::Error),

    #[error("Invalid service name '{0}' (must be non-empty, without spaces or '/')")]
    InvalidServiceName(String),

    #[error("The service user must not be empty")]
    EmptyUser,

    #[error("Application directory must be absolute: {}", .0.display())]
    RelativeAppDir(PathBuf),
}
