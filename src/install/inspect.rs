//! Read-only health check of an installation.

use std::ffi::OsStr;

use serde::Serialize;

use super::{ServiceUnit, UnitState, inspect_unit, is_active};
use crate::config::{BOT_TOKEN_KEY, EnvFile, InstallSettings, MUSIC_TOKEN_KEY, looks_like_bot_token};
use crate::system::{CommandRunner, find_in, required_tools};

/// Severity of a single finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

/// One line of the health report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckItem {
    pub name: String,
    pub status: CheckStatus,
    pub detail: String,
}

/// All findings, in check order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InspectionReport {
    pub items: Vec<CheckItem>,
}

impl InspectionReport {
    fn push(&mut self, name: impl Into<String>, status: CheckStatus, detail: impl Into<String>) {
        self.items.push(CheckItem {
            name: name.into(),
            status,
            detail: detail.into(),
        });
    }

    #[must_use]
    pub fn count(&self, status: CheckStatus) -> usize {
        self.items.iter().filter(|i| i.status == status).count()
    }

    /// No errors (warnings are allowed).
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        self.count(CheckStatus::Error) == 0
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&CheckItem> {
        self.items.iter().find(|i| i.name == name)
    }
}

/// Inspects prerequisites, secrets, checkout, runtime, unit and service state.
pub async fn inspect_host<R: CommandRunner>(
    settings: &InstallSettings,
    runner: &R,
    search_path: &OsStr,
) -> InspectionReport {
    let mut report = InspectionReport::default();

    for tool in required_tools(&settings.python) {
        match find_in(&tool.program, search_path) {
            Some(path) => report.push(&tool.program, CheckStatus::Ok, path.display().to_string()),
            None => report.push(&tool.program, CheckStatus::Error, tool.hint),
        }
    }

    check_env(settings, &mut report);

    if settings.git_marker().exists() {
        report.push("repository", CheckStatus::Ok, settings.app_dir.display().to_string());
    } else {
        report.push(
            "repository",
            CheckStatus::Error,
            format!("no checkout in {}", settings.app_dir.display()),
        );
    }

    if settings.venv_python().exists() {
        report.push("venv", CheckStatus::Ok, settings.venv_path().display().to_string());
    } else {
        report.push(
            "venv",
            CheckStatus::Error,
            format!("{} is missing", settings.venv_python().display()),
        );
    }

    let desired = ServiceUnit::from_settings(settings).render();
    let unit_path = settings.unit_path();
    match inspect_unit(&unit_path, &desired) {
        Ok(UnitState::InSync) => report.push("unit", CheckStatus::Ok, unit_path.display().to_string()),
        Ok(UnitState::Drifted) => report.push(
            "unit",
            CheckStatus::Warning,
            format!("{} differs from the expected unit; re-run the installer", unit_path.display()),
        ),
        Ok(UnitState::Missing) => report.push(
            "unit",
            CheckStatus::Error,
            format!("{} not installed", unit_path.display()),
        ),
        Err(e) => report.push("unit", CheckStatus::Error, e.to_string()),
    }

    match is_active(runner, &settings.service_name).await {
        Ok(true) => report.push("service", CheckStatus::Ok, "active"),
        Ok(false) => report.push("service", CheckStatus::Warning, "not running"),
        Err(e) => report.push("service", CheckStatus::Warning, e.to_string()),
    }

    report
}

fn check_env(settings: &InstallSettings, report: &mut InspectionReport) {
    let path = settings.env_path();
    if !path.exists() {
        report.push("env_file", CheckStatus::Error, format!("{} not found", path.display()));
        return;
    }

    let env = match EnvFile::load(&path) {
        Ok(env) => env,
        Err(e) => {
            report.push("env_file", CheckStatus::Error, e.to_string());
            return;
        }
    };

    if env.is_empty() {
        report.push("env_file", CheckStatus::Error, "no entries");
        return;
    }

    let mut problems = Vec::new();
    let duplicates = env.duplicate_keys();
    if !duplicates.is_empty() {
        problems.push(format!("duplicate keys: {}", duplicates.join(", ")));
    }
    let unknown = env.unknown_keys();
    if !unknown.is_empty() {
        problems.push(format!("unknown keys: {}", unknown.join(", ")));
    }

    if problems.is_empty() {
        report.push("env_file", CheckStatus::Ok, format!("{} entries", env.len()));
    } else {
        report.push("env_file", CheckStatus::Warning, problems.join("; "));
    }

    match env.get(BOT_TOKEN_KEY) {
        None => report.push(BOT_TOKEN_KEY, CheckStatus::Error, "missing"),
        Some("") => report.push(BOT_TOKEN_KEY, CheckStatus::Error, "empty"),
        Some(token) if !looks_like_bot_token(token) => report.push(
            BOT_TOKEN_KEY,
            CheckStatus::Warning,
            "does not look like a Telegram bot token",
        ),
        Some(_) => report.push(BOT_TOKEN_KEY, CheckStatus::Ok, "set"),
    }

    let music = if env.get(MUSIC_TOKEN_KEY).is_some_and(|t| !t.is_empty()) {
        "set"
    } else {
        "not set (optional)"
    };
    report.push(MUSIC_TOKEN_KEY, CheckStatus::Ok, music);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::install::installed_unit_user;
    use crate::system::testing::FakeRunner;

    fn settings_in(app: &std::path::Path, units: &std::path::Path) -> InstallSettings {
        let mut settings = InstallSettings::new(app);
        settings.unit_dir = units.to_path_buf();
        settings.run_as = "zenload".to_owned();
        settings
    }

    #[tokio::test]
    async fn test_empty_host_reports_errors() {
        let app = tempfile::tempdir().unwrap();
        let units = tempfile::tempdir().unwrap();
        let settings = settings_in(app.path(), units.path());
        let runner = FakeRunner::new().service_inactive();

        let report = inspect_host(&settings, &runner, OsStr::new("")).await;

        assert!(!report.is_healthy());
        assert_eq!(report.get("git").unwrap().status, CheckStatus::Error);
        assert_eq!(report.get("env_file").unwrap().status, CheckStatus::Error);
        assert_eq!(report.get("unit").unwrap().status, CheckStatus::Error);
        assert_eq!(report.get("service").unwrap().status, CheckStatus::Warning);
    }

    #[tokio::test]
    async fn test_env_problems_are_reported() {
        let app = tempfile::tempdir().unwrap();
        let units = tempfile::tempdir().unwrap();
        std::fs::write(app.path().join(".env"), "BOT_TOKEN=\nBOT_TOKEN=\n").unwrap();
        let settings = settings_in(app.path(), units.path());

        let report = inspect_host(&settings, &FakeRunner::new(), OsStr::new("")).await;

        let env = report.get("env_file").unwrap();
        assert_eq!(env.status, CheckStatus::Warning);
        assert!(env.detail.contains("BOT_TOKEN"));
        assert_eq!(report.get(BOT_TOKEN_KEY).unwrap().detail, "empty");
    }

    #[tokio::test]
    async fn test_drifted_unit_is_a_warning() {
        let app = tempfile::tempdir().unwrap();
        let units = tempfile::tempdir().unwrap();
        std::fs::write(units.path().join("zenload.service"), "[Unit]\n").unwrap();
        let settings = settings_in(app.path(), units.path());

        let report = inspect_host(&settings, &FakeRunner::new(), OsStr::new("")).await;

        assert_eq!(report.get("unit").unwrap().status, CheckStatus::Warning);
        assert_eq!(report.get("service").unwrap().detail, "active");
    }

    #[tokio::test]
    async fn test_production_env_keys_are_accepted() {
        let app = tempfile::tempdir().unwrap();
        let units = tempfile::tempdir().unwrap();
        std::fs::write(
            app.path().join(".env"),
            "BOT_TOKEN=123456:ABCdef\nMONGODB_URI=mongodb://localhost:27017\nCOBALT_API_TOKEN=c\n",
        )
        .unwrap();
        let settings = settings_in(app.path(), units.path());

        let report = inspect_host(&settings, &FakeRunner::new(), OsStr::new("")).await;

        let env = report.get("env_file").unwrap();
        assert_eq!(env.status, CheckStatus::Ok, "{}", env.detail);
        assert_eq!(env.detail, "3 entries");
    }

    #[tokio::test]
    async fn test_duplicates_do_not_hide_unknown_keys() {
        let app = tempfile::tempdir().unwrap();
        let units = tempfile::tempdir().unwrap();
        std::fs::write(
            app.path().join(".env"),
            "BOT_TOKEN=1:a\nBOT_TOKEN=1:b\nBOT_TOKN=typo\n",
        )
        .unwrap();
        let settings = settings_in(app.path(), units.path());

        let report = inspect_host(&settings, &FakeRunner::new(), OsStr::new("")).await;

        let env = report.get("env_file").unwrap();
        assert_eq!(env.status, CheckStatus::Warning);
        assert_eq!(env.detail, "duplicate keys: BOT_TOKEN; unknown keys: BOT_TOKN");
    }

    #[tokio::test]
    async fn test_empty_env_file_is_an_error() {
        let app = tempfile::tempdir().unwrap();
        let units = tempfile::tempdir().unwrap();
        std::fs::write(app.path().join(".env"), "# nothing yet\n").unwrap();
        let settings = settings_in(app.path(), units.path());

        let report = inspect_host(&settings, &FakeRunner::new(), OsStr::new("")).await;

        let env = report.get("env_file").unwrap();
        assert_eq!(env.status, CheckStatus::Error);
        assert_eq!(env.detail, "no entries");
        assert!(report.get(BOT_TOKEN_KEY).is_none());
    }

    #[tokio::test]
    async fn test_unit_user_taken_from_installed_unit() {
        let app = tempfile::tempdir().unwrap();
        let units = tempfile::tempdir().unwrap();
        let installed = settings_in(app.path(), units.path());
        std::fs::write(
            installed.unit_path(),
            ServiceUnit::from_settings(&installed).render(),
        )
        .unwrap();

        let mut checked = installed.clone();
        checked.run_as = "someone-else".to_owned();
        let report = inspect_host(&checked, &FakeRunner::new(), OsStr::new("")).await;
        assert_eq!(report.get("unit").unwrap().status, CheckStatus::Warning);

        checked.run_as = installed_unit_user(&checked.unit_path()).unwrap();
        let report = inspect_host(&checked, &FakeRunner::new(), OsStr::new("")).await;
        assert_eq!(report.get("unit").unwrap().status, CheckStatus::Ok);
    }
}
