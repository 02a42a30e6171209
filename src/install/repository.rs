//! Clones or updates the bot repository.

use std::path::Path;

use serde::Serialize;
use tracing::{info, warn};

use super::{InstallError, run_tool};
use crate::config::InstallSettings;
use crate::system::{CommandRunner, Invocation};

/// What happened to the checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RepoOutcome {
    /// Repository was fetched for the first time.
    Cloned,
    /// Existing checkout was fast-forwarded.
    Updated,
    /// A git step failed and `keep_going` let the run continue.
    SyncFailed,
}

/// Brings the checkout in `app_dir` up to date.
///
/// Without a `.git` marker the repository is cloned; a directory that already
/// holds files (such as a freshly written `.env`) is initialised in place so
/// untracked files survive. A `.git` without a `HEAD` is what an interrupted
/// in-place initialisation leaves behind, and resumes that path. Otherwise
/// `git pull --ff-only` runs.
pub async fn sync_repository<R: CommandRunner>(
    settings: &InstallSettings,
    runner: &R,
) -> Result<RepoOutcome, InstallError> {
    let app_dir = &settings.app_dir;
    let keep_going = settings.keep_going;

    if settings.git_marker().exists() {
        if has_head(runner, app_dir).await? {
            info!("Updating repository in {}", app_dir.display());
            let pulled = run_tool(
                runner,
                git_in(app_dir).args(["pull", "--ff-only"]),
                keep_going,
            )
            .await?;
            return Ok(if pulled {
                RepoOutcome::Updated
            } else {
                RepoOutcome::SyncFailed
            });
        }
        warn!(
            "{} has no commits yet, resuming the initial checkout",
            app_dir.display()
        );
    }

    let url = settings
        .repo_url
        .as_deref()
        .ok_or_else(|| InstallError::MissingRepoUrl {
            app_dir: app_dir.clone(),
        })?;

    info!("Cloning {url} into {}", app_dir.display());

    if is_empty_dir(app_dir)? {
        let cloned = run_tool(
            runner,
            Invocation::new("git")
                .args(["clone", "--branch", settings.branch.as_str(), url])
                .arg(app_dir.display().to_string()),
            keep_going,
        )
        .await?;
        return Ok(if cloned {
            RepoOutcome::Cloned
        } else {
            RepoOutcome::SyncFailed
        });
    }

    run_tool(runner, git_in(app_dir).arg("init"), keep_going).await?;

    // A previous attempt may have registered a different URL.
    let _ = runner
        .run(&git_in(app_dir).args(["remote", "remove", "origin"]).captured())
        .await?;

    let branch = settings.branch.as_str();
    let steps = [
        git_in(app_dir).args(["remote", "add", "origin", url]),
        git_in(app_dir).args(["fetch", "origin", branch]),
        git_in(app_dir)
            .args(["checkout", "-f", "-B", branch, "--track"])
            .arg(format!("origin/{branch}")),
    ];
    let mut all_ok = true;
    for step in steps {
        all_ok &= run_tool(runner, step, keep_going).await?;
    }

    Ok(if all_ok {
        RepoOutcome::Cloned
    } else {
        RepoOutcome::SyncFailed
    })
}

/// Whether the checkout has at least one commit.
async fn has_head<R: CommandRunner>(runner: &R, dir: &Path) -> Result<bool, InstallError> {
    let output = runner
        .run(
            &git_in(dir)
                .args(["rev-parse", "--verify", "--quiet", "HEAD"])
                .captured(),
        )
        .await?;
    Ok(output.success())
}

fn git_in(dir: &Path) -> Invocation {
    Invocation::new("git")
        .arg("-C")
        .arg(dir.display().to_string())
}

/// Missing directories count as empty.
fn is_empty_dir(dir: &Path) -> Result<bool, InstallError> {
    match std::fs::read_dir(dir) {
        Ok(mut entries) => Ok(entries.next().is_none()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(true),
        Err(e) => Err(InstallError::io(
            format!("Failed to read {}", dir.display()),
            e,
        )),
    }
}
