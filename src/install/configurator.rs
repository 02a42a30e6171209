//! Collects the bot's secrets and writes the `.env` file.

use serde::Serialize;
use tracing::info;

use super::InstallError;
use crate::config::{EnvFile, InstallSettings};
use crate::system::Prompter;

const BOT_TOKEN_PROMPT: &str = "Enter your Telegram bot token";
const MUSIC_TOKEN_PROMPT: &str = "Enter your Yandex Music token (optional, press Enter to skip)";

/// What happened to the secrets file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvOutcome {
    /// File already existed and was left untouched.
    Kept,
    /// File was created from the operator's answers.
    Created { music_token: bool },
}

/// Writes the `.env` file unless one already exists.
///
/// Tokens are not validated; an empty bot token is written as-is.
pub async fn configure_env<P: Prompter>(
    settings: &InstallSettings,
    prompter: &P,
) -> Result<EnvOutcome, InstallError> {
    let path = settings.env_path();
    if path.exists() {
        info!("Using existing {}", path.display());
        return Ok(EnvOutcome::Kept);
    }

    let bot_token = prompter.secret(BOT_TOKEN_PROMPT).await?;
    let music_token = prompter.secret(MUSIC_TOKEN_PROMPT).await?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| InstallError::io(format!("Failed to create {}", parent.display()), e))?;
    }

    let env = EnvFile::from_tokens(bot_token.trim(), music_token.trim());
    env.write_new(&path)?;

    info!("Wrote {} ({} entries)", path.display(), env.len());
    Ok(EnvOutcome::Created {
        music_token: !music_token.trim().is_empty(),
    })
}
