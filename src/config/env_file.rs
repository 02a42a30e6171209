//! The bot's `.env` secrets file.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use thiserror::Error;

use super::{BOT_TOKEN_KEY, KNOWN_ENV_KEYS, MUSIC_TOKEN_KEY};

/// Errors raised while reading or writing the secrets file.
#[derive(Debug, Error)]
pub enum EnvFileError {
    #[error("Failed to write {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: dotenvy::Error,
    },
}

/// Ordered `KEY=VALUE` entries of a `.env` file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvFile {
    entries: Vec<(String, String)>,
}

impl EnvFile {
    /// Builds the file the installer writes: the bot token always, the music
    /// token only when non-empty.
    #[must_use]
    pub fn from_tokens(bot_token: &str, music_token: &str) -> Self {
        let mut entries = vec![(BOT_TOKEN_KEY.to_owned(), bot_token.to_owned())];
        if !music_token.is_empty() {
            entries.push((MUSIC_TOKEN_KEY.to_owned(), music_token.to_owned()));
        }
        Self { entries }
    }

    /// Reads an existing file. Values are interpreted the way `dotenv` loaders do.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, EnvFileError> {
        let path = path.as_ref();
        let read_err = |source| EnvFileError::Read {
            path: path.display().to_string(),
            source,
        };

        let mut entries = Vec::new();
        for item in dotenvy::from_path_iter(path).map_err(read_err)? {
            entries.push(item.map_err(read_err)?);
        }
        Ok(Self { entries })
    }

    /// Writes the file, refusing to replace an existing one.
    ///
    /// On Unix the file is created with mode `0600`.
    pub fn write_new(&self, path: impl AsRef<Path>) -> Result<(), EnvFileError> {
        let path = path.as_ref();
        let write_err = |source| EnvFileError::Write {
            path: path.display().to_string(),
            source,
        };

        let mut options = OpenOptions::new();
        options.write(true).create_new(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        let mut file = options.open(path).map_err(write_err)?;
        file.write_all(self.render().as_bytes()).map_err(write_err)?;
        file.sync_all().map_err(write_err)
    }

    /// Renders raw `KEY=VALUE` lines with no quoting.
    #[must_use]
    pub fn render(&self) -> String {
        self.entries
            .iter()
            .map(|(k, v)| format!("{k}={v}\n"))
            .collect()
    }

    /// Returns the value of a key. When a key repeats, the last value wins.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Keys appearing more than once, in order of first repetition.
    #[must_use]
    pub fn duplicate_keys(&self) -> Vec<&str> {
        let mut seen = std::collections::HashSet::new();
        let mut duplicates = Vec::new();
        for (key, _) in &self.entries {
            if !seen.insert(key.as_str()) && !duplicates.contains(&key.as_str()) {
                duplicates.push(key.as_str());
            }
        }
        duplicates
    }

    /// Keys the bot does not read.
    #[must_use]
    pub fn unknown_keys(&self) -> Vec<&str> {
        self.entries
            .iter()
            .map(|(k, _)| k.as_str())
            .filter(|k| !KNOWN_ENV_KEYS.contains(k))
            .collect()
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Checks if the file has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Loose shape check for a Telegram bot token: `<digits>:<35 chars>`.
#[must_use]
pub fn looks_like_bot_token(token: &str) -> bool {
    let Some((id, secret)) = token.split_once(':') else {
        return false;
    };
    !id.is_empty()
        && id.chars().all(|c| c.is_ascii_digit())
        && secret.len() == 35
        && secret
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_skips_empty_music_token() {
        let env = EnvFile::from_tokens("123:abc", "");
        assert_eq!(env.render(), "BOT_TOKEN=123:abc\n");
        assert_eq!(env.len(), 1);
    }

    #[test]
    fn test_render_writes_both_tokens() {
        let env = EnvFile::from_tokens("123:abc", "ym-token");
        assert_eq!(
            env.render(),
            "BOT_TOKEN=123:abc\nYANDEX_MUSIC_TOKEN=ym-token\n"
        );
    }

    #[test]
    fn test_empty_bot_token_is_still_written() {
        let env = EnvFile::from_tokens("", "");
        assert_eq!(env.render(), "BOT_TOKEN=\n");
    }

    #[test]
    fn test_write_new_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(&path, "BOT_TOKEN=old\n").unwrap();

        let result = EnvFile::from_tokens("new", "").write_new(&path);
        assert!(matches!(result, Err(EnvFileError::Write { .. })));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "BOT_TOKEN=old\n");
    }

    #[cfg(unix)]
    #[test]
    fn test_write_new_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        EnvFile::from_tokens("123:abc", "").write_new(&path).unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_load_reads_written_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        EnvFile::from_tokens("123:abc", "ym").write_new(&path).unwrap();

        let loaded = EnvFile::load(&path).unwrap();
        assert_eq!(loaded.get(BOT_TOKEN_KEY), Some("123:abc"));
        assert_eq!(loaded.get(MUSIC_TOKEN_KEY), Some("ym"));
        assert!(loaded.duplicate_keys().is_empty());
    }

    #[test]
    fn test_load_detects_duplicates_and_unknown_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(&path, "BOT_TOKEN=a\nEXTRA=1\nBOT_TOKEN=b\n").unwrap();

        let loaded = EnvFile::load(&path).unwrap();
        assert_eq!(loaded.get(BOT_TOKEN_KEY), Some("b"));
        assert_eq!(loaded.duplicate_keys(), vec!["BOT_TOKEN"]);
        assert_eq!(loaded.unknown_keys(), vec!["EXTRA"]);
    }

    #[test]
    fn test_looks_like_bot_token() {
        let secret = "A".repeat(35);
        assert!(looks_like_bot_token(&format!("123456:{secret}")));
        assert!(!looks_like_bot_token("123456"));
        assert!(!looks_like_bot_token("abc:def"));
        assert!(!looks_like_bot_token(""));
    }
}
