//! Configuration module for the installer.
//!
//! Handles the installer's own settings and the bot's `.env` secrets file.

mod env_file;
mod settings;

pub use env_file::{EnvFile, EnvFileError, looks_like_bot_token};
pub use settings::{ConfigError, InstallSettings};

/// Key holding the Telegram bot token.
pub const BOT_TOKEN_KEY: &str = "BOT_TOKEN";

/// Key holding the optional Yandex Music token.
pub const MUSIC_TOKEN_KEY: &str = "YANDEX_MUSIC_TOKEN";

/// Key holding the MongoDB connection string. Not prompted for.
pub const MONGODB_URI_KEY: &str = "MONGODB_URI";

/// Key holding the optional Cobalt API token. Not prompted for.
pub const COBALT_TOKEN_KEY: &str = "COBALT_API_TOKEN";

/// Keys the bot reads from its `.env` file.
pub const KNOWN_ENV_KEYS: [&str; 4] = [
    BOT_TOKEN_KEY,
    MUSIC_TOKEN_KEY,
    MONGODB_URI_KEY,
    COBALT_TOKEN_KEY,
];

/// Default systemd service name.
pub const DEFAULT_SERVICE_NAME: &str = "zenload";
