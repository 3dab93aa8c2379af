//! Server configuration parsed from environment variables.

use std::path::PathBuf;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_CHAT_RATE_LIMIT: usize = 20;
pub const DEFAULT_CHAT_RATE_WINDOW_SECS: u64 = 10;
pub const DEFAULT_MAX_CHAT_CHARS: usize = 4000;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid {var}: {value}")]
    Invalid { var: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub port: u16,
    /// YAML file listing users and their token digests.
    pub users_file: Option<PathBuf>,
    /// Accept unknown tokens as guest identities.
    pub allow_guests: bool,
    pub chat_rate_limit: usize,
    pub chat_rate_window_secs: u64,
    pub max_chat_chars: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            users_file: None,
            allow_guests: false,
            chat_rate_limit: DEFAULT_CHAT_RATE_LIMIT,
            chat_rate_window_secs: DEFAULT_CHAT_RATE_WINDOW_SECS,
            max_chat_chars: DEFAULT_MAX_CHAT_CHARS,
        }
    }
}

impl ServerConfig {
    /// Build typed config from environment variables.
    ///
    /// Optional:
    /// - `PORT`: default 3000
    /// - `COLLAB_USERS_FILE`: path to the users YAML file
    /// - `COLLAB_ALLOW_GUESTS`: `true`/`1` to admit unknown tokens as guests
    /// - `CHAT_RATE_LIMIT`: chat messages per window per connection, default 20
    /// - `CHAT_RATE_WINDOW_SECS`: default 10
    /// - `CHAT_MAX_CHARS`: default 4000
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when a set variable does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            port: env_parse("PORT", defaults.port)?,
            users_file: std::env::var("COLLAB_USERS_FILE")
                .into_iter()
                .find(|v| !v.trim().is_empty())
                .map(PathBuf::from),
            allow_guests: parse_bool("COLLAB_ALLOW_GUESTS", std::env::var("COLLAB_ALLOW_GUESTS").ok().as_deref())?,
            chat_rate_limit: env_parse("CHAT_RATE_LIMIT", defaults.chat_rate_limit)?,
            chat_rate_window_secs: env_parse("CHAT_RATE_WINDOW_SECS", defaults.chat_rate_window_secs)?,
            max_chat_chars: env_parse("CHAT_MAX_CHARS", defaults.max_chat_chars)?,
        })
    }
}

fn env_parse<T>(var: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
{
    match std::env::var(var) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::Invalid { var, value: raw }),
        _ => Ok(default),
    }
}

fn parse_bool(var: &'static str, raw: Option<&str>) -> Result<bool, ConfigError> {
    match raw.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
        None | Some("" | "0" | "false" | "no") => Ok(false),
        Some("1" | "true" | "yes") => Ok(true),
        Some(other) => Err(ConfigError::Invalid { var, value: other.to_owned() }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
