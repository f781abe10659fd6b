//! Runtime configuration parsed from environment variables.

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// A variable is set but its value cannot be parsed.
    #[error("invalid value for {var}: '{value}' ({expected})")]
    Invalid { var: &'static str, value: String, expected: &'static str },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Base URL of the board API, without a trailing slash.
    pub api_url: String,
    /// Bearer token sent with every request.
    pub token: Option<String>,
    pub timeouts: Timeouts,
    /// Persist drag/resize geometry on every pointer-move, not only on release.
    pub stream_motion: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            token: None,
            timeouts: Timeouts {
                request_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
                connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            },
            stream_motion: false,
        }
    }
}

impl Config {
    /// Build typed config from environment variables.
    ///
    /// Optional:
    /// - `STICKERBOARD_API_URL`: default `http://127.0.0.1:8000`
    /// - `STICKERBOARD_TOKEN`: no `Authorization` header when absent
    /// - `STICKERBOARD_REQUEST_TIMEOUT_SECS`: default 30
    /// - `STICKERBOARD_CONNECT_TIMEOUT_SECS`: default 10
    /// - `STICKERBOARD_STREAM_MOTION`: `true`/`false`, default `false`
    ///
    /// Empty values count as unset.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when a numeric or boolean variable
    /// does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_url = env_var("STICKERBOARD_API_URL")
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        let token = env_var("STICKERBOARD_TOKEN");
        let timeouts = Timeouts {
            request_secs: env_parse_u64("STICKERBOARD_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS)?,
            connect_secs: env_parse_u64("STICKERBOARD_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS)?,
        };
        let stream_motion = env_parse_bool("STICKERBOARD_STREAM_MOTION", false)?;

        Ok(Self { api_url, token, timeouts, stream_motion })
    }
}

fn env_var(key: &str) -> Option<String> {
    match std::env::var(key) {
        Ok(value) if !value.trim().is_empty() => Some(value),
        _ => None,
    }
}

fn env_parse_u64(key: &'static str, default: u64) -> Result<u64, ConfigError> {
    let Some(raw) = env_var(key) else {
        return Ok(default);
    };
    raw.trim()
        .parse::<u64>()
        .map_err(|_| ConfigError::Invalid { var: key, value: raw, expected: "a non-negative integer" })
}

fn env_parse_bool(key: &'static str, default: bool) -> Result<bool, ConfigError> {
    let Some(raw) = env_var(key) else {
        return Ok(default);
    };
    parse_bool(&raw).ok_or(ConfigError::Invalid { var: key, value: raw, expected: "true or false" })
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
