use std::env;
use std::fs;
use std::io;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::format::MessageLimits;

pub const CONFIG_FILE_NAME: &str = "config.json";
pub const CONFIG_DIR_ENV: &str = "CONFIG_PATH";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error("invalid config {path}: {source}")]
    Invalid {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("{0}")]
    Value(String),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    /// JMdict XML file or compiled snapshot.
    pub jmdict_file: PathBuf,
    /// Shared secret callers must present as `Authorization: Bot <token>`.
    pub api_token: Option<String>,
    /// JSON document for channel settings and cards; in-memory when unset.
    pub store_path: Option<PathBuf>,
    pub bind: SocketAddr,
    pub command_prefix: String,
    pub default_language: String,
    pub max_message_chars: usize,
    /// Probability that a plain message in a card-mode channel draws a card.
    pub card_chance: f64,
    /// Messages from this author are ignored.
    pub bot_user_id: Option<String>,
    pub prefix_limit: usize,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            jmdict_file: PathBuf::from("JMdict_e.xml"),
            api_token: None,
            store_path: None,
            bind: SocketAddr::from(([127, 0, 0, 1], 8080)),
            command_prefix: "jpn".to_string(),
            default_language: "eng".to_string(),
            max_message_chars: MessageLimits::DEFAULT_MAX_CHARS,
            card_chance: 0.1,
            bot_user_id: None,
            prefix_limit: 20,
        }
    }
}

impl BotConfig {
    /// Loads from `explicit` when given, otherwise from `$CONFIG_PATH/config.json`
    /// or `./config.json`, falling back to defaults when neither exists.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match explicit {
            Some(path) => Self::from_file(path)?,
            None => match discover() {
                Some(path) => Self::from_file(&path)?,
                None => {
                    debug!("no config file found, using defaults");
                    Self::default()
                }
            },
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let bytes = fs::read(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_slice(&bytes).map_err(|source| ConfigError::Invalid {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.command_prefix.is_empty() || self.command_prefix.contains('!') {
            return Err(ConfigError::Value(format!(
                "command_prefix must be non-empty and must not contain '!', got {:?}",
                self.command_prefix
            )));
        }
        if !(0.0..=1.0).contains(&self.card_chance) {
            return Err(ConfigError::Value(format!(
                "card_chance must be within 0.0..=1.0, got {}",
                self.card_chance
            )));
        }
        if self.max_message_chars < 64 {
            return Err(ConfigError::Value(format!(
                "max_message_chars is too small: {}",
                self.max_message_chars
            )));
        }
        Ok(())
    }

    pub fn message_limits(&self) -> MessageLimits {
        MessageLimits::new(self.max_message_chars)
    }
}

fn discover() -> Option<PathBuf> {
    let mut candidates = Vec::new();
    if let Some(dir) = env::var_os(CONFIG_DIR_ENV) {
        candidates.push(PathBuf::from(dir).join(CONFIG_FILE_NAME));
    }
    candidates.push(PathBuf::from(CONFIG_FILE_NAME));
    candidates.into_iter().find(|path| path.is_file())
}
