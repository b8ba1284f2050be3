//! Configuration management

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Yaml},
};
use filterbot_core::DEFAULT_WHITELIST;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Environment variable prefix; nested keys use `__`
/// (`FILTERBOT_FILTER__WHITELIST`).
pub const ENV_PREFIX: &str = "FILTERBOT_";

/// Main configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Prefix that marks a chat line as a bot command (`!filter ...`).
    pub commands_prefix: String,
    /// Filter command configuration
    pub filter: FilterConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            commands_prefix: "!".to_string(),
            filter: FilterConfig::default(),
        }
    }
}

/// Filter command configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Command word, without the commands prefix.
    pub trigger: String,
    /// Comma-separated glob patterns of filters users may run.
    pub whitelist: String,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            trigger: "filter".to_string(),
            whitelist: DEFAULT_WHITELIST.to_string(),
        }
    }
}

impl Config {
    /// Load configuration from file and environment
    ///
    /// Later sources win: built-in defaults, then the YAML file, then
    /// `FILTERBOT_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file does not exist or cannot be parsed.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::figment(path)?
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .map_err(|e| Error::Config(e.to_string()))
    }

    /// Load configuration from a file only, ignoring the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file does not exist or cannot be parsed.
    pub fn load_file(path: &Path) -> Result<Self> {
        Self::figment(Some(path))?
            .extract()
            .map_err(|e| Error::Config(e.to_string()))
    }

    fn figment(path: Option<&Path>) -> Result<Figment> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(p) = path {
            if !p.exists() {
                return Err(Error::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            figment = figment.merge(Yaml::file(p));
        }

        Ok(figment)
    }

    /// The full command word users type, e.g. `!filter`.
    #[must_use]
    pub fn command(&self) -> String {
        format!("{}{}", self.commands_prefix, self.filter.trigger)
    }

    /// Check values that cannot be expressed in the type.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the trigger is empty or contains whitespace.
    pub fn validate(&self) -> Result<()> {
        let trigger = &self.filter.trigger;
        if trigger.is_empty() || trigger.chars().any(char::is_whitespace) {
            return Err(Error::Config(format!(
                "filter.trigger must be a single non-empty word, got {trigger:?}"
            )));
        }
        if self.commands_prefix.chars().any(char::is_whitespace) {
            return Err(Error::Config(format!(
                "commands_prefix must not contain whitespace, got {:?}",
                self.commands_prefix
            )));
        }
        Ok(())
    }
}
