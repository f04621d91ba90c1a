//! Application configuration management.
//!
//! Settings are read from `~/.config/keygate/config.json` (missing file means
//! defaults), then overridden by environment variables, which may come from a
//! `.env` file:
//!
//! - `KEYGATE_SIGNING_KEY`: token signing key (hex, base64, or a 32+ byte passphrase)
//! - `KEYGATE_TOKEN_TTL_SECS`: access token lifetime in seconds
//! - `KEYGATE_DATA_DIR`: where the account store and session live
//! - `KEYGATE_REQUIRE_EMAIL`: `true` to reject identifiers that are not email-shaped
//! - `KEYGATE_MIN_PASSWORD_LENGTH`: minimum password length at registration

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use keygate_core::config::DEFAULT_TOKEN_TTL_SECS;
use keygate_core::{HasherConfig, IdentityPolicy};
use serde::{Deserialize, Serialize};

/// Application name used for config/data directory paths
pub const APP_NAME: &str = "keygate";

/// Config file name
const CONFIG_FILE: &str = "config.json";

pub const ENV_SIGNING_KEY: &str = "KEYGATE_SIGNING_KEY";
const ENV_TOKEN_TTL_SECS: &str = "KEYGATE_TOKEN_TTL_SECS";
const ENV_DATA_DIR: &str = "KEYGATE_DATA_DIR";
const ENV_REQUIRE_EMAIL: &str = "KEYGATE_REQUIRE_EMAIL";
const ENV_MIN_PASSWORD_LENGTH: &str = "KEYGATE_MIN_PASSWORD_LENGTH";

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub token_ttl_secs: u64,
    pub data_dir: Option<PathBuf>,
    pub hasher: HasherConfig,
    pub policy: IdentityPolicy,
    /// Signing key from the environment. Never written to the config file.
    #[serde(skip)]
    pub signing_key: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            token_ttl_secs: DEFAULT_TOKEN_TTL_SECS,
            data_dir: None,
            hasher: HasherConfig::default(),
            policy: IdentityPolicy::default(),
            signing_key: None,
        }
    }
}

impl Config {
    /// Load the config file (if any) and apply environment overrides
    pub fn load() -> Result<Self> {
        let mut config = Self::load_file()?;
        config.apply_env(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    fn load_file() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(key) = var(ENV_SIGNING_KEY).filter(|k| !k.trim().is_empty()) {
            self.signing_key = Some(key);
        }
        if let Some(ttl) = var(ENV_TOKEN_TTL_SECS) {
            self.token_ttl_secs = ttl
                .trim()
                .parse()
                .with_context(|| format!("{} must be a whole number of seconds", ENV_TOKEN_TTL_SECS))?;
        }
        if let Some(dir) = var(ENV_DATA_DIR).filter(|d| !d.trim().is_empty()) {
            self.data_dir = Some(PathBuf::from(dir));
        }
        if let Some(flag) = var(ENV_REQUIRE_EMAIL) {
            self.policy.require_email_shape = matches!(
                flag.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            );
        }
        if let Some(len) = var(ENV_MIN_PASSWORD_LENGTH) {
            self.policy.min_secret_length = len
                .trim()
                .parse()
                .with_context(|| format!("{} must be a whole number", ENV_MIN_PASSWORD_LENGTH))?;
        }
        Ok(())
    }

    pub fn token_ttl(&self) -> Duration {
        Duration::from_secs(self.token_ttl_secs)
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Directory holding the account store and saved session
    pub fn data_dir(&self) -> Result<PathBuf> {
        if let Some(ref dir) = self.data_dir {
            return Ok(dir.clone());
        }
        let data_dir = dirs::data_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME))
    }
}
