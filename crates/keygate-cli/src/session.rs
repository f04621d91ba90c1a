use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use keygate_core::store::write_private;
use serde::{Deserialize, Serialize};

/// Session file name in the data directory
const SESSION_FILE: &str = "session.json";

/// Warn about upcoming expiry when fewer than this many minutes remain
const EXPIRY_WARNING_MINUTES: i64 = 5;

/// The token from the most recent successful login
#[derive(Clone, Serialize, Deserialize)]
pub struct SessionData {
    pub token: String,
    pub identifier: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl SessionData {
    pub fn new(token: String, identifier: String, expires_at: DateTime<Utc>) -> Self {
        Self {
            token,
            identifier,
            expires_at,
            created_at: Utc::now(),
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }

    /// Check if the session will expire soon
    pub fn expires_soon(&self) -> bool {
        self.time_until_expiry() < Duration::minutes(EXPIRY_WARNING_MINUTES)
    }

    pub fn time_until_expiry(&self) -> Duration {
        self.expires_at - Utc::now()
    }

    /// Get minutes remaining until expiry (for display)
    pub fn minutes_until_expiry(&self) -> i64 {
        self.time_until_expiry().num_minutes().max(0)
    }
}

pub struct Session {
    data_dir: PathBuf,
    pub data: Option<SessionData>,
}

impl Session {
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            data_dir,
            data: None,
        }
    }

    /// Load session from disk. Expired sessions are kept so the server-side
    /// check can report the expiry.
    pub fn load(&mut self) -> Result<bool> {
        let path = self.session_path();
        if !path.exists() {
            return Ok(false);
        }
        let contents = std::fs::read_to_string(&path)
            .context("Failed to read session file")?;
        let data: SessionData = serde_json::from_str(&contents)
            .context("Failed to parse session file")?;
        self.data = Some(data);
        Ok(true)
    }

    /// Save session to disk
    pub fn save(&self) -> Result<()> {
        if let Some(ref data) = self.data {
            let path = self.session_path();
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let contents = serde_json::to_string_pretty(data)?;
            write_private(&path, contents).context("Failed to write session file")?;
        }
        Ok(())
    }

    /// Clear session data
    pub fn clear(&mut self) -> Result<()> {
        self.data = None;
        let path = self.session_path();
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }

    pub fn update(&mut self, data: SessionData) {
        self.data = Some(data);
    }

    pub fn token(&self) -> Option<&str> {
        self.data.as_ref().map(|d| d.token.as_str())
    }

    fn session_path(&self) -> PathBuf {
        self.data_dir.join(SESSION_FILE)
    }
}
