use std::path::PathBuf;

use anyhow::{Context, Result};
use keygate_core::store::write_private;
use keygate_core::SigningKey;
use keyring::Entry;
use tracing::{info, warn};

const SERVICE_NAME: &str = "keygate";

/// Keychain account name for the token signing key
const SIGNING_KEY_ACCOUNT: &str = "token-signing-key";

/// Fallback key file, used only when no OS keychain is available
const SIGNING_KEY_FILE: &str = "signing.key";

pub struct SigningKeyStore {
    fallback_dir: PathBuf,
}

impl SigningKeyStore {
    pub fn new(fallback_dir: impl Into<PathBuf>) -> Self {
        Self {
            fallback_dir: fallback_dir.into(),
        }
    }

    /// Return the stored signing key, generating and storing one on first use.
    ///
    /// The OS keychain is tried first; if it is unavailable the key lives in an
    /// owner-only file in the data directory.
    pub fn load_or_create(&self) -> Result<SigningKey> {
        match Self::load_from_keychain() {
            Ok(Some(key)) => return Ok(key),
            Ok(None) => {}
            Err(e) => warn!(error = %e, "OS keychain unavailable, using key file"),
        }

        if let Some(key) = self.load_from_file()? {
            return Ok(key);
        }

        let key = SigningKey::generate();
        match Self::store_in_keychain(&key) {
            Ok(()) => info!("Generated new signing key in OS keychain"),
            Err(e) => {
                warn!(error = %e, "Could not store signing key in keychain");
                self.store_in_file(&key)?;
                info!(path = %self.key_path().display(), "Generated new signing key file");
            }
        }
        Ok(key)
    }

    fn load_from_keychain() -> Result<Option<SigningKey>> {
        let entry = Entry::new(SERVICE_NAME, SIGNING_KEY_ACCOUNT)
            .context("Failed to create keyring entry")?;
        match entry.get_password() {
            Ok(material) => {
                let key = SigningKey::from_material(&material)
                    .context("Signing key in keychain is invalid")?;
                Ok(Some(key))
            }
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e).context("Failed to read signing key from keychain"),
        }
    }

    fn store_in_keychain(key: &SigningKey) -> Result<()> {
        let entry = Entry::new(SERVICE_NAME, SIGNING_KEY_ACCOUNT)
            .context("Failed to create keyring entry")?;
        entry
            .set_password(&key.to_hex())
            .context("Failed to store signing key in keychain")?;

        // Some backends accept writes they cannot read back
        match Self::load_from_keychain()? {
            Some(_) => Ok(()),
            None => Err(anyhow::anyhow!("keychain did not retain the signing key")),
        }
    }

    fn load_from_file(&self) -> Result<Option<SigningKey>> {
        let path = self.key_path();
        if !path.exists() {
            return Ok(None);
        }
        let material = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let key = SigningKey::from_material(&material)
            .with_context(|| format!("Signing key in {} is invalid", path.display()))?;
        Ok(Some(key))
    }

    fn store_in_file(&self, key: &SigningKey) -> Result<()> {
        std::fs::create_dir_all(&self.fallback_dir)?;
        let path = self.key_path();
        write_private(&path, key.to_hex().as_bytes())
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }

    fn key_path(&self) -> PathBuf {
        self.fallback_dir.join(SIGNING_KEY_FILE)
    }
}
