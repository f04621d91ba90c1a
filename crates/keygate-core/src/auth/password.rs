//! One-way secret hashing.
//!
//! Hashes are Argon2id PHC strings (`$argon2id$v=19$m=..,t=..,p=..$salt$hash`),
//! so every hash carries its own salt and cost parameters.

use std::sync::OnceLock;

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use rand::rngs::OsRng;
use tracing::debug;

use crate::config::HasherConfig;
use crate::error::{AuthError, Result};

#[derive(Clone)]
pub struct SecretHasher {
    argon2: Argon2<'static>,
    /// Hash verified against when the account does not exist, so an unknown
    /// identity costs the same as a wrong secret
    dummy_hash: OnceLock<String>,
}

impl SecretHasher {
    pub fn new(config: HasherConfig) -> Result<Self> {
        let params = Params::new(config.memory_kib, config.iterations, config.parallelism, None)
            .map_err(|e| AuthError::Hashing(format!("invalid argon2 parameters: {}", e)))?;

        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
            dummy_hash: OnceLock::new(),
        })
    }

    /// Hash a raw secret with a fresh random salt
    pub fn hash(&self, raw_secret: &str) -> Result<String> {
        if raw_secret.is_empty() {
            return Err(AuthError::validation("Password is required"));
        }

        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(raw_secret.as_bytes(), &salt)
            .map_err(|e| AuthError::Hashing(e.to_string()))?;
        Ok(hash.to_string())
    }

    /// Check a raw secret against a stored hash.
    ///
    /// The comparison is constant time. Unparseable or unsupported hash strings
    /// yield `false`; only empty inputs are rejected outright.
    pub fn verify(&self, raw_secret: &str, secret_hash: &str) -> Result<bool> {
        if raw_secret.is_empty() || secret_hash.is_empty() {
            return Err(AuthError::validation("Password and hash are required"));
        }

        let parsed = match PasswordHash::new(secret_hash) {
            Ok(parsed) => parsed,
            Err(e) => {
                debug!(error = %e, "Stored secret hash is not a valid PHC string");
                return Ok(false);
            }
        };

        // Parameters come from the hash itself, not from this hasher's config
        match self.argon2.verify_password(raw_secret.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => {
                debug!(error = %e, "Stored secret hash could not be verified");
                Ok(false)
            }
        }
    }

    /// Burn one verification's worth of work against a throwaway hash
    pub fn verify_dummy(&self, raw_secret: &str) {
        let dummy = self.dummy_hash.get_or_init(|| {
            self.hash("keygate-dummy-secret").unwrap_or_default()
        });
        if !dummy.is_empty() && !raw_secret.is_empty() {
            let _ = self.verify(raw_secret, dummy);
        }
    }
}
